/// Enemy AI: steering toward the player in continuous space.
///
/// Three modes, chosen by distance to the player:
///   1. **Idle**: farther than the relevance range: no movement at all.
///   2. **Chase**: inside the kind's detection range: straight at the player.
///   3. **Drift**: otherwise: a small per-tick chance of a random nudge
///      at a multiple of normal speed.
///
/// Returns an intended velocity only; collision is resolved by `physics`.

use rand::Rng;

use super::entity::{Enemy, Position};

#[derive(Clone, Copy, Debug)]
pub struct AiParams {
    pub relevance_range: f32,
    pub drift_chance: f64,
    pub drift_multiplier: f32,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Intent {
    Idle,
    Chase { vx: f32, vy: f32 },
    Drift { vx: f32, vy: f32 },
}

impl Intent {
    pub fn velocity(self) -> (f32, f32) {
        match self {
            Intent::Idle => (0.0, 0.0),
            Intent::Chase { vx, vy } | Intent::Drift { vx, vy } => (vx, vy),
        }
    }
}

pub fn decide<R: Rng>(enemy: &Enemy, player: Position, params: &AiParams, rng: &mut R) -> Intent {
    let stats = enemy.stats();
    let dx = player.x - enemy.pos.x;
    let dy = player.y - enemy.pos.y;
    let dist = (dx * dx + dy * dy).sqrt();

    if dist > params.relevance_range {
        return Intent::Idle;
    }

    if dist < stats.detection_range && dist > f32::EPSILON {
        return Intent::Chase {
            vx: dx / dist * stats.speed,
            vy: dy / dist * stats.speed,
        };
    }

    if rng.gen_bool(probability(params.drift_chance)) {
        let span = stats.speed * params.drift_multiplier;
        let vx = (rng.gen::<f32>() - 0.5) * span;
        let vy = (rng.gen::<f32>() - 0.5) * span;
        return Intent::Drift { vx, vy };
    }

    Intent::Idle
}

/// Non-finite chances never fire.
fn probability(p: f64) -> f64 {
    if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::EnemyKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params() -> AiParams {
        AiParams { relevance_range: 30.0, drift_chance: 0.05, drift_multiplier: 3.0 }
    }

    #[test]
    fn chases_inside_detection_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let slime = Enemy::new(1, Position::new(0.0, 0.0), EnemyKind::Slime);
        let intent = decide(&slime, Position::new(3.0, 4.0), &params(), &mut rng);
        match intent {
            Intent::Chase { vx, vy } => {
                assert!((vx - 0.6 * 0.025).abs() < 1e-6);
                assert!((vy - 0.8 * 0.025).abs() < 1e-6);
            }
            other => panic!("expected chase, got {other:?}"),
        }
    }

    #[test]
    fn idle_beyond_relevance_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let ghost = Enemy::new(1, Position::new(0.0, 0.0), EnemyKind::Ghost);
        // Ghost detection (50) exceeds relevance (30): relevance wins.
        let intent = decide(&ghost, Position::new(40.0, 0.0), &params(), &mut rng);
        assert_eq!(intent, Intent::Idle);
    }

    #[test]
    fn drift_is_rare_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let bat = Enemy::new(1, Position::new(0.0, 0.0), EnemyKind::Bat);
        let far = Position::new(20.0, 0.0);
        let mut drifts = 0;
        for _ in 0..2000 {
            if let Intent::Drift { vx, vy } = decide(&bat, far, &params(), &mut rng) {
                drifts += 1;
                let limit = 0.05 * 3.0 / 2.0 + 1e-6;
                assert!(vx.abs() <= limit && vy.abs() <= limit);
            }
        }
        // ~5% of 2000 = 100
        assert!(drifts > 40 && drifts < 200, "drifts = {drifts}");
    }

    #[test]
    fn nan_drift_chance_never_drifts() {
        let mut rng = StdRng::seed_from_u64(7);
        let bat = Enemy::new(1, Position::new(0.0, 0.0), EnemyKind::Bat);
        let p = AiParams { drift_chance: f64::NAN, ..params() };
        for _ in 0..200 {
            assert_eq!(decide(&bat, Position::new(20.0, 0.0), &p, &mut rng), Intent::Idle);
        }
    }
}
