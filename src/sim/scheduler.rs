/// Cooperative scheduler for the single game thread.
///
/// The host advances a simulated millisecond clock once per frame. Two
/// kinds of timed work hang off that clock:
///
///   - **Deferred events**: one-shot callbacks (dig completion, the death
///     delay). Each is tagged with the run it was scheduled for; the game
///     drops any that come due under a different run.
///   - **Countdown**: a repeating one-second interval driving the game
///     timer. Start and stop are idempotent; stopping discards the partial
///     second so a restart always waits a full second.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Deferred {
    DigComplete,
    DeathToGameOver,
}

/// A deferred event that has come due.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Due {
    pub run_id: u64,
    pub what: Deferred,
}

#[derive(Clone, Debug)]
struct Scheduled {
    at_ms: u64,
    due: Due,
}

/// Everything that fired during one `advance`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fired {
    pub deferred: Vec<Due>,
    pub seconds: u32,
}

const COUNTDOWN_INTERVAL_MS: u64 = 1000;

#[derive(Clone, Debug)]
pub struct Scheduler {
    now_ms: u64,
    run_id: u64,
    queue: Vec<Scheduled>,
    /// Clock time of the next countdown tick; `None` = stopped.
    next_second: Option<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler { now_ms: 0, run_id: 0, queue: vec![], next_second: None }
    }

    /// Open a new run: bump the run id, cancel every deferred event and
    /// stop the countdown. Returns the new run id.
    pub fn begin_run(&mut self) -> u64 {
        self.run_id += 1;
        self.queue.clear();
        self.next_second = None;
        self.run_id
    }

    /// Schedule `what` to fire `delay_ms` from now, tagged with the current run.
    pub fn schedule(&mut self, delay_ms: u64, what: Deferred) {
        self.queue.push(Scheduled {
            at_ms: self.now_ms + delay_ms,
            due: Due { run_id: self.run_id, what },
        });
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub fn is_scheduled(&self, what: Deferred) -> bool {
        self.queue.iter().any(|s| s.due.what == what)
    }

    pub fn start_countdown(&mut self) {
        if self.next_second.is_none() {
            self.next_second = Some(self.now_ms + COUNTDOWN_INTERVAL_MS);
        }
    }

    pub fn stop_countdown(&mut self) {
        self.next_second = None;
    }

    #[cfg(test)]
    pub fn countdown_running(&self) -> bool {
        self.next_second.is_some()
    }

    /// Move the clock forward and collect whatever came due, oldest first.
    pub fn advance(&mut self, dt_ms: u64) -> Fired {
        self.now_ms += dt_ms;
        let now = self.now_ms;

        let mut due: Vec<Scheduled> = Vec::new();
        self.queue.retain(|s| {
            if s.at_ms <= now {
                due.push(s.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|s| s.at_ms);

        let mut seconds = 0;
        if let Some(mut next) = self.next_second {
            while next <= now {
                seconds += 1;
                next += COUNTDOWN_INTERVAL_MS;
            }
            self.next_second = Some(next);
        }

        Fired { deferred: due.into_iter().map(|s| s.due).collect(), seconds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_fires_once_after_delay() {
        let mut s = Scheduler::new();
        s.begin_run();
        s.schedule(300, Deferred::DigComplete);
        assert!(s.advance(299).deferred.is_empty());
        let fired = s.advance(1);
        assert_eq!(fired.deferred, vec![Due { run_id: 1, what: Deferred::DigComplete }]);
        assert!(s.advance(1000).deferred.is_empty());
    }

    #[test]
    fn due_events_come_out_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(500, Deferred::DeathToGameOver);
        s.schedule(100, Deferred::DigComplete);
        let fired = s.advance(1000);
        let order: Vec<Deferred> = fired.deferred.iter().map(|d| d.what).collect();
        assert_eq!(order, vec![Deferred::DigComplete, Deferred::DeathToGameOver]);
    }

    #[test]
    fn new_run_cancels_deferred() {
        let mut s = Scheduler::new();
        s.begin_run();
        s.schedule(2500, Deferred::DeathToGameOver);
        assert_eq!(s.begin_run(), 2);
        assert_eq!(s.pending(), 0);
        assert!(s.advance(5000).deferred.is_empty());
    }

    #[test]
    fn countdown_start_is_idempotent() {
        let mut s = Scheduler::new();
        s.start_countdown();
        s.advance(600);
        s.start_countdown(); // must not reset the phase
        assert_eq!(s.advance(400).seconds, 1);
    }

    #[test]
    fn countdown_catches_up_on_long_frames() {
        let mut s = Scheduler::new();
        s.start_countdown();
        assert_eq!(s.advance(3500).seconds, 3);
        assert_eq!(s.advance(500).seconds, 1);
    }

    #[test]
    fn stopping_discards_partial_second() {
        let mut s = Scheduler::new();
        s.start_countdown();
        s.advance(900);
        s.stop_countdown();
        assert_eq!(s.advance(5000).seconds, 0);
        s.start_countdown();
        assert_eq!(s.advance(999).seconds, 0);
        assert_eq!(s.advance(1).seconds, 1);
    }
}
