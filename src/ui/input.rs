/// Terminal input → host commands.
///
/// Drains crossterm's queue once per frame. Mouse positions are converted
/// from terminal cells into viewport pixels so the simulation's pointer
/// handling (drag threshold, tap-to-world) sees the same units it would
/// on a pixel display. Key repeats count as presses; releases are ignored.

use std::time::Duration;

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

use super::renderer::{CELL_W, MAP_ORIGIN};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Command {
    Confirm,
    OpenBook,
    Back,
    Quit,
    DigHere,
    /// Camera pan in viewport pixels, drag convention.
    Pan { dx: f32, dy: f32 },
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
}

pub struct InputState {
    tile_size: f32,
    pub commands: Vec<Command>,
}

impl InputState {
    pub fn new(tile_size: f32) -> Self {
        InputState { tile_size, commands: Vec::with_capacity(8) }
    }

    /// Read every pending terminal event without blocking.
    pub fn drain_events(&mut self) {
        self.commands.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            let cmd = match event::read() {
                Ok(Event::Key(key)) => self.translate_key(key),
                Ok(Event::Mouse(mouse)) => self.translate_mouse(mouse),
                _ => None,
            };
            self.commands.extend(cmd);
        }
    }

    fn translate_key(&self, key: KeyEvent) -> Option<Command> {
        if key.kind == KeyEventKind::Release { return None; }
        if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c' | 'C')) {
            return Some(Command::Quit);
        }
        let step = self.tile_size;
        Some(match key.code {
            KeyCode::Enter => Command::Confirm,
            KeyCode::Esc => Command::Back,
            KeyCode::Char('q' | 'Q') => Command::Quit,
            KeyCode::Char('b' | 'B') => Command::OpenBook,
            KeyCode::Char(' ') => Command::DigHere,
            // Arrows move the view; dragging the map moves it the other way.
            KeyCode::Left => Command::Pan { dx: step, dy: 0.0 },
            KeyCode::Right => Command::Pan { dx: -step, dy: 0.0 },
            KeyCode::Up => Command::Pan { dx: 0.0, dy: step },
            KeyCode::Down => Command::Pan { dx: 0.0, dy: -step },
            _ => return None,
        })
    }

    fn translate_mouse(&self, mouse: MouseEvent) -> Option<Command> {
        let (x, y) = cell_to_viewport_px(mouse.column, mouse.row, self.tile_size);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Command::PointerDown { x, y }),
            MouseEventKind::Drag(MouseButton::Left) => Some(Command::PointerMove { x, y }),
            MouseEventKind::Up(MouseButton::Left) => Some(Command::PointerUp { x, y }),
            _ => None,
        }
    }
}

/// Centre of a terminal cell in viewport pixels. A map tile spans
/// `CELL_W` columns and one row.
pub fn cell_to_viewport_px(col: u16, row: u16, tile_size: f32) -> (f32, f32) {
    let fx = (col as f32 - MAP_ORIGIN.0 as f32 + 0.5) / CELL_W as f32;
    let fy = row as f32 - MAP_ORIGIN.1 as f32 + 0.5;
    (fx * tile_size, fy * tile_size)
}
