/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into `front` from a `ViewSnapshot`
///   2. Compare each cell with `back` (the previous frame)
///   3. Emit terminal commands only for cells that changed, batched with `queue!`
///   4. Swap front/back
///
/// One map tile is two terminal columns wide and one row high. The map
/// viewport sits at `MAP_ORIGIN`; `ui::input` maps mouse cells back into
/// viewport pixels with the same geometry.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{round_tile, Direction, EnemyKind};
use crate::domain::tile::Tile;
use crate::domain::treasure::Rarity;
use crate::sim::view::ViewSnapshot;
use crate::sim::world::Phase;

// ── Cell ──

const GLYPH_BYTES: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    glyph: [u8; GLYPH_BYTES],
    len: u8,
    fg: Color,
    bg: Color,
    /// Occupies this column and the next.
    wide: bool,
    /// Right half of a wide glyph; never printed.
    cont: bool,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 18, g: 24, b: 38 };

    const BLANK: Cell = Cell {
        glyph: [b' ', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    /// Forces a repaint wherever it sits in the back buffer.
    const INVALID: Cell = Cell {
        glyph: [b'?', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    fn text(s: &str, fg: Color, bg: Color, wide: bool) -> Self {
        let mut cell = Cell::BLANK;
        // Cut on a char boundary so the stored bytes stay valid UTF-8.
        let mut end = s.len().min(GLYPH_BYTES);
        while !s.is_char_boundary(end) { end -= 1; }
        cell.glyph[..end].copy_from_slice(&s.as_bytes()[..end]);
        cell.len = end as u8;
        cell.fg = fg;
        cell.bg = match bg { Color::Reset => Cell::BASE_BG, other => other };
        cell.wide = wide;
        cell
    }

    fn ch(c: char, fg: Color, bg: Color) -> Self {
        let mut buf = [0u8; 4];
        Cell::text(c.encode_utf8(&mut buf), fg, bg, false)
    }

    fn cont(bg: Color) -> Self {
        Cell { len: 0, cont: true, ..Cell::text("", Color::White, bg, false) }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.glyph[..self.len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height { self.cells[y * self.width + x] } else { Cell::BLANK }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, c) in s.chars().enumerate() {
            self.set(x + i, y, Cell::ch(c, fg, bg));
        }
    }

    /// A two-column glyph (emoji) at x, x+1.
    fn put_wide(&mut self, x: usize, y: usize, s: &str, bg: Color) {
        if x + 1 >= self.width { return; }
        self.set(x, y, Cell::text(s, Color::Reset, bg, true));
        self.set(x + 1, y, Cell::cont(bg));
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::ch(' ', Color::White, bg));
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for row in y..y + h {
            for col in x..x + w {
                self.set(col, row, Cell::ch(' ', Color::White, bg));
            }
        }
    }
}

// ── Layout ──

pub const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 1;

/// Terminal (column, row) of the map viewport's top-left corner.
pub const MAP_ORIGIN: (u16, u16) = (MAP_COL as u16, MAP_ROW as u16);

const HUD_BG: Color = Color::Rgb { r: 30, g: 40, b: 70 };
const MSG_BG: Color = Color::Rgb { r: 210, g: 180, b: 60 };
const DIALOG_BG: Color = Color::Rgb { r: 45, g: 35, b: 20 };
const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const GREEN: Color = Color::Rgb { r: 90, g: 240, b: 120 };
const DIM: Color = Color::DarkGrey;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.front.resize(tw as usize, th as usize);
        self.back.resize(tw as usize, th as usize);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, view: &ViewSnapshot) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.front.width || th as usize != self.front.height;
        if resized {
            self.front.resize(tw as usize, th as usize);
            self.back.resize(tw as usize, th as usize);
        }
        if resized || self.last_phase != Some(view.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(view.phase);
        }

        self.front.cells.fill(Cell::BLANK);
        match view.phase {
            Phase::Title => self.compose_title(),
            Phase::TreasureBook => self.compose_book(view),
            Phase::Playing | Phase::Dying => self.compose_game(view),
            Phase::TreasureFound => {
                self.compose_game(view);
                self.compose_treasure_dialog(view);
            }
            Phase::GameOver | Phase::TimeUp => self.compose_summary(view),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let changed = cell != self.back.get(x, y)
                    || (cell.wide && self.front.get(x + 1, y) != self.back.get(x + 1, y));
                if cell.cont || !changed {
                    x += 1;
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.as_str()))?;

                x += if cell.wide { 2 } else { 1 };
                cursor_at = Some((x, y));
            }
        }
        self.writer.flush()
    }

    // ── Playing screen ──

    fn compose_game(&mut self, v: &ViewSnapshot) {
        let vw = v.camera.view_w.ceil() as usize;
        let vh = v.camera.view_h.ceil() as usize;

        // HUD
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = format!(
            " Gold {:>5}g   Time {:>2}s   Treasures {} ",
            v.gold, v.time_left, v.treasures.len()
        );
        let time_fg = if v.time_left <= 10 { Color::Rgb { r: 255, g: 90, b: 90 } } else { Color::White };
        self.front.put_str(0, HUD_ROW, &hud, time_fg, HUD_BG);

        // Map
        let left = v.camera.x - (v.camera.view_w - 1.0) / 2.0;
        let top = v.camera.y - (v.camera.view_h - 1.0) / 2.0;
        for sy in 0..vh {
            for sx in 0..vw {
                let wx = round_tile(left + sx as f32);
                let wy = round_tile(top + sy as f32);
                let col = MAP_COL + sx * CELL_W;
                let row = MAP_ROW + sy;
                let visible = wx >= 0 && wy >= 0
                    && v.visible.0.contains(&(wx as usize))
                    && v.visible.1.contains(&(wy as usize));
                match v.map.get(wx, wy) {
                    Some(tile) if visible => self.compose_tile(tile, col, row),
                    _ => self.compose_sea(col, row),
                }
            }
        }

        // Target marker, then enemies, then the player on top.
        let to_screen = |x: f32, y: f32| -> Option<(usize, usize)> {
            let sx = round_tile(x - left);
            let sy = round_tile(y - top);
            if sx < 0 || sy < 0 || sx as usize >= vw || sy as usize >= vh { return None; }
            Some((MAP_COL + sx as usize * CELL_W, MAP_ROW + sy as usize))
        };

        if let Some(t) = v.target {
            if let Some((col, row)) = to_screen(t.x, t.y) {
                let bg = self.front.get(col, row).bg;
                self.front.set(col, row, Cell::ch('◎', GOLD, bg));
                self.front.set(col + 1, row, Cell::ch(' ', GOLD, bg));
            }
        }
        for e in v.enemies {
            if let Some((col, row)) = to_screen(e.pos.x, e.pos.y) {
                let glyph = match e.kind {
                    EnemyKind::Slime => "🦠",
                    EnemyKind::Bat => "🦇",
                    EnemyKind::Ghost => "👻",
                };
                let bg = self.front.get(col, row).bg;
                self.front.put_wide(col, row, glyph, bg);
            }
        }
        if let Some((col, row)) = to_screen(v.player.pos.x, v.player.pos.y) {
            let glyph = if v.phase == Phase::Dying {
                "💀"
            } else if v.player.digging {
                "⛏"
            } else {
                match v.player.facing {
                    Direction::Left => "🚶",
                    _ => "🧑",
                }
            };
            let bg = self.front.get(col, row).bg;
            self.front.put_wide(col, row, glyph, bg);
        }

        // Message bar
        let msg_row = MAP_ROW + vh + 1;
        let status = if v.generating { Some("Digging something up...") } else { v.message };
        if let Some(msg) = status {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(1, msg_row, msg, Color::Black, MSG_BG);
        }

        self.front.put_str(
            1, msg_row + 2,
            "Click: walk & dig   Drag/Arrows: look   Space: dig here   Esc: quit",
            DIM, Color::Reset,
        );
    }

    fn compose_sea(&mut self, col: usize, row: usize) {
        let bg = Color::Rgb { r: 20, g: 50, b: 110 };
        self.front.set(col, row, Cell::ch(' ', Color::White, bg));
        self.front.set(col + 1, row, Cell::ch(' ', Color::White, bg));
    }

    fn compose_tile(&mut self, tile: Tile, col: usize, row: usize) {
        let (c0, c1, fg, bg) = match tile {
            Tile::Grass => ('"', ' ', Color::Rgb { r: 110, g: 190, b: 90 }, Color::Rgb { r: 60, g: 130, b: 55 }),
            Tile::Dirt => ('░', '░', Color::Rgb { r: 170, g: 120, b: 70 }, Color::Rgb { r: 110, g: 75, b: 40 }),
            Tile::Water => ('≈', '≈', Color::Rgb { r: 120, g: 180, b: 255 }, Color::Rgb { r: 30, g: 70, b: 150 }),
            Tile::Rock => ('█', '█', Color::Rgb { r: 130, g: 130, b: 130 }, Color::Rgb { r: 80, g: 80, b: 80 }),
            Tile::Sand => ('·', ' ', Color::Rgb { r: 170, g: 150, b: 100 }, Color::Rgb { r: 220, g: 200, b: 140 }),
            Tile::Hole => (' ', ' ', Color::Reset, Color::Rgb { r: 25, g: 18, b: 8 }),
            Tile::TreasureMark => ('✕', ' ', GOLD, Color::Rgb { r: 60, g: 42, b: 15 }),
        };
        self.front.set(col, row, Cell::ch(c0, fg, bg));
        self.front.set(col + 1, row, Cell::ch(c1, fg, bg));
    }

    fn compose_treasure_dialog(&mut self, v: &ViewSnapshot) {
        let t = match v.found_treasure {
            Some(t) => &t.entry,
            None => return,
        };
        let (bx, by, bw, bh) = (MAP_COL + 1, MAP_ROW + 3, 40, 9);
        self.front.fill_rect(bx, by, bw, bh, DIALOG_BG);

        self.front.put_str(bx + 9, by + 1, "★ TREASURE FOUND! ★", GOLD, DIALOG_BG);
        self.front.put_wide(bx + 2, by + 3, &t.icon, DIALOG_BG);
        self.front.put_str(bx + 5, by + 3, &t.name, Color::White, DIALOG_BG);
        let stars = "★".repeat(Rarity::from_value(t.value).stars() as usize);
        self.front.put_str(bx + 5, by + 4, &format!("{}g  {}", t.value, stars), GOLD, DIALOG_BG);
        let desc: String = t.description.chars().take(bw - 4).collect();
        self.front.put_str(bx + 2, by + 5, &desc, Color::Grey, DIALOG_BG);
        self.front.put_str(bx + 2, by + 7, "▸ ENTER: keep digging", GREEN, DIALOG_BG);
    }

    // ── Static screens ──

    fn compose_title(&mut self) {
        let title = [
            r"  ___  _        ___                _   ",
            r" |   \(_) __ _ / _ \ _  _  ___  __| |_ ",
            r" | |) | |/ _` | (_) | || |/ -_)(_-<  _|",
            r" |___/|_|\__, |\__\_\\_,_|\___|/__/\__|",
            r"         |___/                         ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 1 + i, line, GOLD, Color::Reset);
        }
        self.front.put_str(6, 7, "Sixty seconds. One shovel. Find the gold.", GREEN, Color::Reset);

        self.front.put_str(8, 10, "ENTER   Start digging", GREEN, Color::Reset);
        self.front.put_str(8, 11, "  B     Treasure Book", Color::White, Color::Reset);
        self.front.put_str(8, 12, "  Q     Quit", Color::White, Color::Reset);

        let help = [
            "Controls",
            "  Click         walk there, then dig",
            "  Click self    dig where you stand",
            "  Drag/Arrows   look around",
            "  Space         dig here",
            "  Lure enemies into holes to bury them.",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, 15 + i, line, color, Color::Reset);
        }
    }

    fn compose_summary(&mut self, v: &ViewSnapshot) {
        let (header, color) = match v.phase {
            Phase::TimeUp => ("⏱  TIME UP  ⏱", GOLD),
            _ => ("✕  GAME OVER  ✕", Color::Rgb { r: 255, g: 70, b: 70 }),
        };
        self.front.put_str(6, 2, "╔══════════════════════════╗", color, Color::Reset);
        self.front.put_str(6, 3, &format!("║ {:^24} ║", header), color, Color::Reset);
        self.front.put_str(6, 4, "╚══════════════════════════╝", color, Color::Reset);

        self.front.put_str(8, 6, &format!("Gold collected: {}g", v.gold), Color::White, Color::Reset);
        self.front.put_str(8, 7, &format!("Treasures found: {}", v.treasures.len()), Color::White, Color::Reset);

        let max_rows = self.front.height.saturating_sub(13);
        for (i, t) in v.treasures.iter().take(max_rows).enumerate() {
            let row = 9 + i;
            self.front.put_wide(10, row, &t.entry.icon, Cell::BASE_BG);
            self.front.put_str(13, row, &format!("{:<24} {:>5}g", t.entry.name, t.entry.value), Color::Grey, Color::Reset);
        }
        let hidden = v.treasures.len().saturating_sub(max_rows);
        let footer = 10 + v.treasures.len().min(max_rows);
        if hidden > 0 {
            self.front.put_str(13, footer - 1, &format!("... and {hidden} more"), DIM, Color::Reset);
        }
        self.front.put_str(8, footer + 1, "▸ ENTER: Back to Title", GREEN, Color::Reset);
    }

    fn compose_book(&mut self, v: &ViewSnapshot) {
        let book = v.book();
        let header = format!(
            " Treasure Book   {}/{} discovered ({}%) ",
            book.discovered, book.total, book.percent()
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &header, GOLD, HUD_BG);

        for (i, b) in book.entries.iter().enumerate() {
            let row = 2 + i;
            if row + 2 >= self.front.height { break; }
            let stars = format!("{:<4}", "★".repeat(b.rarity.stars() as usize));
            if b.discovered {
                self.front.put_wide(2, row, &b.entry.icon, Cell::BASE_BG);
                self.front.put_str(5, row, &format!("{:<24} {:>5}g  ", b.entry.name, b.entry.value), Color::White, Color::Reset);
                self.front.put_str(38, row, &stars, GOLD, Color::Reset);
            } else {
                self.front.put_str(2, row, "?? ????????", DIM, Color::Reset);
                self.front.put_str(38, row, &stars, DIM, Color::Reset);
            }
        }

        let footer = self.front.height.saturating_sub(1);
        self.front.put_str(2, footer, "ENTER/ESC: Back to Title", DIM, Color::Reset);
    }
}
