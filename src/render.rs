use crate::config::{GlyphSet, Settings};
use crate::course::{Course, Tile, COLS, ROWS};
use crate::model::GameState;
use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        DisableFocusChange, EnableFocusChange, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Right half of a double-width glyph. Never printed; the glyph to its left
/// already covers it.
pub(crate) const WIDE_TAIL: char = '\0';

/// Terminal columns per grid cell, so a 40x40 px tile stays roughly square.
pub(crate) const CELL_COLS: u16 = 2;
pub(crate) const FIELD_W: u16 = COLS as u16 * CELL_COLS;
pub(crate) const FIELD_H: u16 = ROWS as u16;
const FOOTER_ROWS: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    #[cfg(test)]
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        if x < self.w && y < self.h {
            Some(self.cells[self.idx(x, y)])
        } else {
            None
        }
    }
    pub(crate) fn clear(&mut self, fg: Color, bg: Color) {
        for c in &mut self.cells {
            c.ch = ' ';
            c.fg = fg;
            c.bg = bg;
        }
    }
}

/* -----------------------------
   Terminal session
------------------------------ */

/// Terminal modes switched on so far; restore undoes exactly these.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Setup {
    pub(crate) raw_mode: bool,
    pub(crate) alt_screen: bool,
    pub(crate) focus_events: bool,
    pub(crate) key_flags: bool,
}

/// Queue the escape sequences that undo `setup`, newest mode first.
pub(crate) fn queue_restore<W: Write>(out: &mut W, setup: &Setup) -> io::Result<()> {
    if setup.key_flags {
        queue!(out, PopKeyboardEnhancementFlags)?;
    }
    if setup.focus_events {
        queue!(out, DisableFocusChange)?;
    }
    if setup.alt_screen {
        queue!(
            out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
    }
    out.flush()
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    /// Key releases are reported (keyboard enhancement protocol active).
    pub(crate) reports_release: bool,
    full_redraw: bool,
    setup: Setup,
}

impl Terminal {
    /// Switch the terminal into game mode. The guard exists before the first
    /// mode change, so a failure part-way still restores on drop.
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut term = Self {
            out: io::stdout(),
            cols: 0,
            rows: 0,
            prev: CellBuffer::new(0, 0),
            cur: CellBuffer::new(0, 0),
            reports_release: false,
            full_redraw: true,
            setup: Setup::default(),
        };

        terminal::enable_raw_mode().context("could not enable raw mode")?;
        term.setup.raw_mode = true;

        // marked first: a half-written switch still needs leaving
        term.setup.alt_screen = true;
        execute!(
            term.out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            Clear(ClearType::All)
        )
        .context("could not enter the alternate screen")?;

        execute!(term.out, EnableFocusChange)?;
        term.setup.focus_events = true;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                term.out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            term.setup.key_flags = true;
            term.reports_release = true;
        }

        term.resize_if_needed()?;
        Ok(term)
    }

    /// Restore the terminal. Safe to call more than once.
    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        let setup = std::mem::take(&mut self.setup);
        let written = queue_restore(&mut self.out, &setup);
        if setup.raw_mode {
            terminal::disable_raw_mode()?;
        }
        written?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.full_redraw = true;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        if self.full_redraw {
            queue!(self.out, ResetColor, Clear(ClearType::All))?;
        }

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c.ch == WIDE_TAIL || (!self.full_redraw && c == self.prev.cells[i]) {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_redraw = false;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

/* -----------------------------
   Look
------------------------------ */

#[derive(Clone, Copy, Debug)]
pub(crate) struct Glyphs {
    pub(crate) wall: [char; 2],
    pub(crate) car: char,
    pub(crate) car_wide: bool,
    pub(crate) horiz: char,
    pub(crate) vert: char,
    /// top-left, top-right, bottom-left, bottom-right
    pub(crate) corners: [char; 4],
}

impl Glyphs {
    pub(crate) fn for_set(set: GlyphSet) -> Self {
        match set {
            GlyphSet::Unicode => Self {
                wall: ['█', '█'],
                car: '車',
                car_wide: true,
                horiz: '─',
                vert: '│',
                corners: ['┌', '┐', '└', '┘'],
            },
            GlyphSet::Ascii => Self {
                wall: ['#', '#'],
                car: 'A',
                car_wide: false,
                horiz: '-',
                vert: '|',
                corners: ['+', '+', '+', '+'],
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Palette {
    pub(crate) paper: Color,
    pub(crate) ink: Color,
    pub(crate) car: Color,
    pub(crate) hud_fg: Color,
    pub(crate) hud_bg: Color,
}

impl Palette {
    pub(crate) fn new(enable_color: bool) -> Self {
        if enable_color {
            // black ink on white paper
            Self {
                paper: Color::Rgb {
                    r: 255,
                    g: 255,
                    b: 255,
                },
                ink: Color::Rgb { r: 0, g: 0, b: 0 },
                car: Color::Rgb { r: 0, g: 0, b: 0 },
                hud_fg: Color::Rgb {
                    r: 200,
                    g: 200,
                    b: 200,
                },
                hud_bg: Color::Rgb {
                    r: 24,
                    g: 24,
                    b: 24,
                },
            }
        } else {
            Self {
                paper: Color::Reset,
                ink: Color::Reset,
                car: Color::Reset,
                hud_fg: Color::Reset,
                hud_bg: Color::Reset,
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Look {
    pub(crate) glyphs: Glyphs,
    pub(crate) palette: Palette,
}

impl Look {
    pub(crate) fn from_settings(s: &Settings) -> Self {
        Self {
            glyphs: Glyphs::for_set(s.glyphs),
            palette: Palette::new(s.enable_color),
        }
    }
}

/* -----------------------------
   Layout
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Viewport {
    pub(crate) x: u16,
    pub(crate) y: u16,
}

impl Viewport {
    /// Terminal position of a grid cell, or None off the grid.
    fn cell(&self, col: usize, row: usize) -> Option<(u16, u16)> {
        if col >= COLS || row >= ROWS {
            return None;
        }
        Some((self.x + col as u16 * CELL_COLS, self.y + row as u16))
    }
}

/// Center the playfield plus footer, or None when the terminal is too small.
pub(crate) fn fit_view(term_w: u16, term_h: u16) -> Option<Viewport> {
    let need_h = FIELD_H + FOOTER_ROWS;
    if term_w < FIELD_W || term_h < need_h {
        return None;
    }
    Some(Viewport {
        x: (term_w - FIELD_W) / 2,
        y: (term_h - need_h) / 2,
    })
}

/* -----------------------------
   Drawing
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x as usize + i;
        if xx >= buf.w as usize {
            break;
        }
        buf.set(xx as u16, y, Cell { ch, fg, bg });
    }
}

fn fill(buf: &mut CellBuffer, x: u16, y: u16, w: u16, h: u16, fg: Color, bg: Color) {
    for yy in y..y.saturating_add(h) {
        for xx in x..x.saturating_add(w) {
            buf.set(xx, yy, Cell { ch: ' ', fg, bg });
        }
    }
}

fn draw_course(buf: &mut CellBuffer, v: &Viewport, course: &Course, look: &Look) {
    let p = look.palette;
    for (row_idx, row) in course.rows().enumerate() {
        for (col, tile) in row.iter().enumerate() {
            let Some((x, y)) = v.cell(col, row_idx) else {
                continue;
            };
            if *tile == Tile::Wall {
                for (dx, ch) in look.glyphs.wall.iter().enumerate() {
                    buf.set(
                        x + dx as u16,
                        y,
                        Cell {
                            ch: *ch,
                            fg: p.ink,
                            bg: p.paper,
                        },
                    );
                }
            }
        }
    }
}

fn draw_car(buf: &mut CellBuffer, v: &Viewport, st: &GameState, look: &Look) {
    if st.player_col < 0 || st.player_row < 0 {
        return;
    }
    let Some((x, y)) = v.cell(st.player_col as usize, st.player_row as usize) else {
        return;
    };
    let p = look.palette;
    let g = look.glyphs;
    buf.set(
        x,
        y,
        Cell {
            ch: g.car,
            fg: p.car,
            bg: p.paper,
        },
    );
    buf.set(
        x + 1,
        y,
        Cell {
            ch: if g.car_wide { WIDE_TAIL } else { ' ' },
            fg: p.car,
            bg: p.paper,
        },
    );
}

/// Bordered distance readout pinned to the playfield's top-left corner.
fn draw_score_box(buf: &mut CellBuffer, v: &Viewport, distance: u64, look: &Look) {
    let p = look.palette;
    let g = look.glyphs;
    let label = format!("DIST {distance}");
    let inner = label.chars().count() as u16;
    let (x0, y0) = (v.x, v.y);
    let x1 = x0 + inner + 1;

    let mut put = |x: u16, y: u16, ch: char| {
        buf.set(
            x,
            y,
            Cell {
                ch,
                fg: p.ink,
                bg: p.paper,
            },
        )
    };
    put(x0, y0, g.corners[0]);
    put(x1, y0, g.corners[1]);
    put(x0, y0 + 2, g.corners[2]);
    put(x1, y0 + 2, g.corners[3]);
    for x in x0 + 1..x1 {
        put(x, y0, g.horiz);
        put(x, y0 + 2, g.horiz);
    }
    put(x0, y0 + 1, g.vert);
    put(x1, y0 + 1, g.vert);
    draw_text(buf, x0 + 1, y0 + 1, &label, p.ink, p.paper);
}

fn draw_game_over(buf: &mut CellBuffer, v: &Viewport, distance: u64, look: &Look) {
    let p = look.palette;
    let mid = v.y + FIELD_H / 2;
    let lines = [
        "GAME OVER".to_string(),
        format!("DISTANCE {distance}"),
        "R to restart".to_string(),
    ];
    for (i, line) in lines.iter().enumerate() {
        let w = line.chars().count() as u16;
        let x = v.x + FIELD_W.saturating_sub(w) / 2;
        draw_text(buf, x, mid - 1 + i as u16, line, p.ink, p.paper);
    }
}

fn draw_footer(buf: &mut CellBuffer, v: &Viewport, game_over: bool, look: &Look) {
    let p = look.palette;
    let hint = if game_over { "R again  Q quit" } else { "<- -> steer  Q quit" };
    let w = hint.chars().count() as u16;
    let x = v.x + FIELD_W.saturating_sub(w) / 2;
    draw_text(buf, x, v.y + FIELD_H, hint, p.hud_fg, p.hud_bg);
}

fn draw_too_small(buf: &mut CellBuffer, look: &Look) {
    let p = look.palette;
    let msg = format!("Terminal too small. Need {}x{}.", FIELD_W, FIELD_H + FOOTER_ROWS);
    let y = buf.h / 2;
    let w = msg.chars().count() as u16;
    let x = buf.w.saturating_sub(w) / 2;
    draw_text(buf, x, y, &msg, p.hud_fg, p.hud_bg);
}

/// Compose one frame. Returns false when the terminal cannot fit the
/// playfield and only the size notice was drawn.
pub(crate) fn render_scene(buf: &mut CellBuffer, st: &GameState, look: &Look) -> bool {
    let p = look.palette;
    buf.clear(p.hud_fg, p.hud_bg);

    let Some(v) = fit_view(buf.w, buf.h) else {
        draw_too_small(buf, look);
        return false;
    };

    fill(buf, v.x, v.y, FIELD_W, FIELD_H, p.ink, p.paper);
    if st.game_over {
        draw_game_over(buf, &v, st.distance, look);
    } else {
        draw_course(buf, &v, &st.course, look);
        draw_car(buf, &v, st, look);
        draw_score_box(buf, &v, st.distance, look);
    }
    draw_footer(buf, &v, st.game_over, look);
    true
}
