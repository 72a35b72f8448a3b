//! The `Terminal`: ties the parser, screen buffer, cursor/mode state,
//! charset translator and damage tracker together behind the host-facing
//! API.

use std::io::{self, Write};

use slog::Logger;
use sloggers::file::FileLoggerBuilder;
use sloggers::null::NullLoggerBuilder;
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

use crate::charset::Charset;
use crate::cursor::{Cursor, Modes, SavedCursor};
use crate::damage::{DamageTracker, Rect};
use crate::error::ReplyError;
use crate::graphics::Graphics;
use crate::parser::{ParserState, SeqAccumulator};
use crate::screen::{CellAttrs, Screen, MAX_COLS};

/// Where the terminal's own diagnostic log should go. Mirrors a
/// configuration layer for logging sinks, independent of the host log.
#[derive(Clone, Debug)]
pub enum LogType {
    File(String, Severity),
    Stdout(Severity),
    Stderr(Severity),
    None,
}

/// Builder for a [`Terminal`], following the method-chaining shape used
/// throughout this codebase's configuration surfaces.
#[derive(Clone, Debug)]
pub struct TerminalBuilder {
    rows: usize,
    cols: usize,
    log: LogType,
}

impl TerminalBuilder {
    pub fn new() -> Self {
        TerminalBuilder {
            rows: 25,
            cols: 80,
            log: LogType::None,
        }
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn cols(mut self, cols: usize) -> Self {
        self.cols = cols;
        self
    }

    pub fn log(mut self, log: LogType) -> Self {
        self.log = log;
        self
    }

    pub fn build<W: Write>(self, reply: W) -> Terminal<W> {
        let logger = match self.log {
            LogType::File(ref name, level) => FileLoggerBuilder::new(name)
                .level(level)
                .build()
                .ok(),
            LogType::Stdout(level) => TerminalLoggerBuilder::new()
                .destination(Destination::Stdout)
                .level(level)
                .build()
                .ok(),
            LogType::Stderr(level) => TerminalLoggerBuilder::new()
                .destination(Destination::Stderr)
                .level(level)
                .build()
                .ok(),
            LogType::None => NullLoggerBuilder {}.build().ok(),
        }
        .unwrap_or_else(|| NullLoggerBuilder {}.build().unwrap());

        Terminal::new(reply, self.rows.max(1), self.cols.min(MAX_COLS), logger)
    }
}

impl Default for TerminalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The terminal core. Owns its screen, cursor, modes, parser state and
/// damage tracker exclusively; `reply` is the write-only sink for
/// synthesized replies (DA/DSR/CPR/…).
pub struct Terminal<W: Write> {
    pub(crate) reply: W,
    pub(crate) screen: Screen,
    pub(crate) rows: usize,

    pub(crate) cursor: Cursor,
    pub(crate) saved_cursor: SavedCursor,
    pub(crate) modes: Modes,
    pub(crate) attrs: CellAttrs,

    pub(crate) g0: Charset,
    pub(crate) g1: Charset,
    pub(crate) gl: u8,

    pub(crate) margin_top: usize,
    pub(crate) margin_bottom: usize,

    pub(crate) damage: DamageTracker,

    pub(crate) parser_state: ParserState,
    pub(crate) seq: SeqAccumulator,

    pub(crate) tabstops: Vec<bool>,
    pub(crate) last_printed: Option<char>,

    pub(crate) graphics: Option<Box<dyn Graphics>>,
    pub(crate) logger: Logger,
}

impl<W: Write> Terminal<W> {
    fn new(reply: W, rows: usize, cols: usize, logger: Logger) -> Self {
        let mut tabstops = vec![false; MAX_COLS];
        let mut x = 8;
        while x < MAX_COLS {
            tabstops[x] = true;
            x += 8;
        }
        Terminal {
            reply,
            screen: Screen::new(rows, cols),
            rows,
            cursor: Cursor::default(),
            saved_cursor: SavedCursor::default(),
            modes: Modes::default(),
            attrs: CellAttrs::default(),
            g0: Charset::Ascii,
            g1: Charset::Ascii,
            gl: 0,
            margin_top: 0,
            margin_bottom: rows - 1,
            damage: DamageTracker::new(),
            parser_state: ParserState::default(),
            seq: SeqAccumulator::new(),
            tabstops,
            last_printed: None,
            graphics: None,
            logger,
        }
    }

    /// `create(reply_sink, rows, cols) -> Terminal`, with
    /// power-on defaults and no attached logger.
    pub fn create(reply: W, rows: usize, cols: usize) -> Self {
        TerminalBuilder::new().rows(rows).cols(cols).build(reply)
    }

    /// Release all storage. Rust's `Drop` already does this; provided for
    /// host-API symmetry with an explicit `destroy(Terminal)` call.
    pub fn destroy(self) {}

    pub fn cols(&self) -> usize {
        self.screen.cols
    }

    /// Feed input bytes for interpretation; always "succeeds" (parse
    /// anomalies are logged and absorbed, never abort the stream).
    pub fn process(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.process_byte(b);
        }
    }

    /// Pass bytes through to the reply sink (keystrokes etc.), retrying on
    /// `EINTR`.
    pub fn input(&mut self, bytes: &[u8]) -> Result<usize, ReplyError> {
        let mut written = 0;
        while written < bytes.len() {
            match self.reply.write(&bytes[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(written)
    }

    pub fn set_graphics(&mut self, graphics: Box<dyn Graphics>) {
        self.graphics = Some(graphics);
    }

    /// Flush accumulated damage (or the whole screen, if `redraw_all` is
    /// pending) to the attached [`Graphics`] sink.
    pub fn render(&mut self) {
        let cols = self.screen.cols;
        let rows = self.rows;
        if self.damage.redraw_all {
            if let Some(g) = self.graphics.as_mut() {
                g.clear(0, 0, cols, rows);
                for y in 0..rows {
                    let row = self.screen.row(y);
                    let dbl_height = if row.dbl_height {
                        if row.dbl_side == crate::screen::DoubleSide::Top { 1 } else { 2 }
                    } else {
                        0
                    };
                    for x in 0..cols {
                        g.draw_cell(x, y, row.cell(x), row.dbl_width, dbl_height);
                    }
                }
            }
            for y in 0..rows {
                self.screen.row_mut(y).dirty = false;
            }
            self.damage.clear();
            return;
        }

        let rects: Vec<Rect> = self.damage.take();
        for r in &rects {
            for y in r.y..(r.y + r.h).min(rows) {
                self.screen.row_mut(y).dirty = false;
            }
        }
        if let Some(g) = self.graphics.as_mut() {
            for r in rects {
                g.clear(r.x, r.y, r.w, r.h);
                for y in r.y..(r.y + r.h).min(rows) {
                    let row = self.screen.row(y);
                    let dbl_height = if row.dbl_height {
                        if row.dbl_side == crate::screen::DoubleSide::Top { 1 } else { 2 }
                    } else {
                        0
                    };
                    for x in r.x..(r.x + r.w).min(cols) {
                        g.draw_cell(x, y, row.cell(x), row.dbl_width, dbl_height);
                    }
                }
            }
        }
        self.damage.clear();
    }

    /// Fill a buffer with `rows` lines of `cols` translated codepoints
    /// each, newline-separated. Used only by tests.
    pub fn fill(&self) -> String {
        let cols = self.screen.cols;
        let mut out = String::with_capacity((cols + 1) * self.rows);
        for y in 0..self.rows {
            let row = self.screen.row(y);
            for x in 0..cols {
                out.push_str(row.cell(x).as_str());
            }
            if y + 1 < self.rows {
                out.push('\n');
            }
        }
        out
    }

    pub(crate) fn active_charset(&self) -> Charset {
        if self.gl == 0 {
            self.g0
        } else {
            self.g1
        }
    }

    pub(crate) fn mark(&mut self, x: usize, y: usize, w: usize, h: usize) {
        self.damage.mark(Rect { x, y, w, h });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exercises the deferred-wrap/scroll-region mechanic behind `decawm.c`'s
    /// autowrap check (case 0 of its four print variants, same `DECSTBM
    /// 3;21` + DECOM + DECAWM setup): with the scroll region confined to
    /// rows 2..=20 (0-based), a character printed at the bottom margin's
    /// last column defers its wrap; the next printable forces a scroll of
    /// the *region only* before landing at column 0 of the freshly blanked
    /// bottom row, leaving the deferred character on the row above.
    #[test]
    fn autowrap_at_the_bottom_margin_scrolls_only_the_region() {
        let mut term = Terminal::create(Vec::new(), 25, 80);
        term.process(b"\x1B[3;21r"); // DECSTBM: margin_top=2, margin_bottom=20
        term.process(b"\x1B[?6h\x1B[?7h"); // DECOM, DECAWM
        term.process(b"\x1B[19;80H"); // CUP, DECOM-relative row 18 -> absolute row 20, col 79
        term.process(b"Aa");

        let filled = term.fill();
        let lines: Vec<&str> = filled.lines().collect();
        // 'A' deferred its wrap at column 79 of row 20; the arrival of 'a'
        // scrolled the region before depositing, pushing 'A' up to row 19
        // and landing 'a' at column 0 of the now-blank row 20.
        assert_eq!(lines[19].chars().nth(79).unwrap(), 'A');
        assert_eq!(lines[20].chars().next().unwrap(), 'a');
        // Rows outside the scroll region are untouched by the region-local
        // scroll.
        assert_eq!(lines[0].trim(), "");
        assert_eq!(lines[24].trim(), "");
    }
}
