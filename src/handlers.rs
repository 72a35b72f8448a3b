//! Command handlers: one family per sequence kind (CSI, ESC, `#`, `(`/`)`,
//! VT52). Mutates cursor/screen/modes and emits replies; dispatched from
//! the parser once a sequence is recognized as complete.

use std::io::{self, Write};

use slog::{trace, warn};

use crate::c0;
use crate::charset::Charset;
use crate::cursor::{Modes, SavedCursor};
use crate::parser::{self, CsiSeq, GroundByte, ParserState, SEQ_BUF_LEN};
use crate::screen::{Cell, CellAttrs, DoubleSide};
use crate::terminal::Terminal;

/// Absent or explicit-zero motion counts both mean "move by one".
fn count_or_one(seq: &CsiSeq, idx: usize) -> usize {
    let v = seq.get(idx, 1);
    if v <= 0 {
        1
    } else {
        v as usize
    }
}

impl<W: Write> Terminal<W> {
    pub(crate) fn process_byte(&mut self, b: u8) {
        match self.parser_state {
            ParserState::Ground => self.process_ground_byte(b),
            ParserState::InSequence => self.process_sequence_byte(b),
        }
    }

    fn process_ground_byte(&mut self, b: u8) {
        match parser::classify_ground(b) {
            GroundByte::Ignored => {}
            GroundByte::Esc => {
                self.parser_state = ParserState::InSequence;
                self.seq.clear();
            }
            GroundByte::C0(byte) => self.execute_c0(byte),
            GroundByte::Printable(byte) => self.print_byte(byte),
            GroundByte::Unknown(byte) => {
                trace!(self.logger, "dropped byte {:#04x}", byte);
            }
        }
    }

    fn process_sequence_byte(&mut self, b: u8) {
        if b == c0::CAN || b == c0::SUB {
            self.parser_state = ParserState::Ground;
            self.seq.clear();
            return;
        }
        if b == c0::ESC {
            self.seq.clear();
            return;
        }
        if !self.seq.push(b) {
            warn!(self.logger, "sequence buffer overflow, dropping sequence");
            self.parser_state = ParserState::Ground;
            self.seq.clear();
            return;
        }
        let vt52 = !self.modes.contains(Modes::DECANM);
        if parser::is_terminator(self.seq.as_slice(), vt52) {
            self.dispatch_sequence(vt52);
            self.seq.clear();
            self.parser_state = ParserState::Ground;
        }
    }

    fn dispatch_sequence(&mut self, vt52: bool) {
        // Copy out of the accumulator first: dispatch needs `&mut self`,
        // and `self.seq` is otherwise still borrowed.
        let mut local = [0u8; SEQ_BUF_LEN];
        let slice = self.seq.as_slice();
        let len = slice.len();
        local[..len].copy_from_slice(slice);
        let buf = &local[..len];

        if vt52 {
            self.dispatch_vt52(buf);
            return;
        }
        match buf[0] {
            b'[' => self.dispatch_csi(buf),
            b'#' => self.dispatch_hash(buf[1]),
            b'(' => self.designate(0, buf[1]),
            b')' => self.designate(1, buf[1]),
            _ => self.dispatch_esc(buf),
        }
    }

    // ---- C0 ---------------------------------------------------------

    fn execute_c0(&mut self, byte: u8) {
        self.cursor.lcf = false;
        match byte {
            c0::ENQ => self.enq(),
            c0::BS => self.backspace(),
            c0::HT => self.tab(),
            c0::LF | c0::VT | c0::FF => self.linefeed(),
            c0::CR => self.carriage_return(),
            c0::SO => self.gl = 1,
            c0::SI => self.gl = 0,
            _ => {}
        }
    }

    fn enq(&mut self) {
        self.write_reply("\x1B[?1;2c");
    }

    fn backspace(&mut self) {
        if self.cursor.cx > 0 {
            self.cursor.cx -= 1;
        }
    }

    fn carriage_return(&mut self) {
        self.cursor.cx = 0;
    }

    fn tab(&mut self) {
        let cols = self.screen.cols;
        let mut x = self.cursor.cx + 1;
        while x < cols && !self.tabstops[x] {
            x += 1;
        }
        self.cursor.cx = x.min(cols - 1);
    }

    /// LF: advance one row, scrolling if at the bottom margin; CR also if
    /// LNM is set.
    fn linefeed(&mut self) {
        self.index_down();
        if self.modes.contains(Modes::LNM) {
            self.carriage_return();
        }
    }

    fn newline(&mut self) {
        self.index_down();
        self.carriage_return();
    }

    /// IND: move down one row, scrolling the region if already on its
    /// bottom margin.
    fn index_down(&mut self) {
        if self.cursor.cy == self.margin_bottom {
            self.scroll_up_region(1);
        } else if self.cursor.cy + 1 < self.rows {
            self.cursor.cy += 1;
        }
        self.cursor.lcf = false;
    }

    /// RI: move up one row, reverse-scrolling the region if already on its
    /// top margin.
    fn reverse_index(&mut self) {
        if self.cursor.cy == self.margin_top {
            self.scroll_down_region(1);
        } else if self.cursor.cy > 0 {
            self.cursor.cy -= 1;
        }
        self.cursor.lcf = false;
    }

    fn scroll_up_region(&mut self, n: usize) {
        self.screen.scroll_up(self.margin_top, self.margin_bottom, n, self.attrs);
        self.damage.mark_redraw_all();
    }

    fn scroll_down_region(&mut self, n: usize) {
        self.screen.scroll_down(self.margin_top, self.margin_bottom, n, self.attrs);
        self.damage.mark_redraw_all();
    }

    // ---- Printable deposit & autowrap ----------------------------------

    fn print_byte(&mut self, c: u8) {
        let ch = crate::charset::translate(self.active_charset(), c);
        self.deposit_char(ch);
    }

    fn deposit_char(&mut self, ch: char) {
        if self.modes.contains(Modes::DECAWM) && self.cursor.lcf {
            self.cursor.cx = 0;
            self.index_down();
            self.cursor.lcf = false;
        }
        self.last_printed = Some(ch);
        let (cx, cy) = (self.cursor.cx, self.cursor.cy);
        let cols = self.screen.cols;
        let cell = Cell::from_char(ch, self.attrs);
        if self.modes.contains(Modes::IRM) {
            self.screen.insert_chars(cx, cy, 1, self.attrs);
            self.screen.set_cell(cx, cy, cell);
            self.mark(cx, cy, cols - cx, 1);
        } else {
            self.screen.set_cell(cx, cy, cell);
            self.mark(cx, cy, 1, 1);
        }
        if !self.modes.contains(Modes::DECAWM) {
            self.cursor.cx = (self.cursor.cx + 1).min(cols - 1);
        } else if self.cursor.cx + 1 == cols {
            self.cursor.lcf = true;
        } else {
            self.cursor.cx += 1;
        }
    }

    /// `CSI b` (REP): repeats the last printed character through the
    /// normal print path.
    fn repeat_last(&mut self, n: usize) {
        // Clamped the same way DCH/IL/DL bound their counts to the screen
        // size: a full screen's worth of repeats is already enough to
        // paint every cell, so anything beyond that is wasted work from a
        // malformed or hostile parameter.
        let n = n.min(self.screen.cols * self.rows);
        if let Some(c) = self.last_printed {
            for _ in 0..n {
                self.deposit_char(c);
            }
        } else {
            trace!(self.logger, "REP with no preceding printed character");
        }
    }

    // ---- Cursor motion -------------------------------------------------

    fn cursor_up(&mut self, n: usize) {
        let top = self.margin_top;
        self.cursor.cy = self.cursor.cy.saturating_sub(n).max(top);
        self.cursor.lcf = false;
    }

    fn cursor_down(&mut self, n: usize) {
        let bottom = self.margin_bottom;
        self.cursor.cy = (self.cursor.cy + n).min(bottom);
        self.cursor.lcf = false;
    }

    fn cursor_forward(&mut self, n: usize) {
        let cols = self.screen.cols;
        self.cursor.cx = (self.cursor.cx + n).min(cols - 1);
        self.cursor.lcf = false;
    }

    fn cursor_back(&mut self, n: usize) {
        self.cursor.cx = self.cursor.cx.saturating_sub(n);
        self.cursor.lcf = false;
    }

    /// CUP/HVP. DECOM offsets the row into the scroll region and clamps
    /// vertical motion to it; there is no VT100 horizontal margin, so the
    /// column is never clamped beyond the physical screen width.
    fn cursor_to(&mut self, x: usize, y: usize) {
        let (oy, max_y) = if self.modes.contains(Modes::DECOM) {
            (self.margin_top, self.margin_bottom)
        } else {
            (0, self.rows - 1)
        };
        let cols = self.screen.cols;
        self.cursor.cy = (oy + y).min(max_y);
        self.cursor.cx = x.min(cols - 1);
        self.cursor.lcf = false;
    }

    fn save_cursor(&mut self) {
        self.saved_cursor = SavedCursor {
            cx: self.cursor.cx,
            cy: self.cursor.cy,
            attrs: self.attrs,
            charset_index: self.gl,
            lcf: self.cursor.lcf,
        };
    }

    fn restore_cursor(&mut self) {
        let s = self.saved_cursor;
        self.cursor.cx = s.cx;
        self.cursor.cy = s.cy;
        self.attrs = s.attrs;
        self.gl = s.charset_index;
        self.cursor.lcf = s.lcf;
    }

    // ---- Erase / insert / delete ----------------------------------------

    fn erase_display(&mut self, mode: i64) {
        let cols = self.screen.cols;
        let rows = self.rows;
        let (cx, cy) = (self.cursor.cx, self.cursor.cy);
        match mode {
            0 => {
                self.screen.erase_range(cx, cols - 1, cy, self.attrs);
                self.mark(cx, cy, cols - cx, 1);
                if cy + 1 < rows {
                    for y in (cy + 1)..rows {
                        self.screen.erase_range(0, cols - 1, y, self.attrs);
                    }
                    self.mark(0, cy + 1, cols, rows - cy - 1);
                }
            }
            1 => {
                if cy > 0 {
                    for y in 0..cy {
                        self.screen.erase_range(0, cols - 1, y, self.attrs);
                    }
                    self.mark(0, 0, cols, cy);
                }
                self.screen.erase_range(0, cx, cy, self.attrs);
                self.mark(0, cy, cx + 1, 1);
            }
            2 => {
                self.screen.clear_all(self.attrs);
                self.damage.mark_redraw_all();
            }
            _ => {}
        }
        self.cursor.lcf = false;
    }

    fn erase_line(&mut self, mode: i64) {
        let cols = self.screen.cols;
        let (cx, cy) = (self.cursor.cx, self.cursor.cy);
        match mode {
            0 => {
                self.screen.erase_range(cx, cols - 1, cy, self.attrs);
                self.mark(cx, cy, cols - cx, 1);
            }
            1 => {
                self.screen.erase_range(0, cx, cy, self.attrs);
                self.mark(0, cy, cx + 1, 1);
            }
            2 => {
                self.screen.erase_range(0, cols - 1, cy, self.attrs);
                self.mark(0, cy, cols, 1);
            }
            _ => {}
        }
        self.cursor.lcf = false;
    }

    fn delete_chars_at_cursor(&mut self, n: usize) {
        let (cx, cy) = (self.cursor.cx, self.cursor.cy);
        let cols = self.screen.cols;
        self.screen.delete_chars(cx, cy, n, self.attrs);
        self.mark(cx, cy, cols - cx, 1);
        self.cursor.lcf = false;
    }

    fn insert_lines(&mut self, n: usize) {
        let (top, bottom) = (self.margin_top, self.margin_bottom);
        self.screen.insert_lines(self.cursor.cy, n, top, bottom, self.attrs);
        self.damage.mark_redraw_all();
        self.cursor.lcf = false;
    }

    fn delete_lines(&mut self, n: usize) {
        let (top, bottom) = (self.margin_top, self.margin_bottom);
        self.screen.delete_lines(self.cursor.cy, n, top, bottom, self.attrs);
        self.damage.mark_redraw_all();
        self.cursor.lcf = false;
    }

    // ---- CSI dispatch ----------------------------------------------------

    fn dispatch_csi(&mut self, buf: &[u8]) {
        let seq = parser::parse_csi(buf);
        let private = seq.private == Some(b'?');
        match seq.final_byte {
            b'A' => self.cursor_up(count_or_one(&seq, 0)),
            b'B' => self.cursor_down(count_or_one(&seq, 0)),
            b'C' => self.cursor_forward(count_or_one(&seq, 0)),
            b'D' => self.cursor_back(count_or_one(&seq, 0)),
            b'H' | b'f' => {
                let y = count_or_one(&seq, 0) - 1;
                let x = count_or_one(&seq, 1) - 1;
                self.cursor_to(x, y);
            }
            b'J' => self.erase_display(seq.get(0, 0)),
            b'K' => self.erase_line(seq.get(0, 0)),
            b'P' => self.delete_chars_at_cursor(count_or_one(&seq, 0)),
            b'L' => self.insert_lines(count_or_one(&seq, 0)),
            b'M' => self.delete_lines(count_or_one(&seq, 0)),
            b'b' => self.repeat_last(count_or_one(&seq, 0)),
            b'm' => self.sgr(&seq),
            b'r' => self.decstbm(&seq),
            b'g' => self.tbc(seq.get(0, 0)),
            b'c' => self.da(),
            b'n' => self.dsr(&seq, private),
            b'h' => self.sm(&seq, private),
            b'l' => self.rm(&seq, private),
            other => {
                warn!(self.logger, "unhandled CSI final byte {:?}", other as char);
            }
        }
    }

    fn sgr(&mut self, seq: &CsiSeq) {
        if seq.count() == 0 {
            self.attrs = CellAttrs::default();
        }
        for i in 0..seq.count() {
            match seq.get(i, 0) {
                0 => self.attrs = CellAttrs::default(),
                1 => self.attrs.bold = true,
                4 => self.attrs.underline = true,
                5 => self.attrs.blink = true,
                7 => self.attrs.reverse = true,
                _ => {}
            }
        }
        self.cursor.lcf = false;
    }

    fn decstbm(&mut self, seq: &CsiSeq) {
        let rows = self.rows;
        let top = count_or_one(seq, 0) - 1;
        let bottom = (seq.get(1, rows as i64) as usize).saturating_sub(1);
        if seq.count() == 0 || top >= bottom || bottom >= rows {
            self.margin_top = 0;
            self.margin_bottom = rows - 1;
        } else {
            self.margin_top = top;
            self.margin_bottom = bottom;
        }
        self.cursor_to(0, 0);
    }

    fn tbc(&mut self, mode: i64) {
        match mode {
            0 => {
                let x = self.cursor.cx;
                if x < self.tabstops.len() {
                    self.tabstops[x] = false;
                }
            }
            3 => {
                for t in self.tabstops.iter_mut() {
                    *t = false;
                }
            }
            _ => {}
        }
        self.cursor.lcf = false;
    }

    fn da(&mut self) {
        self.write_reply("\x1B[?1;6c");
        self.cursor.lcf = false;
    }

    fn dsr(&mut self, seq: &CsiSeq, private: bool) {
        if private {
            if seq.get(0, 0) == 15 {
                self.write_reply("\x1B[?13n");
            }
        } else {
            match seq.get(0, 0) {
                5 => self.write_reply("\x1B[0n"),
                6 => {
                    let reply = format!("\x1B[{};{}R", self.cursor.cy + 1, self.cursor.cx + 1);
                    self.write_reply(&reply);
                }
                _ => {}
            }
        }
        self.cursor.lcf = false;
    }

    fn sm(&mut self, seq: &CsiSeq, private: bool) {
        for i in 0..seq.count() {
            self.set_mode(private, seq.get(i, 0), true);
        }
        self.cursor.lcf = false;
    }

    fn rm(&mut self, seq: &CsiSeq, private: bool) {
        for i in 0..seq.count() {
            self.set_mode(private, seq.get(i, 0), false);
        }
        self.cursor.lcf = false;
    }

    fn set_mode(&mut self, private: bool, num: i64, on: bool) {
        if private {
            match num {
                1 => self.set_flag(Modes::DECCKM, on),
                2 => self.set_flag(Modes::DECANM, on),
                3 => self.deccolm(on),
                4 => self.set_flag(Modes::DECSCLM, on),
                5 => self.decscnm(on),
                6 => {
                    self.set_flag(Modes::DECOM, on);
                    self.cursor_to(0, 0);
                }
                7 => {
                    self.set_flag(Modes::DECAWM, on);
                    if !on {
                        self.cursor.lcf = false;
                    }
                }
                8 => self.set_flag(Modes::DECARM, on),
                18 => self.set_flag(Modes::DECPFF, on),
                19 => self.set_flag(Modes::DECPEX, on),
                _ => warn!(self.logger, "unhandled private mode ?{}", num),
            }
        } else {
            match num {
                2 => self.set_flag(Modes::KAM, on),
                4 => self.set_flag(Modes::IRM, on),
                12 => self.set_flag(Modes::SRM, on),
                20 => self.set_flag(Modes::LNM, on),
                _ => warn!(self.logger, "unhandled mode {}", num),
            }
        }
    }

    fn set_flag(&mut self, flag: Modes, on: bool) {
        if on {
            self.modes.insert(flag);
        } else {
            self.modes.remove(flag);
        }
    }

    /// DECCOLM: switch 80/132-column mode — erases the screen, homes the
    /// cursor, resets the scroll region, and asks the sink to resize.
    fn deccolm(&mut self, on: bool) {
        self.set_flag(Modes::DECCOLM, on);
        let cols = if on { 132 } else { 80 };
        self.screen.resize_cols(cols, self.attrs);
        self.margin_top = 0;
        self.margin_bottom = self.rows - 1;
        self.cursor_to(0, 0);
        let rows = self.rows;
        if let Some(g) = self.graphics.as_mut() {
            g.resize(cols, rows);
        }
        self.damage.mark_redraw_all();
    }

    fn decscnm(&mut self, on: bool) {
        self.set_flag(Modes::DECSCNM, on);
        if let Some(g) = self.graphics.as_mut() {
            g.invert(on);
        }
        self.damage.mark_redraw_all();
    }

    // ---- ESC non-CSI / `#` / `(` / `)` -----------------------------------

    fn dispatch_esc(&mut self, buf: &[u8]) {
        match buf[0] {
            b'D' => self.index_down(),
            b'M' => self.reverse_index(),
            b'E' => self.newline(),
            b'Z' => self.write_reply("\x1B[?1;6c"),
            b'H' => {
                let x = self.cursor.cx;
                if x < self.tabstops.len() {
                    self.tabstops[x] = true;
                }
                self.cursor.lcf = false;
            }
            b'7' => self.save_cursor(),
            b'8' => self.restore_cursor(),
            b'>' => self.set_flag(Modes::DECPAM, false),
            b'=' => self.set_flag(Modes::DECPAM, true),
            other => warn!(self.logger, "unhandled ESC {:?}", other as char),
        }
    }

    fn dispatch_hash(&mut self, n: u8) {
        match n {
            b'3' => {
                let row = self.screen.row_mut(self.cursor.cy);
                row.dbl_height = true;
                row.dbl_side = DoubleSide::Top;
                self.damage.mark_redraw_all();
            }
            b'4' => {
                let row = self.screen.row_mut(self.cursor.cy);
                row.dbl_height = true;
                row.dbl_side = DoubleSide::Bottom;
                self.damage.mark_redraw_all();
            }
            b'5' => {
                let row = self.screen.row_mut(self.cursor.cy);
                row.dbl_height = false;
                row.dbl_width = false;
                self.damage.mark_redraw_all();
            }
            b'6' => {
                self.screen.row_mut(self.cursor.cy).dbl_width = true;
                self.damage.mark_redraw_all();
            }
            b'8' => self.decaln(),
            other => warn!(self.logger, "unhandled ESC # {:?}", other as char),
        }
    }

    /// DECALN: fill the entire screen with `E` at the current attributes.
    fn decaln(&mut self) {
        let cols = self.screen.cols;
        let rows = self.rows;
        let attrs = self.attrs;
        for y in 0..rows {
            self.screen.row_mut(y).fill(cols, 'E', attrs);
        }
        self.damage.mark_redraw_all();
    }

    fn designate(&mut self, slot: u8, byte: u8) {
        match Charset::from_designator(byte) {
            Some(cs) if slot == 0 => self.g0 = cs,
            Some(cs) => self.g1 = cs,
            None => warn!(self.logger, "unknown charset designator {:?}", byte as char),
        }
    }

    // ---- VT52 (DECANM reset) ---------------------------------------------

    fn dispatch_vt52(&mut self, buf: &[u8]) {
        match buf[0] {
            b'A' => {
                if self.cursor.cy > 0 {
                    self.cursor.cy -= 1;
                }
                self.cursor.lcf = false;
            }
            b'B' => {
                if self.cursor.cy + 1 < self.rows {
                    self.cursor.cy += 1;
                }
                self.cursor.lcf = false;
            }
            b'C' => {
                let cols = self.screen.cols;
                self.cursor.cx = (self.cursor.cx + 1).min(cols - 1);
                self.cursor.lcf = false;
            }
            b'D' => {
                self.cursor.cx = self.cursor.cx.saturating_sub(1);
                self.cursor.lcf = false;
            }
            b'H' => {
                self.cursor.cx = 0;
                self.cursor.cy = 0;
                self.cursor.lcf = false;
            }
            b'I' => self.reverse_index(),
            b'J' => self.erase_display(0),
            b'K' => self.erase_line(0),
            b'Y' => {
                if buf.len() >= 3 {
                    let row = i64::from(buf[1]) - 0x20 - 1;
                    let col = i64::from(buf[2]) - 0x20 - 1;
                    self.cursor.cy = (row.max(0) as usize).min(self.rows - 1);
                    self.cursor.cx = (col.max(0) as usize).min(self.screen.cols - 1);
                    self.cursor.lcf = false;
                }
            }
            b'Z' => self.write_reply("\x1B/Z"),
            b'F' => self.g0 = Charset::SpecialGraphics,
            b'G' => self.g0 = Charset::Ascii,
            b'<' => self.set_flag(Modes::DECANM, true),
            other => warn!(self.logger, "unhandled VT52 opcode {:?}", other as char),
        }
    }

    // ---- Reply sink -----------------------------------------------------

    pub(crate) fn write_reply(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let mut written = 0;
        while written < bytes.len() {
            match self.reply.write(&bytes[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(self.logger, "reply write failed: {}", e);
                    break;
                }
            }
        }
    }
}
