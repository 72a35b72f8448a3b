//! VT100/VT102 terminal emulator core.
//!
//! Feeds a host's PTY output through [`Terminal::process`], which keeps a
//! screen buffer, cursor and mode state machine up to date and writes any
//! synthesized replies (DA/DSR/CPR/ENQ/…) back through the sink handed to
//! [`Terminal::create`]. Rendering is delegated to a caller-supplied
//! [`Graphics`] implementation; this crate has no opinion on pixels, fonts
//! or a windowing toolkit.
//!
//! ```no_run
//! use vt100_core::{Terminal, NullGraphics};
//!
//! let mut term = Terminal::create(Vec::new(), 24, 80);
//! term.set_graphics(Box::new(NullGraphics::default()));
//! term.process(b"hello, world\r\n");
//! term.render();
//! ```

mod c0;
mod charset;
mod cursor;
mod damage;
mod error;
mod graphics;
mod handlers;
mod parser;
mod screen;
mod terminal;

pub use cursor::Modes;
pub use error::ReplyError;
pub use graphics::{Graphics, NullGraphics};
pub use screen::{Cell, CellAttrs};
pub use sloggers::types::Severity;
pub use terminal::{LogType, Terminal, TerminalBuilder};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_output_lands_in_the_top_left() {
        let mut term = Terminal::create(Vec::new(), 24, 80);
        term.process(b"hello");
        assert!(term.fill().starts_with("hello"));
    }

    #[test]
    fn overwrite_with_carriage_return() {
        let mut term = Terminal::create(Vec::new(), 24, 80);
        term.process(b"hello\rJ");
        assert!(term.fill().starts_with("Jello"));
    }

    #[test]
    fn decaln_fills_screen_with_e() {
        let mut term = Terminal::create(Vec::new(), 3, 5);
        term.process(b"\x1B#8");
        let filled = term.fill();
        for line in filled.lines() {
            assert_eq!(line, "EEEEE");
        }
    }

    #[test]
    fn dch_deletes_under_cursor_and_shifts_left() {
        let mut term = Terminal::create(Vec::new(), 1, 10);
        term.process(b"abcdef\r");
        term.process(b"\x1B[2P");
        assert!(term.fill().starts_with("cdef"));
    }

    #[test]
    fn scroll_up_through_az_leaves_only_the_tail_onscreen() {
        let mut term = Terminal::create(Vec::new(), 3, 1);
        for c in b'A'..=b'Z' {
            term.process(&[c, b'\r', b'\n']);
        }
        let filled = term.fill();
        let lines: Vec<&str> = filled.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with('Z') || lines[2].trim().is_empty());
    }

    #[test]
    fn reverse_index_at_home_scrolls_down() {
        let mut term = Terminal::create(Vec::new(), 3, 1);
        term.process(b"A\r\nB\r\nC");
        term.process(b"\x1B[H");
        term.process(b"\x1BM");
        let filled = term.fill();
        let lines: Vec<&str> = filled.lines().collect();
        assert_eq!(lines[0].trim(), "");
        assert_eq!(lines[1].trim(), "A");
    }

    #[test]
    fn cursor_position_report_replies_on_reply_sink() {
        let mut sink = Vec::new();
        let mut term = Terminal::create(&mut sink, 24, 80);
        term.process(b"abc");
        term.process(b"\x1B[6n");
        drop(term);
        assert_eq!(sink, b"\x1B[1;4R");
    }

    #[test]
    fn autowrap_defers_wrap_to_the_next_printable() {
        let mut term = Terminal::create(Vec::new(), 3, 5);
        term.process(b"\x1B[?7h"); // DECAWM
        term.process(b"abcde");
        assert!(term.fill().lines().next().unwrap() == "abcde");
        term.process(b"X");
        let filled = term.fill();
        let lines: Vec<&str> = filled.lines().collect();
        assert_eq!(lines[1].chars().next().unwrap(), 'X');
    }

    fn padded(s: &str, cols: usize) -> String {
        let mut s = s.to_string();
        while s.len() < cols {
            s.push(' ');
        }
        s
    }

    #[test]
    fn hello_world_lands_on_the_first_line_at_full_terminal_size() {
        let mut term = Terminal::create(Vec::new(), 25, 80);
        term.process(b"Hello, world!\n");
        let filled = term.fill();
        let lines: Vec<&str> = filled.lines().collect();
        assert_eq!(lines.len(), 25);
        assert_eq!(lines[0], padded("Hello, world!", 80));
        for line in &lines[1..] {
            assert_eq!(*line, padded("", 80));
        }
    }

    #[test]
    fn carriage_return_lets_a_second_write_overwrite_the_first() {
        let mut term = Terminal::create(Vec::new(), 25, 80);
        term.process(b"EEEEEEEEEEEEE\r");
        term.process(b"Hello, world!\n");
        let filled = term.fill();
        let lines: Vec<&str> = filled.lines().collect();
        assert_eq!(lines[0], padded("Hello, world!", 80));
    }

    #[test]
    fn dch_closes_the_gap_left_by_a_deleted_typo() {
        let mut term = Terminal::create(Vec::new(), 25, 80);
        term.process(b"EHello, typo world!\x1B[11D\x1B[5P\r\x1B[P\n");
        let filled = term.fill();
        let lines: Vec<&str> = filled.lines().collect();
        assert_eq!(lines[0], padded("Hello, world!", 80));
    }

    #[test]
    fn reverse_index_at_the_home_row_scrolls_the_whole_screen_down() {
        let mut term = Terminal::create(Vec::new(), 25, 80);
        term.process(b"Hello, world!\x1BM");
        let filled = term.fill();
        let lines: Vec<&str> = filled.lines().collect();
        assert_eq!(lines[0], padded("", 80));
        assert_eq!(lines[1], padded("Hello, world!", 80));
    }

    #[test]
    fn cursor_position_report_at_power_on_home() {
        let mut sink = Vec::new();
        let mut term = Terminal::create(&mut sink, 25, 80);
        term.process(b"\x1B[6n");
        drop(term);
        assert_eq!(sink, b"\x1B[1;1R");
    }

    #[test]
    fn rep_with_a_huge_count_returns_promptly_instead_of_hanging() {
        let mut term = Terminal::create(Vec::new(), 25, 80);
        term.process(b"A\x1B[99999999999999999999b");
        assert!(term.fill().lines().next().unwrap().starts_with('A'));
    }
}
