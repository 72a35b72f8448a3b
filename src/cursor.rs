//! Cursor position, saved-cursor snapshot, and operating mode flags.

use bitflags::bitflags;

use crate::screen::CellAttrs;

/// `(cx, cy)` plus the deferred-wrap latch (LCF).
#[derive(Clone, Copy, Debug, Default)]
pub struct Cursor {
    pub cx: usize,
    pub cy: usize,
    /// "the cursor logically sits on the rightmost column and the next
    /// printable will wrap before being written". Cleared by any explicit
    /// motion, erase, or non-printable with side effects.
    pub lcf: bool,
}

impl Cursor {
    pub fn new(cx: usize, cy: usize) -> Self {
        Cursor { cx, cy, lcf: false }
    }
}

/// `{cx, cy, attrs, charset_index, lcf}` captured by DECSC, restored by
/// DECRC. Only one level; repeated DECSC overwrites.
#[derive(Clone, Copy, Debug, Default)]
pub struct SavedCursor {
    pub cx: usize,
    pub cy: usize,
    pub attrs: CellAttrs,
    pub charset_index: u8,
    pub lcf: bool,
}

bitflags! {
    /// Operating mode flags. Power-on default is DECANM set,
    /// everything else reset.
    pub struct Modes: u32 {
        /// ?1 — Cursor keys emit application form.
        const DECCKM  = 0b0000_0000_0000_0001;
        /// ?2 — ANSI mode (reset = VT52).
        const DECANM  = 0b0000_0000_0000_0010;
        /// ?3 — 132-column mode (reset = 80).
        const DECCOLM = 0b0000_0000_0000_0100;
        /// ?4 — Smooth scroll (flag only).
        const DECSCLM = 0b0000_0000_0000_1000;
        /// ?5 — Reverse video.
        const DECSCNM = 0b0000_0000_0001_0000;
        /// ?6 — Origin mode.
        const DECOM   = 0b0000_0000_0010_0000;
        /// ?7 — Autowrap.
        const DECAWM  = 0b0000_0000_0100_0000;
        /// ?8 — Autorepeat (flag only).
        const DECARM  = 0b0000_0000_1000_0000;
        /// ?18 — Print form feed (flag only).
        const DECPFF  = 0b0000_0001_0000_0000;
        /// ?19 — Print extent (flag only).
        const DECPEX  = 0b0000_0010_0000_0000;
        /// 2 — Keyboard locked.
        const KAM     = 0b0000_0100_0000_0000;
        /// 4 — Insert/replace mode.
        const IRM     = 0b0000_1000_0000_0000;
        /// 12 — Local echo (SRM).
        const SRM     = 0b0001_0000_0000_0000;
        /// 20 — Linefeed/Newline mode.
        const LNM     = 0b0010_0000_0000_0000;
        /// ESC = — application keypad (informational).
        const DECPAM  = 0b0100_0000_0000_0000;
    }
}

impl Default for Modes {
    fn default() -> Modes {
        Modes::DECANM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_default_is_decanm_only() {
        let m = Modes::default();
        assert!(m.contains(Modes::DECANM));
        assert!(!m.contains(Modes::DECAWM));
        assert!(!m.contains(Modes::IRM));
    }
}
