//! C0 set of 7-bit control characters (from ANSI X3.4-1977).
//!
//! Only the subset the parser's `Ground` state acts on is named here;
//! 8-bit C1 controls are a non-goal.

#![allow(dead_code)]

/// Null filler, ignored by the parser.
pub const NUL: u8 = 0x00;
/// Enquiry — triggers the ENQ reply without moving the cursor.
pub const ENQ: u8 = 0x05;
/// Bell.
pub const BEL: u8 = 0x07;
/// Backspace.
pub const BS: u8 = 0x08;
/// Horizontal Tabulation.
pub const HT: u8 = 0x09;
/// Linefeed.
pub const LF: u8 = 0x0A;
/// Vertical Tabulation (treated as LF).
pub const VT: u8 = 0x0B;
/// Form Feed (treated as LF).
pub const FF: u8 = 0x0C;
/// Carriage Return.
pub const CR: u8 = 0x0D;
/// Shift Out — selects G1 into GL.
pub const SO: u8 = 0x0E;
/// Shift In — selects G0 into GL.
pub const SI: u8 = 0x0F;
/// Cancel — aborts an in-progress escape/CSI sequence.
pub const CAN: u8 = 0x18;
/// Substitute — aborts an in-progress escape/CSI sequence.
pub const SUB: u8 = 0x1A;
/// Prefix to an escape sequence.
pub const ESC: u8 = 0x1B;
/// Delete, ignored by the parser.
pub const DEL: u8 = 0x7F;
