//! Error types surfaced by the reply sink.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Failure writing a reply (DA/DSR/CPR/…) or raw input back to the host.
///
/// `EINTR` is retried internally by [`crate::terminal::Terminal::input`] and
/// never reaches here; anything else is wrapped and returned to the caller
/// while leaving the terminal's internal state untouched.
#[derive(Debug)]
pub struct ReplyError(String);

impl ReplyError {
    pub(crate) fn new<S: Into<String>>(msg: S) -> Self {
        ReplyError(msg.into())
    }
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for ReplyError {
    fn description(&self) -> &str {
        &self.0
    }
}

impl From<io::Error> for ReplyError {
    fn from(why: io::Error) -> Self {
        ReplyError(why.to_string())
    }
}
