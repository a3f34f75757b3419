//! ANSI colors for terminal status lines.

use crate::error::MlError;
use std::fmt;
use std::str::FromStr;

/// Erase the current line and return the cursor to column 0.
pub const CLEAR_LINE: &str = "\x1b[2K\r";
pub const RESET_CODE: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    Gray,
}

impl Color {
    pub fn code(self) -> &'static str {
        match self {
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Blue => "\x1b[94m",
            Self::Magenta => "\x1b[35m",
            Self::Cyan => "\x1b[36m",
            Self::Gray => "\x1b[37m",
        }
    }

    /// Wrap `s` in this color's start code and the reset code.
    pub fn paint(self, s: &str) -> String {
        format!("{}{s}{RESET_CODE}", self.code())
    }
}

impl FromStr for Color {
    type Err = MlError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "blue" => Ok(Self::Blue),
            "magenta" => Ok(Self::Magenta),
            "cyan" => Ok(Self::Cyan),
            "gray" | "grey" => Ok(Self::Gray),
            _ => Err(MlError::lookup(format!("unknown color '{name}'"))),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::Gray => "gray",
        };
        f.write_str(name)
    }
}

/// Color `s` by palette name (case-insensitive).
pub fn color(s: &str, name: &str) -> Result<String, MlError> {
    Ok(name.parse::<Color>()?.paint(s))
}
