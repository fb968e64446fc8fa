//! Fixed-part prompt composition without categories or templates.

use serde::{Deserialize, Serialize};

/// Separator used between parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Space,
    Newline,
}

impl Delimiter {
    pub fn separator(self) -> &'static str {
        match self {
            Delimiter::Comma => ", ",
            Delimiter::Space => " ",
            Delimiter::Newline => "\n",
        }
    }

    /// Parse a host option value; anything unrecognised is a space.
    pub fn parse(value: &str) -> Delimiter {
        match value {
            "comma" => Delimiter::Comma,
            "newline" => Delimiter::Newline,
            _ => Delimiter::Space,
        }
    }
}

/// Join trimmed, non-empty parts in order.
pub fn compose<S: AsRef<str>>(parts: &[S], delimiter: Delimiter) -> String {
    parts
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(delimiter.separator())
}
