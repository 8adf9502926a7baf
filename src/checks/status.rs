use serde::{Deserialize, Serialize};
use std::fmt;

/// Traffic-light verdict of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Rule satisfied
    Green,
    /// Inconclusive, satisfied with a caveat, or downgraded by policy
    Yellow,
    /// Rule violated
    Red,
    /// Not evaluated yet
    #[default]
    Gray,
}

impl Status {
    pub fn icon(self) -> &'static str {
        match self {
            Status::Green => "✅",
            Status::Yellow => "⚠️",
            Status::Red => "❌",
            Status::Gray => "🔘",
        }
    }

    /// Red is the only status that fails a lint run
    pub fn is_failing(self) -> bool {
        self == Status::Red
    }

    pub fn is_evaluated(self) -> bool {
        self != Status::Gray
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Green => "green",
            Status::Yellow => "yellow",
            Status::Red => "red",
            Status::Gray => "gray",
        };
        f.write_str(label)
    }
}
