//! Letter grades shared by the SSL checker and the website monitor.

use serde::Serialize;
use std::fmt;

/// Letter grade, declared worst to best so that `Ord` follows quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    F,
    D,
    C,
    B,
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    /// Lowers the grade to `ceiling` if it is currently better.
    pub fn cap(&mut self, ceiling: Grade) {
        if *self > ceiling {
            *self = ceiling;
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::F => "F",
            Grade::D => "D",
            Grade::C => "C",
            Grade::B => "B",
            Grade::A => "A",
            Grade::APlus => "A+",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
