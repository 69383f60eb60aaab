use std::fmt;

use serde::{Deserialize, Serialize};

/// A duration expressed as whole hours plus leftover minutes (`minutes < 60`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedTime {
    pub hours: u64,
    pub minutes: u8,
}

impl fmt::Display for ElapsedTime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}h:{:02}m", self.hours, self.minutes)
    }
}
