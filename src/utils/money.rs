// Conversions between minor currency units (paise, cents) and major units

use serde::{Serialize, Serializer};
use std::fmt;

/// An amount held in minor units and reported in major units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MajorUnits(u64);

impl MajorUnits {
    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub fn minor(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    fn is_whole(&self) -> bool {
        self.0 % 100 == 0
    }
}

// Renders like a JS number: 100000 -> "1000", 99950 -> "999.5", 5 -> "0.05"
impl fmt::Display for MajorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let fraction = self.0 % 100;

        if fraction == 0 {
            write!(f, "{}", whole)
        } else if fraction % 10 == 0 {
            write!(f, "{}.{}", whole, fraction / 10)
        } else {
            write!(f, "{}.{:02}", whole, fraction)
        }
    }
}

impl Serialize for MajorUnits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_whole() {
            serializer.serialize_u64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.as_f64())
        }
    }
}
