//! Coverage index
//!
//! Deduplicates source files, tests and (file, line) pairs into stable handles
//! and keeps an append-only list of coverage facts against them. One index can
//! absorb many reports; it shares nothing with other instances.

mod interner;
mod store;

pub use interner::Interner;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, zero-based identifier handed out by an [`Interner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(u64);

impl Handle {
    pub fn get(self) -> u64 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Numeric range available to handles, fixed when an index is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleWidth {
    U16,
    #[default]
    U32,
    U64,
}

impl HandleWidth {
    /// Largest handle value this width can represent.
    pub fn max_handle(self) -> u64 {
        match self {
            HandleWidth::U16 => u16::MAX as u64,
            HandleWidth::U32 => u32::MAX as u64,
            HandleWidth::U64 => u64::MAX,
        }
    }
}

impl fmt::Display for HandleWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleWidth::U16 => f.write_str("u16"),
            HandleWidth::U32 => f.write_str("u32"),
            HandleWidth::U64 => f.write_str("u64"),
        }
    }
}

/// A test: the file that contains it and its name there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestIdentity {
    pub file: String,
    pub name: String,
}

impl TestIdentity {
    pub fn new(file: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.file)
        } else {
            write!(f, "{}::{}", self.file, self.name)
        }
    }
}

/// A source line, addressed by its file handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    pub file: Handle,
    pub num: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_limits() {
        assert_eq!(HandleWidth::U16.max_handle(), 65_535);
        assert_eq!(HandleWidth::U32.max_handle(), 4_294_967_295);
        assert_eq!(HandleWidth::default(), HandleWidth::U32);
        assert_eq!(HandleWidth::U64.to_string(), "u64");
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(
            TestIdentity::new("tests/CartTest.php", "testAdd").to_string(),
            "tests/CartTest.php::testAdd"
        );
        assert_eq!(TestIdentity::new("clover.xml", "").to_string(), "clover.xml");
    }
}
