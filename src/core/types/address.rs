//! Memory address wrapper type with hex parsing

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A byte offset in the target's virtual address space.
///
/// Stored as `u64` so 32-bit and 64-bit targets are both represented exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    /// Creates a new address from a raw value
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null. Null is still a valid scan match.
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parses operator input, failing with [`MemoryError::Parse`]
    pub fn parse(input: &str) -> MemoryResult<Self> {
        input.parse()
    }
}

impl FromStr for Address {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MemoryError::parse(s, "empty address"));
        }

        let (digits, radix) = if let Some(hex) = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .or_else(|| s.strip_prefix('$'))
        {
            (hex, 16)
        } else if s.chars().any(|c| c.is_ascii_alphabetic()) {
            // Assume hex if contains letters
            (s, 16)
        } else {
            (s, 10)
        };

        // from_str_radix would accept a leading '+'
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(MemoryError::parse(s, "not a valid address: unexpected character"));
        }

        let value = u64::from_str_radix(digits, radix);

        value
            .map(Address::new)
            .map_err(|e| MemoryError::parse(s, format!("not a valid address: {}", e)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Address::new(u64::from(value))
    }
}

impl From<Address> for u64 {
    fn from(address: Address) -> Self {
        address.0
    }
}
