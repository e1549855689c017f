//! Target process selection
//!
//! Enumeration itself is a native primitive; this module only decides which
//! of the running processes is the emulator.

pub mod locator;

pub use locator::TargetLocator;
