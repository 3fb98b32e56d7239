//! Checkers shipped with the harness

pub mod dummy;
pub mod linestore;

pub use dummy::DummyChecker;
pub use linestore::{noise_for, LineStoreChecker};
