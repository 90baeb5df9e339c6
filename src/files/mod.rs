//! File helpers.

mod atomic;

pub use atomic::{remove_if_exists, write_atomic};
