//! SSL virtual host generation.

mod writer;

pub use writer::{reload_web_server, VhostWriter};
