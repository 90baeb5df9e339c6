//! NGINX configuration reading.
//!
//! A minimal directive-block reader used to discover hosted apps.

mod parser;

pub use parser::{parse, Block, Directive, ParseError};
