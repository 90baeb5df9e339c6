//! Configuration templates.

mod engine;

pub use engine::{TemplateEngine, SSL_VHOST_TEMPLATE};
