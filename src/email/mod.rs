//! Normalized email records and the parser that produces them.

pub mod parser;
pub mod types;

pub use parser::{EmailParser, MailParser};
pub use types::{ContentType, EmailHeader, NormalizedEmail};
