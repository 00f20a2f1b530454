pub mod parse;
pub mod record;

pub use parse::{parse_batch, ParseError};
pub use record::{FreeForm, LogRecord};
