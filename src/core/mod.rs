pub mod error;

pub use error::{CoachError, FormatError, Result};
