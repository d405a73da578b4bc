//! Shared types, configuration, and progress parsing for ytbar.

pub mod config;
pub mod model;
pub mod progress;
pub mod util;

pub use config::*;
pub use model::*;
pub use progress::{parse_line, LineKind, ParseError, MERGE_MESSAGE};
pub use util::format_elapsed;
