// Utils

pub mod text;

pub use text::{tokenize, StopwordFilter, PORTUGUESE_STOP_WORDS};
