pub mod file_format;
pub mod log_setup;
pub mod parallel;

pub use file_format::{FileFormatError, FileFormatResult, SerdeFormat};
