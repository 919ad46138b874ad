pub mod source_scanner;

pub use source_scanner::{SourceFile, SourceScanner};
