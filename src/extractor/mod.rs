pub mod doc_blocks;
pub mod doc_extractor;
pub mod fragment_writer;

pub use doc_blocks::{BlockExtractor, DocBlock};
pub use doc_extractor::{DocExtractor, ExtractionProgress, ExtractionReport, FragmentInfo};
pub use fragment_writer::{fragment_file_name, FragmentWriter};
