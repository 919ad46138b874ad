use crate::error::{Result, ToolsError};
use regex::Regex;

/// Body of one `/*.. ... */` comment, without the comment markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocBlock {
    pub body: String,
    /// Byte offset of the opening marker in the source text.
    pub offset: usize,
}

pub struct BlockExtractor {
    pattern: Regex,
}

impl BlockExtractor {
    /// `pattern` must contain one capture group holding the block body.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| ToolsError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        if pattern.captures_len() < 2 {
            return Err(ToolsError::Pattern {
                pattern: pattern.as_str().to_string(),
                message: "pattern needs a capture group for the block body".to_string(),
            });
        }

        Ok(Self { pattern })
    }

    /// All non-overlapping blocks in source order.
    pub fn extract(&self, text: &str) -> Vec<DocBlock> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let body = caps.get(1)?;
                Some(DocBlock {
                    body: body.as_str().to_string(),
                    offset: whole.start(),
                })
            })
            .collect()
    }
}
