use crate::error::Result;
use crate::extractor::DocBlock;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the fragment for `source_name`: dots removed, then `.{extension}`.
///
/// `rvar_entity.cpp` becomes `rvar_entitycpp.rst`.
pub fn fragment_file_name(source_name: &str, extension: &str) -> String {
    format!("{}.{}", source_name.replace('.', ""), extension)
}

pub struct FragmentWriter {
    output_dir: PathBuf,
    extension: String,
}

impl FragmentWriter {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(output_dir: P, extension: S) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn fragment_path(&self, source_name: &str) -> PathBuf {
        self.output_dir
            .join(fragment_file_name(source_name, &self.extension))
    }

    /// Writes every block followed by a newline, overwriting any previous
    /// fragment. Nothing is written when `blocks` is empty.
    pub fn write(&self, source_name: &str, blocks: &[DocBlock]) -> Result<Option<PathBuf>> {
        if blocks.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(&self.output_dir)?;

        let path = self.fragment_path(source_name);
        let mut writer = BufWriter::new(fs::File::create(&path)?);

        for block in blocks {
            writeln!(writer, "{}", block.body)?;
        }
        writer.flush()?;

        Ok(Some(path))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
