//! Report export to strings and files

use std::path::{Path, PathBuf};

use super::formatter::generate_report;
use super::types::{BatchReport, OutputFormat, ReportError, ReportResult};
use crate::document::ProcessingResult;

/// Renders batch results and optionally writes them to an output directory
#[derive(Debug, Clone)]
pub struct ReportExporter {
    output_dir: PathBuf,
}

impl ReportExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render `results` in `format`
    pub fn export(&self, results: &[ProcessingResult], format: OutputFormat) -> ReportResult<String> {
        generate_report(&BatchReport::new(results), format)
    }

    /// Render `results` and write them to `output_dir/file_name`
    ///
    /// Returns the rendered content together with the written path.
    pub async fn export_to_file(
        &self,
        results: &[ProcessingResult],
        format: OutputFormat,
        file_name: &str,
    ) -> ReportResult<(String, PathBuf)> {
        let content = self.export(results, format)?;

        // Only the final component is honoured so reports stay inside output_dir.
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| ReportError::InvalidFileName(file_name.to_string()))?;
        let path = self.output_dir.join(name);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| ReportError::Io {
                path: self.output_dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, &content)
            .await
            .map_err(|source| ReportError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(path = %path.display(), format = %format, "Results exported");
        Ok((content, path))
    }
}
