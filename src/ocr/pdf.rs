//! PDF page counting

use std::path::Path;

/// Reports the page count of a PDF document
pub trait PageCounter: Send + Sync {
    /// `None` when the document cannot be parsed
    fn page_count(&self, path: &Path) -> Option<u32>;
}

/// Page counter backed by `lopdf`
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfPageCounter;

impl PageCounter for LopdfPageCounter {
    fn page_count(&self, path: &Path) -> Option<u32> {
        match lopdf::Document::load(path) {
            Ok(doc) => Some(doc.get_pages().len() as u32),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read PDF info");
                None
            }
        }
    }
}
