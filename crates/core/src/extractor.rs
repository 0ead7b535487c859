use crate::error::IngestError;
use lopdf::Document;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Source of per-page text for a PDF file.
pub trait PdfExtractor: Send + Sync {
    /// Every page in order, 1-indexed. Pages without text are kept with an
    /// empty string so the page count stays accurate.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
        let document = Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;
        extract_document_pages(&document, path)
    }
}

impl LopdfExtractor {
    pub fn extract_bytes(&self, bytes: &[u8], label: &Path) -> Result<Vec<PageText>, IngestError> {
        let document =
            Document::load_mem(bytes).map_err(|error| IngestError::PdfParse(error.to_string()))?;
        extract_document_pages(&document, label)
    }
}

fn extract_document_pages(document: &Document, path: &Path) -> Result<Vec<PageText>, IngestError> {
    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = match document.extract_text(&[page_no]) {
            Ok(text) => text,
            Err(error) => {
                warn!(path = %path.display(), page = page_no, %error, "page text unreadable, treating as blank");
                String::new()
            }
        };

        pages.push(PageText {
            number: page_no,
            text,
        });
    }

    if pages.is_empty() {
        return Err(IngestError::PdfParse(format!(
            "pdf has no pages: {}",
            path.display()
        )));
    }

    Ok(pages)
}

pub fn extract_page_texts(path: &Path) -> Result<Vec<PageText>, IngestError> {
    LopdfExtractor.extract_pages(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn broken_pdf_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n%broken")?;

        let result = extract_page_texts(&path);
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
        Ok(())
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let result = LopdfExtractor.extract_bytes(b"not a pdf", Path::new("upload.pdf"));
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
    }
}
