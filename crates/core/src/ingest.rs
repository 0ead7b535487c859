use crate::error::IngestError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// PDF files under `path`, sorted. A single file is returned as-is when it is a PDF.
pub fn discover_pdf_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return if is_pdf(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        };
    }

    let mut files = WalkDir::new(path)
        .into_iter()
        .filter_map(|item| item.ok())
        .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
        .map(|entry| entry.path().to_path_buf())
        .collect::<Vec<_>>();

    files.sort_unstable();
    files
}

/// The file name a document is stored and cited under.
pub fn document_name(path: &Path) -> Result<String, IngestError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::{discover_pdf_files, document_name};
    use crate::IngestError;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn discover_pdf_files_is_recursive() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("a.pdf")).and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(nested.join("B.PDF"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        fs::write(base.join("notes.txt"), b"not a pdf")?;

        let files = discover_pdf_files(base);
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[test]
    fn single_file_is_returned_directly() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file = dir.path().join("report.pdf");
        fs::write(&file, b"%PDF-1.4")?;

        assert_eq!(discover_pdf_files(&file), vec![file]);
        Ok(())
    }

    #[test]
    fn document_name_is_the_file_name() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(document_name(Path::new("/data/uploads/manual.pdf"))?, "manual.pdf");
        assert!(matches!(
            document_name(Path::new("/")),
            Err(IngestError::MissingFileName(_))
        ));
        Ok(())
    }
}
