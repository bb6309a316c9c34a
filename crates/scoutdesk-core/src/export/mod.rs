//! Renderers that turn filled templates and lists into files.
//!
//! - [`PdfRenderer`]: A4 PDF with a bordered cell grid
//! - [`WordRenderer`]: .docx table with the same grid
//! - [`XlsxExporter`]: spreadsheets for forms and list exports

pub mod pdf;
pub mod word;
pub mod xlsx;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::template::{populate, FieldSource, FilledDocument, FormKind, TemplateError};

pub use pdf::PdfRenderer;
pub use word::WordRenderer;
pub use xlsx::XlsxExporter;

/// Turns a filled template into file bytes.
pub trait DocumentRenderer {
    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, document: &FilledDocument) -> Result<Vec<u8>, TemplateError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
    Xlsx,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Some(ExportFormat::Pdf),
            "docx" | "word" => Some(ExportFormat::Docx),
            "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }

    pub fn renderer(&self) -> Box<dyn DocumentRenderer> {
        match self {
            ExportFormat::Pdf => Box::new(PdfRenderer::default()),
            ExportFormat::Docx => Box::new(WordRenderer::default()),
            ExportFormat::Xlsx => Box::new(XlsxExporter),
        }
    }
}

/// Write export bytes to `dir/file_name`, creating the directory.
pub fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Export written");
    Ok(path)
}

/// Fill a built-in form from `source` and render it in `format`.
///
/// The layout is validated first so a broken template never reaches a file.
pub fn render_form(
    kind: FormKind,
    source: &dyn FieldSource,
    subtitle: &str,
    format: ExportFormat,
) -> Result<Vec<u8>, TemplateError> {
    let layout = kind.layout();
    layout.validate()?;
    let document = populate(&layout, source).with_subtitle(subtitle);
    format.renderer().render(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_form_pdf() {
        let source = json!({"nombres": "Lucía", "apellidos": "Paredes Soto"});
        let bytes = render_form(FormKind::Dngi02, &source, "Grupo Lima 12", ExportFormat::Pdf)
            .expect("render");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!(ExportFormat::parse("PDF"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::parse("word"), Some(ExportFormat::Docx));
        assert_eq!(ExportFormat::parse("odt"), None);
        assert_eq!(ExportFormat::Docx.renderer().extension(), "docx");
    }

    #[test]
    fn test_write_export_creates_directory() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = temp.path().join("exports").join("2024");
        let path = write_export(&dir, "lista.xlsx", b"data").expect("write export");
        assert_eq!(path, dir.join("lista.xlsx"));
        assert_eq!(std::fs::read(&path).expect("read back"), b"data");
    }
}
