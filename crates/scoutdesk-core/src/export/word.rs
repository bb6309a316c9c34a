use std::io::Cursor;

use docx_rs::{
    AlignmentType, Docx, Paragraph, Run, Shading, Table, TableCell, TableRow, WidthType,
};

use super::DocumentRenderer;
use crate::template::{FilledCell, FilledDocument, TemplateError};

/// Usable width of an A4 page with 2 cm margins, in twentieths of a point.
const CONTENT_WIDTH_DXA: usize = 9638;
const HEADER_FILL: &str = "D9D9D9";

/// Word document holding the form as a single table.
#[derive(Debug, Clone)]
pub struct WordRenderer {
    /// Font size in half-points.
    pub font_size: usize,
}

impl Default for WordRenderer {
    fn default() -> Self {
        Self { font_size: 18 }
    }
}

impl WordRenderer {
    fn cell(&self, cell: &FilledCell) -> TableCell {
        let mut run = Run::new().add_text(cell.text.as_str()).size(self.font_size);
        if cell.is_header {
            run = run.bold();
        }

        let width = (CONTENT_WIDTH_DXA as f64 * cell.width / 100.0).round() as usize;
        let mut table_cell = TableCell::new()
            .add_paragraph(Paragraph::new().add_run(run))
            .width(width, WidthType::Dxa)
            .grid_span(cell.col_span as usize);
        if cell.is_header {
            table_cell = table_cell.shading(Shading::new().fill(HEADER_FILL));
        }
        table_cell
    }

    fn build(&self, document: &FilledDocument) -> Docx {
        let columns = document.grid_columns.max(1) as usize;
        let grid = vec![CONTENT_WIDTH_DXA / columns; columns];

        let rows: Vec<TableRow> = document
            .rows
            .iter()
            .map(|row| TableRow::new(row.cells.iter().map(|c| self.cell(c)).collect()))
            .collect();

        let mut docx = Docx::new()
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(document.code.as_str()).size(16)),
            )
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(document.title.as_str()).bold().size(28))
                    .align(AlignmentType::Center),
            );
        if let Some(subtitle) = &document.subtitle {
            docx = docx.add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(subtitle.as_str()).size(22))
                    .align(AlignmentType::Center),
            );
        }

        docx.add_table(Table::new(rows).set_grid(grid))
    }
}

impl DocumentRenderer for WordRenderer {
    fn extension(&self) -> &'static str {
        "docx"
    }

    fn render(&self, document: &FilledDocument) -> Result<Vec<u8>, TemplateError> {
        let mut buffer = Cursor::new(Vec::new());
        self.build(document)
            .build()
            .pack(&mut buffer)
            .map_err(|e| TemplateError::Render {
                format: "docx",
                message: e.to_string(),
            })?;
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{dngi03, populate};
    use serde_json::json;

    #[test]
    fn test_render_produces_zip_container() {
        let doc = populate(&dngi03(), &json!({"nombres": "Luis", "apellidos": "Quispe"}));
        let bytes = WordRenderer::default().render(&doc).expect("render docx");
        // .docx files are zip archives
        assert!(bytes.starts_with(b"PK"));
    }
}
