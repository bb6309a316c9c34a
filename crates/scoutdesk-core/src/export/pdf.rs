use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};

use super::DocumentRenderer;
use crate::template::{FilledDocument, FilledRow, TemplateError};
use crate::utils::truncate;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const LAYER_NAME: &str = "Contenido";

/// Rough average glyph width of Helvetica, as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f32 = 0.5;
const PT_TO_MM: f32 = 0.3528;

fn render_error(message: impl ToString) -> TemplateError {
    TemplateError::Render {
        format: "pdf",
        message: message.to_string(),
    }
}

/// A4 PDF with each template row drawn as a line of bordered cells.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    pub margin_mm: f32,
    pub row_height_mm: f32,
    pub font_size: f32,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            margin_mm: 15.0,
            row_height_mm: 8.0,
            font_size: 9.0,
        }
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PdfRenderer {
    fn content_width(&self) -> f32 {
        PAGE_WIDTH_MM - 2.0 * self.margin_mm
    }

    /// Characters of `font_size` that fit in `width_mm` with padding.
    fn fitting_chars(&self, width_mm: f32, font_size: f32) -> usize {
        let glyph_mm = font_size * GLYPH_WIDTH_RATIO * PT_TO_MM;
        ((width_mm - 3.0).max(0.0) / glyph_mm) as usize
    }

    fn draw_rect(layer: &PdfLayerReference, x: f32, top: f32, width: f32, height: f32) {
        let corners = [
            (x, top),
            (x + width, top),
            (x + width, top - height),
            (x, top - height),
        ];
        layer.add_line(Line {
            points: corners
                .iter()
                .map(|&(px, py)| (Point::new(Mm(px), Mm(py)), false))
                .collect(),
            is_closed: true,
        });
    }

    fn draw_row(&self, layer: &PdfLayerReference, fonts: &Fonts, row: &FilledRow, top: f32) {
        let content_width = self.content_width();
        let mut x = self.margin_mm;

        for cell in &row.cells {
            let width = content_width * (cell.width as f32) / 100.0;
            Self::draw_rect(layer, x, top, width, self.row_height_mm);

            let (font, size) = if cell.is_header {
                (&fonts.bold, self.font_size - 1.0)
            } else {
                (&fonts.regular, self.font_size)
            };
            let text = truncate(&cell.text, self.fitting_chars(width, size));
            if !text.is_empty() {
                let baseline = top - self.row_height_mm + (self.row_height_mm - size * PT_TO_MM) / 2.0;
                layer.use_text(text, size, Mm(x + 1.5), Mm(baseline), font);
            }

            x += width;
        }
    }

    fn new_page(doc: &PdfDocumentReference) -> PdfLayerReference {
        let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        doc.get_page(page).get_layer(layer)
    }
}

impl DocumentRenderer for PdfRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, document: &FilledDocument) -> Result<Vec<u8>, TemplateError> {
        let title = format!("{} - {}", document.code, document.title);
        let (doc, page, layer) =
            PdfDocument::new(&title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_error)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_error)?,
        };

        let mut current = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT_MM - self.margin_mm;

        current.use_text(document.code.as_str(), 8.0, Mm(self.margin_mm), Mm(y), &fonts.regular);
        y -= 7.0;
        current.use_text(document.title.as_str(), 13.0, Mm(self.margin_mm), Mm(y), &fonts.bold);
        y -= 6.0;
        if let Some(subtitle) = &document.subtitle {
            current.use_text(subtitle.as_str(), 10.0, Mm(self.margin_mm), Mm(y), &fonts.regular);
            y -= 6.0;
        }
        y -= 2.0;

        for row in &document.rows {
            if y - self.row_height_mm < self.margin_mm {
                current = Self::new_page(&doc);
                y = PAGE_HEIGHT_MM - self.margin_mm;
            }
            self.draw_row(&current, &fonts, row, y);
            y -= self.row_height_mm;
        }

        doc.save_to_bytes().map_err(render_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{dngi02, populate};
    use serde_json::json;

    #[test]
    fn test_fitting_chars_scales_with_width() {
        let renderer = PdfRenderer::default();
        let narrow = renderer.fitting_chars(36.0, 9.0);
        let wide = renderer.fitting_chars(144.0, 9.0);
        assert!(narrow > 10);
        assert!(wide > narrow * 3);
        assert_eq!(renderer.fitting_chars(2.0, 9.0), 0);
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let doc = populate(&dngi02(), &json!({"nombres": "Lucia", "apellidos": "Paredes"}))
            .with_subtitle("Grupo Scout Lima 12");
        let bytes = PdfRenderer::default().render(&doc).expect("render pdf");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
