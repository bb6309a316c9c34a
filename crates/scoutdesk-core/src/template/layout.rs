use std::fmt;

use super::field::FieldSource;
use super::TemplateError;

/// Allowed deviation from 100 when summing a row's widths.
const WIDTH_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub enum CellKind {
    /// Static label.
    Header { label: String },
    /// Value taken from the record at `field`.
    Data { field: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCell {
    /// Rendered width as a percentage of the page's content width.
    pub width: f64,
    /// Grid columns covered by the cell.
    pub col_span: u32,
    pub kind: CellKind,
}

impl TemplateCell {
    pub fn header(label: impl Into<String>, width: f64) -> Self {
        Self {
            width,
            col_span: 1,
            kind: CellKind::Header { label: label.into() },
        }
    }

    pub fn data(field: impl Into<String>, width: f64) -> Self {
        Self {
            width,
            col_span: 1,
            kind: CellKind::Data { field: field.into() },
        }
    }

    pub fn span(mut self, col_span: u32) -> Self {
        self.col_span = col_span.max(1);
        self
    }

    pub fn is_header(&self) -> bool {
        matches!(self.kind, CellKind::Header { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateRow {
    pub cells: Vec<TemplateCell>,
}

impl TemplateRow {
    pub fn new(cells: Vec<TemplateCell>) -> Self {
        Self { cells }
    }

    pub fn width_sum(&self) -> f64 {
        self.cells.iter().map(|c| c.width).sum()
    }

    pub fn span_sum(&self) -> u32 {
        self.cells.iter().map(|c| c.col_span).sum()
    }
}

/// Why a row breaks the layout rules.
#[derive(Debug, Clone, PartialEq)]
pub enum RowProblem {
    Empty { row: usize },
    WidthSum { row: usize, sum: f64 },
    SpanMismatch { row: usize, span: u32, expected: u32 },
}

impl fmt::Display for RowProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowProblem::Empty { row } => write!(f, "row {} has no cells", row + 1),
            RowProblem::WidthSum { row, sum } => {
                write!(f, "row {} widths sum to {:.2}, expected 100", row + 1, sum)
            }
            RowProblem::SpanMismatch { row, span, expected } => write!(
                f,
                "row {} covers {} grid columns, expected {}",
                row + 1,
                span,
                expected
            ),
        }
    }
}

/// A fixed form layout: ordered rows of header/data cells.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLayout {
    /// Form code, e.g. "DNGI-02".
    pub code: String,
    pub title: String,
    pub rows: Vec<TemplateRow>,
}

impl TemplateLayout {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, cells: Vec<TemplateCell>) -> Self {
        self.rows.push(TemplateRow::new(cells));
        self
    }

    /// Number of grid columns, taken from the first row.
    pub fn grid_columns(&self) -> u32 {
        self.rows.first().map(|r| r.span_sum()).unwrap_or(0)
    }

    /// Every row that breaks the width or span rules.
    pub fn problems(&self) -> Vec<RowProblem> {
        let expected = self.grid_columns();
        let mut problems = Vec::new();

        for (index, row) in self.rows.iter().enumerate() {
            if row.cells.is_empty() {
                problems.push(RowProblem::Empty { row: index });
                continue;
            }

            let sum = row.width_sum();
            if (sum - 100.0).abs() > WIDTH_TOLERANCE {
                problems.push(RowProblem::WidthSum { row: index, sum });
            }

            let span = row.span_sum();
            if span != expected {
                problems.push(RowProblem::SpanMismatch { row: index, span, expected });
            }
        }

        problems
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(TemplateError::InvalidLayout {
                code: self.code.clone(),
                problems: problems.iter().map(|p| p.to_string()).collect(),
            })
        }
    }

    /// Data field keys referenced by the layout, in order.
    pub fn fields(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .filter_map(|c| match &c.kind {
                CellKind::Data { field } => Some(field.as_str()),
                CellKind::Header { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilledCell {
    pub text: String,
    pub width: f64,
    pub col_span: u32,
    pub is_header: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilledRow {
    pub cells: Vec<FilledCell>,
}

/// A layout with every cell resolved to its text, ready for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FilledDocument {
    pub code: String,
    pub title: String,
    /// Line printed under the title, usually the group's name.
    pub subtitle: Option<String>,
    pub grid_columns: u32,
    pub rows: Vec<FilledRow>,
}

impl FilledDocument {
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        let subtitle = subtitle.into();
        self.subtitle = if subtitle.trim().is_empty() { None } else { Some(subtitle) };
        self
    }

    /// Text of the first data cell that follows a header with `label`.
    pub fn value_after(&self, label: &str) -> Option<&str> {
        self.rows.iter().find_map(|row| {
            row.cells
                .windows(2)
                .find(|pair| pair[0].is_header && pair[0].text == label && !pair[1].is_header)
                .map(|pair| pair[1].text.as_str())
        })
    }
}

/// Resolve every cell of `layout` against `source`.
///
/// Header cells keep their label; data cells take the source's value at the
/// field key, or an empty string when the field is missing.
pub fn populate(layout: &TemplateLayout, source: &dyn FieldSource) -> FilledDocument {
    let rows = layout
        .rows
        .iter()
        .map(|row| FilledRow {
            cells: row
                .cells
                .iter()
                .map(|cell| {
                    let text = match &cell.kind {
                        CellKind::Header { label } => label.clone(),
                        CellKind::Data { field } => source.field_text(field).unwrap_or_default(),
                    };
                    FilledCell {
                        text,
                        width: cell.width,
                        col_span: cell.col_span,
                        is_header: cell.is_header(),
                    }
                })
                .collect(),
        })
        .collect();

    FilledDocument {
        code: layout.code.clone(),
        title: layout.title.clone(),
        subtitle: None,
        grid_columns: layout.grid_columns(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn small_layout() -> TemplateLayout {
        TemplateLayout::new("TEST", "Prueba")
            .row(vec![TemplateCell::header("DATOS", 100.0).span(4)])
            .row(vec![
                TemplateCell::header("Nombre", 20.0),
                TemplateCell::data("nombres", 30.0),
                TemplateCell::header("Edad", 20.0),
                TemplateCell::data("edad", 30.0),
            ])
            .row(vec![
                TemplateCell::header("Dirección", 20.0),
                TemplateCell::data("direccion", 80.0).span(3),
            ])
    }

    #[test]
    fn test_valid_layout_has_no_problems() {
        let layout = small_layout();
        assert_eq!(layout.grid_columns(), 4);
        assert!(layout.problems().is_empty());
        assert!(layout.validate().is_ok());
        assert_eq!(layout.fields(), vec!["nombres", "edad", "direccion"]);
    }

    #[test]
    fn test_width_sum_violation_reported() {
        let layout = small_layout().row(vec![
            TemplateCell::header("A", 50.0).span(2),
            TemplateCell::data("a", 40.0).span(2),
        ]);
        let problems = layout.problems();
        assert_eq!(problems, vec![RowProblem::WidthSum { row: 3, sum: 90.0 }]);
        let err = layout.validate().unwrap_err();
        assert!(err.to_string().contains("row 4 widths sum to 90.00"));
    }

    #[test]
    fn test_span_mismatch_reported() {
        let layout = small_layout().row(vec![
            TemplateCell::header("A", 50.0),
            TemplateCell::data("a", 50.0),
        ]);
        assert_eq!(
            layout.problems(),
            vec![RowProblem::SpanMismatch { row: 3, span: 2, expected: 4 }]
        );
    }

    #[test]
    fn test_width_tolerance() {
        let layout = TemplateLayout::new("T", "T").row(vec![
            TemplateCell::header("A", 33.333),
            TemplateCell::header("B", 33.333),
            TemplateCell::header("C", 33.334),
        ]);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_populate_fills_headers_and_values() {
        let record = json!({"nombres": "Lucía", "edad": 12});
        let doc = populate(&small_layout(), &record);

        assert_eq!(doc.rows.len(), 3);
        assert_eq!(doc.rows[0].cells[0].text, "DATOS");
        assert!(doc.rows[0].cells[0].is_header);
        assert_eq!(doc.value_after("Nombre"), Some("Lucía"));
        assert_eq!(doc.value_after("Edad"), Some("12"));
        // Missing field renders as empty string
        assert_eq!(doc.value_after("Dirección"), Some(""));
        assert_eq!(doc.rows[2].cells[1].col_span, 3);
    }

    #[test]
    fn test_subtitle_ignores_blank() {
        let doc = populate(&small_layout(), &json!({})).with_subtitle("  ");
        assert_eq!(doc.subtitle, None);
        let doc = doc.with_subtitle("Grupo Scout 12");
        assert_eq!(doc.subtitle.as_deref(), Some("Grupo Scout 12"));
    }
}
