//! Fixed-grid document templates.
//!
//! A [`TemplateLayout`] describes a form as rows of header and data cells
//! with width percentages. [`populate`] resolves it against a record into a
//! [`FilledDocument`], which the renderers in [`crate::export`] turn into
//! PDF or Word files.
//!
//! Every row's widths must add up to 100 and every row must cover the same
//! number of grid columns.

pub mod dngi;
pub mod field;
pub mod layout;

use thiserror::Error;

pub use dngi::{dngi02, dngi02_source, dngi03, dngi03_source, FormKind};
pub use field::{to_source, FieldSource};
pub use layout::{
    populate, CellKind, FilledCell, FilledDocument, FilledRow, RowProblem, TemplateCell,
    TemplateLayout, TemplateRow,
};

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Layout {code} is invalid: {}", .problems.join("; "))]
    InvalidLayout { code: String, problems: Vec<String> },

    #[error("Record could not be read: {0}")]
    Source(#[from] serde_json::Error),

    #[error("Failed to render {format}: {message}")]
    Render { format: &'static str, message: String },
}
