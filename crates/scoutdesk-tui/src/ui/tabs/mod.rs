//! Tab-specific content rendering.
//!
//! Each tab module exposes a `render(frame, app, area)` entry point.
//! The helpers here keep the list/detail panels consistent across tabs.

pub mod actividades;
pub mod comite;
pub mod dashboard;
pub mod dirigentes;
pub mod documentos;
pub mod patrullas;
pub mod programas;
pub mod scouts;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders},
};

use crate::ui::styles;

/// Placeholder for an empty value.
pub const PLACEHOLDER: &str = "-";

/// Split the main area into a list panel and a detail panel.
pub fn split_panels(area: Rect, list_percent: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(list_percent),
            Constraint::Percentage(100 - list_percent),
        ])
        .split(area);
    (chunks[0], chunks[1])
}

/// Bordered panel block with a title.
pub fn panel(title: impl Into<String>, focused: bool) -> Block<'static> {
    Block::default()
        .title(title.into())
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
}

/// Section heading inside a detail panel.
pub fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(title.to_string(), styles::highlight_style()))
}

/// `Label: value` line with the label padded to `width`.
pub fn field_line(label: &str, value: impl Into<String>, width: usize) -> Line<'static> {
    let value = value.into();
    let value = if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value
    };
    Line::from(vec![
        Span::styled(format!("{:<width$}", format!("{}:", label), width = width), styles::muted_style()),
        Span::raw(value),
    ])
}

/// Optional text as a display string.
pub fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Muted hint line for empty panels.
pub fn hint(text: &str) -> Line<'static> {
    Line::from(Span::styled(format!("  {}", text), styles::muted_style()))
}
