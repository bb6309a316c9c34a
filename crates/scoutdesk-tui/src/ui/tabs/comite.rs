use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Cell, Row, Table, TableState},
    Frame,
};

use scoutdesk_core::utils::format_phone;

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::ui::tabs::{opt, panel};

/// Render the parent committee, officers first.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let miembros = app.sorted_comite();

    let header = Row::new(["Cargo", "Nombre", "Celular", "Email", "Periodo"])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = miembros
        .iter()
        .map(|m| {
            let style = if m.activo {
                styles::list_item_style()
            } else {
                styles::muted_style()
            };
            Row::new(vec![
                Cell::from(m.cargo_display()),
                Cell::from(m.full_name()),
                Cell::from(m.celular.as_deref().map(format_phone).unwrap_or_default()),
                Cell::from(opt(&m.email)),
                Cell::from(opt(&m.periodo)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(16),
        Constraint::Fill(2),
        Constraint::Length(13),
        Constraint::Fill(2),
        Constraint::Length(11),
    ];
    let activos = miembros.iter().filter(|m| m.activo).count();
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(
            format!(" Comité de padres ({} activos) ", activos),
            app.focus == Focus::List,
        ))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !miembros.is_empty() {
        state.select(Some(app.comite_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
