use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame,
};

use scoutdesk_core::models::Record;
use scoutdesk_core::utils::{format_phone, truncate};

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::ui::tabs::{field_line, hint, opt, panel, split_panels};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_panels(area, 40);
    render_patrol_list(frame, app, list_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(5)])
        .split(detail_area);
    render_patrol_info(frame, app, chunks[0]);
    render_patrol_members(frame, app, chunks[1]);
}

fn render_patrol_list(frame: &mut Frame, app: &App, area: Rect) {
    let patrullas = app.sorted_patrullas();

    let items: Vec<ListItem> = patrullas
        .iter()
        .map(|patrulla| {
            let count = patrulla.members(&app.data.scouts).len();
            let line = Line::from(vec![
                Span::raw(format!("{:<20} ", truncate(&patrulla.nombre, 20))),
                Span::styled(format!("{:<10}", patrulla.rama.label()), styles::muted_style()),
                Span::raw(format!("{:>3} scouts", count)),
            ]);
            let style = if patrulla.activa {
                styles::list_item_style()
            } else {
                styles::muted_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let sin_patrulla = app
        .data
        .scouts
        .iter()
        .filter(|s| s.estado.is_active() && s.is_unassigned())
        .count();
    let title = format!(" Patrullas ({}) - {} sin patrulla ", patrullas.len(), sin_patrulla);
    let list = List::new(items)
        .block(panel(title, app.focus == Focus::List))
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    if !patrullas.is_empty() {
        state.select(Some(app.patrullas_selection));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_patrol_info(frame: &mut Frame, app: &App, area: Rect) {
    let Some(patrulla) = app.selected_patrulla() else {
        frame.render_widget(
            Paragraph::new(vec![hint("Select a patrol from the list")]).block(panel(" Patrulla ", false)),
            area,
        );
        return;
    };

    let scout_name = |id: Option<i64>| {
        id.and_then(|id| app.data.scout(id))
            .map(|s| s.full_name())
            .unwrap_or_default()
    };

    let lines = vec![
        field_line("Guía", scout_name(patrulla.guia_id), 10),
        field_line("Subguía", scout_name(patrulla.subguia_id), 10),
        field_line("Lema", opt(&patrulla.lema), 10),
        field_line("Grito", opt(&patrulla.grito), 10),
        field_line("Color", opt(&patrulla.color), 10),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(panel(format!(" {} ", patrulla.label()), false)),
        area,
    );
}

fn render_patrol_members(frame: &mut Frame, app: &App, area: Rect) {
    let members = app.patrulla_members();
    let today = app.today();
    let focused = app.focus == Focus::Detail;
    let (guia, subguia) = app
        .selected_patrulla()
        .map(|p| (p.guia_id, p.subguia_id))
        .unwrap_or_default();

    let rows: Vec<Row> = members
        .iter()
        .map(|scout| {
            let role = if scout.id.is_some() && scout.id == guia {
                "Guía"
            } else if scout.id.is_some() && scout.id == subguia {
                "Subguía"
            } else {
                ""
            };
            Row::new(vec![
                Cell::from(scout.display_name()),
                Cell::from(Span::styled(role, styles::highlight_style())),
                Cell::from(format!("{:>3}", scout.edad_str(today))),
                Cell::from(scout.contact_phone().map(format_phone).unwrap_or_default()),
            ])
            .style(styles::membership_style(scout.estado))
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Length(8),
        Constraint::Length(4),
        Constraint::Length(13),
    ];
    let table = Table::new(rows, widths)
        .block(panel(format!(" Miembros ({}) ", members.len()), focused))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused && !members.is_empty() {
        state.select(Some(app.detail_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
