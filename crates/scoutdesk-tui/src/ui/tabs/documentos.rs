use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use scoutdesk_core::models::EstadoAutorizacion;
use scoutdesk_core::utils::format_date;

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::ui::tabs::{hint, opt, panel, split_panels};

/// Authorizations per activity: activities on the left, documents on the right.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_panels(area, 40);
    render_activity_list(frame, app, list_area);
    render_documents(frame, app, detail_area);
}

fn render_activity_list(frame: &mut Frame, app: &App, area: Rect) {
    let actividades = app.sorted_actividades();

    let rows: Vec<Row> = actividades
        .iter()
        .map(|a| {
            let docs: Vec<_> = app
                .data
                .documentos
                .iter()
                .filter(|d| Some(d.actividad_id) == a.id)
                .collect();
            let firmados = docs.iter().filter(|d| d.is_signed()).count();
            Row::new(vec![
                Cell::from(format_date(a.fecha_inicio)),
                Cell::from(a.nombre.clone()),
                Cell::from(Span::styled(
                    format!("{}/{}", firmados, docs.len()),
                    styles::progress_style(firmados, docs.len()),
                )),
            ])
        })
        .collect();

    let header = Row::new(["Inicio", "Actividad", "Firmas"]).style(styles::title_style());
    let widths = [Constraint::Length(10), Constraint::Fill(1), Constraint::Length(7)];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(" Actividades ", app.focus == Focus::List))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !actividades.is_empty() {
        state.select(Some(app.actividades_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_documents(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let documentos = app.actividad_documentos();

    let title = match app.selected_actividad() {
        Some(a) => format!(" {} - [space] avanzar estado ", a.nombre),
        None => " Autorizaciones ".to_string(),
    };

    if documentos.is_empty() {
        frame.render_widget(
            Paragraph::new(vec![hint("No authorizations. Focus this panel and press n to add.")])
                .block(panel(title, focused)),
            area,
        );
        return;
    }

    let header = Row::new(["Scout", "Tipo", "Estado", "Enviada", "Firmada"]).style(styles::title_style());
    let rows: Vec<Row> = documentos
        .iter()
        .map(|d| {
            let scout = app
                .data
                .scout(d.scout_id)
                .map(|s| s.display_name())
                .unwrap_or_else(|| format!("#{}", d.scout_id));
            let tipo = opt(&d.tipo).replace('_', " ").to_lowercase();
            Row::new(vec![
                Cell::from(scout),
                Cell::from(tipo),
                Cell::from(Span::styled(d.estado.label(), styles::authorization_style(d.estado))),
                Cell::from(format_date(d.fecha_envio)),
                Cell::from(format_date(d.fecha_firma)),
            ])
        })
        .collect();

    let pendientes = documentos
        .iter()
        .filter(|d| d.estado == EstadoAutorizacion::Pendiente)
        .count();
    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(format!("{}({} pendientes) ", title, pendientes), focused))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused {
        state.select(Some(app.detail_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
