use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use scoutdesk_core::models::ActividadExterior;
use scoutdesk_core::utils::{format_date, format_money, format_percent};
use scoutdesk_core::BudgetSummary;

use crate::app::{ActividadView, App, Focus};
use crate::ui::styles;
use crate::ui::tabs::{field_line, hint, opt, panel, split_panels};

const LABEL_WIDTH: usize = 14;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_panels(area, 40);
    render_activity_table(frame, app, list_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(6)])
        .split(detail_area);
    render_activity_header(frame, app, chunks[0]);

    let focused = app.focus == Focus::Detail;
    match app.actividad_view {
        ActividadView::Presupuesto => render_presupuesto(frame, app, chunks[1], focused),
        ActividadView::Compras => render_compras(frame, app, chunks[1], focused),
        ActividadView::Logistica => render_logistica(frame, app, chunks[1], focused),
        ActividadView::Subcampos => render_subcampos(frame, app, chunks[1], focused),
    }
}

fn render_activity_table(frame: &mut Frame, app: &App, area: Rect) {
    let actividades = app.sorted_actividades();

    let header = Row::new(["Inicio", "Actividad", "Estado"])
        .style(styles::title_style())
        .height(1);
    let rows: Vec<Row> = actividades
        .iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(format_date(a.fecha_inicio)),
                Cell::from(a.nombre.clone()),
                Cell::from(a.estado.label()),
            ])
        })
        .collect();

    let widths = [Constraint::Length(10), Constraint::Fill(1), Constraint::Length(11)];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(
            format!(" Actividades ({}) ", actividades.len()),
            app.focus == Focus::List,
        ))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !actividades.is_empty() {
        state.select(Some(app.actividades_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

/// `12/07/2024 - 14/07/2024 (3 días)`
fn fechas(actividad: &ActividadExterior) -> String {
    match (actividad.fecha_inicio, actividad.fecha_fin) {
        (Some(_), Some(_)) => format!(
            "{} - {} ({} días)",
            format_date(actividad.fecha_inicio),
            format_date(actividad.fecha_fin),
            actividad.dias()
        ),
        (Some(_), None) => format_date(actividad.fecha_inicio),
        _ => String::new(),
    }
}

fn budget_lines(summary: &BudgetSummary) -> Vec<Line<'static>> {
    let remaining_style = if summary.is_over_budget() {
        styles::error_style()
    } else {
        styles::success_style()
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:<LABEL_WIDTH$}", "Presupuesto:"), styles::muted_style()),
        Span::raw(format_money(summary.total_cents)),
        Span::styled("  ejecutado ", styles::muted_style()),
        Span::raw(format!(
            "{} ({})",
            format_money(summary.executed_cents),
            format_percent(summary.execution_percent)
        )),
        Span::styled("  saldo ", styles::muted_style()),
        Span::styled(format_money(summary.remaining_cents), remaining_style),
    ])];

    let mut compras = format!("{}/{} ítems comprados", summary.items_purchased, summary.items_total);
    if let Some(per_head) = summary.cost_per_participant_cents {
        compras = format!("{}, {} por participante", compras, format_money(per_head));
    }
    lines.push(field_line("", compras, LABEL_WIDTH));
    lines
}

fn render_activity_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(actividad) = app.selected_actividad() else {
        frame.render_widget(
            Paragraph::new(vec![hint("Select an activity from the list")]).block(panel(" Actividad ", false)),
            area,
        );
        return;
    };

    let coordenadas = actividad
        .coordinates()
        .map(|(lat, lon)| format!("{:.5}, {:.5}", lat, lon))
        .unwrap_or_default();
    let participantes = actividad
        .participantes
        .map(|p| p.to_string())
        .unwrap_or_default();

    let mut lines = vec![
        Line::from(Span::styled(actividad.nombre.clone(), styles::title_style())),
        field_line("Tipo", opt(&actividad.tipo), LABEL_WIDTH),
        field_line("Fechas", fechas(actividad), LABEL_WIDTH),
        field_line("Ubicación", actividad.ubicacion_display(), LABEL_WIDTH),
        field_line("Coordenadas", coordenadas, LABEL_WIDTH),
        field_line("Responsable", opt(&actividad.responsable), LABEL_WIDTH),
        field_line("Participantes", participantes, LABEL_WIDTH),
        Line::from(""),
    ];
    if let Some(summary) = app.budget_summary() {
        lines.extend(budget_lines(&summary));
    }

    frame.render_widget(
        Paragraph::new(lines).block(panel(
            format!(" {} - [X] Excel ", actividad.estado.label()),
            false,
        )),
        area,
    );
}

fn render_detail_table(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    focused: bool,
    title: String,
    table: Table,
    len: usize,
) {
    if len == 0 {
        frame.render_widget(
            Paragraph::new(vec![hint("Nothing yet. Focus this panel and press n to add.")])
                .block(panel(title, focused)),
            area,
        );
        return;
    }
    let table = table
        .block(panel(title, focused))
        .row_highlight_style(styles::selected_style());
    let mut state = TableState::default();
    if focused {
        state.select(Some(app.detail_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_presupuesto(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let items = app.actividad_presupuesto();

    let header = Row::new(["", "Categoría", "Descripción", "Cant.", "P. unit.", "Subtotal"])
        .style(styles::title_style());
    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            let (mark, mark_style) = styles::check_mark(item.comprado);
            let cantidad = match item.dias_alquiler {
                Some(dias) if dias > 1 => format!("{} x{}d", item.cantidad, dias),
                _ => item.cantidad.to_string(),
            };
            Row::new(vec![
                Cell::from(Span::styled(mark, mark_style)),
                Cell::from(item.categoria.label()),
                Cell::from(item.descripcion.clone()),
                Cell::from(cantidad),
                Cell::from(format_money((item.precio_unitario * 100.0).round() as i64)),
                Cell::from(format_money(item.subtotal_cents())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Length(12),
        Constraint::Fill(1),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(13),
    ];
    let len = items.len();
    let table = Table::new(rows, widths).header(header);
    render_detail_table(
        frame,
        app,
        area,
        focused,
        " Presupuesto - [b] registrar compra ".to_string(),
        table,
        len,
    );
}

fn render_compras(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let compras = app.actividad_compras();

    let header = Row::new(["Fecha", "Descripción", "Proveedor", "Monto", ""]).style(styles::title_style());
    let rows: Vec<Row> = compras
        .iter()
        .map(|c| {
            let comprobante = if c.comprobante_url.is_some() { "•" } else { "" };
            Row::new(vec![
                Cell::from(format_date(c.fecha)),
                Cell::from(c.descripcion.clone()),
                Cell::from(opt(&c.proveedor)),
                Cell::from(format_money(c.monto_cents())),
                Cell::from(comprobante),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Length(13),
        Constraint::Length(2),
    ];
    let total: i64 = compras.iter().map(|c| c.monto_cents()).sum();
    let len = compras.len();
    let table = Table::new(rows, widths).header(header);
    render_detail_table(
        frame,
        app,
        area,
        focused,
        format!(" Compras ({}) - {} ", len, format_money(total)),
        table,
        len,
    );
}

fn render_logistica(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let items = app.actividad_logistica();

    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            let (mark, mark_style) = styles::check_mark(item.is_ready());
            Row::new(vec![
                Cell::from(Span::styled(mark, mark_style)),
                Cell::from(item.descripcion.clone()),
                Cell::from(opt(&item.categoria).to_lowercase()),
                Cell::from(opt(&item.responsable)),
                Cell::from(format_date(item.fecha_limite)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(10),
    ];
    let listos = items.iter().filter(|i| i.is_ready()).count();
    let len = items.len();
    let table = Table::new(rows, widths);
    render_detail_table(
        frame,
        app,
        area,
        focused,
        format!(" Logística {}/{} - [space] listo ", listos, len),
        table,
        len,
    );
}

fn render_subcampos(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let subcampos = app.actividad_subcampos();
    let asignaciones = app.actividad_asignaciones();

    let rows: Vec<Row> = subcampos
        .iter()
        .map(|sc| {
            let patrullas: Vec<String> = asignaciones
                .iter()
                .filter(|a| a.subcampo_id.is_some() && a.subcampo_id == sc.id)
                .map(|a| app.data.patrulla_name(Some(a.patrulla_id)))
                .collect();
            let responsable = sc
                .responsable_id
                .and_then(|id| app.data.scout(id))
                .map(|s| s.full_name())
                .unwrap_or_default();
            let capacidad = sc.capacidad.map(|c| c.to_string()).unwrap_or_default();
            Row::new(vec![
                Cell::from(sc.nombre.clone()),
                Cell::from(opt(&sc.ubicacion)),
                Cell::from(capacidad),
                Cell::from(responsable),
                Cell::from(patrullas.join(", ")),
            ])
        })
        .collect();

    let header = Row::new(["Subcampo", "Ubicación", "Cap.", "Responsable", "Patrullas"])
        .style(styles::title_style());
    let widths = [
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Fill(2),
    ];
    let sin_asignar = asignaciones.iter().filter(|a| a.subcampo_id.is_none()).count();
    let len = subcampos.len();
    let table = Table::new(rows, widths).header(header);
    render_detail_table(
        frame,
        app,
        area,
        focused,
        format!(" Subcampos ({}) - {} patrullas sin asignar - [a] asignar ", len, sin_asignar),
        table,
        len,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fechas_range_and_single_day() {
        let mut actividad = ActividadExterior {
            fecha_inicio: NaiveDate::from_ymd_opt(2024, 7, 12),
            fecha_fin: NaiveDate::from_ymd_opt(2024, 7, 14),
            ..Default::default()
        };
        assert_eq!(fechas(&actividad), "12/07/2024 - 14/07/2024 (3 días)");

        actividad.fecha_fin = None;
        assert_eq!(fechas(&actividad), "12/07/2024");

        actividad.fecha_inicio = None;
        assert_eq!(fechas(&actividad), "");
    }

    #[test]
    fn test_budget_lines_show_per_participant_cost() {
        let summary = BudgetSummary {
            total_cents: 120_000,
            executed_cents: 30_000,
            remaining_cents: 90_000,
            execution_percent: 25.0,
            items_total: 4,
            items_purchased: 1,
            cost_per_participant_cents: Some(6_000),
            ..Default::default()
        };
        let lines = budget_lines(&summary);
        let text: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("1/4 ítems comprados"));
        assert!(text.contains("S/ 60.00 por participante"));
    }
}
