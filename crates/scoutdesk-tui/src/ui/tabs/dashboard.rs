use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use scoutdesk_core::stats::{DashboardStats, Progress};
use scoutdesk_core::utils::format_percent;

use crate::app::App;
use crate::ui::styles;
use crate::ui::tabs::{hint, panel};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.dashboard_stats();

    // Totals on top, then ramas | patrols, then activity progress
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(50),
            Constraint::Min(6),
        ])
        .split(area);

    render_totals(frame, app, &stats, rows[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    render_ramas(frame, &stats, middle[0]);
    render_patrols(frame, &stats, middle[1]);

    render_activities(frame, &stats, rows[2]);
}

fn render_totals(frame: &mut Frame, app: &App, stats: &DashboardStats, area: Rect) {
    let count = |value: usize, label: &str| {
        vec![
            Span::styled(format!("{}", value), styles::highlight_style()),
            Span::styled(format!(" {}   ", label), styles::muted_style()),
        ]
    };

    let mut spans = Vec::new();
    spans.extend(count(stats.total_scouts, "scouts"));
    spans.extend(count(stats.scouts_activos, "activos"));
    spans.extend(count(stats.scouts_inactivos, "inactivos"));
    spans.extend(count(stats.total_dirigentes, "dirigentes"));
    spans.extend(count(app.data.patrullas.len(), "patrullas"));

    let sin_patrulla = if stats.sin_patrulla > 0 {
        Span::styled(
            format!("{} scouts activos sin patrulla", stats.sin_patrulla),
            styles::error_style(),
        )
    } else {
        Span::styled("Todos los scouts activos tienen patrulla", styles::success_style())
    };

    let lines = vec![Line::from(spans), Line::from(sin_patrulla)];
    frame.render_widget(
        Paragraph::new(lines).block(panel(format!(" {} ", app.config.group_name()), false)),
        area,
    );
}

fn render_ramas(frame: &mut Frame, stats: &DashboardStats, area: Rect) {
    let header = Row::new(["Rama", "Total", "Activos", "%"]).style(styles::title_style());
    let rows: Vec<Row> = stats
        .por_rama
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.rama.label()),
                Cell::from(format!("{:>5}", r.total)),
                Cell::from(format!("{:>7}", r.activos)),
                Cell::from(format!("{:>6}", format_percent(r.percent))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(5),
        Constraint::Length(7),
        Constraint::Length(6),
    ];
    frame.render_widget(
        Table::new(rows, widths)
            .header(header)
            .block(panel(" Scouts por rama ", false)),
        area,
    );
}

fn render_patrols(frame: &mut Frame, stats: &DashboardStats, area: Rect) {
    if stats.patrullas.is_empty() {
        frame.render_widget(
            Paragraph::new(vec![hint("No patrols yet")]).block(panel(" Patrullas ", false)),
            area,
        );
        return;
    }

    let largest = stats.patrullas.iter().map(|p| p.miembros).max().unwrap_or(0);
    let bar_width = 20usize;

    let lines: Vec<Line> = stats
        .patrullas
        .iter()
        .map(|p| {
            let filled = if largest == 0 {
                0
            } else {
                p.miembros * bar_width / largest
            };
            Line::from(vec![
                Span::raw(format!("{:<18} ", p.nombre)),
                Span::styled("█".repeat(filled), styles::highlight_style()),
                Span::styled(format!(" {}", p.miembros), styles::muted_style()),
            ])
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).block(panel(" Tamaño de patrullas ", false)),
        area,
    );
}

fn progress_cell(progress: Progress) -> Cell<'static> {
    if progress.total == 0 {
        return Cell::from(Span::styled("-", styles::muted_style()));
    }
    Cell::from(Span::styled(
        progress.display(),
        styles::progress_style(progress.done, progress.total),
    ))
}

fn render_activities(frame: &mut Frame, stats: &DashboardStats, area: Rect) {
    if stats.actividades.is_empty() {
        frame.render_widget(
            Paragraph::new(vec![hint("No outdoor activities planned")])
                .block(panel(" Actividades ", false)),
            area,
        );
        return;
    }

    let header = Row::new(["Actividad", "Autorizaciones", "Logística"]).style(styles::title_style());
    let rows: Vec<Row> = stats
        .actividades
        .iter()
        .map(|a| {
            Row::new(vec![
                Cell::from(a.nombre.clone()),
                progress_cell(a.autorizaciones),
                progress_cell(a.logistica),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Length(16),
        Constraint::Length(16),
    ];
    frame.render_widget(
        Table::new(rows, widths)
            .header(header)
            .block(panel(" Preparación de actividades ", false)),
        area,
    );
}
