use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use scoutdesk_core::models::ProgramaSemanal;
use scoutdesk_core::utils::format_date;

use crate::app::{App, Focus, ProgramaView};
use crate::ui::styles;
use crate::ui::tabs::{field_line, hint, opt, panel, split_panels};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_panels(area, 45);
    render_program_table(frame, app, list_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(6)])
        .split(detail_area);
    render_program_header(frame, app, chunks[0]);
    match app.programa_view {
        ProgramaView::Bloques => render_bloques(frame, app, chunks[1]),
        ProgramaView::Materiales => render_materiales(frame, app, chunks[1]),
    }
}

fn render_program_table(frame: &mut Frame, app: &App, area: Rect) {
    let programas = app.sorted_programas();

    let header = Row::new(["Fecha", "Rama", "Tema", "Estado"])
        .style(styles::title_style())
        .height(1);
    let rows: Vec<Row> = programas
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(format_date(p.fecha)),
                Cell::from(p.rama.label()),
                Cell::from(p.tema.clone()),
                Cell::from(p.estado.label()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Fill(1),
        Constraint::Length(11),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(
            format!(" Programas ({}) ", programas.len()),
            app.focus == Focus::List,
        ))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !programas.is_empty() {
        state.select(Some(app.programas_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

/// `18:00 - 20:30 (150 min)` when a start time is set.
fn horario(programa: &ProgramaSemanal) -> String {
    let total = programa.total_minutes();
    match (programa.hora_inicio.as_deref(), programa.end_time()) {
        (Some(start), Some(end)) => format!("{} - {} ({} min)", start.trim(), end, total),
        _ if total > 0 => format!("{} min", total),
        _ => String::new(),
    }
}

fn render_program_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(programa) = app.selected_programa() else {
        frame.render_widget(
            Paragraph::new(vec![hint("Select a program from the list")]).block(panel(" Programa ", false)),
            area,
        );
        return;
    };

    let lines = vec![
        Line::from(Span::styled(programa.tema.clone(), styles::title_style())),
        field_line("Objetivo", opt(&programa.objetivo), 13),
        field_line("Lugar", opt(&programa.lugar), 13),
        field_line("Horario", horario(programa), 13),
        field_line("Responsable", opt(&programa.responsable), 13),
        field_line("Notas", opt(&programa.observaciones), 13),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(panel(format!(" {} ", format_date(programa.fecha)), false)),
        area,
    );
}

fn render_bloques(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let schedule = app
        .selected_programa()
        .map(|p| p.block_schedule())
        .unwrap_or_default();

    if schedule.is_empty() {
        frame.render_widget(
            Paragraph::new(vec![hint("No blocks yet. Press n with this panel focused.")])
                .block(panel(" Agenda ", focused)),
            area,
        );
        return;
    }

    let header = Row::new(["Hora", "Actividad", "Min", "Responsable"])
        .style(styles::title_style())
        .height(1);
    let rows: Vec<Row> = schedule
        .iter()
        .map(|(hora, bloque)| {
            Row::new(vec![
                Cell::from(Span::styled(hora.clone(), styles::highlight_style())),
                Cell::from(bloque.actividad.clone()),
                Cell::from(format!("{:>3}", bloque.duracion_minutos)),
                Cell::from(opt(&bloque.responsable)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Fill(2),
        Constraint::Length(4),
        Constraint::Fill(1),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(format!(" Agenda ({} bloques) ", schedule.len()), focused))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused {
        state.select(Some(app.detail_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_materiales(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let materiales = app.selected_materiales();
    let bloques = app
        .selected_programa()
        .map(|p| p.bloques.as_slice())
        .unwrap_or_default();

    let rows: Vec<Row> = materiales
        .iter()
        .map(|m| {
            let (mark, mark_style) = styles::check_mark(m.conseguido);
            let bloque = bloques
                .get(m.bloque as usize)
                .map(|b| b.actividad.clone())
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(Span::styled(mark, mark_style)),
                Cell::from(m.material.clone()),
                Cell::from(format!("{:>3}", m.cantidad)),
                Cell::from(bloque),
                Cell::from(opt(&m.responsable)),
            ])
        })
        .collect();

    let conseguidos = materiales.iter().filter(|m| m.conseguido).count();
    let widths = [
        Constraint::Length(3),
        Constraint::Fill(2),
        Constraint::Length(4),
        Constraint::Fill(2),
        Constraint::Fill(1),
    ];
    let table = Table::new(rows, widths)
        .block(
            panel(
                format!(" Materiales {}/{} - [space] conseguido ", conseguidos, materiales.len()),
                focused,
            )
            .title_style(styles::progress_style(conseguidos, materiales.len())),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused && !materiales.is_empty() {
        state.select(Some(app.detail_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoutdesk_core::models::BloquePrograma;

    fn bloque(min: u32) -> BloquePrograma {
        BloquePrograma {
            actividad: "Juego".to_string(),
            duracion_minutos: min,
            ..Default::default()
        }
    }

    #[test]
    fn test_horario_with_start_time() {
        let programa = ProgramaSemanal {
            hora_inicio: Some("15:00".to_string()),
            bloques: vec![bloque(30), bloque(45)],
            ..Default::default()
        };
        assert_eq!(horario(&programa), "15:00 - 16:15 (75 min)");
    }

    #[test]
    fn test_horario_without_start_time() {
        let programa = ProgramaSemanal {
            bloques: vec![bloque(20)],
            ..Default::default()
        };
        assert_eq!(horario(&programa), "20 min");
        assert_eq!(horario(&ProgramaSemanal::default()), "");
    }
}
