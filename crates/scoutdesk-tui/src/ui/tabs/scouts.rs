use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use scoutdesk_core::models::{Scout, ScoutSortColumn};
use scoutdesk_core::utils::{format_date, format_phone};

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::ui::tabs::{field_line, hint, opt, panel, split_panels};

const LABEL_WIDTH: usize = 16;

fn sort_label(column: ScoutSortColumn) -> &'static str {
    match column {
        ScoutSortColumn::Name => "nombre",
        ScoutSortColumn::Rama => "rama",
        ScoutSortColumn::Patrulla => "patrulla",
        ScoutSortColumn::Edad => "edad",
        ScoutSortColumn::Estado => "estado",
    }
}

/// Render the Scouts tab: sortable roster with details and relatives
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_panels(area, 55);
    render_scout_table(frame, app, list_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Length(9)])
        .split(detail_area);
    render_scout_detail(frame, app, chunks[0]);
    render_familiares(frame, app, chunks[1]);
}

fn render_scout_table(frame: &mut Frame, app: &App, area: Rect) {
    let scouts = app.sorted_scouts();
    let today = app.today();
    let focused = app.focus == Focus::List;

    let sort_indicator = |col: ScoutSortColumn| {
        if app.scout_sort_column == col {
            if app.scout_sort_ascending { " ▲" } else { " ▼" }
        } else {
            ""
        }
    };

    let header = Row::new([
        Cell::from(format!("Nombre{}", sort_indicator(ScoutSortColumn::Name))),
        Cell::from(format!("Rama{}", sort_indicator(ScoutSortColumn::Rama))),
        Cell::from(format!("Patrulla{}", sort_indicator(ScoutSortColumn::Patrulla))),
        Cell::from(format!("Edad{}", sort_indicator(ScoutSortColumn::Edad))),
        Cell::from(format!("Estado{}", sort_indicator(ScoutSortColumn::Estado))),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = scouts
        .iter()
        .map(|scout| {
            Row::new(vec![
                Cell::from(scout.display_name()),
                Cell::from(scout.rama.label()),
                Cell::from(app.data.patrulla_name(scout.patrulla_id)),
                Cell::from(format!("{:>3}", scout.edad_str(today))),
                Cell::from(scout.estado.label()),
            ])
            .style(styles::membership_style(scout.estado))
        })
        .collect();

    let widths = [
        Constraint::Percentage(40),
        Constraint::Fill(1),
        Constraint::Fill(2),
        Constraint::Length(6),
        Constraint::Length(9),
    ];

    let title = format!(
        " Scouts ({}) - [s]ort: {} ",
        scouts.len(),
        sort_label(app.scout_sort_column)
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(title, focused))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !scouts.is_empty() {
        state.select(Some(app.scouts_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn detail_lines(app: &App, scout: &Scout) -> Vec<Line<'static>> {
    let today = app.today();
    let mut lines = vec![
        Line::from(Span::styled(scout.full_name(), styles::title_style())),
        Line::from(""),
    ];

    let documento = match (&scout.tipo_documento, &scout.numero_documento) {
        (Some(tipo), Some(numero)) => format!("{} {}", tipo, numero),
        (None, Some(numero)) => numero.clone(),
        _ => String::new(),
    };
    let nacimiento = match scout.fecha_nacimiento {
        Some(_) => format!(
            "{} ({} años)",
            format_date(scout.fecha_nacimiento),
            scout.edad_str(today)
        ),
        None => String::new(),
    };

    lines.push(field_line("Rama", scout.rama.label(), LABEL_WIDTH));
    lines.push(field_line("Patrulla", app.data.patrulla_name(scout.patrulla_id), LABEL_WIDTH));
    lines.push(field_line("Estado", scout.estado.label(), LABEL_WIDTH));
    lines.push(field_line("Código", opt(&scout.codigo_asociado), LABEL_WIDTH));
    lines.push(field_line("Documento", documento, LABEL_WIDTH));
    lines.push(field_line("Nacimiento", nacimiento, LABEL_WIDTH));
    lines.push(field_line("Ingreso", format_date(scout.fecha_ingreso), LABEL_WIDTH));
    lines.push(Line::from(""));
    lines.push(field_line(
        "Celular",
        scout.contact_phone().map(format_phone).unwrap_or_default(),
        LABEL_WIDTH,
    ));
    lines.push(field_line("Email", opt(&scout.email), LABEL_WIDTH));
    lines.push(field_line("Dirección", opt(&scout.direccion), LABEL_WIDTH));
    lines.push(field_line("Colegio", opt(&scout.colegio), LABEL_WIDTH));

    let alergias = opt(&scout.alergias);
    lines.push(Line::from(""));
    lines.push(field_line("Grupo sanguíneo", opt(&scout.grupo_sanguineo), LABEL_WIDTH));
    lines.push(field_line("Seguro", opt(&scout.seguro_medico), LABEL_WIDTH));
    if alergias.trim().is_empty() {
        lines.push(field_line("Alergias", "", LABEL_WIDTH));
    } else {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<LABEL_WIDTH$}", "Alergias:"), styles::muted_style()),
            Span::styled(alergias, styles::error_style()),
        ]));
    }
    lines
}

fn render_scout_detail(frame: &mut Frame, app: &App, area: Rect) {
    let (title, lines) = match app.selected_scout() {
        Some(scout) => (
            " Ficha [x] PDF [w] Word ".to_string(),
            detail_lines(app, scout),
        ),
        None => (" Ficha ".to_string(), vec![hint("Select a scout from the list")]),
    };
    frame.render_widget(Paragraph::new(lines).block(panel(title, false)), area);
}

fn render_familiares(frame: &mut Frame, app: &App, area: Rect) {
    let familiares = app.selected_familiares();
    let focused = app.focus == Focus::Detail;

    let rows: Vec<Row> = familiares
        .iter()
        .map(|f| {
            let apoderado = if f.es_apoderado { "apoderado" } else { "" };
            Row::new(vec![
                Cell::from(f.full_name()),
                Cell::from(f.parentesco.to_lowercase()),
                Cell::from(f.celular.as_deref().map(format_phone).unwrap_or_default()),
                Cell::from(Span::styled(apoderado, styles::highlight_style())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Fill(1),
        Constraint::Length(13),
        Constraint::Length(9),
    ];
    let table = Table::new(rows, widths)
        .block(panel(format!(" Familiares ({}) ", familiares.len()), focused))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused && !familiares.is_empty() {
        state.select(Some(app.detail_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
