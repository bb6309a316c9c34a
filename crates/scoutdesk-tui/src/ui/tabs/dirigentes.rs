use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use scoutdesk_core::models::Dirigente;
use scoutdesk_core::utils::{format_date, format_phone};

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::ui::tabs::{field_line, hint, opt, panel, section, split_panels};

const LABEL_WIDTH: usize = 14;

/// Render the Dirigentes tab
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let (list_area, detail_area) = split_panels(area, 55);
    render_table(frame, app, list_area);
    render_detail(frame, app, detail_area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let dirigentes = app.sorted_dirigentes();

    let header = Row::new(["Nombre", "Cargo", "Formación", "Estado"])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = dirigentes
        .iter()
        .map(|d| {
            Row::new(vec![
                Cell::from(d.display_name()),
                Cell::from(d.cargo_display()),
                Cell::from(nivel_label(d)),
                Cell::from(d.estado.label()),
            ])
            .style(styles::membership_style(d.estado))
        })
        .collect();

    let widths = [
        Constraint::Percentage(38),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Length(9),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(
            format!(" Dirigentes ({}) ", dirigentes.len()),
            app.focus == Focus::List,
        ))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !dirigentes.is_empty() {
        state.select(Some(app.dirigentes_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

/// Training level as words: `INSIGNIA_MADERA` reads "insignia madera".
fn nivel_label(d: &Dirigente) -> String {
    d.nivel_formacion
        .as_deref()
        .map(|n| n.replace('_', " ").to_lowercase())
        .unwrap_or_default()
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(d) = app.selected_dirigente() else {
        frame.render_widget(
            Paragraph::new(vec![hint("Select a leader from the list")]).block(panel(" Ficha ", false)),
            area,
        );
        return;
    };

    let documento = match &d.tipo_documento {
        Some(tipo) => format!("{} {}", tipo, d.numero_documento),
        None => d.numero_documento.clone(),
    };

    let lines = vec![
        Line::from(Span::styled(d.full_name(), styles::title_style())),
        Line::from(Span::styled(d.cargo_display(), styles::highlight_style())),
        Line::from(""),
        section("Registro"),
        field_line("Documento", documento, LABEL_WIDTH),
        field_line("Código", opt(&d.codigo_asociado), LABEL_WIDTH),
        field_line("Formación", nivel_label(d), LABEL_WIDTH),
        field_line("Ingreso", format_date(d.fecha_ingreso), LABEL_WIDTH),
        field_line("Estado", d.estado.label(), LABEL_WIDTH),
        Line::from(""),
        section("Datos personales"),
        field_line("Nacimiento", format_date(d.fecha_nacimiento), LABEL_WIDTH),
        field_line("Nacionalidad", opt(&d.nacionalidad), LABEL_WIDTH),
        field_line("Profesión", opt(&d.profesion), LABEL_WIDTH),
        field_line("Trabajo", opt(&d.centro_laboral), LABEL_WIDTH),
        Line::from(""),
        section("Contacto"),
        field_line(
            "Celular",
            d.celular.as_deref().map(format_phone).unwrap_or_default(),
            LABEL_WIDTH,
        ),
        field_line("Email", opt(&d.email), LABEL_WIDTH),
        field_line("Dirección", opt(&d.direccion), LABEL_WIDTH),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(panel(" Ficha [x] PDF [w] Word ", false)),
        area,
    );
}
