use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use scoutdesk_core::validation::FieldKind;

use crate::app::{ActividadView, App, AppState, LoginFocus, ProgramaView, Tab};
use crate::form::FormState;

use super::styles;
use super::tabs::{actividades, comite, dashboard, dirigentes, documentos, patrullas, programas, scouts};

/// Width of the label column in forms.
const FORM_LABEL_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::EditingForm => {
            if let Some(ref form) = app.form {
                render_form_overlay(frame, form);
            }
        }
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  scoutdesk - {}", app.config.group_name());
    let role = format!("{}  [?] Help", app.permisos.rol);

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + role.chars().count() + 2),
        )),
        Span::styled(role, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(
            format!("[{}] {}", i + 1, tab.title()),
            styles::tab_style(app.current_tab == *tab),
        ));
    }

    // Detail sub-views on the right
    let views: Vec<(&str, bool)> = match app.current_tab {
        Tab::Programas => vec![
            (ProgramaView::Bloques.title(), app.programa_view == ProgramaView::Bloques),
            (ProgramaView::Materiales.title(), app.programa_view == ProgramaView::Materiales),
        ],
        Tab::Actividades => ActividadView::ALL
            .iter()
            .map(|v| (v.title(), app.actividad_view == *v))
            .collect(),
        _ => Vec::new(),
    };

    if !views.is_empty() {
        let main_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let views_width: usize = views.iter().map(|(l, _)| l.chars().count()).sum::<usize>()
            + (views.len() - 1) * 3
            + 4;
        let padding = (area.width as usize).saturating_sub(main_width + views_width + 2);
        spans.push(Span::raw(" ".repeat(padding)));
        spans.push(Span::styled("[v] ", styles::muted_style()));
        for (i, (label, selected)) in views.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            spans.push(Span::styled(*label, styles::tab_style(*selected)));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Dashboard => dashboard::render(frame, app, area),
        Tab::Scouts => scouts::render(frame, app, area),
        Tab::Dirigentes => dirigentes::render(frame, app, area),
        Tab::Patrullas => patrullas::render(frame, app, area),
        Tab::Comite => comite::render(frame, app, area),
        Tab::Programas => programas::render(frame, app, area),
        Tab::Actividades => actividades::render(frame, app, area),
        Tab::Documentos => documentos::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (left_text, left_style) = if app.state == AppState::Searching || !app.search_query.is_empty() {
        (format!(" /{} ", app.search_query), styles::search_style())
    } else if let Some(ref msg) = app.status_message {
        let style = if msg.starts_with("Error") || msg.contains("failed") {
            styles::error_style()
        } else {
            styles::highlight_style()
        };
        (format!(" {} ", msg), style)
    } else if app.refreshing {
        (" Updating...".to_string(), styles::muted_style())
    } else {
        (
            format!(" Updated {} ", app.cache_ages.last_updated()),
            styles::muted_style(),
        )
    };

    let right_text = " [n]ew [e]dit [d]elete | [u]pdate | [q]uit ";
    let padding = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(58, 33, frame.area());
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from(Span::styled(
            format!(" scoutdesk {}", env!("CARGO_PKG_VERSION")),
            styles::title_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-8", "Switch tabs"),
        help_line("←/→", "Previous/next tab"),
        help_line("Tab", "Switch focus (list ↔ detail)"),
        help_line("↑/↓ j/k", "Move selection"),
        help_line("PgUp/PgDn", "Scroll a page"),
        help_line("/", "Search"),
        help_line("Esc", "Clear search"),
        Line::from(""),
        Line::from(Span::styled(" Records", styles::highlight_style())),
        help_line("n", "New record in the focused panel"),
        help_line("e / Enter", "Edit selected record"),
        help_line("d", "Delete selected record"),
        help_line("Space", "Toggle item / advance authorization"),
        help_line("v", "Cycle detail view"),
        help_line("a", "Assign patrol to sub-camp"),
        help_line("b", "Register purchase"),
        Line::from(""),
        Line::from(Span::styled(" Scouts and leaders", styles::highlight_style())),
        help_line("s / S", "Cycle sort column / flip order"),
        help_line("x / w", "Export DNGI form as PDF / Word"),
        help_line("X", "Export tab as spreadsheet"),
        Line::from(""),
        Line::from(Span::styled(" Session", styles::highlight_style())),
        help_line("u", "Update data from the backend"),
        help_line("L", "Log in again"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// One input line of the login box.
fn login_field(label: &str, value: String, focused: bool) -> Line<'static> {
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(format!("{:<10}[", label), styles::muted_style()),
        Span::styled(
            format!("{:<24}{}", value, cursor),
            styles::row_style(focused),
        ),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let email: String = {
        let count = app.login_username.chars().count();
        app.login_username.chars().skip(count.saturating_sub(24)).collect()
    };
    let masked = "*".repeat(app.login_password.chars().count().min(24));

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" {}", app.config.group_name()),
            styles::title_style(),
        )),
        Line::from(""),
        login_field("Email:", email, app.login_focus == LoginFocus::Username),
        login_field("Password:", masked, app.login_focus == LoginFocus::Password),
        Line::from(""),
    ];

    let button_focused = app.login_focus == LoginFocus::Button;
    let label = if button_focused { " ▶ Log in ◀ " } else { "   Log in   " };
    lines.push(Line::from(vec![
        Span::raw("               ["),
        Span::styled(label, styles::row_style(button_focused)),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .title(" Log in ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn confirm_lines(question: String, confirm: &'static str) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", confirm), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    let lines = confirm_lines("Are you sure you want to quit?".to_string(), "quit");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let Some(ref pending) = app.pending_delete else {
        return;
    };
    let area = centered_rect_fixed(56, 7, frame.area());
    frame.render_widget(Clear, area);

    let label: String = pending.label.chars().take(36).collect();
    let block = Block::default()
        .title(" Delete ")
        .title_style(styles::error_style())
        .borders(Borders::ALL)
        .border_style(styles::error_style());
    let lines = confirm_lines(format!("Delete {}?", label), "delete");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_form_overlay(frame: &mut Frame, form: &FormState) {
    let fields = form.fields();
    let extra = form.errors.len() + usize::from(form.submit_error.is_some()) * 2;
    let height = (fields.len() + extra + 5) as u16;
    let area = centered_rect_fixed(72, height, frame.area());
    frame.render_widget(Clear, area);

    let value_width = (area.width as usize).saturating_sub(FORM_LABEL_WIDTH + 6);
    let mut lines = vec![Line::from("")];

    for (i, spec) in fields.iter().enumerate() {
        let focused = i == form.focus;
        let value = form.values.get(i).map(|s| s.as_str()).unwrap_or_default();
        let marker = if spec.required { "*" } else { " " };

        let shown: String = {
            let count = value.chars().count();
            value.chars().skip(count.saturating_sub(value_width.saturating_sub(4))).collect()
        };
        let decorated = match spec.kind {
            FieldKind::Choice(_) | FieldKind::Bool if focused => format!("◀ {} ▶", shown),
            _ if focused => format!("{}▌", shown),
            _ => shown,
        };

        lines.push(Line::from(vec![
            Span::styled(
                format!(" {}{:<width$}", marker, spec.label, width = FORM_LABEL_WIDTH),
                if focused { styles::highlight_style() } else { styles::muted_style() },
            ),
            Span::styled(decorated, styles::row_style(focused)),
        ]));

        if let Some(error) = form.errors.get(spec.key) {
            lines.push(Line::from(Span::styled(
                format!("  {:<width$}{}", "", error, width = FORM_LABEL_WIDTH),
                styles::error_style(),
            )));
        }
    }

    if let Some(ref error) = form.submit_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Tab/↓ next · ←/→ options · Enter save · Esc cancel",
        styles::muted_style(),
    )));

    let title = if form.is_edit() {
        format!(" Edit {} ", form.target.title())
    } else {
        format!(" New {} ", form.target.title())
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
