use ratatui::style::{Color, Modifier, Style};

use scoutdesk_core::models::{EstadoAutorizacion, EstadoMiembro};

// Color palette
pub const PRIMARY: Color = Color::Rgb(46, 110, 160);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(200, 160, 60);
pub const ERROR: Color = Color::Rgb(200, 70, 70);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(44, 52, 68);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn search_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Row style for a list entry, selected or not.
pub fn row_style(selected: bool) -> Style {
    if selected {
        selected_style()
    } else {
        list_item_style()
    }
}

/// Inactive and withdrawn members are dimmed.
pub fn membership_style(estado: EstadoMiembro) -> Style {
    match estado {
        EstadoMiembro::Activo => list_item_style(),
        EstadoMiembro::Inactivo => muted_style(),
        EstadoMiembro::Retirado => error_style(),
    }
}

pub fn authorization_style(estado: EstadoAutorizacion) -> Style {
    match estado {
        EstadoAutorizacion::Pendiente => muted_style(),
        EstadoAutorizacion::Enviada => highlight_style(),
        EstadoAutorizacion::Firmada => success_style(),
    }
}

/// Green when done, amber when under way, grey when not started.
pub fn progress_style(done: usize, total: usize) -> Style {
    if total > 0 && done >= total {
        success_style()
    } else if done > 0 {
        highlight_style()
    } else {
        muted_style()
    }
}

/// Check mark column for checklist rows.
pub fn check_mark(done: bool) -> (&'static str, Style) {
    if done {
        ("[x]", success_style())
    } else {
        ("[ ]", muted_style())
    }
}
