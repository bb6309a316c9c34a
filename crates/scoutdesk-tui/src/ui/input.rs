//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Overlays
//! (login, help, forms, confirmations, search) take the key first; the
//! rest fall through to global keys and then to tab-specific keys.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use scoutdesk_core::export::ExportFormat;

use crate::app::{
    can_add_password_char, can_add_username_char, App, AppState, Focus, LoginFocus, Tab,
    PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::EditingForm => {
            handle_form_input(app, key).await;
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            handle_delete_input(app, key).await;
            return Ok(false);
        }
        AppState::Searching => {
            handle_search_input(app, key);
            return Ok(false);
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(tab) = Tab::from_digit(c) {
                app.switch_tab(tab);
            }
        }
        KeyCode::Left => app.switch_tab(app.current_tab.prev()),
        KeyCode::Right => app.switch_tab(app.current_tab.next()),
        KeyCode::Tab => {
            if app.has_detail_list() {
                app.focus = match app.focus {
                    Focus::List => Focus::Detail,
                    Focus::Detail => Focus::List,
                };
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        KeyCode::Char('u') => app.refresh_all_background(),
        KeyCode::Char('L') => app.start_login(),
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
            app.search_query.clear();
        }
        KeyCode::Esc => {
            app.search_query.clear();
            app.focus = Focus::List;
        }
        KeyCode::Char('n') => app.open_new_form(),
        KeyCode::Char('e') | KeyCode::Enter => app.open_edit_form(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char(' ') => app.toggle_selected().await,
        _ => match app.current_tab {
            Tab::Scouts => handle_scouts_input(app, key),
            Tab::Dirigentes => handle_dirigentes_input(app, key),
            Tab::Programas => handle_programas_input(app, key),
            Tab::Actividades => handle_actividades_input(app, key),
            Tab::Dashboard | Tab::Patrullas | Tab::Comite | Tab::Documentos => {}
        },
    }

    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.search_query.clear();
        }
        KeyCode::Enter => {
            // Keep the query as an active filter
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.focus = Focus::List;
            app.select_first();
        }
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password => app.login_focus = LoginFocus::Button,
            LoginFocus::Button => {
                // A failed attempt leaves login_error set and the overlay open
                let _ = app.attempt_login().await;
                if app.state == AppState::Normal {
                    app.refresh_all_background();
                }
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

async fn handle_form_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.cancel_form();
            return;
        }
        KeyCode::Enter => {
            app.submit_form().await;
            return;
        }
        _ => {}
    }

    let Some(form) = app.form.as_mut() else {
        app.state = AppState::Normal;
        return;
    };
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Left => {
            form.cycle_option(false);
        }
        KeyCode::Right => {
            form.cycle_option(true);
        }
        KeyCode::Backspace => form.pop_char(),
        KeyCode::Char(c) => form.push_char(c),
        _ => {}
    }
}

async fn handle_delete_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete().await,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
        _ => {}
    }
}

fn handle_scouts_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('s') => app.toggle_scout_sort(app.scout_sort_column.next()),
        KeyCode::Char('S') => app.toggle_scout_sort(app.scout_sort_column),
        KeyCode::Char('x') => app.export_form(ExportFormat::Pdf),
        KeyCode::Char('w') => app.export_form(ExportFormat::Docx),
        KeyCode::Char('X') => app.export_sheet(),
        _ => {}
    }
}

fn handle_dirigentes_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('x') => app.export_form(ExportFormat::Pdf),
        KeyCode::Char('w') => app.export_form(ExportFormat::Docx),
        KeyCode::Char('X') => app.export_sheet(),
        _ => {}
    }
}

fn handle_programas_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('v') {
        app.programa_view = app.programa_view.next();
        app.detail_selection = 0;
    }
}

fn handle_actividades_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('v') => {
            app.actividad_view = app.actividad_view.next();
            app.detail_selection = 0;
        }
        KeyCode::Char('V') => {
            app.actividad_view = app.actividad_view.prev();
            app.detail_selection = 0;
        }
        KeyCode::Char('a') => app.open_assign_form(),
        KeyCode::Char('b') => app.open_purchase_form(),
        KeyCode::Char('X') => app.export_sheet(),
        _ => {}
    }
}
