//! Application state management for scoutdesk.
//!
//! This module contains the core `App` struct that manages all application state,
//! including UI state, the table store, session management, and background task
//! coordination. Record actions (save, delete, toggles, exports) live in
//! `actions.rs`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use scoutdesk_core::api::{friendly_message, ApiClient, ApiError, GeocodeClient};
use scoutdesk_core::auth::{Accion, CredentialStore, Permisos, Session};
use scoutdesk_core::cache::CacheAges;
use scoutdesk_core::config::{ENV_API_KEY, ENV_PASSWORD};
use scoutdesk_core::models::{
    ActividadExterior, AsignacionSubCampo, BloquePrograma, CompraRegistro, Dirigente,
    DocumentoAutorizacion, FamiliarScout, ItemLogistica, ItemPresupuesto, MaterialBloque,
    MiembroComite, Patrulla, ProgramaSemanal, Scout, ScoutSortColumn, SubCampo,
};
use scoutdesk_core::utils::{cmp_ignore_case, contains_ignore_case};
use scoutdesk_core::{BudgetSummary, CacheManager, Config, DashboardStats};

use crate::data::{of_actividad, Data, RefreshResult, Stored};
use crate::form::FormState;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for the email input.
const MAX_USERNAME_LENGTH: usize = 80;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// How long a toast stays in the status bar.
const STATUS_TTL: Duration = Duration::from_secs(5);

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Scouts,
    Dirigentes,
    Patrullas,
    Comite,
    Programas,
    Actividades,
    Documentos,
}

impl Tab {
    pub const ALL: [Tab; 8] = [
        Tab::Dashboard,
        Tab::Scouts,
        Tab::Dirigentes,
        Tab::Patrullas,
        Tab::Comite,
        Tab::Programas,
        Tab::Actividades,
        Tab::Documentos,
    ];

    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Inicio",
            Tab::Scouts => "Scouts",
            Tab::Dirigentes => "Dirigentes",
            Tab::Patrullas => "Patrullas",
            Tab::Comite => "Comité",
            Tab::Programas => "Programas",
            Tab::Actividades => "Actividades",
            Tab::Documentos => "Autorizaciones",
        }
    }

    fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }

    /// Tab bound to a number key, `'1'` being the first.
    pub fn from_digit(c: char) -> Option<Self> {
        let n = c.to_digit(10)? as usize;
        n.checked_sub(1).and_then(|i| Tab::ALL.get(i).copied())
    }
}

/// Sub-view of the program detail panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramaView {
    Bloques,
    Materiales,
}

impl ProgramaView {
    pub fn title(&self) -> &'static str {
        match self {
            ProgramaView::Bloques => "Agenda",
            ProgramaView::Materiales => "Materiales",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ProgramaView::Bloques => ProgramaView::Materiales,
            ProgramaView::Materiales => ProgramaView::Bloques,
        }
    }
}

/// Sub-view of the activity detail panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActividadView {
    Presupuesto,
    Compras,
    Logistica,
    Subcampos,
}

impl ActividadView {
    pub const ALL: [ActividadView; 4] = [
        ActividadView::Presupuesto,
        ActividadView::Compras,
        ActividadView::Logistica,
        ActividadView::Subcampos,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ActividadView::Presupuesto => "Presupuesto",
            ActividadView::Compras => "Compras",
            ActividadView::Logistica => "Logística",
            ActividadView::Subcampos => "Subcampos",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ActividadView::Presupuesto => ActividadView::Compras,
            ActividadView::Compras => ActividadView::Logistica,
            ActividadView::Logistica => ActividadView::Subcampos,
            ActividadView::Subcampos => ActividadView::Presupuesto,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ActividadView::Presupuesto => ActividadView::Subcampos,
            ActividadView::Compras => ActividadView::Presupuesto,
            ActividadView::Logistica => ActividadView::Compras,
            ActividadView::Subcampos => ActividadView::Logistica,
        }
    }
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingForm,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Kind of row a delete confirmation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Scout,
    Familiar,
    Dirigente,
    Comite,
    Patrulla,
    SubCampo,
    Programa,
    /// Block `index` of the program whose id is the pending delete's id.
    Bloque { index: usize },
    Material,
    Actividad,
    Presupuesto,
    Logistica,
    Compra,
    Documento,
}

/// A delete waiting for the user's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub kind: RecordKind,
    pub id: i64,
    pub label: String,
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub api: ApiClient,
    pub geocoder: Option<GeocodeClient>,
    pub cache: CacheManager,
    pub permisos: Permisos,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub search_query: String,
    pub scout_sort_column: ScoutSortColumn,
    pub scout_sort_ascending: bool,
    pub programa_view: ProgramaView,
    pub actividad_view: ActividadView,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Selection indices
    pub scouts_selection: usize,
    pub dirigentes_selection: usize,
    pub patrullas_selection: usize,
    pub comite_selection: usize,
    pub programas_selection: usize,
    /// Shared by the Actividades and Autorizaciones tabs.
    pub actividades_selection: usize,
    pub detail_selection: usize,

    // Modals
    pub form: Option<FormState>,
    pub pending_delete: Option<PendingDelete>,

    // Table store
    pub data: Data,

    // Background task channel
    refresh_rx: Option<mpsc::Receiver<RefreshResult>>,
    refresh_tx: mpsc::Sender<RefreshResult>,
    pub refreshing: bool,

    // Status message (toast)
    pub status_message: Option<String>,
    status_set_at: Option<Instant>,

    // Cache ages for status bar
    pub cache_ages: CacheAges,
}

impl App {
    /// Create a new application instance
    pub async fn new() -> Result<Self> {
        debug!("App::new() starting");
        let mut config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        config.apply_env();

        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        // Load session from disk if it exists
        let mut session = Session::new(cache_dir.clone());
        let load_result = session.load();
        debug!(?load_result, has_data = session.data.is_some(), "Session loaded");

        let api_key = resolve_api_key()?;
        let mut api = ApiClient::new(config.backend_url()?, &api_key)?;
        if let Some(token) = session.token() {
            api.set_token(token.to_string());
            debug!("Token set on API client");
        }

        let geocoder = match GeocodeClient::new(config.geocode_url()) {
            Ok(g) => Some(g),
            Err(e) => {
                warn!(error = %e, "Geocoding disabled");
                None
            }
        };

        let cache = CacheManager::new(cache_dir)?;
        let permisos = match cache.load_permisos() {
            Ok(Some(cached)) => cached.data,
            _ => Permisos::default(),
        };

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_username = config.last_username.clone().unwrap_or_default();
        let login_password = std::env::var(ENV_PASSWORD).unwrap_or_default();

        Ok(Self {
            config,
            session,
            api,
            geocoder,
            cache,
            permisos,

            state: AppState::Normal,
            current_tab: Tab::Dashboard,
            focus: Focus::List,
            search_query: String::new(),
            scout_sort_column: ScoutSortColumn::Name,
            scout_sort_ascending: true,
            programa_view: ProgramaView::Bloques,
            actividad_view: ActividadView::Presupuesto,

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,

            scouts_selection: 0,
            dirigentes_selection: 0,
            patrullas_selection: 0,
            comite_selection: 0,
            programas_selection: 0,
            actividades_selection: 0,
            detail_selection: 0,

            form: None,
            pending_delete: None,

            data: Data::default(),

            refresh_rx: Some(rx),
            refresh_tx: tx,
            refreshing: false,

            status_message: None,
            status_set_at: None,
            cache_ages: Default::default(),
        })
    }

    pub fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Check if the user is authenticated with a valid session
    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let username = self.login_username.trim().to_string();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return Err(anyhow::anyhow!("Email and password required"));
        }

        self.login_error = None;

        match self.api.authenticate(&username, &password).await {
            Ok(session_data) => {
                if let Err(e) = CredentialStore::store(&username, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.api.set_token(session_data.token.clone());
                self.session.update(session_data);
                if let Err(e) = self.session.save() {
                    warn!(error = %e, "Failed to save session");
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!("Login successful");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(login_error_message(&e));
                Err(e)
            }
        }
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
        if self.login_password.is_empty() && !self.login_username.is_empty() {
            if let Ok(stored) = CredentialStore::get_password(&self.login_username) {
                self.login_password = stored;
                self.login_focus = LoginFocus::Button;
            }
        }
    }

    // =========================================================================
    // Permissions and status
    // =========================================================================

    /// Check a permission flag, showing a toast when it is off.
    pub fn allowed(&mut self, accion: Accion) -> bool {
        match self.permisos.check(accion) {
            Ok(()) => true,
            Err(denied) => {
                self.set_status(denied.to_string());
                false
            }
        }
    }

    /// Show a transient message in the status bar.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_set_at = Some(Instant::now());
    }

    /// Show a failed operation as a toast.
    pub fn report_error(&mut self, context: &str, err: &anyhow::Error) {
        error!(error = ?err, "{}", context);
        self.set_status(format!("{}: {}", context, friendly_message(err)));
    }

    /// Drop the toast once it has been shown long enough.
    pub fn expire_status(&mut self) {
        if let Some(set_at) = self.status_set_at {
            if set_at.elapsed() >= STATUS_TTL {
                self.status_message = None;
                self.status_set_at = None;
            }
        }
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    fn load_table<T: Stored>(&mut self) {
        match self.cache.load_rows::<T>() {
            Ok(Some(cached)) => *T::rows_mut(&mut self.data) = cached.data,
            Ok(None) => {}
            Err(e) => warn!(error = %e, table = T::TABLE, "Failed to read cached table"),
        }
    }

    /// Load all tables from cache
    pub fn load_from_cache(&mut self) {
        self.load_table::<Scout>();
        self.load_table::<FamiliarScout>();
        self.load_table::<Dirigente>();
        self.load_table::<MiembroComite>();
        self.load_table::<Patrulla>();
        self.load_table::<SubCampo>();
        self.load_table::<AsignacionSubCampo>();
        self.load_table::<ProgramaSemanal>();
        self.load_table::<MaterialBloque>();
        self.load_table::<ActividadExterior>();
        self.load_table::<ItemPresupuesto>();
        self.load_table::<ItemLogistica>();
        self.load_table::<CompraRegistro>();
        self.load_table::<DocumentoAutorizacion>();
        self.cache_ages = self.cache.get_cache_ages();
    }

    /// Check if any cache data is stale
    pub fn is_cache_stale(&self) -> bool {
        self.cache.any_stale()
    }

    /// Replace a table in the store and write it to the cache.
    pub fn store<T: Stored>(&mut self, rows: Vec<T>) {
        if let Err(e) = self.cache.save_rows(&rows) {
            warn!(error = %e, table = T::TABLE, "Failed to cache table");
        }
        *T::rows_mut(&mut self.data) = rows;
        self.cache_ages = self.cache.get_cache_ages();
    }

    /// Write the current copy of a table to the cache after a local edit.
    pub fn persist<T: Stored>(&mut self) {
        if let Err(e) = self.cache.save_rows(T::rows(&self.data)) {
            warn!(error = %e, table = T::TABLE, "Failed to cache table");
        }
    }

    // =========================================================================
    // Background Data Refresh
    // =========================================================================

    /// Spawn a background task to refresh all tables
    pub fn refresh_all_background(&mut self) {
        if self.refreshing {
            debug!("Refresh already running");
            return;
        }
        info!("Starting background refresh of all data");

        let Some(token) = self.session.token() else {
            warn!("No token available for refresh");
            self.start_login();
            return;
        };
        let api = self.api.with_token(token.to_string());
        let user_id = self.session.user_id().map(str::to_string);
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            Self::execute_background_refresh(tx, api, user_id).await;
        });

        self.refreshing = true;
    }

    /// Helper to send refresh results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send refresh result - channel closed");
        }
    }

    /// Fetch every table concurrently and report each result over `tx`.
    async fn execute_background_refresh(
        tx: mpsc::Sender<RefreshResult>,
        api: ApiClient,
        user_id: Option<String>,
    ) {
        info!("Background refresh task started");

        let permisos = async {
            match user_id.as_deref() {
                Some(id) => api.fetch_permisos(id).await,
                None => Ok(Permisos::default()),
            }
        };

        let (
            scouts,
            familiares,
            dirigentes,
            comite,
            patrullas,
            subcampos,
            asignaciones,
            programas,
            materiales,
            actividades,
            presupuesto,
            logistica,
            compras,
            documentos,
            permisos,
        ) = tokio::join!(
            api.list::<Scout>(),
            api.list::<FamiliarScout>(),
            api.list::<Dirigente>(),
            api.list::<MiembroComite>(),
            api.list::<Patrulla>(),
            api.list::<SubCampo>(),
            api.list::<AsignacionSubCampo>(),
            api.list::<ProgramaSemanal>(),
            api.list::<MaterialBloque>(),
            api.list::<ActividadExterior>(),
            api.list::<ItemPresupuesto>(),
            api.list::<ItemLogistica>(),
            api.list::<CompraRegistro>(),
            api.list::<DocumentoAutorizacion>(),
            permisos,
        );

        Self::send_fetch_result(&tx, "Scouts", scouts, RefreshResult::Scouts).await;
        Self::send_fetch_result(&tx, "Familiares", familiares, RefreshResult::Familiares).await;
        Self::send_fetch_result(&tx, "Dirigentes", dirigentes, RefreshResult::Dirigentes).await;
        Self::send_fetch_result(&tx, "Comité", comite, RefreshResult::Comite).await;
        Self::send_fetch_result(&tx, "Patrullas", patrullas, RefreshResult::Patrullas).await;
        Self::send_fetch_result(&tx, "Subcampos", subcampos, RefreshResult::SubCampos).await;
        Self::send_fetch_result(&tx, "Asignaciones", asignaciones, RefreshResult::Asignaciones).await;
        Self::send_fetch_result(&tx, "Programas", programas, RefreshResult::Programas).await;
        Self::send_fetch_result(&tx, "Materiales", materiales, RefreshResult::Materiales).await;
        Self::send_fetch_result(&tx, "Actividades", actividades, RefreshResult::Actividades).await;
        Self::send_fetch_result(&tx, "Presupuesto", presupuesto, RefreshResult::Presupuesto).await;
        Self::send_fetch_result(&tx, "Logística", logistica, RefreshResult::Logistica).await;
        Self::send_fetch_result(&tx, "Compras", compras, RefreshResult::Compras).await;
        Self::send_fetch_result(&tx, "Autorizaciones", documentos, RefreshResult::Documentos).await;
        Self::send_fetch_result(&tx, "Perfil", permisos, RefreshResult::Permisos).await;

        info!("Background refresh complete");
        Self::send_result(&tx, RefreshResult::RefreshComplete).await;
    }

    /// Helper to send a successful fetch result or an error
    async fn send_fetch_result<T, F>(
        tx: &mpsc::Sender<RefreshResult>,
        name: &str,
        result: Result<T>,
        wrapper: F,
    ) where
        F: FnOnce(T) -> RefreshResult,
    {
        match result {
            Ok(data) => {
                debug!("{} fetched successfully", name);
                Self::send_result(tx, wrapper(data)).await;
            }
            Err(e) => {
                error!(error = ?e, "{} fetch failed", name);
                let message = format!("{}: {}", name, friendly_message(&e));
                Self::send_result(tx, RefreshResult::Error(message)).await;
            }
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        // Collect all pending results first to avoid borrow conflicts
        let results: Vec<RefreshResult> = match self.refresh_rx {
            Some(ref mut rx) => {
                let mut results = Vec::new();
                while let Ok(result) = rx.try_recv() {
                    results.push(result);
                }
                results
            }
            None => Vec::new(),
        };

        for result in results {
            self.process_refresh_result(result);
        }
        self.expire_status();
    }

    /// Store one refresh result and cache it.
    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Scouts(rows) => self.store(rows),
            RefreshResult::Familiares(rows) => self.store(rows),
            RefreshResult::Dirigentes(rows) => self.store(rows),
            RefreshResult::Comite(rows) => self.store(rows),
            RefreshResult::Patrullas(rows) => self.store(rows),
            RefreshResult::SubCampos(rows) => self.store(rows),
            RefreshResult::Asignaciones(rows) => self.store(rows),
            RefreshResult::Programas(rows) => self.store(rows),
            RefreshResult::Materiales(rows) => self.store(rows),
            RefreshResult::Actividades(rows) => self.store(rows),
            RefreshResult::Presupuesto(rows) => self.store(rows),
            RefreshResult::Logistica(rows) => self.store(rows),
            RefreshResult::Compras(rows) => self.store(rows),
            RefreshResult::Documentos(rows) => self.store(rows),
            RefreshResult::Permisos(permisos) => {
                if let Err(e) = self.cache.save_permisos(&permisos) {
                    warn!(error = %e, "Failed to cache permissions");
                }
                self.permisos = permisos;
            }
            RefreshResult::RefreshComplete => {
                self.refreshing = false;
                self.clamp_selections();
            }
            RefreshResult::Error(msg) => {
                self.set_status(msg);
            }
        }
    }

    /// Refetch one table after a write and store it.
    pub async fn reload<T: Stored>(&mut self) -> Result<()> {
        let rows = self
            .api
            .list::<T>()
            .await
            .with_context(|| format!("Failed to reload {}", T::TABLE))?;
        self.store(rows);
        self.clamp_selections();
        Ok(())
    }

    // =========================================================================
    // Data Access Methods
    // =========================================================================

    pub fn sorted_scouts(&self) -> Vec<&Scout> {
        sort_scouts(
            &self.data,
            self.scout_sort_column,
            self.scout_sort_ascending,
            &self.search_query,
            self.today(),
        )
    }

    pub fn selected_scout(&self) -> Option<&Scout> {
        self.sorted_scouts().get(self.scouts_selection).copied()
    }

    pub fn selected_familiares(&self) -> Vec<&FamiliarScout> {
        match self.selected_scout().and_then(|s| s.id) {
            Some(id) => self.data.familiares_of(id),
            None => Vec::new(),
        }
    }

    pub fn sorted_dirigentes(&self) -> Vec<&Dirigente> {
        let mut rows: Vec<&Dirigente> = self
            .data
            .dirigentes
            .iter()
            .filter(|d| {
                self.search_query.is_empty()
                    || contains_ignore_case(&d.full_name(), &self.search_query)
                    || contains_ignore_case(&d.cargo_display(), &self.search_query)
            })
            .collect();
        rows.sort_by(|a, b| {
            cmp_ignore_case(&a.apellidos, &b.apellidos)
                .then_with(|| cmp_ignore_case(&a.nombres, &b.nombres))
        });
        rows
    }

    pub fn selected_dirigente(&self) -> Option<&Dirigente> {
        self.sorted_dirigentes().get(self.dirigentes_selection).copied()
    }

    pub fn sorted_comite(&self) -> Vec<&MiembroComite> {
        let mut rows: Vec<&MiembroComite> = self
            .data
            .comite
            .iter()
            .filter(|m| {
                self.search_query.is_empty()
                    || contains_ignore_case(&m.full_name(), &self.search_query)
            })
            .collect();
        rows.sort_by(|a, b| {
            b.activo
                .cmp(&a.activo)
                .then_with(|| a.cargo_order().cmp(&b.cargo_order()))
                .then_with(|| cmp_ignore_case(&a.apellidos, &b.apellidos))
        });
        rows
    }

    pub fn selected_comite(&self) -> Option<&MiembroComite> {
        self.sorted_comite().get(self.comite_selection).copied()
    }

    pub fn sorted_patrullas(&self) -> Vec<&Patrulla> {
        let mut rows: Vec<&Patrulla> = self
            .data
            .patrullas
            .iter()
            .filter(|p| {
                self.search_query.is_empty() || contains_ignore_case(&p.nombre, &self.search_query)
            })
            .collect();
        rows.sort_by(|a, b| a.rama.cmp(&b.rama).then_with(|| cmp_ignore_case(&a.nombre, &b.nombre)));
        rows
    }

    pub fn selected_patrulla(&self) -> Option<&Patrulla> {
        self.sorted_patrullas().get(self.patrullas_selection).copied()
    }

    pub fn patrulla_members(&self) -> Vec<&Scout> {
        match self.selected_patrulla() {
            Some(p) => p.members(&self.data.scouts),
            None => Vec::new(),
        }
    }

    /// Programs, newest first.
    pub fn sorted_programas(&self) -> Vec<&ProgramaSemanal> {
        let mut rows: Vec<&ProgramaSemanal> = self
            .data
            .programas
            .iter()
            .filter(|p| {
                self.search_query.is_empty() || contains_ignore_case(&p.tema, &self.search_query)
            })
            .collect();
        rows.sort_by(|a, b| b.fecha.cmp(&a.fecha).then_with(|| cmp_ignore_case(&a.tema, &b.tema)));
        rows
    }

    pub fn selected_programa(&self) -> Option<&ProgramaSemanal> {
        self.sorted_programas().get(self.programas_selection).copied()
    }

    pub fn selected_bloques(&self) -> Vec<&BloquePrograma> {
        self.selected_programa()
            .map(|p| p.bloques.iter().collect())
            .unwrap_or_default()
    }

    pub fn selected_materiales(&self) -> Vec<&MaterialBloque> {
        self.data
            .materiales_of(self.selected_programa().and_then(|p| p.id))
    }

    /// Activities, most recent start date first.
    pub fn sorted_actividades(&self) -> Vec<&ActividadExterior> {
        let mut rows: Vec<&ActividadExterior> = self
            .data
            .actividades
            .iter()
            .filter(|a| {
                self.search_query.is_empty()
                    || contains_ignore_case(&a.nombre, &self.search_query)
                    || contains_ignore_case(a.ubicacion_display(), &self.search_query)
            })
            .collect();
        rows.sort_by(|a, b| {
            b.fecha_inicio
                .cmp(&a.fecha_inicio)
                .then_with(|| cmp_ignore_case(&a.nombre, &b.nombre))
        });
        rows
    }

    pub fn selected_actividad(&self) -> Option<&ActividadExterior> {
        self.sorted_actividades().get(self.actividades_selection).copied()
    }

    fn selected_actividad_id(&self) -> Option<i64> {
        self.selected_actividad().and_then(|a| a.id)
    }

    pub fn actividad_presupuesto(&self) -> Vec<&ItemPresupuesto> {
        of_actividad(&self.data.presupuesto, self.selected_actividad_id(), |i| i.actividad_id)
    }

    pub fn actividad_compras(&self) -> Vec<&CompraRegistro> {
        of_actividad(&self.data.compras, self.selected_actividad_id(), |c| c.actividad_id)
    }

    pub fn actividad_logistica(&self) -> Vec<&ItemLogistica> {
        of_actividad(&self.data.logistica, self.selected_actividad_id(), |i| i.actividad_id)
    }

    pub fn actividad_subcampos(&self) -> Vec<&SubCampo> {
        of_actividad(&self.data.subcampos, self.selected_actividad_id(), |s| s.actividad_id)
    }

    pub fn actividad_asignaciones(&self) -> Vec<&AsignacionSubCampo> {
        of_actividad(&self.data.asignaciones, self.selected_actividad_id(), |a| a.actividad_id)
    }

    pub fn actividad_documentos(&self) -> Vec<&DocumentoAutorizacion> {
        let mut docs =
            of_actividad(&self.data.documentos, self.selected_actividad_id(), |d| d.actividad_id);
        docs.sort_by(|a, b| {
            let name = |d: &DocumentoAutorizacion| {
                self.data
                    .scout(d.scout_id)
                    .map(|s| s.display_name())
                    .unwrap_or_default()
            };
            cmp_ignore_case(&name(a), &name(b))
        });
        docs
    }

    pub fn budget_summary(&self) -> Option<BudgetSummary> {
        self.selected_actividad()
            .map(|a| BudgetSummary::compute(a, &self.data.presupuesto, &self.data.compras))
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        DashboardStats::compute(
            &self.data.scouts,
            self.data.dirigentes.len(),
            &self.data.patrullas,
            &self.data.actividades,
            &self.data.documentos,
            &self.data.logistica,
        )
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Number of rows in the current tab's main list.
    pub fn list_len(&self) -> usize {
        match self.current_tab {
            Tab::Dashboard => 0,
            Tab::Scouts => self.sorted_scouts().len(),
            Tab::Dirigentes => self.sorted_dirigentes().len(),
            Tab::Patrullas => self.sorted_patrullas().len(),
            Tab::Comite => self.sorted_comite().len(),
            Tab::Programas => self.sorted_programas().len(),
            Tab::Actividades | Tab::Documentos => self.sorted_actividades().len(),
        }
    }

    /// Number of rows in the current tab's detail panel.
    pub fn detail_len(&self) -> usize {
        match self.current_tab {
            Tab::Scouts => self.selected_familiares().len(),
            Tab::Patrullas => self.patrulla_members().len(),
            Tab::Programas => match self.programa_view {
                ProgramaView::Bloques => self.selected_bloques().len(),
                ProgramaView::Materiales => self.selected_materiales().len(),
            },
            Tab::Actividades => match self.actividad_view {
                ActividadView::Presupuesto => self.actividad_presupuesto().len(),
                ActividadView::Compras => self.actividad_compras().len(),
                ActividadView::Logistica => self.actividad_logistica().len(),
                ActividadView::Subcampos => self.actividad_subcampos().len(),
            },
            Tab::Documentos => self.actividad_documentos().len(),
            Tab::Dashboard | Tab::Dirigentes | Tab::Comite => 0,
        }
    }

    /// Whether the current tab has a navigable detail panel.
    pub fn has_detail_list(&self) -> bool {
        !matches!(self.current_tab, Tab::Dashboard | Tab::Dirigentes | Tab::Comite)
    }

    fn list_selection_mut(&mut self) -> Option<&mut usize> {
        match self.current_tab {
            Tab::Dashboard => None,
            Tab::Scouts => Some(&mut self.scouts_selection),
            Tab::Dirigentes => Some(&mut self.dirigentes_selection),
            Tab::Patrullas => Some(&mut self.patrullas_selection),
            Tab::Comite => Some(&mut self.comite_selection),
            Tab::Programas => Some(&mut self.programas_selection),
            Tab::Actividades | Tab::Documentos => Some(&mut self.actividades_selection),
        }
    }

    /// Move the focused panel's selection by `delta`, clamped to its rows.
    pub fn move_selection(&mut self, delta: isize) {
        match self.focus {
            Focus::List => {
                let len = self.list_len();
                if let Some(selection) = self.list_selection_mut() {
                    let old = *selection;
                    *selection = step(old, delta, len);
                    if old != *selection {
                        self.detail_selection = 0;
                    }
                }
            }
            Focus::Detail => {
                let len = self.detail_len();
                self.detail_selection = step(self.detail_selection, delta, len);
            }
        }
    }

    pub fn select_first(&mut self) {
        self.move_selection(isize::MIN / 2);
    }

    pub fn select_last(&mut self) {
        self.move_selection(isize::MAX / 2);
    }

    /// Keep selections inside their lists after rows change.
    pub fn clamp_selections(&mut self) {
        let tab = self.current_tab;
        let focus = self.focus;
        self.focus = Focus::List;
        for t in Tab::ALL {
            self.current_tab = t;
            let len = self.list_len();
            if let Some(selection) = self.list_selection_mut() {
                *selection = (*selection).min(len.saturating_sub(1));
            }
        }
        self.current_tab = tab;
        self.focus = focus;
        self.detail_selection = self.detail_selection.min(self.detail_len().saturating_sub(1));
    }

    // =========================================================================
    // Sort Toggle Helpers
    // =========================================================================

    /// Toggle scout sort column - if already sorting by this column, flip direction;
    /// otherwise switch to this column with ascending=true. Resets selection to 0.
    pub fn toggle_scout_sort(&mut self, column: ScoutSortColumn) {
        if self.scout_sort_column == column {
            self.scout_sort_ascending = !self.scout_sort_ascending;
        } else {
            self.scout_sort_column = column;
            self.scout_sort_ascending = true;
        }
        self.scouts_selection = 0;
        self.detail_selection = 0;
    }

    /// Switch tab, resetting focus to the list.
    pub fn switch_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.focus = Focus::List;
        self.detail_selection = 0;
    }
}

/// API key from the environment, then the keychain.
fn resolve_api_key() -> Result<String> {
    if let Some(key) = std::env::var(ENV_API_KEY).ok().filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }
    CredentialStore::get_api_key().with_context(|| {
        format!(
            "No backend API key. Set {} or run `scoutdesk --login`",
            ENV_API_KEY
        )
    })
}

/// Login failures: bad credentials get their own message.
fn login_error_message(err: &anyhow::Error) -> String {
    let bad_credentials = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ApiError>(),
            Some(ApiError::Unauthorized)
        ) || matches!(
            cause.downcast_ref::<ApiError>(),
            Some(ApiError::InvalidResponse(msg)) if msg.starts_with("Status 400")
        )
    });
    if bad_credentials {
        "Invalid email or password".to_string()
    } else {
        friendly_message(err)
    }
}

/// `index + delta` clamped to `0..len`.
fn step(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len - 1;
    if delta >= 0 {
        index.saturating_add(delta as usize).min(max)
    } else {
        index.saturating_sub(delta.unsigned_abs()).min(max)
    }
}

/// Check if a scout matches the search query
fn scout_matches(scout: &Scout, patrulla: &str, query: &str) -> bool {
    contains_ignore_case(&scout.nombres, query)
        || contains_ignore_case(&scout.apellidos, query)
        || contains_ignore_case(patrulla, query)
        || contains_ignore_case(scout.rama.label(), query)
        || scout
            .numero_documento
            .as_deref()
            .is_some_and(|d| contains_ignore_case(d, query))
}

/// Scouts filtered by `query` and sorted by `column`.
pub fn sort_scouts<'a>(
    data: &'a Data,
    column: ScoutSortColumn,
    ascending: bool,
    query: &str,
    today: NaiveDate,
) -> Vec<&'a Scout> {
    let mut sorted: Vec<&Scout> = data.scouts.iter().collect();

    if !query.is_empty() {
        sorted.retain(|s| scout_matches(s, &data.patrulla_name(s.patrulla_id), query));
    }

    sorted.sort_by(|a, b| {
        let name_cmp = |x: &Scout, y: &Scout| {
            cmp_ignore_case(&x.apellidos, &y.apellidos)
                .then_with(|| cmp_ignore_case(&x.nombres, &y.nombres))
        };

        let cmp = match column {
            ScoutSortColumn::Name => name_cmp(a, b),
            ScoutSortColumn::Rama => a.rama.cmp(&b.rama).then_with(|| name_cmp(a, b)),
            ScoutSortColumn::Patrulla => cmp_ignore_case(
                &data.patrulla_name(a.patrulla_id),
                &data.patrulla_name(b.patrulla_id),
            )
            .then_with(|| name_cmp(a, b)),
            ScoutSortColumn::Edad => a
                .edad(today)
                .cmp(&b.edad(today))
                .then_with(|| name_cmp(a, b)),
            ScoutSortColumn::Estado => a
                .estado
                .label()
                .cmp(b.estado.label())
                .then_with(|| name_cmp(a, b)),
        };

        if ascending {
            cmp
        } else {
            cmp.reverse()
        }
    });

    sorted
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use scoutdesk_core::models::{EstadoMiembro, Rama};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn scout(id: i64, nombres: &str, apellidos: &str, rama: Rama, born: NaiveDate) -> Scout {
        Scout {
            id: Some(id),
            nombres: nombres.to_string(),
            apellidos: apellidos.to_string(),
            rama,
            fecha_nacimiento: Some(born),
            ..Default::default()
        }
    }

    fn sample() -> Data {
        Data {
            scouts: vec![
                scout(1, "Lucía", "Paredes", Rama::Tropa, date(2011, 3, 1)),
                scout(2, "Mateo", "Alvarez", Rama::Manada, date(2015, 8, 9)),
                Scout {
                    patrulla_id: Some(10),
                    estado: EstadoMiembro::Inactivo,
                    ..scout(3, "Ana", "Quispe", Rama::Tropa, date(2012, 1, 20))
                },
            ],
            patrullas: vec![Patrulla {
                id: Some(10),
                nombre: "Halcones".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn ids(scouts: &[&Scout]) -> Vec<i64> {
        scouts.iter().filter_map(|s| s.id).collect()
    }

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tab_next() {
        assert_eq!(Tab::Dashboard.next(), Tab::Scouts);
        assert_eq!(Tab::Actividades.next(), Tab::Documentos);
        assert_eq!(Tab::Documentos.next(), Tab::Dashboard); // Wraps around
    }

    #[test]
    fn test_tab_prev() {
        assert_eq!(Tab::Dashboard.prev(), Tab::Documentos); // Wraps around
        assert_eq!(Tab::Scouts.prev(), Tab::Dashboard);
    }

    #[test]
    fn test_tab_from_digit() {
        assert_eq!(Tab::from_digit('1'), Some(Tab::Dashboard));
        assert_eq!(Tab::from_digit('8'), Some(Tab::Documentos));
        assert_eq!(Tab::from_digit('9'), None);
        assert_eq!(Tab::from_digit('0'), None);
    }

    #[test]
    fn test_actividad_view_cycles() {
        let mut view = ActividadView::Presupuesto;
        for _ in 0..ActividadView::ALL.len() {
            view = view.next();
        }
        assert_eq!(view, ActividadView::Presupuesto);
        assert_eq!(ActividadView::Presupuesto.prev(), ActividadView::Subcampos);
    }

    // -------------------------------------------------------------------------
    // Sorting and search
    // -------------------------------------------------------------------------

    #[test]
    fn test_sort_scouts_by_name() {
        let data = sample();
        let sorted = sort_scouts(&data, ScoutSortColumn::Name, true, "", date(2024, 6, 1));
        assert_eq!(ids(&sorted), vec![2, 1, 3]);
        let sorted = sort_scouts(&data, ScoutSortColumn::Name, false, "", date(2024, 6, 1));
        assert_eq!(ids(&sorted), vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_scouts_by_edad_and_rama() {
        let data = sample();
        let today = date(2024, 6, 1);
        let by_age = sort_scouts(&data, ScoutSortColumn::Edad, true, "", today);
        assert_eq!(ids(&by_age), vec![2, 3, 1]);
        let by_rama = sort_scouts(&data, ScoutSortColumn::Rama, true, "", today);
        assert_eq!(ids(&by_rama), vec![2, 1, 3]);
    }

    #[test]
    fn test_search_matches_patrol_name() {
        let data = sample();
        let found = sort_scouts(&data, ScoutSortColumn::Name, true, "halc", date(2024, 6, 1));
        assert_eq!(ids(&found), vec![3]);
        let found = sort_scouts(&data, ScoutSortColumn::Name, true, "sin patrulla", date(2024, 6, 1));
        assert_eq!(ids(&found), vec![2, 1]);
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    #[test]
    fn test_step_clamps() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(3, 10, 5), 4);
        assert_eq!(step(4, -2, 5), 2);
        assert_eq!(step(2, 1, 0), 0);
        assert_eq!(step(1, isize::MIN / 2, 5), 0);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(79, '@'));
        assert!(!can_add_username_char(80, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_login_error_message() {
        let unauthorized: anyhow::Error = ApiError::Unauthorized.into();
        assert_eq!(login_error_message(&unauthorized), "Invalid email or password");
        let bad_grant: anyhow::Error =
            ApiError::InvalidResponse("Status 400 Bad Request: invalid_grant".to_string()).into();
        assert_eq!(login_error_message(&bad_grant), "Invalid email or password");
        let server: anyhow::Error = ApiError::ServerError("boom".to_string()).into();
        assert_eq!(login_error_message(&server), "Server error. Try again later.");
    }
}
