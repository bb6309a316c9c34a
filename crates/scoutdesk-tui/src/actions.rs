//! Record actions triggered from the UI: forms, deletes, toggles and exports.
//!
//! Every write goes to the backend first; the local table is refreshed
//! from the backend afterwards, falling back to patching the local copy
//! when that refetch fails.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use scoutdesk_core::api::Receipt;
use scoutdesk_core::auth::Accion;
use scoutdesk_core::export::{render_form, write_export, DocumentRenderer, ExportFormat, XlsxExporter};
use scoutdesk_core::models::{
    remove_patrol_assignments, unassign_members, unassign_subcampo, ActividadExterior,
    AsignacionSubCampo, BloquePrograma, CompraRegistro, Dirigente, DocumentoAutorizacion,
    FamiliarScout, ItemLogistica, ItemPresupuesto, MaterialBloque, MiembroComite, Patrulla,
    ProgramaSemanal, Record, Scout, SubCampo,
};
use scoutdesk_core::template::{dngi02_source, dngi03_source, FormKind};
use scoutdesk_core::utils::format_money;
use scoutdesk_core::friendly_message;

use crate::app::{ActividadView, App, AppState, Focus, PendingDelete, ProgramaView, RecordKind, Tab};
use crate::data::{remove_by_id, upsert, Stored};
use crate::form::{FormState, FormTarget, MARK_BOUGHT_FIELD, RECEIPT_FIELD};

impl App {
    // =========================================================================
    // Forms
    // =========================================================================

    /// Target for a new record in the current tab and panel.
    fn new_target(&self) -> Option<FormTarget> {
        let detail = self.focus == Focus::Detail;
        match self.current_tab {
            Tab::Dashboard => None,
            Tab::Scouts if detail => self
                .selected_scout()
                .and_then(|s| s.id)
                .map(|scout_id| FormTarget::Familiar { scout_id }),
            Tab::Scouts => Some(FormTarget::Scout),
            Tab::Dirigentes => Some(FormTarget::Dirigente),
            Tab::Comite => Some(FormTarget::Comite),
            Tab::Patrullas => Some(FormTarget::Patrulla),
            Tab::Programas if detail => {
                let programa_id = self.selected_programa().and_then(|p| p.id)?;
                Some(match self.programa_view {
                    ProgramaView::Bloques => FormTarget::Bloque { programa_id, index: None },
                    ProgramaView::Materiales => FormTarget::Material { programa_id },
                })
            }
            Tab::Programas => Some(FormTarget::Programa),
            Tab::Actividades if detail => {
                let actividad_id = self.selected_actividad().and_then(|a| a.id)?;
                Some(match self.actividad_view {
                    ActividadView::Presupuesto => FormTarget::Presupuesto { actividad_id },
                    ActividadView::Compras => FormTarget::Compra { actividad_id },
                    ActividadView::Logistica => FormTarget::Logistica { actividad_id },
                    ActividadView::Subcampos => FormTarget::SubCampo { actividad_id },
                })
            }
            Tab::Actividades => Some(FormTarget::Actividad),
            Tab::Documentos => self
                .selected_actividad()
                .and_then(|a| a.id)
                .map(|actividad_id| FormTarget::Documento { actividad_id }),
        }
    }

    /// Target and JSON of the selected record in the current tab and panel.
    fn edit_target(&self) -> Option<(FormTarget, serde_json::Value)> {
        fn json<T: Serialize>(record: &T) -> Option<serde_json::Value> {
            serde_json::to_value(record).ok()
        }

        let detail = self.focus == Focus::Detail;
        let i = self.detail_selection;
        match self.current_tab {
            Tab::Dashboard => None,
            Tab::Scouts if detail => {
                let familiar = *self.selected_familiares().get(i)?;
                Some((FormTarget::Familiar { scout_id: familiar.scout_id }, json(familiar)?))
            }
            Tab::Scouts => Some((FormTarget::Scout, json(self.selected_scout()?)?)),
            Tab::Dirigentes => Some((FormTarget::Dirigente, json(self.selected_dirigente()?)?)),
            Tab::Comite => Some((FormTarget::Comite, json(self.selected_comite()?)?)),
            Tab::Patrullas if detail => {
                let scout = *self.patrulla_members().get(i)?;
                Some((FormTarget::Scout, json(scout)?))
            }
            Tab::Patrullas => Some((FormTarget::Patrulla, json(self.selected_patrulla()?)?)),
            Tab::Programas if detail => {
                let programa = self.selected_programa()?;
                let programa_id = programa.id?;
                match self.programa_view {
                    ProgramaView::Bloques => Some((
                        FormTarget::Bloque { programa_id, index: Some(i) },
                        json(programa.bloques.get(i)?)?,
                    )),
                    ProgramaView::Materiales => Some((
                        FormTarget::Material { programa_id },
                        json(*self.selected_materiales().get(i)?)?,
                    )),
                }
            }
            Tab::Programas => Some((FormTarget::Programa, json(self.selected_programa()?)?)),
            Tab::Actividades if detail => {
                let actividad_id = self.selected_actividad()?.id?;
                match self.actividad_view {
                    ActividadView::Presupuesto => Some((
                        FormTarget::Presupuesto { actividad_id },
                        json(*self.actividad_presupuesto().get(i)?)?,
                    )),
                    // Purchases are a ledger: entries are added or deleted, not edited
                    ActividadView::Compras => None,
                    ActividadView::Logistica => Some((
                        FormTarget::Logistica { actividad_id },
                        json(*self.actividad_logistica().get(i)?)?,
                    )),
                    ActividadView::Subcampos => Some((
                        FormTarget::SubCampo { actividad_id },
                        json(*self.actividad_subcampos().get(i)?)?,
                    )),
                }
            }
            Tab::Actividades => Some((FormTarget::Actividad, json(self.selected_actividad()?)?)),
            Tab::Documentos => {
                let actividad_id = self.selected_actividad()?.id?;
                let doc = *self.actividad_documentos().get(i)?;
                Some((FormTarget::Documento { actividad_id }, json(doc)?))
            }
        }
    }

    fn show_form(&mut self, form: FormState) {
        self.form = Some(form);
        self.state = AppState::EditingForm;
    }

    /// Open an empty form for the current panel.
    pub fn open_new_form(&mut self) {
        if !self.allowed(Accion::Crear) {
            return;
        }
        match self.new_target() {
            Some(target) => self.show_form(FormState::new(target)),
            None => self.set_status("Nothing to add here"),
        }
    }

    /// Open the selected row in a form.
    pub fn open_edit_form(&mut self) {
        if !self.allowed(Accion::Editar) {
            return;
        }
        match self.edit_target() {
            Some((target, existing)) => self.show_form(FormState::edit(target, existing)),
            None => self.set_status("Nothing to edit here"),
        }
    }

    /// Purchase form prefilled from the selected budget item.
    pub fn open_purchase_form(&mut self) {
        if !self.allowed(Accion::Crear) {
            return;
        }
        let Some(actividad_id) = self.selected_actividad().and_then(|a| a.id) else {
            self.set_status("Select an activity first");
            return;
        };
        let mut form = FormState::new(FormTarget::Compra { actividad_id });
        if self.focus == Focus::Detail && self.actividad_view == ActividadView::Presupuesto {
            if let Some(item) = self.actividad_presupuesto().get(self.detail_selection) {
                if let Some(id) = item.id {
                    form.set_value("item_id", id.to_string());
                }
                form.set_value("descripcion", item.descripcion.clone());
                form.set_value("monto", format!("{:.2}", item.subtotal()));
                form.set_value("proveedor", item.proveedor.clone().unwrap_or_default());
                form.set_value(MARK_BOUGHT_FIELD, "Sí");
            }
        }
        form.set_value("fecha", self.today().format("%Y-%m-%d").to_string());
        self.show_form(form);
    }

    /// Form assigning a patrol of the selected activity to a sub-camp.
    pub fn open_assign_form(&mut self) {
        if !self.allowed(Accion::Editar) {
            return;
        }
        match self.selected_actividad().and_then(|a| a.id) {
            Some(actividad_id) => self.show_form(FormState::new(FormTarget::Asignacion { actividad_id })),
            None => self.set_status("Select an activity first"),
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    /// Validate and save the open form. The form stays open on failure.
    pub async fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        form.submit_error = None;
        if !form.validate() {
            return;
        }
        let target = form.target;

        match self.save_form(target).await {
            Ok(message) => {
                info!(form = target.title(), "Form saved");
                self.form = None;
                self.state = AppState::Normal;
                self.set_status(message);
            }
            Err(e) => {
                error!(error = ?e, form = target.title(), "Save failed");
                if let Some(form) = self.form.as_mut() {
                    form.submit_error = Some(friendly_message(&e));
                }
            }
        }
    }

    async fn save_form(&mut self, target: FormTarget) -> Result<String> {
        let form = self.form.as_ref().context("No open form")?;
        match target {
            FormTarget::Scout => {
                let scout: Scout = form.to_record()?;
                self.save_record(scout).await
            }
            FormTarget::Familiar { .. } => {
                let familiar: FamiliarScout = form.to_record()?;
                self.save_record(familiar).await
            }
            FormTarget::Dirigente => {
                let dirigente: Dirigente = form.to_record()?;
                self.save_record(dirigente).await
            }
            FormTarget::Comite => {
                let miembro: MiembroComite = form.to_record()?;
                self.save_record(miembro).await
            }
            FormTarget::Patrulla => {
                let patrulla: Patrulla = form.to_record()?;
                self.save_record(patrulla).await
            }
            FormTarget::SubCampo { .. } => {
                let subcampo: SubCampo = form.to_record()?;
                self.save_record(subcampo).await
            }
            FormTarget::Asignacion { .. } => {
                let asignacion: AsignacionSubCampo = form.to_record()?;
                self.save_asignacion(asignacion).await
            }
            FormTarget::Programa => {
                let programa: ProgramaSemanal = form.to_record()?;
                self.save_record(programa).await
            }
            FormTarget::Bloque { programa_id, index } => {
                let bloque: BloquePrograma = form.to_record()?;
                self.save_bloque(programa_id, index, bloque).await
            }
            FormTarget::Material { .. } => {
                let material: MaterialBloque = form.to_record()?;
                self.save_record(material).await
            }
            FormTarget::Actividad => {
                let actividad: ActividadExterior = form.to_record()?;
                let saved = self
                    .api
                    .save_actividad(&actividad, self.geocoder.as_ref())
                    .await?;
                let message = format!("Saved {}", saved.label());
                self.after_save(saved).await;
                Ok(message)
            }
            FormTarget::Presupuesto { .. } => {
                let item: ItemPresupuesto = form.to_record()?;
                self.save_record(item).await
            }
            FormTarget::Logistica { .. } => {
                let item: ItemLogistica = form.to_record()?;
                self.save_record(item).await
            }
            FormTarget::Compra { .. } => {
                let compra: CompraRegistro = form.to_record()?;
                let receipt_path = form
                    .value(RECEIPT_FIELD)
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from);
                let mark_bought = form.flag(MARK_BOUGHT_FIELD);
                self.save_compra(compra, receipt_path, mark_bought).await
            }
            FormTarget::Documento { .. } => {
                let documento: DocumentoAutorizacion = form.to_record()?;
                self.save_record(documento).await
            }
        }
    }

    async fn save_record<T: Stored>(&mut self, record: T) -> Result<String> {
        let saved = self.api.save(&record).await?;
        let message = format!("Saved {}", saved.label());
        self.after_save(saved).await;
        Ok(message)
    }

    /// Refresh a table after a write, or patch the saved row in locally.
    async fn after_save<T: Stored>(&mut self, saved: T) {
        if let Err(e) = self.reload::<T>().await {
            warn!(error = %e, table = T::TABLE, "Reload after save failed, updating local copy");
            upsert(T::rows_mut(&mut self.data), saved);
            self.persist::<T>();
        }
    }

    /// One assignment per patrol and activity: an existing one is moved.
    async fn save_asignacion(&mut self, mut asignacion: AsignacionSubCampo) -> Result<String> {
        if asignacion.id.is_none() {
            asignacion.id = self
                .data
                .asignacion_of(asignacion.actividad_id, asignacion.patrulla_id)
                .and_then(|a| a.id);
        }
        let saved = self.api.save(&asignacion).await?;
        let message = format!(
            "{} assigned to {}",
            self.data.patrulla_name(Some(saved.patrulla_id)),
            self.data.subcampo_name(saved.subcampo_id)
        );
        self.after_save(saved).await;
        Ok(message)
    }

    /// Blocks are stored inside their program, so edits save the program.
    async fn save_bloque(
        &mut self,
        programa_id: i64,
        index: Option<usize>,
        bloque: BloquePrograma,
    ) -> Result<String> {
        let mut programa = self
            .data
            .programas
            .iter()
            .find(|p| p.id == Some(programa_id))
            .cloned()
            .ok_or_else(|| anyhow!("Program {} is no longer loaded", programa_id))?;
        match index {
            Some(i) if i < programa.bloques.len() => programa.bloques[i] = bloque,
            Some(i) => return Err(anyhow!("Block {} no longer exists", i + 1)),
            None => programa.bloques.push(bloque),
        }
        let end = programa.end_time().unwrap_or_default();
        self.save_record(programa).await?;
        Ok(if end.is_empty() {
            "Agenda updated".to_string()
        } else {
            format!("Agenda updated, ends at {}", end)
        })
    }

    async fn save_compra(
        &mut self,
        compra: CompraRegistro,
        receipt_path: Option<PathBuf>,
        mark_bought: bool,
    ) -> Result<String> {
        let (receipt, read_warning) = load_receipt(receipt_path.as_deref());
        let outcome = self
            .api
            .register_purchase(&compra, receipt, self.config.bucket(), mark_bought)
            .await?;

        let mut message = format!(
            "Purchase of {} registered",
            format_money(outcome.compra.monto_cents())
        );
        let warnings = [&read_warning, &outcome.receipt_warning, &outcome.item_warning];
        for warning in warnings.into_iter().flatten() {
            message = format!("{}. {}", message, warning);
        }

        let compra = outcome.compra;
        self.after_save(compra).await;
        if mark_bought {
            if let Err(e) = self.reload::<ItemPresupuesto>().await {
                warn!(error = %e, "Failed to reload budget items");
            }
        }
        Ok(message)
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Ask to delete the selected row of the focused panel.
    pub fn request_delete(&mut self) {
        if !self.allowed(Accion::Eliminar) {
            return;
        }
        match self.delete_candidate() {
            Some(pending) => {
                self.pending_delete = Some(pending);
                self.state = AppState::ConfirmingDelete;
            }
            None => self.set_status("Nothing to delete here"),
        }
    }

    fn delete_candidate(&self) -> Option<PendingDelete> {
        fn pending<T: Record>(kind: RecordKind, record: &T) -> Option<PendingDelete> {
            Some(PendingDelete {
                kind,
                id: record.id()?,
                label: record.label(),
            })
        }

        let detail = self.focus == Focus::Detail;
        let i = self.detail_selection;
        match self.current_tab {
            Tab::Dashboard => None,
            Tab::Scouts if detail => pending(RecordKind::Familiar, *self.selected_familiares().get(i)?),
            Tab::Scouts => pending(RecordKind::Scout, self.selected_scout()?),
            Tab::Dirigentes => pending(RecordKind::Dirigente, self.selected_dirigente()?),
            Tab::Comite => pending(RecordKind::Comite, self.selected_comite()?),
            Tab::Patrullas if detail => None,
            Tab::Patrullas => pending(RecordKind::Patrulla, self.selected_patrulla()?),
            Tab::Programas if detail => match self.programa_view {
                ProgramaView::Bloques => {
                    let programa = self.selected_programa()?;
                    let bloque = programa.bloques.get(i)?;
                    Some(PendingDelete {
                        kind: RecordKind::Bloque { index: i },
                        id: programa.id?,
                        label: bloque.actividad.clone(),
                    })
                }
                ProgramaView::Materiales => {
                    pending(RecordKind::Material, *self.selected_materiales().get(i)?)
                }
            },
            Tab::Programas => pending(RecordKind::Programa, self.selected_programa()?),
            Tab::Actividades if detail => match self.actividad_view {
                ActividadView::Presupuesto => {
                    pending(RecordKind::Presupuesto, *self.actividad_presupuesto().get(i)?)
                }
                ActividadView::Compras => pending(RecordKind::Compra, *self.actividad_compras().get(i)?),
                ActividadView::Logistica => {
                    pending(RecordKind::Logistica, *self.actividad_logistica().get(i)?)
                }
                ActividadView::Subcampos => {
                    pending(RecordKind::SubCampo, *self.actividad_subcampos().get(i)?)
                }
            },
            Tab::Actividades => pending(RecordKind::Actividad, self.selected_actividad()?),
            Tab::Documentos if detail => {
                pending(RecordKind::Documento, *self.actividad_documentos().get(i)?)
            }
            Tab::Documentos => None,
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    /// Delete the confirmed row on the backend, then locally.
    pub async fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(pending) = self.pending_delete.take() else {
            return;
        };
        match self.execute_delete(&pending).await {
            Ok(()) => {
                info!(kind = ?pending.kind, id = pending.id, "Deleted");
                self.clamp_selections();
                self.set_status(format!("Deleted {}", pending.label));
            }
            Err(e) => self.report_error(&format!("Could not delete {}", pending.label), &e),
        }
    }

    async fn execute_delete(&mut self, pending: &PendingDelete) -> Result<()> {
        let id = pending.id;
        match pending.kind {
            RecordKind::Scout => self.delete_record::<Scout>(id).await,
            RecordKind::Familiar => self.delete_record::<FamiliarScout>(id).await,
            RecordKind::Dirigente => self.delete_record::<Dirigente>(id).await,
            RecordKind::Comite => self.delete_record::<MiembroComite>(id).await,
            RecordKind::Patrulla => {
                self.api.delete_patrulla(id).await?;
                let unassigned = unassign_members(&mut self.data.scouts, id);
                remove_patrol_assignments(&mut self.data.asignaciones, id);
                remove_by_id(&mut self.data.patrullas, id);
                info!(patrulla_id = id, unassigned, "Patrol members unassigned");
                self.persist::<Scout>();
                self.persist::<AsignacionSubCampo>();
                self.persist::<Patrulla>();
                Ok(())
            }
            RecordKind::SubCampo => {
                self.api.delete_subcampo(id).await?;
                unassign_subcampo(&mut self.data.asignaciones, id);
                remove_by_id(&mut self.data.subcampos, id);
                self.persist::<AsignacionSubCampo>();
                self.persist::<SubCampo>();
                Ok(())
            }
            RecordKind::Bloque { index } => {
                let mut programa = self
                    .data
                    .programas
                    .iter()
                    .find(|p| p.id == Some(id))
                    .cloned()
                    .ok_or_else(|| anyhow!("Program {} is no longer loaded", id))?;
                if index >= programa.bloques.len() {
                    return Err(anyhow!("Block {} no longer exists", index + 1));
                }
                programa.bloques.remove(index);
                let saved = self.api.save(&programa).await?;
                upsert(&mut self.data.programas, saved);
                self.persist::<ProgramaSemanal>();
                Ok(())
            }
            RecordKind::Programa => self.delete_record::<ProgramaSemanal>(id).await,
            RecordKind::Material => self.delete_record::<MaterialBloque>(id).await,
            RecordKind::Actividad => self.delete_record::<ActividadExterior>(id).await,
            RecordKind::Presupuesto => self.delete_record::<ItemPresupuesto>(id).await,
            RecordKind::Logistica => self.delete_record::<ItemLogistica>(id).await,
            RecordKind::Compra => self.delete_record::<CompraRegistro>(id).await,
            RecordKind::Documento => self.delete_record::<DocumentoAutorizacion>(id).await,
        }
    }

    async fn delete_record<T: Stored>(&mut self, id: i64) -> Result<()> {
        self.api.delete::<T>(id).await?;
        remove_by_id(T::rows_mut(&mut self.data), id);
        self.persist::<T>();
        Ok(())
    }

    // =========================================================================
    // Toggles
    // =========================================================================

    /// Flip the selected checklist row, or advance an authorization.
    pub async fn toggle_selected(&mut self) {
        if self.focus != Focus::Detail {
            return;
        }
        if !self.allowed(Accion::Editar) {
            return;
        }
        let result = match self.current_tab {
            Tab::Programas if self.programa_view == ProgramaView::Materiales => {
                self.toggle_material().await
            }
            Tab::Actividades if self.actividad_view == ActividadView::Logistica => {
                self.toggle_logistica().await
            }
            Tab::Documentos => self.advance_documento().await,
            _ => return,
        };
        match result {
            Ok(Some(message)) => self.set_status(message),
            Ok(None) => {}
            Err(e) => self.report_error("Update failed", &e),
        }
    }

    async fn toggle_material(&mut self) -> Result<Option<String>> {
        let Some(material) = self.selected_materiales().get(self.detail_selection).map(|m| (*m).clone())
        else {
            return Ok(None);
        };
        let conseguido = self.api.toggle_material(&material).await?;
        let mut updated = material;
        updated.conseguido = conseguido;
        let label = updated.material.clone();
        upsert(&mut self.data.materiales, updated);
        self.persist::<MaterialBloque>();
        Ok(Some(format!(
            "{}: {}",
            label,
            if conseguido { "conseguido" } else { "pendiente" }
        )))
    }

    async fn toggle_logistica(&mut self) -> Result<Option<String>> {
        let Some(item) = self.actividad_logistica().get(self.detail_selection).map(|i| (*i).clone())
        else {
            return Ok(None);
        };
        let estado = self.api.toggle_logistica(&item).await?;
        let mut updated = item;
        updated.estado = estado;
        let message = format!("{}: {}", updated.descripcion, estado.label());
        upsert(&mut self.data.logistica, updated);
        self.persist::<ItemLogistica>();
        Ok(Some(message))
    }

    async fn advance_documento(&mut self) -> Result<Option<String>> {
        let Some(doc) = self.actividad_documentos().get(self.detail_selection).map(|d| (*d).clone())
        else {
            return Ok(None);
        };
        let cambio = self.api.advance_autorizacion(&doc, self.today()).await?;
        let mut updated = doc;
        updated.apply(&cambio);
        let message = format!("Authorization {}", updated.estado.label());
        upsert(&mut self.data.documentos, updated);
        self.persist::<DocumentoAutorizacion>();
        Ok(Some(message))
    }

    // =========================================================================
    // Exports
    // =========================================================================

    /// Export the selected scout (DNGI-02) or leader (DNGI-03) as a form.
    pub fn export_form(&mut self, format: ExportFormat) {
        if !self.allowed(Accion::Exportar) {
            return;
        }
        match self.render_selected_form(format) {
            Ok(Some(path)) => self.set_status(format!("Exported {}", path.display())),
            Ok(None) => self.set_status("Select a scout or leader to export"),
            Err(e) => self.report_error("Export failed", &e),
        }
    }

    fn render_selected_form(&self, format: ExportFormat) -> Result<Option<PathBuf>> {
        let today = self.today();
        let (kind, source, apellidos, nombres) = match self.current_tab {
            Tab::Scouts => {
                let Some(scout) = self.selected_scout() else {
                    return Ok(None);
                };
                let patrulla = self.data.patrulla(scout.patrulla_id);
                let apoderado = scout.id.and_then(|id| self.data.apoderado_of(id));
                let source = dngi02_source(scout, patrulla, apoderado, today)?;
                (FormKind::Dngi02, source, scout.apellidos.clone(), scout.nombres.clone())
            }
            Tab::Dirigentes => {
                let Some(dirigente) = self.selected_dirigente() else {
                    return Ok(None);
                };
                let source = dngi03_source(dirigente, today)?;
                (
                    FormKind::Dngi03,
                    source,
                    dirigente.apellidos.clone(),
                    dirigente.nombres.clone(),
                )
            }
            _ => return Ok(None),
        };

        let bytes = render_form(kind, &source, self.config.group_name(), format)?;
        let file_name = kind.file_name(&apellidos, &nombres, format.renderer().extension());
        write_export(&self.config.export_dir(), &file_name, &bytes).map(Some)
    }

    /// Export the current tab as a spreadsheet.
    pub fn export_sheet(&mut self) {
        if !self.allowed(Accion::Exportar) {
            return;
        }
        match self.render_sheet() {
            Ok(Some(path)) => self.set_status(format!("Exported {}", path.display())),
            Ok(None) => self.set_status("Nothing to export on this tab"),
            Err(e) => self.report_error("Export failed", &e),
        }
    }

    fn render_sheet(&self) -> Result<Option<PathBuf>> {
        let exporter = XlsxExporter;
        let (file_name, bytes) = match self.current_tab {
            Tab::Scouts => (
                "scouts.xlsx".to_string(),
                exporter.scouts(&self.data.scouts, &self.data.patrullas, self.today())?,
            ),
            Tab::Dirigentes => (
                "dirigentes.xlsx".to_string(),
                exporter.dirigentes(&self.data.dirigentes)?,
            ),
            Tab::Actividades => {
                let Some(actividad) = self.selected_actividad() else {
                    return Ok(None);
                };
                (
                    XlsxExporter::budget_file_name(actividad),
                    exporter.budget(actividad, &self.data.presupuesto, &self.data.compras)?,
                )
            }
            _ => return Ok(None),
        };
        write_export(&self.config.export_dir(), &file_name, &bytes).map(Some)
    }
}

/// Read a receipt file for upload.
fn read_receipt(path: &Path) -> Result<Receipt> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Could not read receipt {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "comprobante".to_string());
    Ok(Receipt { file_name, bytes })
}

/// Read the optional receipt. An unreadable file becomes a warning so the
/// purchase is still registered without it.
fn load_receipt(path: Option<&Path>) -> (Option<Receipt>, Option<String>) {
    let Some(path) = path else {
        return (None, None);
    };
    match read_receipt(path) {
        Ok(receipt) => (Some(receipt), None),
        Err(e) => {
            warn!(error = %e, "Receipt skipped");
            (None, Some(format!("Receipt not attached: {:#}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_receipt_keeps_file_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("boleta 001.pdf");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(b"%PDF-1.4").expect("write");

        let receipt = read_receipt(&path).expect("readable");
        assert_eq!(receipt.file_name, "boleta 001.pdf");
        assert_eq!(receipt.bytes, b"%PDF-1.4");
    }

    #[test]
    fn test_missing_receipt_does_not_block_purchase() {
        let (receipt, warning) = load_receipt(Some(Path::new("/nonexistent/boleta.pdf")));
        assert!(receipt.is_none());
        let warning = warning.expect("warning for unreadable receipt");
        assert!(warning.starts_with("Receipt not attached"));
        assert!(warning.contains("boleta.pdf"));
    }

    #[test]
    fn test_load_receipt_without_path() {
        let (receipt, warning) = load_receipt(None);
        assert!(receipt.is_none());
        assert!(warning.is_none());
    }

    #[test]
    fn test_read_receipt_missing_file() {
        let err = read_receipt(Path::new("/nonexistent/boleta.pdf")).unwrap_err();
        assert!(err.to_string().contains("Could not read receipt"));
    }
}
