//! Multi-step backend operations built on the generic table calls.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::json;
use tracing::{info, warn};

use crate::models::{
    ActividadExterior, AsignacionSubCampo, CambioEstadoAutorizacion, CompraRegistro,
    DocumentoAutorizacion, EstadoItem, ItemLogistica, ItemPresupuesto, MaterialBloque, Patrulla,
    Record, Scout, SubCampo,
};

use super::{ApiClient, GeocodeClient};

/// Storage folder for purchase receipts.
const RECEIPTS_PREFIX: &str = "comprobantes";

/// A receipt photo picked for upload.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of registering a purchase.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub compra: CompraRegistro,
    /// Set when the receipt could not be uploaded; the purchase was still saved.
    pub receipt_warning: Option<String>,
    /// Set when the budget item could not be marked as bought.
    pub item_warning: Option<String>,
}

fn require_id<T: Record>(record: &T) -> Result<i64> {
    record
        .id()
        .ok_or_else(|| anyhow::anyhow!("{} '{}' has not been saved yet", T::TABLE, record.label()))
}

impl ApiClient {
    // ===== Patrols and sub-camps =====

    /// Unassign the patrol's scouts and drop its sub-camp assignments,
    /// then delete the patrol. Returns how many scouts were unassigned.
    pub async fn delete_patrulla(&self, patrulla_id: i64) -> Result<usize> {
        let unassigned = self
            .patch_where(Scout::TABLE, "patrulla_id", patrulla_id, &json!({ "patrulla_id": null }))
            .await
            .context("Failed to unassign patrol members")?;
        let asignaciones = self
            .delete_where(AsignacionSubCampo::TABLE, "patrulla_id", patrulla_id)
            .await
            .context("Failed to remove patrol sub-camp assignments")?;
        self.delete::<Patrulla>(patrulla_id).await?;
        info!(patrulla_id, unassigned, asignaciones, "Deleted patrol");
        Ok(unassigned)
    }

    /// Clear the sub-camp from its patrol assignments, then delete it.
    pub async fn delete_subcampo(&self, subcampo_id: i64) -> Result<usize> {
        let unassigned = self
            .patch_where(
                AsignacionSubCampo::TABLE,
                "subcampo_id",
                subcampo_id,
                &json!({ "subcampo_id": null }),
            )
            .await
            .context("Failed to clear sub-camp assignments")?;
        self.delete::<SubCampo>(subcampo_id).await?;
        info!(subcampo_id, unassigned, "Deleted sub-camp");
        Ok(unassigned)
    }

    // ===== Status toggles =====

    /// Flip a logistics item between Pendiente and Listo.
    pub async fn toggle_logistica(&self, item: &ItemLogistica) -> Result<EstadoItem> {
        let id = require_id(item)?;
        let estado = item.toggled_estado();
        self.patch::<ItemLogistica, _>(id, &json!({ "estado": estado }))
            .await
            .context("Failed to update logistics item")?;
        Ok(estado)
    }

    /// Flip a program material's `conseguido` flag.
    pub async fn toggle_material(&self, material: &MaterialBloque) -> Result<bool> {
        let id = require_id(material)?;
        let conseguido = material.toggled();
        self.patch::<MaterialBloque, _>(id, &json!({ "conseguido": conseguido }))
            .await
            .context("Failed to update material")?;
        Ok(conseguido)
    }

    /// Move an authorization to its next status, stamping the dates.
    pub async fn advance_autorizacion(
        &self,
        documento: &DocumentoAutorizacion,
        today: NaiveDate,
    ) -> Result<CambioEstadoAutorizacion> {
        let id = require_id(documento)?;
        let cambio = documento.advance(today);
        self.patch::<DocumentoAutorizacion, _>(id, &cambio)
            .await
            .context("Failed to update authorization")?;
        Ok(cambio)
    }

    // ===== Purchases =====

    /// Register a purchase, uploading its receipt first when one is given.
    ///
    /// A failed upload or a failed "bought" mark on the budget item is
    /// reported in the outcome; only the purchase insert itself can fail.
    pub async fn register_purchase(
        &self,
        compra: &CompraRegistro,
        receipt: Option<Receipt>,
        bucket: &str,
        mark_item_bought: bool,
    ) -> Result<PurchaseOutcome> {
        let mut compra = compra.clone();
        let mut receipt_warning = None;

        if let Some(receipt) = receipt {
            match self
                .upload(bucket, RECEIPTS_PREFIX, &receipt.file_name, receipt.bytes)
                .await
            {
                Ok(url) => compra.comprobante_url = Some(url),
                Err(e) => {
                    warn!(error = %e, file = %receipt.file_name, "Receipt upload failed");
                    receipt_warning = Some(format!("Receipt not uploaded: {}", e));
                }
            }
        }

        let compra = self
            .insert(&compra)
            .await
            .context("Failed to register purchase")?;

        let mut item_warning = None;
        if let (true, Some(item_id)) = (mark_item_bought, compra.item_id) {
            if let Err(e) = self
                .patch::<ItemPresupuesto, _>(item_id, &json!({ "comprado": true }))
                .await
            {
                warn!(error = %e, item_id, "Failed to mark budget item as bought");
                item_warning = Some(format!("Budget item not marked as bought: {}", e));
            }
        }

        Ok(PurchaseOutcome {
            compra,
            receipt_warning,
            item_warning,
        })
    }

    // ===== Activities =====

    /// Save an activity, refreshing its location label from the coordinates.
    ///
    /// Geocoding is best effort: on failure the label is left empty.
    pub async fn save_actividad(
        &self,
        actividad: &ActividadExterior,
        geocoder: Option<&GeocodeClient>,
    ) -> Result<ActividadExterior> {
        let mut actividad = actividad.clone();
        match (geocoder, actividad.coordinates()) {
            (Some(geocoder), Some((lat, lon))) => match geocoder.reverse(lat, lon).await {
                Ok(label) => actividad.ubicacion_etiqueta = label,
                Err(e) => {
                    warn!(error = %e, lat, lon, "Reverse geocoding failed");
                    actividad.ubicacion_etiqueta = None;
                }
            },
            (_, None) => actividad.ubicacion_etiqueta = None,
            (None, Some(_)) => {}
        }
        self.save(&actividad).await
    }
}
