use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Record;
use crate::validation::{FieldKind, FieldSpec};

pub const TIPOS_DOCUMENTO_AUTORIZACION: &[&str] =
    &["AUTORIZACION_SALIDA", "FICHA_MEDICA", "DESLINDE", "OTRO"];

/// Progress of an authorization document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoAutorizacion {
    #[default]
    Pendiente,
    Enviada,
    Firmada,
}

impl EstadoAutorizacion {
    pub const CHOICES: &'static [&'static str] = &["PENDIENTE", "ENVIADA", "FIRMADA"];

    /// PENDIENTE -> ENVIADA -> FIRMADA -> PENDIENTE
    pub fn next(&self) -> Self {
        match self {
            EstadoAutorizacion::Pendiente => EstadoAutorizacion::Enviada,
            EstadoAutorizacion::Enviada => EstadoAutorizacion::Firmada,
            EstadoAutorizacion::Firmada => EstadoAutorizacion::Pendiente,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EstadoAutorizacion::Pendiente => "Pendiente",
            EstadoAutorizacion::Enviada => "Enviada",
            EstadoAutorizacion::Firmada => "Firmada",
        }
    }
}

/// Authorization a guardian signs for a scout to join an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentoAutorizacion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub actividad_id: i64,
    pub scout_id: i64,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub estado: EstadoAutorizacion,
    #[serde(default)]
    pub fecha_envio: Option<NaiveDate>,
    #[serde(default)]
    pub fecha_firma: Option<NaiveDate>,
    /// Public URL of the scanned signed document.
    #[serde(default)]
    pub archivo_url: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
}

impl Record for DocumentoAutorizacion {
    const TABLE: &'static str = "documentos_autorizacion";
    const ORDER_BY: &'static str = "scout_id";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("scout_id", "Scout (id)", FieldKind::Integer),
        FieldSpec::optional("tipo", "Tipo", FieldKind::Choice(TIPOS_DOCUMENTO_AUTORIZACION)),
        FieldSpec::required("estado", "Estado", FieldKind::Choice(EstadoAutorizacion::CHOICES)),
        FieldSpec::optional("observaciones", "Observaciones", FieldKind::Text),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        format!("Autorización scout {} ({})", self.scout_id, self.estado.label())
    }
}

/// Status fields written when an authorization advances.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CambioEstadoAutorizacion {
    pub estado: EstadoAutorizacion,
    pub fecha_envio: Option<NaiveDate>,
    pub fecha_firma: Option<NaiveDate>,
}

impl DocumentoAutorizacion {
    /// Status change for advancing this document on `today`.
    ///
    /// Entering ENVIADA stamps the send date, entering FIRMADA stamps the
    /// signature date, wrapping back to PENDIENTE clears both.
    pub fn advance(&self, today: NaiveDate) -> CambioEstadoAutorizacion {
        let estado = self.estado.next();
        match estado {
            EstadoAutorizacion::Pendiente => CambioEstadoAutorizacion {
                estado,
                fecha_envio: None,
                fecha_firma: None,
            },
            EstadoAutorizacion::Enviada => CambioEstadoAutorizacion {
                estado,
                fecha_envio: Some(today),
                fecha_firma: None,
            },
            EstadoAutorizacion::Firmada => CambioEstadoAutorizacion {
                estado,
                fecha_envio: self.fecha_envio.or(Some(today)),
                fecha_firma: Some(today),
            },
        }
    }

    /// Apply a status change locally, leaving every other field as is.
    pub fn apply(&mut self, cambio: &CambioEstadoAutorizacion) {
        self.estado = cambio.estado;
        self.fecha_envio = cambio.fecha_envio;
        self.fecha_firma = cambio.fecha_firma;
    }

    pub fn is_signed(&self) -> bool {
        self.estado == EstadoAutorizacion::Firmada
    }
}
