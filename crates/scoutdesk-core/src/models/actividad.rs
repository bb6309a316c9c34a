use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Record;
use crate::validation::{FieldKind, FieldSpec};

pub const TIPOS_ACTIVIDAD: &[&str] = &["CAMPAMENTO", "EXCURSION", "CAMINATA", "SERVICIO", "OTRO"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoActividad {
    #[default]
    Planificada,
    Confirmada,
    EnCurso,
    Finalizada,
    Cancelada,
}

impl EstadoActividad {
    pub const CHOICES: &'static [&'static str] =
        &["PLANIFICADA", "CONFIRMADA", "EN_CURSO", "FINALIZADA", "CANCELADA"];

    pub fn label(&self) -> &'static str {
        match self {
            EstadoActividad::Planificada => "Planificada",
            EstadoActividad::Confirmada => "Confirmada",
            EstadoActividad::EnCurso => "En curso",
            EstadoActividad::Finalizada => "Finalizada",
            EstadoActividad::Cancelada => "Cancelada",
        }
    }
}

/// An outdoor activity (camp, hike, service) with its own budget and logistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActividadExterior {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub nombre: String,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub fecha_inicio: Option<NaiveDate>,
    #[serde(default)]
    pub fecha_fin: Option<NaiveDate>,
    #[serde(default)]
    pub lugar: Option<String>,
    #[serde(default)]
    pub latitud: Option<f64>,
    #[serde(default)]
    pub longitud: Option<f64>,
    /// Short reverse-geocoded label for the coordinates.
    #[serde(default)]
    pub ubicacion_etiqueta: Option<String>,
    #[serde(default)]
    pub responsable: Option<String>,
    #[serde(default)]
    pub participantes: Option<u32>,
    #[serde(default)]
    pub estado: EstadoActividad,
    #[serde(default)]
    pub descripcion: Option<String>,
}

impl Record for ActividadExterior {
    const TABLE: &'static str = "actividades";
    const ORDER_BY: &'static str = "fecha_inicio";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("nombre", "Nombre", FieldKind::Text),
        FieldSpec::optional("tipo", "Tipo", FieldKind::Choice(TIPOS_ACTIVIDAD)),
        FieldSpec::required("fecha_inicio", "Fecha inicio", FieldKind::Date),
        FieldSpec::optional("fecha_fin", "Fecha fin", FieldKind::Date),
        FieldSpec::optional("lugar", "Lugar", FieldKind::Text),
        FieldSpec::optional("latitud", "Latitud", FieldKind::Coordinate),
        FieldSpec::optional("longitud", "Longitud", FieldKind::Coordinate),
        FieldSpec::optional("responsable", "Responsable", FieldKind::Text),
        FieldSpec::optional("participantes", "Participantes", FieldKind::Integer),
        FieldSpec::required("estado", "Estado", FieldKind::Choice(EstadoActividad::CHOICES)),
        FieldSpec::optional("descripcion", "Descripción", FieldKind::Text),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        self.nombre.clone()
    }
}

impl ActividadExterior {
    /// Number of calendar days the activity spans, at least 1.
    pub fn dias(&self) -> u32 {
        match (self.fecha_inicio, self.fecha_fin) {
            (Some(inicio), Some(fin)) if fin >= inicio => {
                u32::try_from((fin - inicio).num_days() + 1).unwrap_or(1)
            }
            _ => 1,
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitud?, self.longitud?))
    }

    /// Best location text: geocoded label, then the typed place name.
    pub fn ubicacion_display(&self) -> &str {
        self.ubicacion_etiqueta
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.lugar.as_deref())
            .unwrap_or("-")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoItem {
    #[default]
    Pendiente,
    Listo,
}

impl EstadoItem {
    pub const CHOICES: &'static [&'static str] = &["PENDIENTE", "LISTO"];

    pub fn toggled(&self) -> Self {
        match self {
            EstadoItem::Pendiente => EstadoItem::Listo,
            EstadoItem::Listo => EstadoItem::Pendiente,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EstadoItem::Pendiente => "Pendiente",
            EstadoItem::Listo => "Listo",
        }
    }
}

/// A logistics checklist item of an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemLogistica {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub actividad_id: i64,
    pub descripcion: String,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub responsable: Option<String>,
    #[serde(default)]
    pub fecha_limite: Option<NaiveDate>,
    #[serde(default)]
    pub estado: EstadoItem,
}

impl Record for ItemLogistica {
    const TABLE: &'static str = "items_logistica";
    const ORDER_BY: &'static str = "descripcion";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("descripcion", "Descripción", FieldKind::Text),
        FieldSpec::optional("categoria", "Categoría", FieldKind::Text),
        FieldSpec::optional("responsable", "Responsable", FieldKind::Text),
        FieldSpec::optional("fecha_limite", "Fecha límite", FieldKind::Date),
        FieldSpec::required("estado", "Estado", FieldKind::Choice(EstadoItem::CHOICES)),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        self.descripcion.clone()
    }
}

impl ItemLogistica {
    pub fn toggled_estado(&self) -> EstadoItem {
        self.estado.toggled()
    }

    pub fn is_ready(&self) -> bool {
        self.estado == EstadoItem::Listo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estado_item_toggles_both_ways() {
        let item = ItemLogistica {
            descripcion: "Carpas".to_string(),
            ..Default::default()
        };
        assert_eq!(item.toggled_estado(), EstadoItem::Listo);
        assert_eq!(EstadoItem::Listo.toggled(), EstadoItem::Pendiente);
    }

    #[test]
    fn test_dias_spans_inclusive_range() {
        let actividad = ActividadExterior {
            fecha_inicio: NaiveDate::from_ymd_opt(2024, 7, 26),
            fecha_fin: NaiveDate::from_ymd_opt(2024, 7, 29),
            ..Default::default()
        };
        assert_eq!(actividad.dias(), 4);
        assert_eq!(ActividadExterior::default().dias(), 1);
    }

    #[test]
    fn test_ubicacion_display_prefers_label() {
        let mut actividad = ActividadExterior {
            lugar: Some("Huampaní".to_string()),
            ..Default::default()
        };
        assert_eq!(actividad.ubicacion_display(), "Huampaní");
        actividad.ubicacion_etiqueta = Some("Chaclacayo, Lima, Perú".to_string());
        assert_eq!(actividad.ubicacion_display(), "Chaclacayo, Lima, Perú");
    }

    #[test]
    fn test_estado_en_curso_wire_name() {
        let json = serde_json::to_string(&EstadoActividad::EnCurso).expect("serialize estado");
        assert_eq!(json, "\"EN_CURSO\"");
    }
}
