use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::scout::Rama;
use super::Record;
use crate::validation::{FieldKind, FieldSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoPrograma {
    #[default]
    Borrador,
    Planificado,
    Ejecutado,
}

impl EstadoPrograma {
    pub const CHOICES: &'static [&'static str] = &["BORRADOR", "PLANIFICADO", "EJECUTADO"];

    pub fn label(&self) -> &'static str {
        match self {
            EstadoPrograma::Borrador => "Borrador",
            EstadoPrograma::Planificado => "Planificado",
            EstadoPrograma::Ejecutado => "Ejecutado",
        }
    }
}

/// One block of a weekly program, stored inline in the program row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BloquePrograma {
    pub actividad: String,
    pub duracion_minutos: u32,
    #[serde(default)]
    pub responsable: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
}

impl BloquePrograma {
    /// Form fields for adding a block to a program.
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("actividad", "Actividad", FieldKind::Text),
        FieldSpec::required("duracion_minutos", "Duración (min)", FieldKind::Integer),
        FieldSpec::optional("responsable", "Responsable", FieldKind::Text),
        FieldSpec::optional("descripcion", "Descripción", FieldKind::Text),
    ];
}

/// A Saturday (or weekly) meeting program for one branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramaSemanal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub fecha: Option<NaiveDate>,
    #[serde(default)]
    pub rama: Rama,
    pub tema: String,
    #[serde(default)]
    pub objetivo: Option<String>,
    #[serde(default)]
    pub lugar: Option<String>,
    /// Start time as `HH:MM`.
    #[serde(default)]
    pub hora_inicio: Option<String>,
    #[serde(default)]
    pub responsable: Option<String>,
    #[serde(default)]
    pub estado: EstadoPrograma,
    #[serde(default)]
    pub bloques: Vec<BloquePrograma>,
    #[serde(default)]
    pub observaciones: Option<String>,
}

impl Record for ProgramaSemanal {
    const TABLE: &'static str = "programas_semanales";
    const ORDER_BY: &'static str = "fecha";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("fecha", "Fecha", FieldKind::Date),
        FieldSpec::required("rama", "Rama", FieldKind::Choice(Rama::CHOICES)),
        FieldSpec::required("tema", "Tema", FieldKind::Text),
        FieldSpec::optional("objetivo", "Objetivo", FieldKind::Text),
        FieldSpec::optional("lugar", "Lugar", FieldKind::Text),
        FieldSpec::optional("hora_inicio", "Hora inicio", FieldKind::Text),
        FieldSpec::optional("responsable", "Responsable", FieldKind::Text),
        FieldSpec::required("estado", "Estado", FieldKind::Choice(EstadoPrograma::CHOICES)),
        FieldSpec::optional("observaciones", "Observaciones", FieldKind::Text),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        match self.fecha {
            Some(fecha) => format!("{} - {}", fecha.format("%d/%m/%Y"), self.tema),
            None => self.tema.clone(),
        }
    }
}

impl ProgramaSemanal {
    pub fn total_minutes(&self) -> u32 {
        self.bloques.iter().map(|b| b.duracion_minutos).sum()
    }

    fn start(&self) -> Option<NaiveTime> {
        let raw = self.hora_inicio.as_deref()?.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    /// End time (`HH:MM`) derived from the start time and block durations.
    ///
    /// Wraps past midnight; `None` when the start time is missing or malformed.
    pub fn end_time(&self) -> Option<String> {
        let start = self.start()?;
        let end = start + chrono::Duration::minutes(i64::from(self.total_minutes()));
        Some(format!("{:02}:{:02}", end.hour(), end.minute()))
    }

    /// Start time of each block, in order.
    pub fn block_schedule(&self) -> Vec<(String, &BloquePrograma)> {
        let Some(mut cursor) = self.start() else {
            return self.bloques.iter().map(|b| ("--:--".to_string(), b)).collect();
        };
        let mut schedule = Vec::with_capacity(self.bloques.len());
        for bloque in &self.bloques {
            schedule.push((format!("{:02}:{:02}", cursor.hour(), cursor.minute()), bloque));
            cursor += chrono::Duration::minutes(i64::from(bloque.duracion_minutos));
        }
        schedule
    }
}

/// A material needed for one block of a program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialBloque {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub programa_id: i64,
    /// Index of the block inside the program.
    #[serde(default)]
    pub bloque: u32,
    pub material: String,
    #[serde(default = "default_cantidad")]
    pub cantidad: u32,
    #[serde(default)]
    pub responsable: Option<String>,
    #[serde(default)]
    pub conseguido: bool,
}

fn default_cantidad() -> u32 {
    1
}

impl Record for MaterialBloque {
    const TABLE: &'static str = "materiales_bloque";
    const ORDER_BY: &'static str = "bloque";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("material", "Material", FieldKind::Text),
        FieldSpec::required("cantidad", "Cantidad", FieldKind::Integer),
        FieldSpec::optional("bloque", "Bloque (n°)", FieldKind::Integer),
        FieldSpec::optional("responsable", "Responsable", FieldKind::Text),
        FieldSpec::optional("conseguido", "Conseguido", FieldKind::Bool),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        format!("{} x{}", self.material, self.cantidad)
    }
}

impl MaterialBloque {
    pub fn toggled(&self) -> bool {
        !self.conseguido
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bloque(actividad: &str, minutos: u32) -> BloquePrograma {
        BloquePrograma {
            actividad: actividad.to_string(),
            duracion_minutos: minutos,
            ..Default::default()
        }
    }

    fn programa() -> ProgramaSemanal {
        ProgramaSemanal {
            tema: "Nudos".to_string(),
            hora_inicio: Some("15:00".to_string()),
            bloques: vec![bloque("Formación", 15), bloque("Juego", 45), bloque("Taller", 60)],
            ..Default::default()
        }
    }

    #[test]
    fn test_total_minutes_and_end_time() {
        let p = programa();
        assert_eq!(p.total_minutes(), 120);
        assert_eq!(p.end_time().as_deref(), Some("17:00"));
    }

    #[test]
    fn test_end_time_requires_start() {
        let p = ProgramaSemanal {
            hora_inicio: Some("tarde".to_string()),
            ..programa()
        };
        assert_eq!(p.end_time(), None);
        let schedule = p.block_schedule();
        assert_eq!(schedule[0].0, "--:--");
    }

    #[test]
    fn test_block_schedule() {
        let p = programa();
        let times: Vec<String> = p.block_schedule().into_iter().map(|(t, _)| t).collect();
        assert_eq!(times, vec!["15:00", "15:15", "16:00"]);
    }

    #[test]
    fn test_bloques_default_when_missing() {
        let json = r#"{"id":3,"fecha":"2024-05-04","rama":"MANADA","tema":"Selva","estado":"PLANIFICADO"}"#;
        let p: ProgramaSemanal = serde_json::from_str(json).expect("parse programa row");
        assert!(p.bloques.is_empty());
        assert_eq!(p.estado, EstadoPrograma::Planificado);
        assert_eq!(p.label(), "04/05/2024 - Selva");
    }
}
