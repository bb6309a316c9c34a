use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::scout::{EstadoMiembro, Rama, SEXOS, TIPOS_DOCUMENTO};
use super::{join_name, Record};
use crate::validation::{FieldKind, FieldSpec};

pub const CARGOS_DIRIGENTE: &[&str] = &[
    "JEFE_GRUPO",
    "SUBJEFE_GRUPO",
    "JEFE_RAMA",
    "ASISTENTE_RAMA",
    "COLABORADOR",
];

pub const NIVELES_FORMACION: &[&str] = &["PRELIMINAR", "BASICO", "AVANZADO", "INSIGNIA_MADERA"];

/// An adult leader record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dirigente {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub codigo_asociado: Option<String>,
    pub nombres: String,
    pub apellidos: String,
    #[serde(default)]
    pub tipo_documento: Option<String>,
    pub numero_documento: String,
    #[serde(default)]
    pub fecha_nacimiento: Option<NaiveDate>,
    #[serde(default)]
    pub sexo: Option<String>,
    #[serde(default)]
    pub estado_civil: Option<String>,
    #[serde(default)]
    pub nacionalidad: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub celular: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub distrito: Option<String>,
    #[serde(default)]
    pub profesion: Option<String>,
    #[serde(default)]
    pub centro_laboral: Option<String>,
    #[serde(default)]
    pub cargo: Option<String>,
    /// Branch the leader works with, `None` for group-level roles.
    #[serde(default)]
    pub rama: Option<Rama>,
    #[serde(default)]
    pub nivel_formacion: Option<String>,
    #[serde(default)]
    pub fecha_ingreso: Option<NaiveDate>,
    #[serde(default)]
    pub estado: EstadoMiembro,
    #[serde(default)]
    pub foto_url: Option<String>,
}

impl Record for Dirigente {
    const TABLE: &'static str = "dirigentes";
    const ORDER_BY: &'static str = "apellidos";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("nombres", "Nombres", FieldKind::Text),
        FieldSpec::required("apellidos", "Apellidos", FieldKind::Text),
        FieldSpec::optional("tipo_documento", "Tipo doc.", FieldKind::Choice(TIPOS_DOCUMENTO)),
        FieldSpec::required("numero_documento", "N° documento", FieldKind::Text),
        FieldSpec::optional("fecha_nacimiento", "Nacimiento", FieldKind::Date),
        FieldSpec::optional("sexo", "Sexo", FieldKind::Choice(SEXOS)),
        FieldSpec::optional("estado_civil", "Estado civil", FieldKind::Text),
        FieldSpec::optional("nacionalidad", "Nacionalidad", FieldKind::Text),
        FieldSpec::optional("email", "Email", FieldKind::Email),
        FieldSpec::optional("celular", "Celular", FieldKind::Text),
        FieldSpec::optional("telefono", "Teléfono", FieldKind::Text),
        FieldSpec::optional("direccion", "Dirección", FieldKind::Text),
        FieldSpec::optional("distrito", "Distrito", FieldKind::Text),
        FieldSpec::optional("profesion", "Profesión", FieldKind::Text),
        FieldSpec::optional("centro_laboral", "Centro laboral", FieldKind::Text),
        FieldSpec::optional("cargo", "Cargo", FieldKind::Choice(CARGOS_DIRIGENTE)),
        FieldSpec::optional("rama", "Rama", FieldKind::Choice(Rama::CHOICES)),
        FieldSpec::optional("nivel_formacion", "Formación", FieldKind::Choice(NIVELES_FORMACION)),
        FieldSpec::optional("codigo_asociado", "Código asociado", FieldKind::Text),
        FieldSpec::optional("fecha_ingreso", "Fecha ingreso", FieldKind::Date),
        FieldSpec::required("estado", "Estado", FieldKind::Choice(EstadoMiembro::CHOICES)),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        self.full_name()
    }
}

impl Dirigente {
    pub fn full_name(&self) -> String {
        join_name(&self.nombres, &self.apellidos)
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.apellidos, self.nombres)
    }

    /// Human label for the leader's position.
    pub fn cargo_display(&self) -> String {
        match self.cargo.as_deref() {
            Some("JEFE_GRUPO") => "Jefe de Grupo".to_string(),
            Some("SUBJEFE_GRUPO") => "Subjefe de Grupo".to_string(),
            Some("JEFE_RAMA") => match self.rama {
                Some(rama) => format!("Jefe de {}", rama.label()),
                None => "Jefe de Rama".to_string(),
            },
            Some("ASISTENTE_RAMA") => match self.rama {
                Some(rama) => format!("Asistente de {}", rama.label()),
                None => "Asistente de Rama".to_string(),
            },
            Some("COLABORADOR") => "Colaborador".to_string(),
            Some(other) if !other.is_empty() => other.to_string(),
            _ => "Dirigente".to_string(),
        }
    }
}

pub const CARGOS_COMITE: &[&str] = &["PRESIDENTE", "VICEPRESIDENTE", "SECRETARIO", "TESORERO", "VOCAL"];

/// A member of the parent committee (comité de padres).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiembroComite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Family record this member comes from, if any.
    #[serde(default)]
    pub familiar_id: Option<i64>,
    pub nombres: String,
    pub apellidos: String,
    pub cargo: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub celular: Option<String>,
    /// Term, e.g. "2024-2025".
    #[serde(default)]
    pub periodo: Option<String>,
    #[serde(default = "default_true")]
    pub activo: bool,
}

fn default_true() -> bool {
    true
}

impl Record for MiembroComite {
    const TABLE: &'static str = "comite_padres";
    const ORDER_BY: &'static str = "cargo";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("nombres", "Nombres", FieldKind::Text),
        FieldSpec::required("apellidos", "Apellidos", FieldKind::Text),
        FieldSpec::required("cargo", "Cargo", FieldKind::Choice(CARGOS_COMITE)),
        FieldSpec::optional("email", "Email", FieldKind::Email),
        FieldSpec::optional("celular", "Celular", FieldKind::Text),
        FieldSpec::optional("periodo", "Periodo", FieldKind::Text),
        FieldSpec::optional("activo", "Activo", FieldKind::Bool),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        format!("{} - {}", join_name(&self.nombres, &self.apellidos), self.cargo_display())
    }
}

impl MiembroComite {
    pub fn full_name(&self) -> String {
        join_name(&self.nombres, &self.apellidos)
    }

    pub fn cargo_display(&self) -> String {
        let mut chars = self.cargo.to_lowercase().chars().collect::<Vec<_>>();
        if let Some(first) = chars.first_mut() {
            *first = first.to_ascii_uppercase();
        }
        chars.into_iter().collect()
    }

    /// Position order for the committee listing (president first).
    pub fn cargo_order(&self) -> usize {
        CARGOS_COMITE
            .iter()
            .position(|c| *c == self.cargo)
            .unwrap_or(CARGOS_COMITE.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cargo_display_uses_rama() {
        let jefe = Dirigente {
            cargo: Some("JEFE_RAMA".to_string()),
            rama: Some(Rama::Manada),
            ..Default::default()
        };
        assert_eq!(jefe.cargo_display(), "Jefe de Manada");

        let sin_cargo = Dirigente::default();
        assert_eq!(sin_cargo.cargo_display(), "Dirigente");
    }

    #[test]
    fn test_comite_defaults_active_and_orders_by_cargo() {
        let json = r#"{"nombres":"Rosa","apellidos":"Mejía","cargo":"TESORERO"}"#;
        let miembro: MiembroComite = serde_json::from_str(json).expect("parse comite row");
        assert!(miembro.activo);
        assert_eq!(miembro.cargo_display(), "Tesorero");

        let presidente = MiembroComite {
            cargo: "PRESIDENTE".to_string(),
            ..Default::default()
        };
        assert!(presidente.cargo_order() < miembro.cargo_order());
    }
}
