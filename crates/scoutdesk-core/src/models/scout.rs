use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{join_name, Record};
use crate::validation::{FieldKind, FieldSpec};

/// Program branch a member belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rama {
    Manada,
    #[default]
    Tropa,
    Comunidad,
    Clan,
}

impl Rama {
    pub const ALL: [Rama; 4] = [Rama::Manada, Rama::Tropa, Rama::Comunidad, Rama::Clan];
    pub const CHOICES: &'static [&'static str] = &["MANADA", "TROPA", "COMUNIDAD", "CLAN"];

    pub fn label(&self) -> &'static str {
        match self {
            Rama::Manada => "Manada",
            Rama::Tropa => "Tropa",
            Rama::Comunidad => "Comunidad",
            Rama::Clan => "Clan",
        }
    }

    /// Age range served by the branch.
    pub fn age_range(&self) -> (u32, u32) {
        match self {
            Rama::Manada => (7, 10),
            Rama::Tropa => (11, 14),
            Rama::Comunidad => (15, 17),
            Rama::Clan => (18, 21),
        }
    }
}

impl std::fmt::Display for Rama {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Membership status of a scout or leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoMiembro {
    #[default]
    Activo,
    Inactivo,
    Retirado,
}

impl EstadoMiembro {
    pub const CHOICES: &'static [&'static str] = &["ACTIVO", "INACTIVO", "RETIRADO"];

    pub fn label(&self) -> &'static str {
        match self {
            EstadoMiembro::Activo => "Activo",
            EstadoMiembro::Inactivo => "Inactivo",
            EstadoMiembro::Retirado => "Retirado",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, EstadoMiembro::Activo)
    }
}

/// Whole years between a birth date and `today`, `None` for future dates.
pub fn age_on(born: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

pub const TIPOS_DOCUMENTO: &[&str] = &["DNI", "CE", "PASAPORTE"];
pub const SEXOS: &[&str] = &["M", "F"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub codigo_asociado: Option<String>,
    pub nombres: String,
    pub apellidos: String,
    #[serde(default)]
    pub tipo_documento: Option<String>,
    #[serde(default)]
    pub numero_documento: Option<String>,
    #[serde(default)]
    pub fecha_nacimiento: Option<NaiveDate>,
    #[serde(default)]
    pub sexo: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub celular: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub distrito: Option<String>,
    #[serde(default)]
    pub colegio: Option<String>,
    #[serde(default)]
    pub grado_estudios: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub grupo_sanguineo: Option<String>,
    #[serde(default)]
    pub seguro_medico: Option<String>,
    #[serde(default)]
    pub alergias: Option<String>,
    #[serde(default)]
    pub rama: Rama,
    #[serde(default)]
    pub estado: EstadoMiembro,
    /// `None` when the scout is not assigned to a patrol.
    #[serde(default)]
    pub patrulla_id: Option<i64>,
    #[serde(default)]
    pub fecha_ingreso: Option<NaiveDate>,
    #[serde(default)]
    pub foto_url: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
}

impl Record for Scout {
    const TABLE: &'static str = "scouts";
    const ORDER_BY: &'static str = "apellidos";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("nombres", "Nombres", FieldKind::Text),
        FieldSpec::required("apellidos", "Apellidos", FieldKind::Text),
        FieldSpec::optional("tipo_documento", "Tipo doc.", FieldKind::Choice(TIPOS_DOCUMENTO)),
        FieldSpec::optional("numero_documento", "N° documento", FieldKind::Text),
        FieldSpec::optional("fecha_nacimiento", "Nacimiento", FieldKind::Date),
        FieldSpec::optional("sexo", "Sexo", FieldKind::Choice(SEXOS)),
        FieldSpec::required("rama", "Rama", FieldKind::Choice(Rama::CHOICES)),
        FieldSpec::required("estado", "Estado", FieldKind::Choice(EstadoMiembro::CHOICES)),
        FieldSpec::optional("codigo_asociado", "Código asociado", FieldKind::Text),
        FieldSpec::optional("email", "Email", FieldKind::Email),
        FieldSpec::optional("celular", "Celular", FieldKind::Text),
        FieldSpec::optional("telefono", "Teléfono", FieldKind::Text),
        FieldSpec::optional("direccion", "Dirección", FieldKind::Text),
        FieldSpec::optional("distrito", "Distrito", FieldKind::Text),
        FieldSpec::optional("colegio", "Colegio", FieldKind::Text),
        FieldSpec::optional("grado_estudios", "Grado", FieldKind::Text),
        FieldSpec::optional("religion", "Religión", FieldKind::Text),
        FieldSpec::optional("grupo_sanguineo", "Grupo sanguíneo", FieldKind::Text),
        FieldSpec::optional("seguro_medico", "Seguro médico", FieldKind::Text),
        FieldSpec::optional("alergias", "Alergias", FieldKind::Text),
        FieldSpec::optional("fecha_ingreso", "Fecha ingreso", FieldKind::Date),
        FieldSpec::optional("observaciones", "Observaciones", FieldKind::Text),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        self.full_name()
    }
}

impl Scout {
    pub fn full_name(&self) -> String {
        join_name(&self.nombres, &self.apellidos)
    }

    pub fn display_name(&self) -> String {
        format!("{}, {}", self.apellidos, self.nombres)
    }

    /// Age in whole years on `today`.
    pub fn edad(&self, today: NaiveDate) -> Option<u32> {
        age_on(self.fecha_nacimiento?, today)
    }

    pub fn edad_str(&self, today: NaiveDate) -> String {
        self.edad(today)
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn contact_phone(&self) -> Option<&str> {
        [self.celular.as_deref(), self.telefono.as_deref()]
            .into_iter()
            .flatten()
            .find(|p| !p.trim().is_empty())
    }

    pub fn is_unassigned(&self) -> bool {
        self.patrulla_id.is_none()
    }
}

/// Sorting options for the scouts table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoutSortColumn {
    #[default]
    Name,
    Rama,
    Patrulla,
    Edad,
    Estado,
}

impl ScoutSortColumn {
    pub fn next(&self) -> Self {
        match self {
            ScoutSortColumn::Name => ScoutSortColumn::Rama,
            ScoutSortColumn::Rama => ScoutSortColumn::Patrulla,
            ScoutSortColumn::Patrulla => ScoutSortColumn::Edad,
            ScoutSortColumn::Edad => ScoutSortColumn::Estado,
            ScoutSortColumn::Estado => ScoutSortColumn::Name,
        }
    }
}

pub const PARENTESCOS: &[&str] = &["PADRE", "MADRE", "TUTOR", "ABUELO", "ABUELA", "HERMANO", "OTRO"];

/// A family member of a scout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamiliarScout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub scout_id: i64,
    pub nombres: String,
    pub apellidos: String,
    pub parentesco: String,
    #[serde(default)]
    pub tipo_documento: Option<String>,
    #[serde(default)]
    pub numero_documento: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub celular: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub ocupacion: Option<String>,
    #[serde(default)]
    pub centro_laboral: Option<String>,
    /// Legal guardian who signs authorizations.
    #[serde(default)]
    pub es_apoderado: bool,
}

impl Record for FamiliarScout {
    const TABLE: &'static str = "familiares_scout";
    const ORDER_BY: &'static str = "apellidos";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("nombres", "Nombres", FieldKind::Text),
        FieldSpec::required("apellidos", "Apellidos", FieldKind::Text),
        FieldSpec::required("parentesco", "Parentesco", FieldKind::Choice(PARENTESCOS)),
        FieldSpec::optional("tipo_documento", "Tipo doc.", FieldKind::Choice(TIPOS_DOCUMENTO)),
        FieldSpec::optional("numero_documento", "N° documento", FieldKind::Text),
        FieldSpec::optional("email", "Email", FieldKind::Email),
        FieldSpec::optional("celular", "Celular", FieldKind::Text),
        FieldSpec::optional("telefono", "Teléfono", FieldKind::Text),
        FieldSpec::optional("ocupacion", "Ocupación", FieldKind::Text),
        FieldSpec::optional("centro_laboral", "Centro laboral", FieldKind::Text),
        FieldSpec::optional("es_apoderado", "Apoderado", FieldKind::Bool),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        format!("{} ({})", join_name(&self.nombres, &self.apellidos), self.parentesco.to_lowercase())
    }
}

impl FamiliarScout {
    pub fn full_name(&self) -> String {
        join_name(&self.nombres, &self.apellidos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn test_edad_before_and_after_birthday() {
        let scout = Scout {
            fecha_nacimiento: Some(date(2012, 6, 15)),
            ..Default::default()
        };
        assert_eq!(scout.edad(date(2024, 6, 14)), Some(11));
        assert_eq!(scout.edad(date(2024, 6, 15)), Some(12));
        assert_eq!(Scout::default().edad(date(2024, 1, 1)), None);
        assert_eq!(Scout::default().edad_str(date(2024, 1, 1)), "-");
    }

    #[test]
    fn test_rama_serializes_upper_case() {
        let json = serde_json::to_string(&Rama::Comunidad).expect("serialize rama");
        assert_eq!(json, "\"COMUNIDAD\"");
        let rama: Rama = serde_json::from_str("\"MANADA\"").expect("parse rama");
        assert_eq!(rama, Rama::Manada);
    }

    #[test]
    fn test_scout_parses_backend_row() {
        let json = r#"{
            "id": 12,
            "nombres": "Mateo",
            "apellidos": "Rojas Díaz",
            "fecha_nacimiento": "2011-02-03",
            "rama": "TROPA",
            "estado": "ACTIVO",
            "patrulla_id": null,
            "created_at": "2024-01-01T00:00:00Z"
        }"#;
        let scout: Scout = serde_json::from_str(json).expect("parse scout row");
        assert_eq!(scout.id, Some(12));
        assert_eq!(scout.display_name(), "Rojas Díaz, Mateo");
        assert!(scout.is_unassigned());
    }

    #[test]
    fn test_new_scout_omits_id_but_keeps_null_patrol() {
        let scout = Scout {
            nombres: "Ana".to_string(),
            apellidos: "Vega".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&scout).expect("serialize scout");
        assert!(json.get("id").is_none());
        assert!(json.get("patrulla_id").map(|v| v.is_null()).unwrap_or(false));
    }

    #[test]
    fn test_contact_phone_prefers_mobile() {
        let scout = Scout {
            telefono: Some("014445566".to_string()),
            celular: Some("987654321".to_string()),
            ..Default::default()
        };
        assert_eq!(scout.contact_phone(), Some("987654321"));

        let only_home = Scout {
            telefono: Some("014445566".to_string()),
            celular: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(only_home.contact_phone(), Some("014445566"));
        assert_eq!(Scout::default().contact_phone(), None);
    }
}
