//! Built-in registration forms.
//!
//! DNGI-02 registers a youth member, DNGI-03 an adult leader. Both use a
//! four-column grid: label (20%) / value (30%) / label (20%) / value (30%).

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use super::field::to_source;
use super::layout::{TemplateCell, TemplateLayout};
use super::TemplateError;
use crate::models::scout::age_on;
use crate::models::{Dirigente, FamiliarScout, Patrulla, Scout};

const DATE_DISPLAY: &str = "%d/%m/%Y";

fn section(title: &str) -> Vec<TemplateCell> {
    vec![TemplateCell::header(title, 100.0).span(4)]
}

fn pair(label_a: &str, field_a: &str, label_b: &str, field_b: &str) -> Vec<TemplateCell> {
    vec![
        TemplateCell::header(label_a, 20.0),
        TemplateCell::data(field_a, 30.0),
        TemplateCell::header(label_b, 20.0),
        TemplateCell::data(field_b, 30.0),
    ]
}

fn wide(label: &str, field: &str) -> Vec<TemplateCell> {
    vec![
        TemplateCell::header(label, 20.0),
        TemplateCell::data(field, 80.0).span(3),
    ]
}

fn signatures(left: &str, right: &str) -> [Vec<TemplateCell>; 2] {
    [
        vec![
            TemplateCell::data("firma_izquierda", 50.0).span(2),
            TemplateCell::data("firma_derecha", 50.0).span(2),
        ],
        vec![
            TemplateCell::header(left, 50.0).span(2),
            TemplateCell::header(right, 50.0).span(2),
        ],
    ]
}

/// DNGI-02: youth member registration form.
pub fn dngi02() -> TemplateLayout {
    let [firma_blank, firma_labels] = signatures("Firma del padre o apoderado", "Firma del Jefe de Grupo");
    TemplateLayout::new("DNGI-02", "FICHA DE INSCRIPCIÓN DE MIEMBRO JUVENIL")
        .row(section("I. DATOS PERSONALES"))
        .row(pair("Apellidos", "apellidos", "Nombres", "nombres"))
        .row(pair("Tipo de documento", "tipo_documento", "N° de documento", "numero_documento"))
        .row(pair("Fecha de nacimiento", "fecha_nacimiento", "Edad", "edad"))
        .row(pair("Sexo", "sexo", "Religión", "religion"))
        .row(wide("Dirección", "direccion"))
        .row(pair("Distrito", "distrito", "Teléfono", "telefono_contacto"))
        .row(wide("Correo electrónico", "email"))
        .row(section("II. DATOS INSTITUCIONALES"))
        .row(pair("Rama", "rama", "Patrulla", "patrulla"))
        .row(pair("Código de asociado", "codigo_asociado", "Fecha de ingreso", "fecha_ingreso"))
        .row(pair("Colegio", "colegio", "Grado", "grado_estudios"))
        .row(section("III. DATOS DE SALUD"))
        .row(pair("Grupo sanguíneo", "grupo_sanguineo", "Seguro médico", "seguro_medico"))
        .row(wide("Alergias", "alergias"))
        .row(section("IV. PADRE, MADRE O APODERADO"))
        .row(wide("Apellidos y nombres", "apoderado.nombre"))
        .row(pair("Parentesco", "apoderado.parentesco", "N° de documento", "apoderado.numero_documento"))
        .row(pair("Celular", "apoderado.celular", "Correo electrónico", "apoderado.email"))
        .row(pair("Ocupación", "apoderado.ocupacion", "Fecha", "fecha_emision"))
        .row(firma_blank)
        .row(firma_labels)
}

/// DNGI-03: adult leader registration form.
pub fn dngi03() -> TemplateLayout {
    let [firma_blank, firma_labels] = signatures("Firma del dirigente", "Firma del Jefe de Grupo");
    TemplateLayout::new("DNGI-03", "FICHA DE INSCRIPCIÓN DE DIRIGENTE")
        .row(section("I. DATOS PERSONALES"))
        .row(pair("Apellidos", "apellidos", "Nombres", "nombres"))
        .row(pair("Tipo de documento", "tipo_documento", "N° de documento", "numero_documento"))
        .row(pair("Fecha de nacimiento", "fecha_nacimiento", "Edad", "edad"))
        .row(pair("Sexo", "sexo", "Estado civil", "estado_civil"))
        .row(pair("Nacionalidad", "nacionalidad", "Teléfono", "telefono_contacto"))
        .row(wide("Dirección", "direccion"))
        .row(pair("Distrito", "distrito", "Correo electrónico", "email"))
        .row(section("II. DATOS PROFESIONALES"))
        .row(pair("Profesión u oficio", "profesion", "Centro laboral", "centro_laboral"))
        .row(section("III. DATOS INSTITUCIONALES"))
        .row(pair("Cargo", "cargo", "Rama", "rama"))
        .row(pair("Nivel de formación", "nivel_formacion", "Código de asociado", "codigo_asociado"))
        .row(pair("Fecha de ingreso", "fecha_ingreso", "Fecha", "fecha_emision"))
        .row(firma_blank)
        .row(firma_labels)
}

/// Which built-in form to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Dngi02,
    Dngi03,
}

impl FormKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "dngi02" => Some(FormKind::Dngi02),
            "dngi03" => Some(FormKind::Dngi03),
            _ => None,
        }
    }

    pub fn layout(&self) -> TemplateLayout {
        match self {
            FormKind::Dngi02 => dngi02(),
            FormKind::Dngi03 => dngi03(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FormKind::Dngi02 => "DNGI-02",
            FormKind::Dngi03 => "DNGI-03",
        }
    }

    /// `DNGI-02_<apellidos>_<nombres>.<ext>` with spaces replaced.
    pub fn file_name(&self, apellidos: &str, nombres: &str, extension: &str) -> String {
        let clean = |s: &str| {
            s.split_whitespace()
                .collect::<Vec<_>>()
                .join("_")
                .replace(['/', '\\'], "_")
        };
        format!("{}_{}_{}.{}", self.code(), clean(apellidos), clean(nombres), extension)
    }
}

fn object(value: &mut Value) -> Result<&mut Map<String, Value>, TemplateError> {
    value.as_object_mut().ok_or_else(|| TemplateError::Render {
        format: "source",
        message: "record is not an object".to_string(),
    })
}

fn format_date(date: Option<NaiveDate>) -> Value {
    date.map(|d| Value::String(d.format(DATE_DISPLAY).to_string()))
        .unwrap_or(Value::Null)
}

fn edad(born: Option<NaiveDate>, today: NaiveDate) -> Value {
    born.and_then(|b| age_on(b, today))
        .map(Value::from)
        .unwrap_or(Value::Null)
}

fn non_blank<'a>(values: [Option<&'a str>; 2]) -> Option<&'a str> {
    values.into_iter().flatten().find(|v| !v.trim().is_empty())
}

/// Field source for a DNGI-02 form: the scout's own fields plus display
/// values for dates, branch, patrol and guardian.
pub fn dngi02_source(
    scout: &Scout,
    patrulla: Option<&Patrulla>,
    apoderado: Option<&FamiliarScout>,
    today: NaiveDate,
) -> Result<Value, TemplateError> {
    let mut source = to_source(scout)?;
    let map = object(&mut source)?;

    map.insert("fecha_nacimiento".into(), format_date(scout.fecha_nacimiento));
    map.insert("fecha_ingreso".into(), format_date(scout.fecha_ingreso));
    map.insert("edad".into(), edad(scout.fecha_nacimiento, today));
    map.insert("rama".into(), Value::from(scout.rama.label()));
    map.insert(
        "patrulla".into(),
        patrulla.map(|p| Value::from(p.nombre.clone())).unwrap_or(Value::Null),
    );
    map.insert(
        "telefono_contacto".into(),
        scout.contact_phone().map(Value::from).unwrap_or(Value::Null),
    );
    map.insert("fecha_emision".into(), format_date(Some(today)));

    if let Some(familiar) = apoderado {
        map.insert(
            "apoderado".into(),
            json!({
                "nombre": familiar.full_name(),
                "parentesco": familiar.parentesco,
                "numero_documento": familiar.numero_documento,
                "celular": non_blank([familiar.celular.as_deref(), familiar.telefono.as_deref()]),
                "email": familiar.email,
                "ocupacion": familiar.ocupacion,
            }),
        );
    }

    Ok(source)
}

/// Field source for a DNGI-03 form.
pub fn dngi03_source(dirigente: &Dirigente, today: NaiveDate) -> Result<Value, TemplateError> {
    let mut source = to_source(dirigente)?;
    let map = object(&mut source)?;

    map.insert("fecha_nacimiento".into(), format_date(dirigente.fecha_nacimiento));
    map.insert("fecha_ingreso".into(), format_date(dirigente.fecha_ingreso));
    map.insert("edad".into(), edad(dirigente.fecha_nacimiento, today));
    map.insert("cargo".into(), Value::from(dirigente.cargo_display()));
    map.insert(
        "rama".into(),
        dirigente.rama.map(|r| Value::from(r.label())).unwrap_or(Value::Null),
    );
    map.insert(
        "telefono_contacto".into(),
        non_blank([dirigente.celular.as_deref(), dirigente.telefono.as_deref()])
            .map(Value::from)
            .unwrap_or(Value::Null),
    );
    map.insert("fecha_emision".into(), format_date(Some(today)));

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rama;
    use crate::template::layout::populate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date")
    }

    #[test]
    fn test_builtin_layouts_validate() {
        for layout in [dngi02(), dngi03()] {
            assert!(layout.problems().is_empty(), "{}: {:?}", layout.code, layout.problems());
            assert_eq!(layout.grid_columns(), 4);
            for row in &layout.rows {
                assert!((row.width_sum() - 100.0).abs() < 0.01);
            }
        }
    }

    #[test]
    fn test_dngi02_populates_scout_and_guardian() {
        let scout = Scout {
            id: Some(1),
            nombres: "Lucía".to_string(),
            apellidos: "Paredes Soto".to_string(),
            fecha_nacimiento: NaiveDate::from_ymd_opt(2012, 6, 15),
            rama: Rama::Tropa,
            celular: Some("987654321".to_string()),
            ..Default::default()
        };
        let patrulla = Patrulla {
            id: Some(3),
            nombre: "Halcones".to_string(),
            ..Default::default()
        };
        let madre = FamiliarScout {
            scout_id: 1,
            nombres: "Rosa".to_string(),
            apellidos: "Soto".to_string(),
            parentesco: "MADRE".to_string(),
            telefono: Some("014445566".to_string()),
            es_apoderado: true,
            ..Default::default()
        };

        let source = dngi02_source(&scout, Some(&patrulla), Some(&madre), today()).expect("source");
        let doc = populate(&dngi02(), &source);

        assert_eq!(doc.code, "DNGI-02");
        assert_eq!(doc.value_after("Nombres"), Some("Lucía"));
        assert_eq!(doc.value_after("Fecha de nacimiento"), Some("15/06/2012"));
        assert_eq!(doc.value_after("Edad"), Some("11"));
        assert_eq!(doc.value_after("Rama"), Some("Tropa"));
        assert_eq!(doc.value_after("Patrulla"), Some("Halcones"));
        assert_eq!(doc.value_after("Apellidos y nombres"), Some("Rosa Soto"));
        assert_eq!(doc.value_after("Celular"), Some("014445566"));
        // Missing values stay empty
        assert_eq!(doc.value_after("Colegio"), Some(""));
    }

    #[test]
    fn test_dngi02_without_guardian_leaves_section_empty() {
        let scout = Scout {
            nombres: "Mateo".to_string(),
            apellidos: "Rojas".to_string(),
            ..Default::default()
        };
        let source = dngi02_source(&scout, None, None, today()).expect("source");
        let doc = populate(&dngi02(), &source);
        assert_eq!(doc.value_after("Apellidos y nombres"), Some(""));
        assert_eq!(doc.value_after("Patrulla"), Some(""));
        assert_eq!(doc.value_after("Edad"), Some(""));
    }

    #[test]
    fn test_dngi03_uses_cargo_display() {
        let dirigente = Dirigente {
            nombres: "Luis".to_string(),
            apellidos: "Quispe".to_string(),
            numero_documento: "45678912".to_string(),
            cargo: Some("JEFE_RAMA".to_string()),
            rama: Some(Rama::Clan),
            ..Default::default()
        };
        let doc = populate(&dngi03(), &dngi03_source(&dirigente, today()).expect("source"));
        assert_eq!(doc.value_after("Cargo"), Some("Jefe de Clan"));
        assert_eq!(doc.value_after("N° de documento"), Some("45678912"));
        assert_eq!(doc.value_after("Fecha"), Some("10/03/2024"));
    }

    #[test]
    fn test_form_kind_parse_and_file_name() {
        assert_eq!(FormKind::parse("DNGI-02"), Some(FormKind::Dngi02));
        assert_eq!(FormKind::parse("dngi03"), Some(FormKind::Dngi03));
        assert_eq!(FormKind::parse("dngi04"), None);
        assert_eq!(
            FormKind::Dngi02.file_name("Paredes  Soto", "Lucía", "pdf"),
            "DNGI-02_Paredes_Soto_Lucía.pdf"
        );
    }
}
