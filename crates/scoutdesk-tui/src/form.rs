//! Modal form state: field values typed by the user, turned into record JSON.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use scoutdesk_core::models::{
    ActividadExterior, AsignacionSubCampo, BloquePrograma, DocumentoAutorizacion, Dirigente,
    FamiliarScout, ItemLogistica, ItemPresupuesto, MaterialBloque, MiembroComite, Patrulla,
    ProgramaSemanal, Record, Scout, SubCampo,
};
use scoutdesk_core::validation::{
    parse_number, validate_fields, value_to_text, FieldKind, FieldSpec, FormErrors,
};

/// Maximum characters accepted in one form field.
const MAX_FIELD_LENGTH: usize = 200;

/// Form key of the receipt file path on the purchase form.
pub const RECEIPT_FIELD: &str = "comprobante";
/// Form key of the "mark budget item as bought" flag on the purchase form.
pub const MARK_BOUGHT_FIELD: &str = "marcar_comprado";

/// Purchase form: the record's fields plus the receipt and item flag.
const COMPRA_FORM_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("descripcion", "Descripción", FieldKind::Text),
    FieldSpec::required("monto", "Monto", FieldKind::Number),
    FieldSpec::optional("fecha", "Fecha", FieldKind::Date),
    FieldSpec::optional("proveedor", "Proveedor", FieldKind::Text),
    FieldSpec::optional("item_id", "Ítem (id)", FieldKind::Integer),
    FieldSpec::optional(RECEIPT_FIELD, "Comprobante (archivo)", FieldKind::Text),
    FieldSpec::optional(MARK_BOUGHT_FIELD, "Marcar ítem comprado", FieldKind::Bool),
];

/// What a form creates or edits, with the parent row it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Scout,
    Familiar { scout_id: i64 },
    Dirigente,
    Comite,
    Patrulla,
    SubCampo { actividad_id: i64 },
    Asignacion { actividad_id: i64 },
    Programa,
    /// A block inside a program's agenda; `index` is set when editing.
    Bloque { programa_id: i64, index: Option<usize> },
    Material { programa_id: i64 },
    Actividad,
    Presupuesto { actividad_id: i64 },
    Logistica { actividad_id: i64 },
    Compra { actividad_id: i64 },
    Documento { actividad_id: i64 },
}

impl FormTarget {
    pub fn title(&self) -> &'static str {
        match self {
            FormTarget::Scout => "Scout",
            FormTarget::Familiar { .. } => "Familiar",
            FormTarget::Dirigente => "Dirigente",
            FormTarget::Comite => "Miembro del comité",
            FormTarget::Patrulla => "Patrulla",
            FormTarget::SubCampo { .. } => "Subcampo",
            FormTarget::Asignacion { .. } => "Asignación de subcampo",
            FormTarget::Programa => "Programa semanal",
            FormTarget::Bloque { .. } => "Bloque del programa",
            FormTarget::Material { .. } => "Material",
            FormTarget::Actividad => "Actividad",
            FormTarget::Presupuesto { .. } => "Ítem de presupuesto",
            FormTarget::Logistica { .. } => "Ítem de logística",
            FormTarget::Compra { .. } => "Compra",
            FormTarget::Documento { .. } => "Autorización",
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            FormTarget::Scout => Scout::FIELDS,
            FormTarget::Familiar { .. } => FamiliarScout::FIELDS,
            FormTarget::Dirigente => Dirigente::FIELDS,
            FormTarget::Comite => MiembroComite::FIELDS,
            FormTarget::Patrulla => Patrulla::FIELDS,
            FormTarget::SubCampo { .. } => SubCampo::FIELDS,
            FormTarget::Asignacion { .. } => AsignacionSubCampo::FIELDS,
            FormTarget::Programa => ProgramaSemanal::FIELDS,
            FormTarget::Bloque { .. } => BloquePrograma::FIELDS,
            FormTarget::Material { .. } => MaterialBloque::FIELDS,
            FormTarget::Actividad => ActividadExterior::FIELDS,
            FormTarget::Presupuesto { .. } => ItemPresupuesto::FIELDS,
            FormTarget::Logistica { .. } => ItemLogistica::FIELDS,
            FormTarget::Compra { .. } => COMPRA_FORM_FIELDS,
            FormTarget::Documento { .. } => DocumentoAutorizacion::FIELDS,
        }
    }

    /// Foreign key the new row must carry.
    pub fn parent(&self) -> Option<(&'static str, i64)> {
        match *self {
            FormTarget::Familiar { scout_id } => Some(("scout_id", scout_id)),
            FormTarget::SubCampo { actividad_id }
            | FormTarget::Asignacion { actividad_id }
            | FormTarget::Presupuesto { actividad_id }
            | FormTarget::Logistica { actividad_id }
            | FormTarget::Compra { actividad_id }
            | FormTarget::Documento { actividad_id } => Some(("actividad_id", actividad_id)),
            FormTarget::Material { programa_id } => Some(("programa_id", programa_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub target: FormTarget,
    /// Record being edited, or an empty object for a new one.
    base: Value,
    pub values: Vec<String>,
    pub focus: usize,
    pub errors: FormErrors,
    /// Error from the backend after a submit attempt.
    pub submit_error: Option<String>,
}

impl FormState {
    /// Empty form with choice fields preset to their first option.
    pub fn new(target: FormTarget) -> Self {
        let values = target
            .fields()
            .iter()
            .map(|spec| match spec.kind {
                FieldKind::Choice(options) if spec.required => {
                    options.first().map(|o| o.to_string()).unwrap_or_default()
                }
                _ => String::new(),
            })
            .collect();
        Self {
            target,
            base: Value::Object(Map::new()),
            values,
            focus: 0,
            errors: FormErrors::default(),
            submit_error: None,
        }
    }

    /// Form prefilled from an existing record's JSON.
    pub fn edit(target: FormTarget, existing: Value) -> Self {
        let values = target
            .fields()
            .iter()
            .map(|spec| existing.get(spec.key).map(value_to_text).unwrap_or_default())
            .collect();
        Self {
            target,
            base: existing,
            values,
            focus: 0,
            errors: FormErrors::default(),
            submit_error: None,
        }
    }

    pub fn is_edit(&self) -> bool {
        match self.target {
            FormTarget::Bloque { index, .. } => index.is_some(),
            _ => self.base.get("id").is_some_and(|id| !id.is_null()),
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.target.fields()
    }

    pub fn focused_spec(&self) -> Option<&'static FieldSpec> {
        self.fields().get(self.focus)
    }

    /// Current text of a field by key.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields()
            .iter()
            .position(|spec| spec.key == key)
            .and_then(|i| self.values.get(i))
            .map(|s| s.as_str())
    }

    pub fn set_value(&mut self, key: &str, text: impl Into<String>) {
        if let Some(i) = self.fields().iter().position(|spec| spec.key == key) {
            if let Some(value) = self.values.get_mut(i) {
                *value = text.into();
            }
        }
    }

    /// Whether a yes/no field is set to yes.
    pub fn flag(&self, key: &str) -> bool {
        self.value(key)
            .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "sí" | "si" | "true"))
    }

    pub fn next_field(&mut self) {
        let len = self.fields().len();
        if len > 0 {
            self.focus = (self.focus + 1) % len;
        }
    }

    pub fn prev_field(&mut self) {
        let len = self.fields().len();
        if len > 0 {
            self.focus = (self.focus + len - 1) % len;
        }
    }

    pub fn push_char(&mut self, c: char) {
        if c.is_control() {
            return;
        }
        if let Some(value) = self.values.get_mut(self.focus) {
            if value.chars().count() < MAX_FIELD_LENGTH {
                value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(value) = self.values.get_mut(self.focus) {
            value.pop();
        }
    }

    /// Step a choice or yes/no field to its next or previous option.
    /// Returns false for free-text fields.
    pub fn cycle_option(&mut self, forward: bool) -> bool {
        let Some(spec) = self.focused_spec() else {
            return false;
        };
        let options: Vec<&str> = match spec.kind {
            FieldKind::Choice(options) if spec.required => options.to_vec(),
            FieldKind::Choice(options) => std::iter::once("").chain(options.iter().copied()).collect(),
            FieldKind::Bool => vec!["Sí", "No"],
            _ => return false,
        };
        let Some(value) = self.values.get_mut(self.focus) else {
            return false;
        };
        let current = options
            .iter()
            .position(|o| o.eq_ignore_ascii_case(value.trim()))
            .unwrap_or(options.len() - 1);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        *value = options[next].to_string();
        true
    }

    /// Run field validation, keeping the errors for inline display.
    pub fn validate(&mut self) -> bool {
        let fields = self.fields();
        let values = &self.values;
        self.errors = validate_fields(fields, |key| {
            fields
                .iter()
                .position(|spec| spec.key == key)
                .and_then(|i| values.get(i))
                .map(|s| s.as_str())
        });
        self.errors.is_empty()
    }

    /// Record JSON: the edited record with the form values laid over it.
    ///
    /// Empty values drop the key so optional columns clear and defaulted
    /// ones fall back to their default.
    pub fn to_json(&self) -> Value {
        let mut map = match &self.base {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        for (spec, text) in self.fields().iter().zip(&self.values) {
            map.insert(spec.key.to_string(), field_value(spec, text));
        }
        if let Some((key, id)) = self.target.parent() {
            map.entry(key.to_string()).or_insert(Value::from(id));
        }
        map.retain(|_, v| !v.is_null());
        Value::Object(map)
    }

    /// Validated form values as a typed record.
    pub fn to_record<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        serde_json::from_value(self.to_json())
            .map_err(|e| anyhow::anyhow!("Form does not match {}: {}", self.target.title(), e))
    }
}

/// JSON value for one form field.
fn field_value(spec: &FieldSpec, text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    match spec.kind {
        FieldKind::Number | FieldKind::Integer | FieldKind::Coordinate => {
            parse_number(text).map(number_value).unwrap_or(Value::Null)
        }
        FieldKind::Choice(options) => {
            let canonical = options
                .iter()
                .find(|o| o.eq_ignore_ascii_case(text))
                .map(|o| o.to_string())
                .unwrap_or_else(|| text.to_uppercase());
            Value::String(canonical)
        }
        FieldKind::Bool => Value::Bool(matches!(
            text.to_lowercase().as_str(),
            "sí" | "si" | "true"
        )),
        FieldKind::Text | FieldKind::Email | FieldKind::Date => Value::String(text.to_string()),
    }
}

/// Whole numbers become JSON integers so integer columns deserialize.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoutdesk_core::models::{EstadoItem, Rama};
    use serde_json::json;

    fn set(form: &mut FormState, key: &str, text: &str) {
        let i = form
            .fields()
            .iter()
            .position(|s| s.key == key)
            .expect("field exists");
        form.values[i] = text.to_string();
    }

    #[test]
    fn test_required_fields_block_submit() {
        let mut form = FormState::new(FormTarget::Scout);
        set(&mut form, "email", "sin-arroba");
        assert!(!form.validate());
        assert!(form.errors.get("nombres").is_some());
        assert!(form.errors.get("apellidos").is_some());
        assert!(form.errors.get("email").is_some());
        // Required choices start on their first option
        assert!(form.errors.get("rama").is_none());
    }

    #[test]
    fn test_new_record_json_converts_kinds() {
        let mut form = FormState::new(FormTarget::Presupuesto { actividad_id: 4 });
        set(&mut form, "categoria", "transporte");
        set(&mut form, "descripcion", " Bus ida y vuelta ");
        set(&mut form, "cantidad", "2");
        set(&mut form, "precio_unitario", "150,50");
        set(&mut form, "comprado", "No");
        assert!(form.validate());

        let json = form.to_json();
        assert_eq!(json["categoria"], "TRANSPORTE");
        assert_eq!(json["descripcion"], "Bus ida y vuelta");
        assert_eq!(json["cantidad"], json!(2));
        assert_eq!(json["precio_unitario"], json!(150.5));
        assert_eq!(json["comprado"], json!(false));
        assert_eq!(json["actividad_id"], json!(4));
        assert!(json.get("dias_alquiler").is_none());

        let item: ItemPresupuesto = form.to_record().expect("typed record");
        assert_eq!(item.subtotal_cents(), 30100);
    }

    #[test]
    fn test_edit_keeps_fields_outside_the_form() {
        let existing = json!({
            "id": 3,
            "fecha": "2024-05-04",
            "rama": "TROPA",
            "tema": "Nudos",
            "estado": "BORRADOR",
            "lugar": "Local",
            "bloques": [{"actividad": "Formación", "duracion_minutos": 15}]
        });
        let mut form = FormState::edit(FormTarget::Programa, existing);
        assert!(form.is_edit());
        assert_eq!(form.value("tema"), Some("Nudos"));

        set(&mut form, "tema", "Nudos y amarres");
        set(&mut form, "lugar", "");
        let programa: ProgramaSemanal = form.to_record().expect("typed record");
        assert_eq!(programa.id, Some(3));
        assert_eq!(programa.tema, "Nudos y amarres");
        assert_eq!(programa.lugar, None);
        assert_eq!(programa.bloques.len(), 1);
        assert_eq!(programa.rama, Rama::Tropa);
    }

    #[test]
    fn test_integer_columns_accept_whole_numbers() {
        let mut form = FormState::new(FormTarget::Material { programa_id: 8 });
        set(&mut form, "material", "Cuerdas");
        set(&mut form, "cantidad", "6");
        set(&mut form, "bloque", "");
        let material: MaterialBloque = form.to_record().expect("typed record");
        assert_eq!(material.cantidad, 6);
        assert_eq!(material.bloque, 0);
        assert_eq!(material.programa_id, 8);
    }

    #[test]
    fn test_fractional_rental_days_rejected_inline() {
        let mut form = FormState::new(FormTarget::Presupuesto { actividad_id: 4 });
        set(&mut form, "descripcion", "Carpas");
        set(&mut form, "cantidad", "2,5");
        set(&mut form, "precio_unitario", "30");
        set(&mut form, "dias_alquiler", "2.5");
        assert!(!form.validate());
        assert_eq!(form.errors.len(), 1);
        assert_eq!(
            form.errors.get("dias_alquiler"),
            Some("Días alquiler must be a whole number")
        );

        set(&mut form, "dias_alquiler", "3");
        assert!(form.validate());
        let item: ItemPresupuesto = form.to_record().expect("typed record");
        assert_eq!(item.dias_alquiler, Some(3));
    }

    #[test]
    fn test_cycle_option_wraps() {
        let mut form = FormState::new(FormTarget::Logistica { actividad_id: 1 });
        form.focus = form
            .fields()
            .iter()
            .position(|s| s.key == "estado")
            .expect("estado");
        assert_eq!(form.value("estado"), Some("PENDIENTE"));
        assert!(form.cycle_option(true));
        assert_eq!(form.value("estado"), Some("LISTO"));
        assert!(form.cycle_option(true));
        assert_eq!(form.value("estado"), Some("PENDIENTE"));

        set(&mut form, "descripcion", "Botiquín");
        let item: ItemLogistica = form.to_record().expect("typed record");
        assert_eq!(item.estado, EstadoItem::Pendiente);

        form.focus = 0;
        assert!(!form.cycle_option(true));
    }

    #[test]
    fn test_purchase_form_extra_fields_are_ignored_by_record() {
        let mut form = FormState::new(FormTarget::Compra { actividad_id: 2 });
        set(&mut form, "descripcion", "Gas");
        set(&mut form, "monto", "45.5");
        set(&mut form, RECEIPT_FIELD, "/tmp/boleta.jpg");
        set(&mut form, MARK_BOUGHT_FIELD, "Sí");
        assert!(form.validate());
        assert_eq!(form.value(RECEIPT_FIELD), Some("/tmp/boleta.jpg"));

        let compra: scoutdesk_core::models::CompraRegistro = form.to_record().expect("typed record");
        assert_eq!(compra.monto_cents(), 4550);
        assert_eq!(compra.actividad_id, 2);
    }

    #[test]
    fn test_field_length_is_capped() {
        let mut form = FormState::new(FormTarget::Patrulla);
        for _ in 0..MAX_FIELD_LENGTH + 10 {
            form.push_char('a');
        }
        form.push_char('\n');
        assert_eq!(form.values[0].chars().count(), MAX_FIELD_LENGTH);
    }
}
