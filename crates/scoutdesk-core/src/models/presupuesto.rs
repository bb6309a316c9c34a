use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Record;
use crate::validation::{FieldKind, FieldSpec};

/// Expense category of a budget line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoriaGasto {
    Alimentacion,
    Transporte,
    Alojamiento,
    Equipo,
    Materiales,
    Seguro,
    #[default]
    Otros,
}

impl CategoriaGasto {
    pub const ALL: [CategoriaGasto; 7] = [
        CategoriaGasto::Alimentacion,
        CategoriaGasto::Transporte,
        CategoriaGasto::Alojamiento,
        CategoriaGasto::Equipo,
        CategoriaGasto::Materiales,
        CategoriaGasto::Seguro,
        CategoriaGasto::Otros,
    ];

    pub const CHOICES: &'static [&'static str] = &[
        "ALIMENTACION",
        "TRANSPORTE",
        "ALOJAMIENTO",
        "EQUIPO",
        "MATERIALES",
        "SEGURO",
        "OTROS",
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CategoriaGasto::Alimentacion => "Alimentación",
            CategoriaGasto::Transporte => "Transporte",
            CategoriaGasto::Alojamiento => "Alojamiento",
            CategoriaGasto::Equipo => "Equipo",
            CategoriaGasto::Materiales => "Materiales",
            CategoriaGasto::Seguro => "Seguro",
            CategoriaGasto::Otros => "Otros",
        }
    }
}

/// Quantities are kept to thousandths (grams, millilitres).
const QUANTITY_SCALE: i128 = 1000;

/// Convert an amount to whole cents.
fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Integer division rounding half away from zero.
fn round_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if r.abs() * 2 >= d.abs() {
        q + n.signum() * d.signum()
    } else {
        q
    }
}

/// A budget line of an outdoor activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPresupuesto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub actividad_id: i64,
    #[serde(default)]
    pub categoria: CategoriaGasto,
    pub descripcion: String,
    pub cantidad: f64,
    #[serde(default)]
    pub unidad: Option<String>,
    pub precio_unitario: f64,
    /// Rental days for rented equipment; multiplies the subtotal when > 0.
    #[serde(default)]
    pub dias_alquiler: Option<u32>,
    #[serde(default)]
    pub comprado: bool,
    #[serde(default)]
    pub proveedor: Option<String>,
}

impl Record for ItemPresupuesto {
    const TABLE: &'static str = "items_presupuesto";
    const ORDER_BY: &'static str = "categoria";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("categoria", "Categoría", FieldKind::Choice(CategoriaGasto::CHOICES)),
        FieldSpec::required("descripcion", "Descripción", FieldKind::Text),
        FieldSpec::required("cantidad", "Cantidad", FieldKind::Number),
        FieldSpec::optional("unidad", "Unidad", FieldKind::Text),
        FieldSpec::required("precio_unitario", "Precio unitario", FieldKind::Number),
        FieldSpec::optional("dias_alquiler", "Días alquiler", FieldKind::Integer),
        FieldSpec::optional("proveedor", "Proveedor", FieldKind::Text),
        FieldSpec::optional("comprado", "Comprado", FieldKind::Bool),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        self.descripcion.clone()
    }
}

impl ItemPresupuesto {
    /// Rental-day multiplier, 1 when not a rental.
    pub fn dias_factor(&self) -> u32 {
        self.dias_alquiler.filter(|d| *d > 0).unwrap_or(1)
    }

    /// Subtotal in cents: quantity × unit price [× rental days].
    ///
    /// The price is taken to whole cents and the quantity to thousandths
    /// before multiplying, so half-cent results round away from zero.
    pub fn subtotal_cents(&self) -> i64 {
        let precio_cents = i128::from(to_cents(self.precio_unitario));
        let cantidad_milli = (self.cantidad * QUANTITY_SCALE as f64).round() as i128;
        let raw = cantidad_milli * precio_cents * i128::from(self.dias_factor());
        round_div(raw, QUANTITY_SCALE) as i64
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal_cents() as f64 / 100.0
    }
}

/// A purchase registered against an activity's budget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompraRegistro {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub actividad_id: i64,
    /// Budget line this purchase settles, if any.
    #[serde(default)]
    pub item_id: Option<i64>,
    pub descripcion: String,
    pub monto: f64,
    #[serde(default)]
    pub fecha: Option<NaiveDate>,
    #[serde(default)]
    pub proveedor: Option<String>,
    /// Public URL of the uploaded receipt photo.
    #[serde(default)]
    pub comprobante_url: Option<String>,
}

impl Record for CompraRegistro {
    const TABLE: &'static str = "compras";
    const ORDER_BY: &'static str = "fecha";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("descripcion", "Descripción", FieldKind::Text),
        FieldSpec::required("monto", "Monto", FieldKind::Number),
        FieldSpec::optional("fecha", "Fecha", FieldKind::Date),
        FieldSpec::optional("proveedor", "Proveedor", FieldKind::Text),
        FieldSpec::optional("item_id", "Ítem (id)", FieldKind::Integer),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        self.descripcion.clone()
    }
}

impl CompraRegistro {
    pub fn monto_cents(&self) -> i64 {
        to_cents(self.monto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(cantidad: f64, precio: f64, dias: Option<u32>) -> ItemPresupuesto {
        ItemPresupuesto {
            descripcion: "Item".to_string(),
            cantidad,
            precio_unitario: precio,
            dias_alquiler: dias,
            ..Default::default()
        }
    }

    #[test]
    fn test_subtotal_without_rental_days() {
        assert_eq!(item(3.0, 19.99, None).subtotal_cents(), 5997);
        assert_eq!(item(0.1, 0.2, None).subtotal_cents(), 2);
    }

    #[test]
    fn test_subtotal_with_rental_days() {
        assert_eq!(item(2.0, 35.5, Some(3)).subtotal_cents(), 21300);
        // Zero days means "not a rental"
        assert_eq!(item(2.0, 35.5, Some(0)).subtotal_cents(), 7100);
    }

    #[test]
    fn test_subtotal_fractional_quantity() {
        let arroz = item(2.5, 4.2, None);
        assert_eq!(arroz.subtotal_cents(), 1050);
        assert!((arroz.subtotal() - 10.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_subtotal_half_cent_rounds_up() {
        let cases = [
            (1.5, 0.15, None, 23),
            (0.5, 2.05, None, 103),
            (0.5, 0.01, None, 1),
            (0.5, 0.03, None, 2),
            (2.5, 0.05, None, 13),
            (0.5, 0.05, Some(3), 8),
        ];
        for (cantidad, precio, dias, expected) in cases {
            assert_eq!(
                item(cantidad, precio, dias).subtotal_cents(),
                expected,
                "{} x {} x {:?}",
                cantidad,
                precio,
                dias
            );
        }
    }

    #[test]
    fn test_round_div_away_from_zero() {
        assert_eq!(round_div(1025, 10), 103);
        assert_eq!(round_div(1024, 10), 102);
        assert_eq!(round_div(-1025, 10), -103);
        assert_eq!(round_div(-1024, 10), -102);
    }

    #[test]
    fn test_categoria_wire_names() {
        let json = serde_json::to_string(&CategoriaGasto::Alimentacion).expect("serialize");
        assert_eq!(json, "\"ALIMENTACION\"");
        assert_eq!(CategoriaGasto::ALL.len(), CategoriaGasto::CHOICES.len());
    }
}
