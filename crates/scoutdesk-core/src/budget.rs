//! Budget aggregation for outdoor activities.
//!
//! All amounts are integer cents so totals shown on screen add up exactly.

use std::collections::BTreeMap;

use crate::models::{ActividadExterior, CategoriaGasto, CompraRegistro, ItemPresupuesto};

/// Percentage of `part` over `total`, 0 when the total is 0.
pub fn percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub categoria: CategoriaGasto,
    pub cents: i64,
    pub items: usize,
    /// Share of the activity total.
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetSummary {
    pub total_cents: i64,
    /// Categories with at least one line, in `CategoriaGasto` order.
    pub by_category: Vec<CategoryTotal>,
    /// Sum of registered purchases.
    pub executed_cents: i64,
    pub remaining_cents: i64,
    pub execution_percent: f64,
    pub items_total: usize,
    pub items_purchased: usize,
    pub cost_per_participant_cents: Option<i64>,
}

impl BudgetSummary {
    pub fn compute(
        actividad: &ActividadExterior,
        items: &[ItemPresupuesto],
        compras: &[CompraRegistro],
    ) -> Self {
        let id = actividad.id;
        let items: Vec<&ItemPresupuesto> = items
            .iter()
            .filter(|i| Some(i.actividad_id) == id)
            .collect();
        let compras: Vec<&CompraRegistro> = compras
            .iter()
            .filter(|c| Some(c.actividad_id) == id)
            .collect();

        let mut per_category: BTreeMap<CategoriaGasto, (i64, usize)> = BTreeMap::new();
        for item in &items {
            let entry = per_category.entry(item.categoria).or_default();
            entry.0 += item.subtotal_cents();
            entry.1 += 1;
        }

        let total_cents: i64 = per_category.values().map(|(cents, _)| cents).sum();
        let by_category = per_category
            .into_iter()
            .map(|(categoria, (cents, count))| CategoryTotal {
                categoria,
                cents,
                items: count,
                percent: percent(cents, total_cents),
            })
            .collect();

        let executed_cents: i64 = compras.iter().map(|c| c.monto_cents()).sum();

        let cost_per_participant_cents = actividad
            .participantes
            .filter(|p| *p > 0)
            .map(|p| (total_cents as f64 / f64::from(p)).round() as i64);

        Self {
            total_cents,
            by_category,
            executed_cents,
            remaining_cents: total_cents - executed_cents,
            execution_percent: percent(executed_cents, total_cents),
            items_total: items.len(),
            items_purchased: items.iter().filter(|i| i.comprado).count(),
            cost_per_participant_cents,
        }
    }

    pub fn category(&self, categoria: CategoriaGasto) -> Option<&CategoryTotal> {
        self.by_category.iter().find(|c| c.categoria == categoria)
    }

    pub fn is_over_budget(&self) -> bool {
        self.remaining_cents < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actividad() -> ActividadExterior {
        ActividadExterior {
            id: Some(1),
            nombre: "Campamento de invierno".to_string(),
            participantes: Some(20),
            ..Default::default()
        }
    }

    fn item(categoria: CategoriaGasto, cantidad: f64, precio: f64) -> ItemPresupuesto {
        ItemPresupuesto {
            actividad_id: 1,
            categoria,
            descripcion: "x".to_string(),
            cantidad,
            precio_unitario: precio,
            ..Default::default()
        }
    }

    #[test]
    fn test_percent_of_empty_total_is_zero() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(25, 100), 25.0);
    }

    #[test]
    fn test_empty_budget() {
        let summary = BudgetSummary::compute(&actividad(), &[], &[]);
        assert_eq!(summary.total_cents, 0);
        assert_eq!(summary.execution_percent, 0.0);
        assert!(summary.by_category.is_empty());
        assert_eq!(summary.cost_per_participant_cents, Some(0));
    }

    #[test]
    fn test_summary_totals_and_shares() {
        let items = vec![
            item(CategoriaGasto::Alimentacion, 20.0, 15.0),
            item(CategoriaGasto::Alimentacion, 10.0, 5.0),
            item(CategoriaGasto::Transporte, 1.0, 250.0),
            // Another activity, ignored
            ItemPresupuesto { actividad_id: 2, ..item(CategoriaGasto::Equipo, 1.0, 999.0) },
        ];
        let compras = vec![CompraRegistro {
            actividad_id: 1,
            descripcion: "Bus".to_string(),
            monto: 150.0,
            ..Default::default()
        }];

        let summary = BudgetSummary::compute(&actividad(), &items, &compras);

        assert_eq!(summary.total_cents, 60_000);
        assert_eq!(summary.items_total, 3);
        let comida = summary.category(CategoriaGasto::Alimentacion).expect("food category");
        assert_eq!(comida.cents, 35_000);
        assert_eq!(comida.items, 2);
        assert!((comida.percent - 58.333).abs() < 0.01);
        assert!(summary.category(CategoriaGasto::Equipo).is_none());

        assert_eq!(summary.executed_cents, 15_000);
        assert_eq!(summary.remaining_cents, 45_000);
        assert_eq!(summary.execution_percent, 25.0);
        assert_eq!(summary.cost_per_participant_cents, Some(3_000));
        assert!(!summary.is_over_budget());
    }
}
