use serde::{Deserialize, Serialize};

use super::scout::{Rama, Scout};
use super::Record;
use crate::validation::{FieldKind, FieldSpec};

/// A patrol: a small standing group of scouts within a branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patrulla {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub nombre: String,
    #[serde(default)]
    pub rama: Rama,
    #[serde(default)]
    pub lema: Option<String>,
    #[serde(default)]
    pub grito: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Scout acting as patrol leader.
    #[serde(default)]
    pub guia_id: Option<i64>,
    #[serde(default)]
    pub subguia_id: Option<i64>,
    #[serde(default = "default_true")]
    pub activa: bool,
}

fn default_true() -> bool {
    true
}

impl Record for Patrulla {
    const TABLE: &'static str = "patrullas";
    const ORDER_BY: &'static str = "nombre";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("nombre", "Nombre", FieldKind::Text),
        FieldSpec::required("rama", "Rama", FieldKind::Choice(Rama::CHOICES)),
        FieldSpec::optional("lema", "Lema", FieldKind::Text),
        FieldSpec::optional("grito", "Grito", FieldKind::Text),
        FieldSpec::optional("color", "Color", FieldKind::Text),
        FieldSpec::optional("guia_id", "Guía (id)", FieldKind::Integer),
        FieldSpec::optional("subguia_id", "Subguía (id)", FieldKind::Integer),
        FieldSpec::optional("activa", "Activa", FieldKind::Bool),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        format!("{} ({})", self.nombre, self.rama.label())
    }
}

impl Patrulla {
    /// Scouts currently assigned to this patrol.
    pub fn members<'a>(&self, scouts: &'a [Scout]) -> Vec<&'a Scout> {
        match self.id {
            Some(id) => scouts.iter().filter(|s| s.patrulla_id == Some(id)).collect(),
            None => Vec::new(),
        }
    }
}

/// A sub-camp set up for one outdoor activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubCampo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub actividad_id: i64,
    pub nombre: String,
    /// Dirigente in charge.
    #[serde(default)]
    pub responsable_id: Option<i64>,
    #[serde(default)]
    pub ubicacion: Option<String>,
    #[serde(default)]
    pub capacidad: Option<u32>,
    #[serde(default)]
    pub observaciones: Option<String>,
}

impl Record for SubCampo {
    const TABLE: &'static str = "subcampos";
    const ORDER_BY: &'static str = "nombre";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("nombre", "Nombre", FieldKind::Text),
        FieldSpec::optional("responsable_id", "Responsable (id)", FieldKind::Integer),
        FieldSpec::optional("ubicacion", "Ubicación", FieldKind::Text),
        FieldSpec::optional("capacidad", "Capacidad", FieldKind::Integer),
        FieldSpec::optional("observaciones", "Observaciones", FieldKind::Text),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        self.nombre.clone()
    }
}

/// Assignment of a patrol to a sub-camp within an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsignacionSubCampo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub actividad_id: i64,
    /// `None` once the sub-camp has been removed.
    #[serde(default)]
    pub subcampo_id: Option<i64>,
    pub patrulla_id: i64,
}

impl Record for AsignacionSubCampo {
    const TABLE: &'static str = "subcampo_patrullas";
    const ORDER_BY: &'static str = "patrulla_id";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::optional("subcampo_id", "Subcampo (id)", FieldKind::Integer),
        FieldSpec::required("patrulla_id", "Patrulla (id)", FieldKind::Integer),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn label(&self) -> String {
        match self.subcampo_id {
            Some(sub) => format!("Patrulla {} en subcampo {}", self.patrulla_id, sub),
            None => format!("Patrulla {} sin subcampo", self.patrulla_id),
        }
    }
}

/// Clear the patrol of every scout assigned to `patrulla_id`.
///
/// Scouts stay in the slice; returns how many were unassigned.
pub fn unassign_members(scouts: &mut [Scout], patrulla_id: i64) -> usize {
    let mut count = 0;
    for scout in scouts.iter_mut().filter(|s| s.patrulla_id == Some(patrulla_id)) {
        scout.patrulla_id = None;
        count += 1;
    }
    count
}

/// Clear the sub-camp of every assignment pointing at `subcampo_id`.
pub fn unassign_subcampo(asignaciones: &mut [AsignacionSubCampo], subcampo_id: i64) -> usize {
    let mut count = 0;
    for asignacion in asignaciones
        .iter_mut()
        .filter(|a| a.subcampo_id == Some(subcampo_id))
    {
        asignacion.subcampo_id = None;
        count += 1;
    }
    count
}

/// Remove every assignment of `patrulla_id`; returns how many were removed.
pub fn remove_patrol_assignments(
    asignaciones: &mut Vec<AsignacionSubCampo>,
    patrulla_id: i64,
) -> usize {
    let before = asignaciones.len();
    asignaciones.retain(|a| a.patrulla_id != patrulla_id);
    before - asignaciones.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scout(id: i64, patrulla: Option<i64>) -> Scout {
        Scout {
            id: Some(id),
            nombres: format!("Scout {id}"),
            apellidos: "Test".to_string(),
            patrulla_id: patrulla,
            ..Default::default()
        }
    }

    #[test]
    fn test_unassign_members_keeps_scouts() {
        let mut scouts = vec![scout(1, Some(10)), scout(2, Some(20)), scout(3, Some(10))];

        let count = unassign_members(&mut scouts, 10);

        assert_eq!(count, 2);
        assert_eq!(scouts.len(), 3);
        assert!(scouts[0].is_unassigned());
        assert_eq!(scouts[1].patrulla_id, Some(20));
        assert!(scouts[2].is_unassigned());
        // Other fields untouched
        assert_eq!(scouts[0].nombres, "Scout 1");
    }

    #[test]
    fn test_unassign_subcampo() {
        let mut asignaciones = vec![
            AsignacionSubCampo { id: Some(1), actividad_id: 5, subcampo_id: Some(7), patrulla_id: 10 },
            AsignacionSubCampo { id: Some(2), actividad_id: 5, subcampo_id: Some(8), patrulla_id: 11 },
        ];

        assert_eq!(unassign_subcampo(&mut asignaciones, 7), 1);
        assert_eq!(asignaciones.len(), 2);
        assert_eq!(asignaciones[0].subcampo_id, None);
        assert_eq!(asignaciones[0].patrulla_id, 10);
        assert_eq!(asignaciones[1].subcampo_id, Some(8));
    }

    #[test]
    fn test_remove_patrol_assignments() {
        let mut asignaciones = vec![
            AsignacionSubCampo { id: Some(1), actividad_id: 5, subcampo_id: Some(7), patrulla_id: 10 },
            AsignacionSubCampo { id: Some(2), actividad_id: 5, subcampo_id: Some(7), patrulla_id: 11 },
            AsignacionSubCampo { id: Some(3), actividad_id: 6, subcampo_id: None, patrulla_id: 10 },
        ];

        assert_eq!(remove_patrol_assignments(&mut asignaciones, 10), 2);
        assert_eq!(asignaciones.len(), 1);
        assert_eq!(asignaciones[0].patrulla_id, 11);
    }

    #[test]
    fn test_members_of_patrol() {
        let scouts = vec![scout(1, Some(10)), scout(2, None)];
        let patrulla = Patrulla {
            id: Some(10),
            nombre: "Halcones".to_string(),
            ..Default::default()
        };
        assert_eq!(patrulla.members(&scouts).len(), 1);
        assert!(Patrulla::default().members(&scouts).is_empty());
    }
}
