//! In-memory copy of every backend table the UI shows.

use scoutdesk_core::auth::Permisos;
use scoutdesk_core::models::{
    ActividadExterior, AsignacionSubCampo, CompraRegistro, Dirigente, DocumentoAutorizacion,
    FamiliarScout, ItemLogistica, ItemPresupuesto, MaterialBloque, MiembroComite, Patrulla,
    ProgramaSemanal, Record, Scout, SubCampo,
};

#[derive(Debug, Default)]
pub struct Data {
    pub scouts: Vec<Scout>,
    pub familiares: Vec<FamiliarScout>,
    pub dirigentes: Vec<Dirigente>,
    pub comite: Vec<MiembroComite>,
    pub patrullas: Vec<Patrulla>,
    pub subcampos: Vec<SubCampo>,
    pub asignaciones: Vec<AsignacionSubCampo>,
    pub programas: Vec<ProgramaSemanal>,
    pub materiales: Vec<MaterialBloque>,
    pub actividades: Vec<ActividadExterior>,
    pub presupuesto: Vec<ItemPresupuesto>,
    pub logistica: Vec<ItemLogistica>,
    pub compras: Vec<CompraRegistro>,
    pub documentos: Vec<DocumentoAutorizacion>,
}

/// A record type with a slot in [`Data`].
pub trait Stored: Record {
    fn rows(data: &Data) -> &Vec<Self>;
    fn rows_mut(data: &mut Data) -> &mut Vec<Self>;
}

macro_rules! stored {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(
            impl Stored for $ty {
                fn rows(data: &Data) -> &Vec<Self> {
                    &data.$field
                }
                fn rows_mut(data: &mut Data) -> &mut Vec<Self> {
                    &mut data.$field
                }
            }
        )*
    };
}

stored! {
    Scout => scouts,
    FamiliarScout => familiares,
    Dirigente => dirigentes,
    MiembroComite => comite,
    Patrulla => patrullas,
    SubCampo => subcampos,
    AsignacionSubCampo => asignaciones,
    ProgramaSemanal => programas,
    MaterialBloque => materiales,
    ActividadExterior => actividades,
    ItemPresupuesto => presupuesto,
    ItemLogistica => logistica,
    CompraRegistro => compras,
    DocumentoAutorizacion => documentos,
}

impl Data {
    pub fn patrulla(&self, id: Option<i64>) -> Option<&Patrulla> {
        let id = id?;
        self.patrullas.iter().find(|p| p.id == Some(id))
    }

    pub fn patrulla_name(&self, id: Option<i64>) -> String {
        self.patrulla(id)
            .map(|p| p.nombre.clone())
            .unwrap_or_else(|| "Sin patrulla".to_string())
    }

    pub fn scout(&self, id: i64) -> Option<&Scout> {
        self.scouts.iter().find(|s| s.id == Some(id))
    }

    pub fn familiares_of(&self, scout_id: i64) -> Vec<&FamiliarScout> {
        self.familiares.iter().filter(|f| f.scout_id == scout_id).collect()
    }

    /// Guardian for forms: the flagged apoderado, else the first relative.
    pub fn apoderado_of(&self, scout_id: i64) -> Option<&FamiliarScout> {
        let familiares = self.familiares_of(scout_id);
        familiares
            .iter()
            .find(|f| f.es_apoderado)
            .or_else(|| familiares.first())
            .copied()
    }

    pub fn materiales_of(&self, programa_id: Option<i64>) -> Vec<&MaterialBloque> {
        match programa_id {
            Some(id) => self.materiales.iter().filter(|m| m.programa_id == id).collect(),
            None => Vec::new(),
        }
    }

    /// Existing assignment of a patrol within an activity.
    pub fn asignacion_of(&self, actividad_id: i64, patrulla_id: i64) -> Option<&AsignacionSubCampo> {
        self.asignaciones
            .iter()
            .find(|a| a.actividad_id == actividad_id && a.patrulla_id == patrulla_id)
    }

    pub fn subcampo_name(&self, id: Option<i64>) -> String {
        id.and_then(|id| self.subcampos.iter().find(|s| s.id == Some(id)))
            .map(|s| s.nombre.clone())
            .unwrap_or_else(|| "Sin subcampo".to_string())
    }
}

/// Replace the row with the same id, or append a new one.
pub fn upsert<T: Record>(rows: &mut Vec<T>, record: T) {
    match record.id().and_then(|id| rows.iter().position(|r| r.id() == Some(id))) {
        Some(index) => rows[index] = record,
        None => rows.push(record),
    }
}

/// Drop the row with `id`; returns false when it was not present.
pub fn remove_by_id<T: Record>(rows: &mut Vec<T>, id: i64) -> bool {
    let before = rows.len();
    rows.retain(|r| r.id() != Some(id));
    rows.len() != before
}

/// Rows of one activity in a child table.
pub fn of_actividad<T, F>(rows: &[T], actividad_id: Option<i64>, key: F) -> Vec<&T>
where
    F: Fn(&T) -> i64,
{
    match actividad_id {
        Some(id) => rows.iter().filter(|r| key(r) == id).collect(),
        None => Vec::new(),
    }
}

/// Result types from the background refresh task.
///
/// One variant per table, sent through an MPSC channel as each fetch
/// finishes.
#[derive(Debug)]
pub enum RefreshResult {
    Scouts(Vec<Scout>),
    Familiares(Vec<FamiliarScout>),
    Dirigentes(Vec<Dirigente>),
    Comite(Vec<MiembroComite>),
    Patrullas(Vec<Patrulla>),
    SubCampos(Vec<SubCampo>),
    Asignaciones(Vec<AsignacionSubCampo>),
    Programas(Vec<ProgramaSemanal>),
    Materiales(Vec<MaterialBloque>),
    Actividades(Vec<ActividadExterior>),
    Presupuesto(Vec<ItemPresupuesto>),
    Logistica(Vec<ItemLogistica>),
    Compras(Vec<CompraRegistro>),
    Documentos(Vec<DocumentoAutorizacion>),
    Permisos(Permisos),
    /// A fetch failed; the message is already user-facing
    Error(String),
    RefreshComplete,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn familiar(id: i64, scout_id: i64, apoderado: bool) -> FamiliarScout {
        FamiliarScout {
            id: Some(id),
            scout_id,
            nombres: format!("F{id}"),
            apellidos: "Rojas".to_string(),
            parentesco: "MADRE".to_string(),
            es_apoderado: apoderado,
            ..Default::default()
        }
    }

    #[test]
    fn test_apoderado_prefers_flagged_relative() {
        let data = Data {
            familiares: vec![familiar(1, 7, false), familiar(2, 7, true), familiar(3, 8, true)],
            ..Default::default()
        };
        assert_eq!(data.apoderado_of(7).and_then(|f| f.id), Some(2));
        assert_eq!(data.apoderado_of(8).and_then(|f| f.id), Some(3));
        assert!(data.apoderado_of(9).is_none());
    }

    #[test]
    fn test_apoderado_falls_back_to_first() {
        let data = Data {
            familiares: vec![familiar(4, 7, false), familiar(5, 7, false)],
            ..Default::default()
        };
        assert_eq!(data.apoderado_of(7).and_then(|f| f.id), Some(4));
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut rows = vec![familiar(1, 7, false), familiar(2, 7, false)];
        let mut edited = familiar(2, 7, true);
        edited.nombres = "Ana".to_string();
        upsert(&mut rows, edited);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].nombres, "Ana");

        upsert(&mut rows, familiar(3, 7, false));
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_remove_by_id() {
        let mut rows = vec![familiar(1, 7, false), familiar(2, 7, false)];
        assert!(remove_by_id(&mut rows, 1));
        assert!(!remove_by_id(&mut rows, 1));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_asignacion_of_matches_activity_and_patrol() {
        let asignacion = |id, actividad_id, patrulla_id| AsignacionSubCampo {
            id: Some(id),
            actividad_id,
            subcampo_id: Some(10),
            patrulla_id,
        };
        let data = Data {
            asignaciones: vec![asignacion(1, 5, 2), asignacion(2, 6, 2), asignacion(3, 5, 3)],
            ..Default::default()
        };
        assert_eq!(data.asignacion_of(5, 2).and_then(|a| a.id), Some(1));
        assert_eq!(data.asignacion_of(6, 2).and_then(|a| a.id), Some(2));
        assert!(data.asignacion_of(6, 3).is_none());
    }

    #[test]
    fn test_stored_slot_matches_type() {
        let mut data = Data::default();
        Patrulla::rows_mut(&mut data).push(Patrulla {
            id: Some(1),
            nombre: "Halcones".to_string(),
            ..Default::default()
        });
        assert_eq!(data.patrullas.len(), 1);
        assert_eq!(data.patrulla_name(Some(1)), "Halcones");
        assert_eq!(data.patrulla_name(None), "Sin patrulla");
    }
}
