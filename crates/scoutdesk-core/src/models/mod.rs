//! Data models for the scout group's backend tables.
//!
//! Every table row type implements [`Record`], which ties it to its backend
//! table and to the form fields used to create and edit it.
//!
//! - `Scout`, `FamiliarScout`: youth members and their family
//! - `Dirigente`, `MiembroComite`: adult leaders and the parent committee
//! - `Patrulla`, `SubCampo`, `AsignacionSubCampo`: group structure
//! - `ProgramaSemanal`, `MaterialBloque`: weekly programs
//! - `ActividadExterior`, `ItemPresupuesto`, `ItemLogistica`, `CompraRegistro`:
//!   outdoor activities, their budget and logistics
//! - `DocumentoAutorizacion`: signed authorizations per activity

pub mod actividad;
pub mod dirigente;
pub mod documento;
pub mod patrulla;
pub mod presupuesto;
pub mod programa;
pub mod scout;

use serde::{de::DeserializeOwned, Serialize};

use crate::validation::FieldSpec;

pub use actividad::{ActividadExterior, EstadoActividad, EstadoItem, ItemLogistica};
pub use dirigente::{Dirigente, MiembroComite};
pub use documento::{CambioEstadoAutorizacion, DocumentoAutorizacion, EstadoAutorizacion};
pub use patrulla::{
    remove_patrol_assignments, unassign_members, unassign_subcampo, AsignacionSubCampo, Patrulla,
    SubCampo,
};
pub use presupuesto::{CategoriaGasto, CompraRegistro, ItemPresupuesto};
pub use programa::{BloquePrograma, EstadoPrograma, MaterialBloque, ProgramaSemanal};
pub use scout::{EstadoMiembro, FamiliarScout, Rama, Scout, ScoutSortColumn};

/// A row of a backend table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Backend table name.
    const TABLE: &'static str;
    /// Column used for the default list ordering.
    const ORDER_BY: &'static str;
    /// Editable fields, in form order.
    const FIELDS: &'static [FieldSpec];

    /// Backend id, `None` until the row has been created.
    fn id(&self) -> Option<i64>;

    /// Short human label used in lists and confirmation dialogs.
    fn label(&self) -> String;
}

/// Join a first and last name, skipping empty parts.
pub(crate) fn join_name(nombres: &str, apellidos: &str) -> String {
    format!("{} {}", nombres.trim(), apellidos.trim())
        .trim()
        .to_string()
}
