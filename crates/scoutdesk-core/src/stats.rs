//! Dashboard aggregates computed over fetched rows.

use crate::budget::percent;
use crate::models::{
    ActividadExterior, DocumentoAutorizacion, ItemLogistica, Patrulla, Rama, Scout,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RamaCount {
    pub rama: Rama,
    pub total: usize,
    pub activos: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatrolSize {
    pub patrulla_id: Option<i64>,
    pub nombre: String,
    pub miembros: usize,
}

/// Completion ratio of a per-activity checklist.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        percent(self.done as i64, self.total as i64)
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.done == self.total
    }

    pub fn display(&self) -> String {
        format!("{}/{} ({:.0}%)", self.done, self.total, self.percent())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityProgress {
    pub actividad_id: Option<i64>,
    pub nombre: String,
    pub autorizaciones: Progress,
    pub logistica: Progress,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total_scouts: usize,
    pub scouts_activos: usize,
    pub scouts_inactivos: usize,
    pub total_dirigentes: usize,
    pub por_rama: Vec<RamaCount>,
    pub patrullas: Vec<PatrolSize>,
    /// Active scouts without a patrol.
    pub sin_patrulla: usize,
    pub actividades: Vec<ActivityProgress>,
}

impl DashboardStats {
    pub fn compute(
        scouts: &[Scout],
        total_dirigentes: usize,
        patrullas: &[Patrulla],
        actividades: &[ActividadExterior],
        documentos: &[DocumentoAutorizacion],
        logistica: &[ItemLogistica],
    ) -> Self {
        let total_scouts = scouts.len();
        let scouts_activos = scouts.iter().filter(|s| s.estado.is_active()).count();

        let por_rama = Rama::ALL
            .iter()
            .map(|&rama| {
                let of_rama: Vec<&Scout> = scouts.iter().filter(|s| s.rama == rama).collect();
                RamaCount {
                    rama,
                    total: of_rama.len(),
                    activos: of_rama.iter().filter(|s| s.estado.is_active()).count(),
                    percent: percent(of_rama.len() as i64, total_scouts as i64),
                }
            })
            .collect();

        let mut patrol_sizes: Vec<PatrolSize> = patrullas
            .iter()
            .map(|p| PatrolSize {
                patrulla_id: p.id,
                nombre: p.nombre.clone(),
                miembros: p.members(scouts).len(),
            })
            .collect();
        patrol_sizes.sort_by(|a, b| b.miembros.cmp(&a.miembros).then_with(|| a.nombre.cmp(&b.nombre)));

        let sin_patrulla = scouts
            .iter()
            .filter(|s| s.estado.is_active() && s.is_unassigned())
            .count();

        let actividades = actividades
            .iter()
            .map(|a| {
                let docs: Vec<&DocumentoAutorizacion> = documentos
                    .iter()
                    .filter(|d| Some(d.actividad_id) == a.id)
                    .collect();
                let items: Vec<&ItemLogistica> = logistica
                    .iter()
                    .filter(|i| Some(i.actividad_id) == a.id)
                    .collect();
                ActivityProgress {
                    actividad_id: a.id,
                    nombre: a.nombre.clone(),
                    autorizaciones: Progress {
                        done: docs.iter().filter(|d| d.is_signed()).count(),
                        total: docs.len(),
                    },
                    logistica: Progress {
                        done: items.iter().filter(|i| i.is_ready()).count(),
                        total: items.len(),
                    },
                }
            })
            .collect();

        Self {
            total_scouts,
            scouts_activos,
            scouts_inactivos: total_scouts - scouts_activos,
            total_dirigentes,
            por_rama,
            patrullas: patrol_sizes,
            sin_patrulla,
            actividades,
        }
    }

    pub fn rama(&self, rama: Rama) -> Option<&RamaCount> {
        self.por_rama.iter().find(|r| r.rama == rama)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstadoAutorizacion, EstadoItem, EstadoMiembro};

    fn scout(id: i64, rama: Rama, patrulla: Option<i64>, estado: EstadoMiembro) -> Scout {
        Scout {
            id: Some(id),
            nombres: format!("S{id}"),
            apellidos: "T".to_string(),
            rama,
            patrulla_id: patrulla,
            estado,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_dashboard() {
        let stats = DashboardStats::compute(&[], 0, &[], &[], &[], &[]);
        assert_eq!(stats.total_scouts, 0);
        assert_eq!(stats.por_rama.len(), 4);
        assert!(stats.por_rama.iter().all(|r| r.percent == 0.0));
    }

    #[test]
    fn test_rama_counts_and_unassigned() {
        let scouts = vec![
            scout(1, Rama::Tropa, Some(1), EstadoMiembro::Activo),
            scout(2, Rama::Tropa, None, EstadoMiembro::Activo),
            scout(3, Rama::Manada, None, EstadoMiembro::Inactivo),
            scout(4, Rama::Tropa, Some(1), EstadoMiembro::Activo),
        ];
        let patrullas = vec![
            Patrulla { id: Some(1), nombre: "Lobos".to_string(), ..Default::default() },
            Patrulla { id: Some(2), nombre: "Águilas".to_string(), ..Default::default() },
        ];

        let stats = DashboardStats::compute(&scouts, 3, &patrullas, &[], &[], &[]);

        assert_eq!(stats.scouts_activos, 3);
        assert_eq!(stats.scouts_inactivos, 1);
        let tropa = stats.rama(Rama::Tropa).expect("tropa row");
        assert_eq!(tropa.total, 3);
        assert_eq!(tropa.percent, 75.0);
        // Inactive scouts do not count as unassigned
        assert_eq!(stats.sin_patrulla, 1);
        assert_eq!(stats.patrullas[0].nombre, "Lobos");
        assert_eq!(stats.patrullas[0].miembros, 2);
        assert_eq!(stats.patrullas[1].miembros, 0);
    }

    #[test]
    fn test_activity_progress() {
        let actividad = ActividadExterior {
            id: Some(7),
            nombre: "Campamento".to_string(),
            ..Default::default()
        };
        let documentos = vec![
            DocumentoAutorizacion { actividad_id: 7, scout_id: 1, estado: EstadoAutorizacion::Firmada, ..Default::default() },
            DocumentoAutorizacion { actividad_id: 7, scout_id: 2, estado: EstadoAutorizacion::Enviada, ..Default::default() },
            DocumentoAutorizacion { actividad_id: 8, scout_id: 3, estado: EstadoAutorizacion::Firmada, ..Default::default() },
        ];
        let logistica = vec![ItemLogistica {
            actividad_id: 7,
            descripcion: "Carpas".to_string(),
            estado: EstadoItem::Listo,
            ..Default::default()
        }];

        let stats = DashboardStats::compute(&[], 0, &[], &[actividad], &documentos, &logistica);
        let progress = &stats.actividades[0];
        assert_eq!(progress.autorizaciones, Progress { done: 1, total: 2 });
        assert_eq!(progress.autorizaciones.display(), "1/2 (50%)");
        assert!(progress.logistica.is_complete());
    }
}
