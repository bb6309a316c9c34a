use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backend table holding one profile row per user.
pub const PROFILES_TABLE: &str = "perfiles";

/// An action gated by a permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accion {
    Crear,
    Editar,
    Eliminar,
    Exportar,
}

impl Accion {
    pub fn label(&self) -> &'static str {
        match self {
            Accion::Crear => "create records",
            Accion::Editar => "edit records",
            Accion::Eliminar => "delete records",
            Accion::Exportar => "export documents",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Your profile ({rol}) is not allowed to {}", .accion.label())]
    Denied { accion: Accion, rol: String },
}

/// Permission flags of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permisos {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_rol")]
    pub rol: String,
    #[serde(default)]
    pub puede_editar: bool,
    #[serde(default)]
    pub puede_eliminar: bool,
    #[serde(default)]
    pub puede_exportar: bool,
}

fn default_rol() -> String {
    "LECTOR".to_string()
}

impl Default for Permisos {
    /// Read-only, used when the user has no profile row.
    fn default() -> Self {
        Self {
            user_id: None,
            rol: default_rol(),
            puede_editar: false,
            puede_eliminar: false,
            puede_exportar: false,
        }
    }
}

impl Permisos {
    pub fn allows(&self, accion: Accion) -> bool {
        match accion {
            Accion::Crear | Accion::Editar => self.puede_editar,
            Accion::Eliminar => self.puede_eliminar,
            Accion::Exportar => self.puede_exportar,
        }
    }

    pub fn check(&self, accion: Accion) -> Result<(), PermissionError> {
        if self.allows(accion) {
            Ok(())
        } else {
            Err(PermissionError::Denied {
                accion,
                rol: self.rol.clone(),
            })
        }
    }

    pub fn is_read_only(&self) -> bool {
        !self.puede_editar && !self.puede_eliminar && !self.puede_exportar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_read_only() {
        let permisos = Permisos::default();
        assert!(permisos.is_read_only());
        let err = permisos.check(Accion::Eliminar).unwrap_err();
        assert_eq!(err.to_string(), "Your profile (LECTOR) is not allowed to delete records");
    }

    #[test]
    fn test_flags_gate_actions() {
        let json = r#"{"user_id":"u1","rol":"DIRIGENTE","puede_editar":true,"puede_exportar":true}"#;
        let permisos: Permisos = serde_json::from_str(json).expect("parse profile");
        assert!(permisos.check(Accion::Crear).is_ok());
        assert!(permisos.check(Accion::Editar).is_ok());
        assert!(permisos.check(Accion::Exportar).is_ok());
        assert!(permisos.check(Accion::Eliminar).is_err());
        assert!(!permisos.is_read_only());
    }
}
