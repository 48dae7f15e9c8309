//! Persistance JSON du catalogue et des playlists

use crate::capture::Capture;
use crate::playlist::Playlist;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Frontière de persistance (chargement au démarrage, sauvegarde à chaque
/// mutation).
///
/// Les playlists sont persistées sans compte (dérivé) et avec l'appartenance
/// de `All` vidée ; les deux sont re-dérivés au chargement.
pub trait PersistenceGateway: Send + Sync {
    fn load_catalog(&self) -> Result<Vec<Capture>>;
    fn save_catalog(&self, captures: &[Capture]) -> Result<()>;
    fn load_playlists(&self) -> Result<Vec<Playlist>>;
    fn save_playlists(&self, playlists: &[Playlist]) -> Result<()>;
}

/// Persistance sur deux fichiers JSON (catalogue et playlists).
pub struct JsonStore {
    catalog_path: PathBuf,
    playlists_path: PathBuf,
}

impl JsonStore {
    pub fn new(catalog_path: impl Into<PathBuf>, playlists_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            playlists_path: playlists_path.into(),
        }
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| Error::Persistence(format!("Failed to serialize {path:?}: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| Error::Persistence(format!("Failed to write {path:?}: {e}")))
    }
}

impl PersistenceGateway for JsonStore {
    fn load_catalog(&self) -> Result<Vec<Capture>> {
        if !self.catalog_path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read(&self.catalog_path).map_err(|e| {
            Error::Persistence(format!("Failed to read {:?}: {e}", self.catalog_path))
        })?;
        serde_json::from_slice(&data).map_err(|e| {
            Error::Persistence(format!("Failed to parse {:?}: {e}", self.catalog_path))
        })
    }

    fn save_catalog(&self, captures: &[Capture]) -> Result<()> {
        Self::write_json(&self.catalog_path, &captures)
    }

    fn load_playlists(&self) -> Result<Vec<Playlist>> {
        if !self.playlists_path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read(&self.playlists_path).map_err(|e| {
            Error::Persistence(format!("Failed to read {:?}: {e}", self.playlists_path))
        })?;
        // Un fichier de playlists illisible n'est pas fatal : on repart d'une
        // collection vide, « All » sera recréée.
        match serde_json::from_slice(&data) {
            Ok(playlists) => Ok(playlists),
            Err(e) => {
                warn!(path = ?self.playlists_path, error = %e, "Unreadable playlists file, starting empty");
                Ok(Vec::new())
            }
        }
    }

    fn save_playlists(&self, playlists: &[Playlist]) -> Result<()> {
        // L'appartenance de « All » est re-dérivée au chargement : ne pas la
        // persister.
        let stripped: Vec<Playlist> = playlists
            .iter()
            .map(|p| {
                if p.is_all() {
                    let mut all = p.clone();
                    all.captures.clear();
                    all
                } else {
                    p.clone()
                }
            })
            .collect();
        Self::write_json(&self.playlists_path, &stripped)
    }
}
