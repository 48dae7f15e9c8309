//! Frontière avec le stockage des fichiers de capture

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Erreurs du stockage de fichiers
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Le fichier n'existe plus : non fatal, le lot continue
    #[error("Backing file not found: {0}")]
    NotFound(String),

    /// Toute autre défaillance fait avorter le lot entier
    #[error("Storage failure on '{path}': {message}")]
    Failure { path: String, message: String },
}

/// Suppression et résolution des fichiers de capture stockés.
///
/// Le moteur de cohérence ne touche jamais le disque directement : il passe
/// par ce trait, ce qui permet aux tests de simuler des défaillances.
pub trait CaptureStorage: Send + Sync {
    /// Supprime le fichier de stockage.
    ///
    /// `NotFound` si le fichier est déjà absent ; `Failure` pour toute autre
    /// raison.
    fn remove_file(&self, filename: &str) -> Result<(), StorageError>;

    /// Chemin absolu du fichier de stockage.
    fn resolve(&self, filename: &str) -> PathBuf;
}

/// Stockage sur un répertoire local.
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CaptureStorage for DirStorage {
    fn remove_file(&self, filename: &str) -> Result<(), StorageError> {
        let path = self.resolve(filename);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(filename.to_string()))
            }
            Err(e) => Err(StorageError::Failure {
                path: path.to_string_lossy().to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn resolve(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}
