//! CatalogStore : liste autoritaire en mémoire des captures

use crate::capture::{Capture, IngestedFile};
use crate::{Error, Result};
use uuid::Uuid;

/// Propriétaire exclusif de la liste des captures, dans l'ordre d'ingestion.
#[derive(Debug, Default)]
pub struct CatalogStore {
    captures: Vec<Capture>,
}

impl CatalogStore {
    /// Reconstruit le store depuis des enregistrements persistés.
    pub fn from_loaded(captures: Vec<Capture>) -> Self {
        Self { captures }
    }

    /// Ingestion : alloue un id frais et ajoute la capture en fin de catalogue.
    ///
    /// Aucun mode d'échec à ce niveau ; la validation amont appartient au
    /// collaborateur d'upload.
    pub fn ingest(&mut self, meta: IngestedFile) -> Capture {
        let capture = Capture::allocate(meta);
        self.captures.push(capture.clone());
        capture
    }

    /// Retire la capture si présente, sinon signale `CaptureNotFound`.
    ///
    /// L'absence est non-fatale pour les appelants par lot : ils continuent
    /// avec les ids restants.
    pub fn remove(&mut self, id: Uuid) -> Result<Capture> {
        match self.captures.iter().position(|c| c.id == id) {
            Some(pos) => Ok(self.captures.remove(pos)),
            None => Err(Error::CaptureNotFound(id)),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Capture> {
        self.captures.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Instantané du catalogue, dans l'ordre d'insertion.
    pub fn list(&self) -> Vec<Capture> {
        self.captures.clone()
    }

    /// Ids du catalogue, dans l'ordre d'insertion.
    pub fn ids(&self) -> Vec<Uuid> {
        self.captures.iter().map(|c| c.id).collect()
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}
