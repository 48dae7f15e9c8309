//! Capture : une unité de trafic enregistrée, ingérée dans le catalogue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Métadonnées livrées par le collaborateur d'upload pour un fichier accepté.
///
/// L'id et l'horodatage d'ingestion sont alloués par le moteur, jamais par
/// l'appelant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFile {
    /// Nom du fichier dans le répertoire de stockage
    pub storage_filename: String,
    /// Nom fourni par l'utilisateur au moment de l'upload
    pub original_name: String,
    pub size_bytes: u64,
}

/// Une capture du catalogue.
///
/// Immuable après ingestion (hors suppression). L'id est la seule référence
/// stable utilisée par les playlists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "pcdserver", derive(utoipa::ToSchema))]
pub struct Capture {
    pub id: Uuid,
    /// Nom du fichier côté stockage
    pub filename: String,
    /// Nom d'origine fourni à l'upload
    pub original_name: String,
    /// Taille en octets
    pub size: u64,
    pub ingested_at: DateTime<Utc>,
}

impl Capture {
    /// Alloue une capture fraîche à partir des métadonnées d'upload.
    pub fn allocate(meta: IngestedFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: meta.storage_filename,
            original_name: meta.original_name,
            size: meta.size_bytes,
            ingested_at: Utc::now(),
        }
    }
}
