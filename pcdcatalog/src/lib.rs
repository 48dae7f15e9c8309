//! # pcdcatalog - Catalogue de captures et playlists cohérentes
//!
//! Cette crate est le cœur de PcapDeck :
//! - **CatalogStore** : liste autoritaire en mémoire des captures ingérées
//! - **PlaylistSet** : collection ordonnée de playlists, playlist « All » en tête
//! - **CatalogManager** : moteur de cohérence appliqué autour de chaque
//!   mutation (appartenances, comptes dérivés, suppression en cascade)
//! - **Diffusion** : après chaque mutation réussie, l'état complet est diffusé
//!   à tous les observateurs connectés (SSE)
//! - **Persistance** : frontière [`PersistenceGateway`] (JSON sur disque),
//!   comptes et appartenance de « All » re-dérivés au chargement
//!
//! Les invariants maintenus après chaque mutation :
//! 1. tout id référencé par une playlist existe dans le catalogue
//! 2. `All` reflète exactement le catalogue, dans l'ordre du catalogue
//! 3. les comptes sont dérivés de l'appartenance, jamais persistés
//! 4. les noms de playlists sont uniques
//!
//! # Exemple
//!
//! ```no_run
//! use pcdcatalog::{CatalogManager, IngestedFile, JsonStore, DirStorage};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> pcdcatalog::Result<()> {
//! let persistence = Arc::new(JsonStore::new("catalog.json", "playlists.json"));
//! let storage = Arc::new(DirStorage::new("captures"));
//! let manager = CatalogManager::load(persistence, storage, Some("eth0".into()))?;
//!
//! let ingested = manager
//!     .ingest_batch(
//!         vec![IngestedFile {
//!             storage_filename: "b1946ac9".into(),
//!             original_name: "session.pcap".into(),
//!             size_bytes: 1024,
//!         }],
//!         None,
//!     )
//!     .await?;
//! println!("Ingested {} capture(s)", ingested.len());
//! # Ok(())
//! # }
//! ```

mod capture;
mod catalog;
mod error;
mod manager;
mod persistence;
mod playlist;
mod storage;

#[cfg(feature = "pcdserver")]
pub mod api;
#[cfg(feature = "pcdserver")]
pub mod openapi;
#[cfg(feature = "pcdserver")]
pub mod sse;

#[cfg(feature = "pcdconfig")]
mod config_ext;

// Réexports publics
pub use capture::{Capture, IngestedFile};
pub use catalog::CatalogStore;
pub use error::{Error, Result};
pub use manager::{CatalogManager, StateEvent};
pub use persistence::{JsonStore, PersistenceGateway};
pub use playlist::{ALL_PLAYLIST, LoopMode, Playlist, PlaylistSet, ReplaySettings, ReplaySpeed};
pub use storage::{CaptureStorage, DirStorage, StorageError};

#[cfg(feature = "pcdconfig")]
pub use config_ext::CatalogConfigExt;
