//! CatalogManager : moteur de cohérence appliqué autour de chaque mutation
//!
//! Toute mutation suit strictement le même ordre : mutation du catalogue,
//! nettoyage des playlists dépendantes, re-dérivation de « All », écriture de
//! persistance, diffusion. Les observateurs ne voient jamais d'état
//! intermédiaire : l'état partagé est tenu sous un verrou à écrivain unique
//! pendant toute la durée du lot, I/O de fichiers comprise.

use crate::capture::{Capture, IngestedFile};
use crate::catalog::CatalogStore;
use crate::persistence::PersistenceGateway;
use crate::playlist::{Playlist, PlaylistSet, ReplaySettings, ALL_PLAYLIST};
use crate::storage::{CaptureStorage, StorageError};
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::warn;
use uuid::Uuid;

/// Évènement d'état diffusé aux observateurs connectés.
///
/// Chaque évènement transporte un instantané complet (pas de diff sélectif) :
/// tous les observateurs convergent vers le même état après chaque mutation.
#[derive(Debug, Clone)]
pub enum StateEvent {
    Captures(Vec<Capture>),
    Playlists(Vec<Playlist>),
    Preferences(serde_json::Value),
}

/// Une étape du plan de rejeu d'une playlist : fichier résolu et réglages
/// effectifs du membre.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayInstruction {
    pub path: PathBuf,
    pub settings: ReplaySettings,
}

/// État partagé unique : catalogue et playlists, mutés ensemble.
struct EngineState {
    catalog: CatalogStore,
    playlists: PlaylistSet,
}

struct ManagerInner {
    state: RwLock<EngineState>,
    persistence: Arc<dyn PersistenceGateway>,
    storage: Arc<dyn CaptureStorage>,
    event_tx: broadcast::Sender<StateEvent>,
}

/// Gestionnaire central du catalogue et des playlists.
///
/// Objet d'état possédé, passé par contexte aux handlers (pas de globals) ;
/// clonable à coût constant.
#[derive(Clone)]
pub struct CatalogManager {
    inner: Arc<ManagerInner>,
}

impl CatalogManager {
    /// Charge l'état persisté et re-dérive la playlist « All ».
    ///
    /// `default_interface` sert d'interface cible initiale si « All » doit
    /// être créée.
    pub fn load(
        persistence: Arc<dyn PersistenceGateway>,
        storage: Arc<dyn CaptureStorage>,
        default_interface: Option<String>,
    ) -> Result<Self> {
        let captures = persistence.load_catalog()?;
        let loaded_playlists = persistence.load_playlists()?;

        let catalog = CatalogStore::from_loaded(captures);
        let playlists = PlaylistSet::from_loaded(
            loaded_playlists,
            catalog.ids(),
            default_interface.as_deref(),
        );

        Ok(Self {
            inner: Arc::new(ManagerInner {
                state: RwLock::new(EngineState { catalog, playlists }),
                persistence,
                storage,
                event_tx: broadcast::channel(256).0,
            }),
        })
    }

    /// Souscrit au flux d'évènements d'état.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Instantané du catalogue.
    pub async fn captures(&self) -> Vec<Capture> {
        self.inner.state.read().await.catalog.list()
    }

    /// Instantané de la collection de playlists.
    pub async fn playlists(&self) -> Vec<Playlist> {
        self.inner.state.read().await.playlists.snapshot()
    }

    /// Instantané cohérent du couple catalogue/playlists (un seul verrou :
    /// jamais de paire dépareillée).
    pub async fn full_snapshot(&self) -> (Vec<Capture>, Vec<Playlist>) {
        let state = self.inner.state.read().await;
        (state.catalog.list(), state.playlists.snapshot())
    }

    /// Instantané d'une playlist par nom.
    pub async fn playlist(&self, name: &str) -> Result<Playlist> {
        let state = self.inner.state.read().await;
        state
            .playlists
            .find(name)
            .cloned()
            .ok_or_else(|| Error::PlaylistNotFound(name.to_string()))
    }

    /// Ingestion d'un lot de captures, avec playlist cible optionnelle.
    ///
    /// La cible est résolue avant toute ingestion : une cible absente (autre
    /// que « All ») rejette le lot sans rien muter. L'ordre des ajouts suit
    /// l'ordre d'upload ; une seule diffusion couvre le lot entier.
    pub async fn ingest_batch(
        &self,
        files: Vec<IngestedFile>,
        target: Option<&str>,
    ) -> Result<Vec<Capture>> {
        let mut state = self.inner.state.write().await;

        // « All » n'est jamais éditée directement : cible implicite
        let target = target.filter(|name| *name != ALL_PLAYLIST);
        if let Some(name) = target {
            if state.playlists.find(name).is_none() {
                return Err(Error::PlaylistNotFound(name.to_string()));
            }
        }

        let mut ingested = Vec::with_capacity(files.len());
        for meta in files {
            let capture = state.catalog.ingest(meta);
            if let Some(name) = target {
                if let Some(playlist) = state.playlists.find_mut(name) {
                    playlist.captures.push(capture.id);
                }
            }
            ingested.push(capture);
        }

        let catalog_ids = state.catalog.ids();
        state.playlists.rederive_all(catalog_ids);

        self.persist_full(&state)?;
        Ok(ingested)
    }

    /// Suppression en cascade d'un ensemble d'ids, tout-ou-rien vis-à-vis du
    /// stockage.
    ///
    /// Les ids inconnus sont journalisés puis ignorés. Un fichier de stockage
    /// déjà absent est non-fatal ; toute autre défaillance de stockage fait
    /// avorter le lot entier avant la moindre mutation du catalogue ou des
    /// playlists.
    pub async fn delete_captures(&self, ids: &[Uuid]) -> Result<Vec<Capture>> {
        let mut state = self.inner.state.write().await;

        let mut seen = HashSet::new();
        let mut doomed: Vec<Capture> = Vec::new();
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            match state.catalog.get(*id) {
                Some(capture) => doomed.push(capture.clone()),
                None => warn!(id = %id, "Capture not found, skipping"),
            }
        }

        // Phase fichiers : aucune mutation mémoire tant que le stockage peut
        // encore faire échouer le lot
        for capture in &doomed {
            match self.inner.storage.remove_file(&capture.filename) {
                Ok(()) => {}
                Err(StorageError::NotFound(filename)) => {
                    warn!(filename = %filename, "Backing file was already absent");
                }
                Err(e @ StorageError::Failure { .. }) => {
                    return Err(Error::StorageFailure(e.to_string()));
                }
            }
        }

        // Phase mémoire : catalogue, playlists dépendantes, puis « All »
        let removed: HashSet<Uuid> = doomed.iter().map(|c| c.id).collect();
        for capture in &doomed {
            let _ = state.catalog.remove(capture.id);
        }
        state.playlists.scrub_removed(&removed);
        let catalog_ids = state.catalog.ids();
        state.playlists.rederive_all(catalog_ids);

        self.persist_full(&state)?;
        Ok(doomed)
    }

    /// Crée une playlist vide (réglages hérités de « All »).
    pub async fn create_playlist(&self, name: &str) -> Result<Playlist> {
        let mut state = self.inner.state.write().await;
        let created = state.playlists.create(name)?.clone();
        self.persist_playlists(&state)?;
        Ok(created)
    }

    /// Remplacement intégral d'une playlist autre que « All ».
    ///
    /// Toute référence de capture du corps doit exister dans le catalogue
    /// (invariant 1) ; le compte est re-dérivé de l'appartenance fournie.
    pub async fn replace_playlist(&self, name: &str, body: Playlist) -> Result<Playlist> {
        let mut state = self.inner.state.write().await;

        for id in body
            .captures
            .iter()
            .chain(body.capture_settings.keys())
        {
            if !state.catalog.contains(*id) {
                return Err(Error::CaptureNotFound(*id));
            }
        }

        let updated = state.playlists.replace(name, body)?.clone();
        self.persist_playlists(&state)?;
        Ok(updated)
    }

    /// Renomme une playlist (unicité re-validée, « All » exclue).
    pub async fn rename_playlist(&self, name: &str, new_name: &str) -> Result<Playlist> {
        let mut state = self.inner.state.write().await;
        let renamed = state.playlists.rename(name, new_name)?.clone();
        self.persist_playlists(&state)?;
        Ok(renamed)
    }

    /// Supprime une playlist (« All » exclue).
    pub async fn delete_playlist(&self, name: &str) -> Result<()> {
        let mut state = self.inner.state.write().await;
        state.playlists.delete(name)?;
        self.persist_playlists(&state)?;
        Ok(())
    }

    /// Plan de rejeu d'une playlist : fichiers résolus et réglages effectifs,
    /// dans l'ordre de l'appartenance. Aucun changement d'état.
    pub async fn replay_plan(&self, name: &str) -> Result<Vec<ReplayInstruction>> {
        let state = self.inner.state.read().await;
        let playlist = state
            .playlists
            .find(name)
            .ok_or_else(|| Error::PlaylistNotFound(name.to_string()))?;

        let mut plan = Vec::with_capacity(playlist.count());
        for id in &playlist.captures {
            match state.catalog.get(*id) {
                Some(capture) => plan.push(ReplayInstruction {
                    path: self.inner.storage.resolve(&capture.filename),
                    settings: playlist.effective_settings(*id),
                }),
                None => warn!(id = %id, playlist = %name, "Dangling capture reference, skipping"),
            }
        }
        Ok(plan)
    }

    /// Chemin du fichier de stockage d'une capture (téléchargement).
    pub async fn capture_path(&self, id: Uuid) -> Result<(Capture, PathBuf)> {
        let state = self.inner.state.read().await;
        let capture = state
            .catalog
            .get(id)
            .cloned()
            .ok_or(Error::CaptureNotFound(id))?;
        let path = self.inner.storage.resolve(&capture.filename);
        Ok((capture, path))
    }

    /// Diffuse les préférences mises à jour aux observateurs.
    pub fn broadcast_preferences(&self, preferences: serde_json::Value) {
        let _ = self
            .inner
            .event_tx
            .send(StateEvent::Preferences(preferences));
    }

    /// Persiste puis diffuse catalogue et playlists (état entièrement réglé).
    fn persist_full(&self, state: &EngineState) -> Result<()> {
        let captures = state.catalog.list();
        let playlists = state.playlists.snapshot();
        self.inner.persistence.save_catalog(&captures)?;
        self.inner.persistence.save_playlists(&playlists)?;
        // Diffusion ignorée si aucun abonné
        let _ = self.inner.event_tx.send(StateEvent::Captures(captures));
        let _ = self.inner.event_tx.send(StateEvent::Playlists(playlists));
        Ok(())
    }

    /// Persiste puis diffuse la collection de playlists seule.
    fn persist_playlists(&self, state: &EngineState) -> Result<()> {
        let playlists = state.playlists.snapshot();
        self.inner.persistence.save_playlists(&playlists)?;
        let _ = self.inner.event_tx.send(StateEvent::Playlists(playlists));
        Ok(())
    }
}
