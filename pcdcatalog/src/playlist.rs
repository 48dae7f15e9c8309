//! Playlists : groupements nommés et ordonnés de captures, « All » en tête

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Nom réservé de la playlist reflétant tout le catalogue.
pub const ALL_PLAYLIST: &str = "All";

/// Vitesse de rejeu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "pcdserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ReplaySpeed {
    /// Respecter les horodatages de la capture
    #[default]
    Pcap,
    /// Rejouer aussi vite que possible
    Topspeed,
}

/// Mode de bouclage du rejeu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "pcdserver", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    None,
    Forever,
}

/// Réglages de rejeu d'une playlist (ou d'un de ses membres).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "pcdserver", derive(utoipa::ToSchema))]
pub struct ReplaySettings {
    #[serde(default)]
    pub speed: ReplaySpeed,
    /// Interface réseau cible (None tant qu'aucune n'est connue)
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub looping: LoopMode,
}

impl ReplaySettings {
    /// Réglages par défaut pour une interface cible donnée.
    pub fn for_interface(interface: Option<String>) -> Self {
        Self {
            interface,
            ..Self::default()
        }
    }
}

/// Une playlist : identité par nom, appartenance ordonnée, réglages de rejeu.
///
/// Le compte n'est pas un champ : il est toujours dérivé de l'appartenance
/// (voir [`Playlist::count`]) et jamais persisté.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "pcdserver", derive(utoipa::ToSchema))]
pub struct Playlist {
    pub name: String,
    /// Ids de captures, ordonnés ; les doublons sont tolérés
    #[serde(default)]
    pub captures: Vec<Uuid>,
    #[serde(default)]
    pub settings: ReplaySettings,
    /// Réglages par capture, prioritaires sur ceux de la playlist
    #[serde(default)]
    pub capture_settings: HashMap<Uuid, ReplaySettings>,
}

impl Playlist {
    pub fn new(name: impl Into<String>, settings: ReplaySettings) -> Self {
        Self {
            name: name.into(),
            captures: Vec::new(),
            settings,
            capture_settings: HashMap::new(),
        }
    }

    /// Compte dérivé : longueur de l'appartenance.
    pub fn count(&self) -> usize {
        self.captures.len()
    }

    pub fn is_all(&self) -> bool {
        self.name == ALL_PLAYLIST
    }

    /// Réglages effectifs d'un membre (surcharges puis playlist).
    pub fn effective_settings(&self, id: Uuid) -> ReplaySettings {
        match self.capture_settings.get(&id) {
            Some(overrides) => {
                let mut settings = overrides.clone();
                if settings.interface.is_none() {
                    settings.interface = self.settings.interface.clone();
                }
                settings
            }
            None => self.settings.clone(),
        }
    }
}

/// Collection ordonnée de playlists.
///
/// Invariant structurel : la première entrée est toujours la playlist `All`,
/// qui reflète le catalogue entier. Toutes les recherches par nom retiennent
/// la première correspondance (tolérance défensive aux doublons de nom).
#[derive(Debug)]
pub struct PlaylistSet {
    playlists: Vec<Playlist>,
}

impl PlaylistSet {
    /// Reconstruit la collection depuis des enregistrements persistés.
    ///
    /// Idempotent : crée `All` en tête si absente (interface par défaut
    /// héritée de `default_interface`), puis re-dérive son appartenance depuis
    /// `catalog_ids` (l'appartenance persistée de `All` n'est jamais crue).
    pub fn from_loaded(
        mut playlists: Vec<Playlist>,
        catalog_ids: Vec<Uuid>,
        default_interface: Option<&str>,
    ) -> Self {
        let has_all = playlists.first().is_some_and(Playlist::is_all);
        if !has_all {
            // Retirer d'éventuelles « All » égarées avant de recréer la vraie
            playlists.retain(|p| !p.is_all());
            let settings =
                ReplaySettings::for_interface(default_interface.map(str::to_string));
            playlists.insert(0, Playlist::new(ALL_PLAYLIST, settings));
        }

        let mut set = Self { playlists };
        set.rederive_all(catalog_ids);
        set
    }

    /// La playlist `All` (toujours en première position).
    pub fn all(&self) -> &Playlist {
        &self.playlists[0]
    }

    fn all_mut(&mut self) -> &mut Playlist {
        &mut self.playlists[0]
    }

    /// Première playlist portant ce nom.
    pub fn find(&self, name: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.name == name)
    }

    /// Première playlist portant ce nom (mutable).
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|p| p.name == name)
    }

    /// Création : échoue en `PlaylistAlreadyExists` si le nom est pris
    /// (« All » inclus). La nouvelle playlist hérite de l'interface cible
    /// courante de `All`.
    pub fn create(&mut self, name: &str) -> Result<&Playlist> {
        if self.find(name).is_some() {
            return Err(Error::PlaylistAlreadyExists(name.to_string()));
        }
        let settings = ReplaySettings::for_interface(self.all().settings.interface.clone());
        self.playlists.push(Playlist::new(name, settings));
        Ok(&self.playlists[self.playlists.len() - 1])
    }

    /// Remplacement intégral des réglages et de l'appartenance d'une playlist
    /// autre que `All`.
    ///
    /// Refuse `All` (protection de l'invariant 2) et tout changement
    /// d'identité (le nom du corps doit égaler le nom visé ; le renommage
    /// passe par [`PlaylistSet::rename`]).
    pub fn replace(&mut self, name: &str, body: Playlist) -> Result<&Playlist> {
        if name == ALL_PLAYLIST || body.is_all() {
            return Err(Error::AllPlaylistProtected);
        }
        if body.name != name {
            return Err(Error::IdentityChange {
                target: name.to_string(),
                body: body.name,
            });
        }
        match self.playlists.iter_mut().find(|p| p.name == name) {
            Some(slot) => {
                *slot = body;
                Ok(slot)
            }
            None => Err(Error::PlaylistNotFound(name.to_string())),
        }
    }

    /// Renommage : re-valide l'unicité du nouveau nom (« All » inclus).
    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<&Playlist> {
        if name == ALL_PLAYLIST || new_name == ALL_PLAYLIST {
            return Err(Error::AllPlaylistProtected);
        }
        if name != new_name && self.find(new_name).is_some() {
            return Err(Error::PlaylistAlreadyExists(new_name.to_string()));
        }
        match self.playlists.iter_mut().find(|p| p.name == name) {
            Some(playlist) => {
                playlist.name = new_name.to_string();
                Ok(playlist)
            }
            None => Err(Error::PlaylistNotFound(name.to_string())),
        }
    }

    /// Suppression : `All` est interdite, absence signalée en `NotFound`.
    pub fn delete(&mut self, name: &str) -> Result<Playlist> {
        if name == ALL_PLAYLIST {
            return Err(Error::AllPlaylistProtected);
        }
        match self.playlists.iter().position(|p| p.name == name) {
            Some(pos) => Ok(self.playlists.remove(pos)),
            None => Err(Error::PlaylistNotFound(name.to_string())),
        }
    }

    /// Retire toute référence aux ids supprimés des playlists autres que
    /// `All`, sans réordonner les membres survivants.
    pub fn scrub_removed(&mut self, removed: &HashSet<Uuid>) {
        for playlist in self.playlists.iter_mut().skip(1) {
            playlist.captures.retain(|id| !removed.contains(id));
            playlist.capture_settings.retain(|id, _| !removed.contains(id));
        }
    }

    /// Re-dérive l'appartenance de `All` depuis le catalogue vivant (jamais
    /// de rustine incrémentale, pour éviter toute dérive).
    pub fn rederive_all(&mut self, catalog_ids: Vec<Uuid>) {
        let all = self.all_mut();
        let live: HashSet<Uuid> = catalog_ids.iter().copied().collect();
        all.captures = catalog_ids;
        all.capture_settings.retain(|id, _| live.contains(id));
    }

    /// Instantané de la collection, `All` en tête.
    pub fn snapshot(&self) -> Vec<Playlist> {
        self.playlists.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Playlist> {
        self.playlists.iter()
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}
