//! # pcdreplay - Délégation du rejeu à tcpreplay
//!
//! Cette crate matérialise la frontière avec l'outil de rejeu externe :
//! - Sonde de disponibilité de `tcpreplay` au démarrage (résultat mis en cache
//!   par l'application, jamais re-sondé par requête)
//! - Construction des lignes de commande de rejeu et lancement hors-bande
//!
//! Aucune analyse de paquets n'a lieu ici : le contenu des fichiers de capture
//! est entièrement du ressort de tcpreplay.

mod exec;
mod probe;

#[cfg(feature = "pcdconfig")]
mod config_ext;

pub use exec::{ReplayError, ReplayStep, spawn_replay};
pub use probe::probe_tcpreplay;

#[cfg(feature = "pcdconfig")]
pub use config_ext::ReplayConfigExt;
