//! Sonde de disponibilité de l'exécutable tcpreplay

use std::path::Path;
use tokio::process::Command;
use tracing::{info, warn};

/// Vérifie que `tcpreplay` est présent et exécutable.
///
/// Le chemin est d'abord testé sur disque, puis `tcpreplay --version` est
/// exécuté. Le booléen retourné est destiné à être mis en cache au démarrage ;
/// un échec de sonde n'est jamais fatal.
pub async fn probe_tcpreplay(path: &str) -> bool {
    if !Path::new(path).exists() {
        warn!(path = %path, "tcpreplay was not found");
        return false;
    }

    match Command::new(path).arg("--version").output().await {
        Ok(output) if output.status.success() => {
            info!(path = %path, "tcpreplay probe succeeded");
            true
        }
        Ok(_) => {
            warn!(path = %path, "tcpreplay was found but could not be executed");
            false
        }
        Err(e) => {
            warn!(path = %path, error = %e, "tcpreplay was found but could not be executed");
            false
        }
    }
}
