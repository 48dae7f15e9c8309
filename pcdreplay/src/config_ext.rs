//! Extension de pcdconfig pour le rejeu

/// Trait d'extension pour pcdconfig::Config
pub trait ReplayConfigExt {
    /// Retourne le chemin configuré de l'exécutable tcpreplay
    fn tcpreplay_path(&self) -> String;
}

impl ReplayConfigExt for pcdconfig::Config {
    fn tcpreplay_path(&self) -> String {
        self.get_string_or(&["replay", "tcpreplay_path"], "/usr/bin/tcpreplay")
    }
}
