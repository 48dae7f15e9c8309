//! Extension de pcdconfig pour le catalogue

use std::path::PathBuf;

/// Trait d'extension pour pcdconfig::Config
pub trait CatalogConfigExt {
    /// Répertoire de stockage des captures (créé s'il n'existe pas)
    fn captures_dir(&self) -> anyhow::Result<PathBuf>;

    /// Valeur brute configurée pour le répertoire des captures
    fn captures_dir_setting(&self) -> String;

    /// Chemin du fichier JSON du catalogue
    fn catalog_file(&self) -> PathBuf;

    /// Chemin du fichier JSON des playlists
    fn playlists_file(&self) -> PathBuf;
}

impl CatalogConfigExt for pcdconfig::Config {
    fn captures_dir(&self) -> anyhow::Result<PathBuf> {
        let dir = self.get_managed_dir(&["captures", "directory"], "captures")?;
        Ok(PathBuf::from(dir))
    }

    fn captures_dir_setting(&self) -> String {
        self.get_string_or(&["captures", "directory"], "captures")
    }

    fn catalog_file(&self) -> PathBuf {
        PathBuf::from(self.config_dir()).join("catalog.json")
    }

    fn playlists_file(&self) -> PathBuf {
        PathBuf::from(self.config_dir()).join("playlists.json")
    }
}
