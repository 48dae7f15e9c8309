//! Types d'erreurs pour pcdcatalog

/// Erreurs du catalogue et des playlists
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Capture not found: {0}")]
    CaptureNotFound(uuid::Uuid),

    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),

    #[error("Playlist already exists: {0}")]
    PlaylistAlreadyExists(String),

    #[error("The 'All' playlist cannot be modified through this operation")]
    AllPlaylistProtected,

    #[error("Playlist name cannot be changed through replace (got '{body}' for '{target}')")]
    IdentityChange { target: String, body: String },

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type Result spécialisé pour pcdcatalog
pub type Result<T> = std::result::Result<T, Error>;
