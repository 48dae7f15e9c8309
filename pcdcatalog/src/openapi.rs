//! Documentation OpenAPI pour l'API catalogue/playlists et le flux SSE.

use utoipa::OpenApi;

/// Documentation OpenAPI de PcapDeck.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::list_captures,
        crate::api::delete_captures,
        crate::api::upload_captures,
        crate::api::download_capture,
        crate::api::list_playlists,
        crate::api::get_playlist,
        crate::api::create_playlist,
        crate::api::replace_playlist,
        crate::api::rename_playlist,
        crate::api::delete_playlist,
        crate::api::play_playlist,
        crate::api::list_interfaces,
        crate::api::get_preferences,
        crate::api::set_preferences,
        crate::sse::state_events_sse,
    ),
    components(
        schemas(
            crate::Capture,
            crate::Playlist,
            crate::ReplaySettings,
            crate::ReplaySpeed,
            crate::LoopMode,
            crate::api::PlaylistResponse,
            crate::api::CatalogStateResponse,
            crate::api::CreatePlaylistRequest,
            crate::api::RenamePlaylistRequest,
            crate::api::PlayResponse,
            crate::api::InterfaceResponse,
            crate::api::PreferencesResponse,
            crate::api::UpdatePreferencesRequest,
            crate::api::ErrorResponse,
        )
    ),
    tags(
        (name = "captures", description = "Catalogue des captures ingérées"),
        (name = "playlists", description = "Groupements ordonnés de captures et réglages de rejeu"),
        (name = "interfaces", description = "Interfaces réseau utilisables pour le rejeu"),
        (name = "preferences", description = "Préférences du serveur"),
        (name = "events", description = "Diffusion de l'état aux observateurs")
    ),
    info(
        title = "PcapDeck API",
        version = "0.1.0",
        description = r#"
# Catalogue de captures et playlists

API de pilotage du catalogue de captures réseau et de ses playlists :
- upload et suppression par lot (atomiques vis-à-vis des observateurs)
- playlists nommées, « All » reflétant tout le catalogue
- rejeu délégué à tcpreplay
- flux SSE `/api/events` : séquence d'accueil puis instantanés complets
  après chaque mutation
        "#,
        license(
            name = "MIT",
        ),
    )
)]
pub struct ApiDoc;
