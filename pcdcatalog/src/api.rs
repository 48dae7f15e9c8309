//! API REST pour le catalogue de captures et les playlists.

use std::collections::HashMap;
use std::path::PathBuf;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pcdconfig::get_config;
use pcdreplay::{spawn_replay, ReplayError, ReplayStep};
use pcdutils::NicInfo;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config_ext::CatalogConfigExt;
use crate::manager::CatalogManager;
use crate::playlist::{LoopMode, Playlist, ReplaySettings, ReplaySpeed};
use crate::{Capture, IngestedFile};

/// Les uploads transportent des fichiers de capture entiers.
const UPLOAD_BODY_LIMIT: usize = 1024 * 1024 * 1024;

/// État partagé des handlers REST.
#[derive(Clone)]
pub struct ApiState {
    pub manager: CatalogManager,
    /// Répertoire de stockage des fichiers de capture
    pub captures_dir: PathBuf,
    /// Chemin de l'exécutable tcpreplay
    pub replay_tool: String,
    /// Résultat (mis en cache au démarrage) de la sonde tcpreplay
    pub replay_ready: bool,
    /// Interfaces réseau énumérées au démarrage
    pub interfaces: Vec<NicInfo>,
}

/// Router `/api` combinant les différents endpoints REST.
pub fn catalog_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/captures", get(list_captures).delete(delete_captures))
        .route("/captures/upload/{playlist_name}", post(upload_captures))
        .route("/captures/{id}/file", get(download_capture))
        .route("/playlists", get(list_playlists).post(create_playlist))
        .route(
            "/playlists/{name}",
            get(get_playlist)
                .put(replace_playlist)
                .delete(delete_playlist),
        )
        .route("/playlists/{name}/rename", post(rename_playlist))
        .route("/playlists/{name}/play", post(play_playlist))
        .route("/interfaces", get(list_interfaces))
        .route("/preferences", get(get_preferences).post(set_preferences))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state)
}

/// Une playlist telle qu'exposée aux clients (compte dérivé inclus).
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaylistResponse {
    pub name: String,
    /// Toujours recalculé : longueur de l'appartenance
    pub count: usize,
    pub captures: Vec<Uuid>,
    pub settings: ReplaySettings,
    pub capture_settings: HashMap<Uuid, ReplaySettings>,
}

impl From<Playlist> for PlaylistResponse {
    fn from(playlist: Playlist) -> Self {
        Self {
            count: playlist.count(),
            name: playlist.name,
            captures: playlist.captures,
            settings: playlist.settings,
            capture_settings: playlist.capture_settings,
        }
    }
}

/// Convertit une collection de playlists en payload client.
pub fn playlists_payload(playlists: Vec<Playlist>) -> Vec<PlaylistResponse> {
    playlists.into_iter().map(PlaylistResponse::from).collect()
}

/// État complet retourné par les mutations touchant le catalogue.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogStateResponse {
    pub captures: Vec<Capture>,
    pub playlists: Vec<PlaylistResponse>,
}

/// Requête de création de playlist.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlaylistRequest {
    pub name: String,
}

/// Requête de renommage de playlist.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenamePlaylistRequest {
    pub new_name: String,
}

/// Réponse au lancement d'un rejeu.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayResponse {
    /// Nombre de fichiers du plan de rejeu
    pub files: usize,
}

/// Interface réseau exposée aux clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct InterfaceResponse {
    pub name: String,
    pub addresses: Vec<String>,
}

/// Préférences du serveur.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PreferencesResponse {
    pub captures_dir: String,
    pub tcpreplay_path: String,
    pub http_port: u16,
}

/// Requête de mise à jour des préférences.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePreferencesRequest {
    pub captures_dir: String,
    pub tcpreplay_path: String,
    pub http_port: Option<u16>,
}

/// Réponse d'erreur REST générique.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/api/captures",
    tag = "captures",
    responses(
        (status = 200, description = "Catalogue complet, dans l'ordre d'ingestion", body = [Capture])
    )
)]
pub async fn list_captures(State(state): State<ApiState>) -> Response {
    (StatusCode::OK, Json(state.manager.captures().await)).into_response()
}

#[utoipa::path(
    delete,
    path = "/api/captures",
    tag = "captures",
    request_body = Vec<Uuid>,
    responses(
        (status = 200, description = "Captures supprimées, état complet retourné", body = CatalogStateResponse),
        (status = 400, description = "Requête invalide", body = ErrorResponse),
        (status = 500, description = "Défaillance du stockage, lot avorté", body = ErrorResponse)
    )
)]
pub async fn delete_captures(
    State(state): State<ApiState>,
    Json(ids): Json<Vec<Uuid>>,
) -> Response {
    if ids.is_empty() {
        return map_status(StatusCode::BAD_REQUEST, "EMPTY_PAYLOAD", "ids cannot be empty");
    }

    match state.manager.delete_captures(&ids).await {
        Ok(_) => full_state_response(&state, StatusCode::OK).await,
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    post,
    path = "/api/captures/upload/{playlist_name}",
    tag = "captures",
    params(
        ("playlist_name" = String, Path, description = "Playlist cible ('All' pour le seul catalogue)")
    ),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Captures ingérées, état complet retourné", body = CatalogStateResponse),
        (status = 400, description = "Upload invalide", body = ErrorResponse),
        (status = 404, description = "Playlist cible introuvable", body = ErrorResponse)
    )
)]
pub async fn upload_captures(
    State(state): State<ApiState>,
    Path(playlist_name): Path<String>,
    mut multipart: Multipart,
) -> Response {
    // Écrire d'abord les fichiers, dans l'ordre d'upload
    let mut files: Vec<IngestedFile> = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                cleanup_uploads(&state, &files).await;
                return map_status(
                    StatusCode::BAD_REQUEST,
                    "UPLOAD_ERROR",
                    &format!("Malformed multipart payload: {e}"),
                );
            }
        };

        let original_name = field
            .file_name()
            .unwrap_or("capture.pcap")
            .to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                cleanup_uploads(&state, &files).await;
                return map_status(
                    StatusCode::BAD_REQUEST,
                    "UPLOAD_ERROR",
                    &format!("Failed to read uploaded file: {e}"),
                );
            }
        };

        let storage_filename = Uuid::new_v4().simple().to_string();
        let path = state.captures_dir.join(&storage_filename);
        if let Err(e) = tokio::fs::write(&path, &data).await {
            cleanup_uploads(&state, &files).await;
            return map_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_FAILURE",
                &format!("Failed to store uploaded file: {e}"),
            );
        }

        files.push(IngestedFile {
            storage_filename,
            original_name,
            size_bytes: data.len() as u64,
        });
    }

    if files.is_empty() {
        return map_status(StatusCode::BAD_REQUEST, "EMPTY_PAYLOAD", "No file in upload");
    }

    match state
        .manager
        .ingest_batch(files.clone(), Some(&playlist_name))
        .await
    {
        Ok(_) => full_state_response(&state, StatusCode::CREATED).await,
        Err(err) => {
            // Lot rejeté : les fichiers écrits ne sont référencés nulle part
            cleanup_uploads(&state, &files).await;
            map_error(err)
        }
    }
}

/// Supprime (au mieux) les fichiers écrits pour un lot d'upload rejeté.
async fn cleanup_uploads(state: &ApiState, files: &[IngestedFile]) {
    for file in files {
        let path = state.captures_dir.join(&file.storage_filename);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "Failed to clean up rejected upload");
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/captures/{id}/file",
    tag = "captures",
    params(
        ("id" = Uuid, Path, description = "Id de la capture")
    ),
    responses(
        (status = 200, description = "Contenu du fichier de capture", content_type = "application/vnd.tcpdump.pcap"),
        (status = 404, description = "Capture ou fichier introuvable", body = ErrorResponse)
    )
)]
pub async fn download_capture(State(state): State<ApiState>, Path(id): Path<Uuid>) -> Response {
    let (capture, path) = match state.manager.capture_path(id).await {
        Ok(found) => found,
        Err(err) => return map_error(err),
    };

    match tokio::fs::File::open(&path).await {
        Ok(file) => {
            let stream = tokio_util::io::ReaderStream::new(file);
            let headers = [
                (
                    header::CONTENT_TYPE,
                    "application/vnd.tcpdump.pcap".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", capture.original_name),
                ),
            ];
            (StatusCode::OK, headers, axum::body::Body::from_stream(stream)).into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => map_status(
            StatusCode::NOT_FOUND,
            "FILE_NOT_FOUND",
            &format!("Backing file for capture {id} is missing"),
        ),
        Err(e) => map_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_FAILURE",
            &format!("Failed to open capture file: {e}"),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/api/playlists",
    tag = "playlists",
    responses(
        (status = 200, description = "Collection de playlists, « All » en tête", body = [PlaylistResponse])
    )
)]
pub async fn list_playlists(State(state): State<ApiState>) -> Response {
    let payload = playlists_payload(state.manager.playlists().await);
    (StatusCode::OK, Json(payload)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/playlists/{name}",
    tag = "playlists",
    params(
        ("name" = String, Path, description = "Nom de la playlist")
    ),
    responses(
        (status = 200, description = "Playlist détaillée", body = PlaylistResponse),
        (status = 404, description = "Playlist introuvable", body = ErrorResponse)
    )
)]
pub async fn get_playlist(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    match state.manager.playlist(&name).await {
        Ok(playlist) => (StatusCode::OK, Json(PlaylistResponse::from(playlist))).into_response(),
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    post,
    path = "/api/playlists",
    tag = "playlists",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 201, description = "Playlist créée", body = PlaylistResponse),
        (status = 400, description = "Nom invalide", body = ErrorResponse),
        (status = 409, description = "Nom déjà pris", body = ErrorResponse)
    )
)]
pub async fn create_playlist(
    State(state): State<ApiState>,
    Json(req): Json<CreatePlaylistRequest>,
) -> Response {
    if req.name.trim().is_empty() {
        return map_status(
            StatusCode::BAD_REQUEST,
            "INVALID_NAME",
            "Playlist name cannot be empty",
        );
    }

    match state.manager.create_playlist(&req.name).await {
        Ok(playlist) => {
            (StatusCode::CREATED, Json(PlaylistResponse::from(playlist))).into_response()
        }
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    put,
    path = "/api/playlists/{name}",
    tag = "playlists",
    params(
        ("name" = String, Path, description = "Nom de la playlist")
    ),
    request_body = Playlist,
    responses(
        (status = 200, description = "Playlist remplacée", body = PlaylistResponse),
        (status = 400, description = "Changement d'identité refusé", body = ErrorResponse),
        (status = 403, description = "« All » protégée", body = ErrorResponse),
        (status = 404, description = "Playlist ou capture référencée introuvable", body = ErrorResponse)
    )
)]
pub async fn replace_playlist(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(body): Json<Playlist>,
) -> Response {
    match state.manager.replace_playlist(&name, body).await {
        Ok(playlist) => (StatusCode::OK, Json(PlaylistResponse::from(playlist))).into_response(),
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    post,
    path = "/api/playlists/{name}/rename",
    tag = "playlists",
    params(
        ("name" = String, Path, description = "Nom actuel de la playlist")
    ),
    request_body = RenamePlaylistRequest,
    responses(
        (status = 200, description = "Playlist renommée", body = PlaylistResponse),
        (status = 403, description = "« All » protégée", body = ErrorResponse),
        (status = 404, description = "Playlist introuvable", body = ErrorResponse),
        (status = 409, description = "Nouveau nom déjà pris", body = ErrorResponse)
    )
)]
pub async fn rename_playlist(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(req): Json<RenamePlaylistRequest>,
) -> Response {
    if req.new_name.trim().is_empty() {
        return map_status(
            StatusCode::BAD_REQUEST,
            "INVALID_NAME",
            "Playlist name cannot be empty",
        );
    }

    match state.manager.rename_playlist(&name, &req.new_name).await {
        Ok(playlist) => (StatusCode::OK, Json(PlaylistResponse::from(playlist))).into_response(),
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    delete,
    path = "/api/playlists/{name}",
    tag = "playlists",
    params(
        ("name" = String, Path, description = "Nom de la playlist")
    ),
    responses(
        (status = 204, description = "Playlist supprimée"),
        (status = 403, description = "« All » protégée", body = ErrorResponse),
        (status = 404, description = "Playlist introuvable", body = ErrorResponse)
    )
)]
pub async fn delete_playlist(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    match state.manager.delete_playlist(&name).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => map_error(err),
    }
}

#[utoipa::path(
    post,
    path = "/api/playlists/{name}/play",
    tag = "playlists",
    params(
        ("name" = String, Path, description = "Nom de la playlist")
    ),
    responses(
        (status = 202, description = "Rejeu lancé hors-bande", body = PlayResponse),
        (status = 400, description = "Playlist vide ou sans interface cible", body = ErrorResponse),
        (status = 404, description = "Playlist introuvable", body = ErrorResponse),
        (status = 503, description = "tcpreplay indisponible", body = ErrorResponse)
    )
)]
pub async fn play_playlist(State(state): State<ApiState>, Path(name): Path<String>) -> Response {
    let plan = match state.manager.replay_plan(&name).await {
        Ok(plan) => plan,
        Err(err) => return map_error(err),
    };

    let mut steps = Vec::with_capacity(plan.len());
    for instruction in plan {
        let Some(interface) = instruction.settings.interface else {
            return map_status(
                StatusCode::BAD_REQUEST,
                "NO_INTERFACE",
                "Playlist has no target interface",
            );
        };
        steps.push(ReplayStep {
            file: instruction.path,
            interface,
            topspeed: instruction.settings.speed == ReplaySpeed::Topspeed,
            loop_forever: instruction.settings.looping == LoopMode::Forever,
        });
    }

    let count = steps.len();
    match spawn_replay(state.replay_tool.clone(), state.replay_ready, steps) {
        Ok(()) => (StatusCode::ACCEPTED, Json(PlayResponse { files: count })).into_response(),
        Err(ReplayError::ToolUnavailable) => map_status(
            StatusCode::SERVICE_UNAVAILABLE,
            "REPLAY_UNAVAILABLE",
            "tcpreplay is not available on this host",
        ),
        Err(ReplayError::EmptyPlan) => map_status(
            StatusCode::BAD_REQUEST,
            "EMPTY_PLAYLIST",
            "Playlist has no captures to replay",
        ),
    }
}

#[utoipa::path(
    get,
    path = "/api/interfaces",
    tag = "interfaces",
    responses(
        (status = 200, description = "Interfaces réseau utilisables", body = [InterfaceResponse])
    )
)]
pub async fn list_interfaces(State(state): State<ApiState>) -> Response {
    let payload: Vec<InterfaceResponse> = state
        .interfaces
        .iter()
        .map(|nic| InterfaceResponse {
            name: nic.name.clone(),
            addresses: nic.addresses.clone(),
        })
        .collect();
    (StatusCode::OK, Json(payload)).into_response()
}

/// Instantané courant des préférences (aussi utilisé à l'accueil SSE).
pub fn preferences_payload() -> serde_json::Value {
    let config = get_config();
    serde_json::json!({
        "captures_dir": config.captures_dir_setting(),
        "tcpreplay_path": config.get_string_or(&["replay", "tcpreplay_path"], ""),
        "http_port": config.get_http_port(),
    })
}

#[utoipa::path(
    get,
    path = "/api/preferences",
    tag = "preferences",
    responses(
        (status = 200, description = "Préférences courantes", body = PreferencesResponse)
    )
)]
pub async fn get_preferences() -> Response {
    (StatusCode::OK, Json(preferences_payload())).into_response()
}

#[utoipa::path(
    post,
    path = "/api/preferences",
    tag = "preferences",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Préférences mises à jour et diffusées", body = PreferencesResponse),
        (status = 400, description = "Champ requis manquant", body = ErrorResponse),
        (status = 500, description = "Écriture de la configuration impossible", body = ErrorResponse)
    )
)]
pub async fn set_preferences(
    State(state): State<ApiState>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Response {
    // Les deux chemins sont requis, comme au démarrage
    if req.captures_dir.trim().is_empty() {
        return map_status(
            StatusCode::BAD_REQUEST,
            "MISSING_FIELD",
            "'captures_dir' is required",
        );
    }
    if req.tcpreplay_path.trim().is_empty() {
        return map_status(
            StatusCode::BAD_REQUEST,
            "MISSING_FIELD",
            "'tcpreplay_path' is required",
        );
    }

    let config = get_config();
    let result = config
        .set_value(
            &["captures", "directory"],
            serde_yaml::Value::String(req.captures_dir.clone()),
        )
        .and_then(|()| {
            config.set_value(
                &["replay", "tcpreplay_path"],
                serde_yaml::Value::String(req.tcpreplay_path.clone()),
            )
        })
        .and_then(|()| match req.http_port {
            Some(port) => config.set_http_port(port),
            None => Ok(()),
        });

    match result {
        Ok(()) => {
            let payload = preferences_payload();
            state.manager.broadcast_preferences(payload.clone());
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(e) => map_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            "CONFIG_WRITE_FAILED",
            &format!("Failed to persist preferences: {e}"),
        ),
    }
}

/// Retourne l'état complet (catalogue + playlists) après une mutation.
async fn full_state_response(state: &ApiState, status: StatusCode) -> Response {
    let (captures, playlists) = state.manager.full_snapshot().await;
    let playlists = playlists_payload(playlists);
    (status, Json(CatalogStateResponse { captures, playlists })).into_response()
}

/// Construit une réponse d'erreur normalisée.
fn map_status(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Traduit une erreur du cœur en réponse REST.
fn map_error(err: crate::Error) -> Response {
    let (status, code) = match &err {
        crate::Error::CaptureNotFound(_) => (StatusCode::NOT_FOUND, "CAPTURE_NOT_FOUND"),
        crate::Error::PlaylistNotFound(_) => (StatusCode::NOT_FOUND, "PLAYLIST_NOT_FOUND"),
        crate::Error::PlaylistAlreadyExists(_) => (StatusCode::CONFLICT, "PLAYLIST_EXISTS"),
        crate::Error::AllPlaylistProtected => (StatusCode::FORBIDDEN, "ALL_PLAYLIST_PROTECTED"),
        crate::Error::IdentityChange { .. } => (StatusCode::BAD_REQUEST, "IDENTITY_CHANGE"),
        crate::Error::StorageFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE"),
        crate::Error::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR"),
        crate::Error::Other(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    map_status(status, code, &err.to_string())
}
