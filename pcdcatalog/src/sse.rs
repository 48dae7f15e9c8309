//! SSE : diffusion de l'état aux observateurs connectés
//!
//! Route type : `GET /api/events`
//!
//! À la connexion, l'observateur reçoit la séquence d'accueil complète
//! (version du serveur, préférences, disponibilité de l'outil de rejeu,
//! liste des interfaces, catalogue, playlists), dans cet ordre, puis le flux
//! des instantanés diffusés après chaque mutation.

use crate::api::{playlists_payload, PlaylistResponse};
use crate::manager::{CatalogManager, StateEvent};
use async_stream::stream;
use axum::{
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Router,
};
use pcdutils::NicInfo;
use std::sync::Arc;

/// Fournit l'instantané courant des préférences à chaque connexion.
pub type PreferencesSource = Arc<dyn Fn() -> serde_json::Value + Send + Sync>;

/// État partagé du flux observateurs.
#[derive(Clone)]
pub struct ObserverState {
    pub manager: CatalogManager,
    /// Version du serveur, envoyée à l'accueil
    pub version: String,
    /// Résultat (mis en cache au démarrage) de la sonde tcpreplay
    pub replay_ready: bool,
    /// Interfaces réseau énumérées au démarrage
    pub interfaces: Vec<NicInfo>,
    pub preferences: PreferencesSource,
}

/// Construit la séquence d'accueil : exactement un évènement de chaque, dans
/// l'ordre du contrat de diffusion.
pub async fn onboarding_payloads(
    state: &ObserverState,
) -> Vec<(&'static str, serde_json::Value)> {
    let (captures, playlists) = state.manager.full_snapshot().await;
    let playlists = playlists_payload(playlists);

    vec![
        ("server_version", serde_json::json!(state.version)),
        ("preferences", (state.preferences)()),
        ("replay_ready", serde_json::json!(state.replay_ready)),
        (
            "interfaces",
            serde_json::to_value(&state.interfaces).unwrap_or_default(),
        ),
        (
            "captures",
            serde_json::to_value(&captures).unwrap_or_default(),
        ),
        (
            "playlists",
            serde_json::to_value(&playlists).unwrap_or_default(),
        ),
    ]
}

/// Traduit un évènement d'état en évènement SSE nommé.
fn live_payload(event: &StateEvent) -> Option<(&'static str, serde_json::Value)> {
    match event {
        StateEvent::Captures(captures) => Some((
            "captures",
            serde_json::to_value(captures).unwrap_or_default(),
        )),
        StateEvent::Playlists(playlists) => {
            let payload: Vec<PlaylistResponse> = playlists_payload(playlists.clone());
            Some((
                "playlists",
                serde_json::to_value(&payload).unwrap_or_default(),
            ))
        }
        StateEvent::Preferences(preferences) => Some(("preferences", preferences.clone())),
    }
}

/// Handler SSE : séquence d'accueil puis instantanés en direct.
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "events",
    responses(
        (status = 200, description = "Flux SSE : séquence d'accueil (server_version, preferences, replay_ready, interfaces, captures, playlists) puis instantanés après chaque mutation", content_type = "text/event-stream")
    )
)]
pub async fn state_events_sse(
    axum::extract::State(state): axum::extract::State<ObserverState>,
) -> impl IntoResponse {
    // Souscrire avant de lire les instantanés : aucune mutation ne peut se
    // glisser entre l'accueil et le direct
    let mut rx = state.manager.subscribe();
    let onboarding = onboarding_payloads(&state).await;

    let stream = stream! {
        for (name, payload) in onboarding {
            if let Ok(json) = serde_json::to_string(&payload) {
                yield Ok::<_, axum::Error>(Event::default().event(name).data(json));
            }
        }

        while let Ok(event) = rx.recv().await {
            if let Some((name, payload)) = live_payload(&event) {
                if let Ok(json) = serde_json::to_string(&payload) {
                    yield Ok::<_, axum::Error>(Event::default().event(name).data(json));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Router prêt à être monté (ex: `/api/events`).
pub fn state_events_router(state: ObserverState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/events", get(state_events_sse))
        .with_state(state)
}
