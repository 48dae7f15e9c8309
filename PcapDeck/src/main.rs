use pcdcatalog::api::{catalog_api_router, preferences_payload, ApiState};
use pcdcatalog::openapi::ApiDoc;
use pcdcatalog::sse::{state_events_router, ObserverState};
use pcdcatalog::{CatalogConfigExt, CatalogManager, DirStorage, JsonStore};
use pcdconfig::get_config;
use pcdreplay::{probe_tcpreplay, ReplayConfigExt};
use pcdserver::{init_logging, Server};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::OpenApi;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ========== PHASE 1 : Infrastructure ==========

    init_logging();
    info!("🚀 Starting PcapDeck version {}", VERSION);

    let config = get_config();

    // Précondition de démarrage : le répertoire des captures doit exister et
    // être inscriptible
    let captures_dir = match config.captures_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Captures directory is not usable: {}", e);
            std::process::exit(1);
        }
    };
    let write_test = captures_dir.join(".write_test");
    if let Err(e) = std::fs::write(&write_test, b"test") {
        error!(
            "Captures directory {} is not writable: {}",
            captures_dir.display(),
            e
        );
        std::process::exit(1);
    }
    let _ = std::fs::remove_file(&write_test);

    // ========== PHASE 2 : Collaborateurs externes ==========

    info!("📡 Enumerating network interfaces...");
    let interfaces = pcdutils::list_interfaces();
    if interfaces.is_empty() {
        warn!("No usable network interface was found");
    } else {
        for nic in &interfaces {
            info!("  - {} ({})", nic.name, nic.addresses.join(", "));
        }
    }
    let default_interface = interfaces.first().map(|nic| nic.name.clone());

    let replay_tool = config.tcpreplay_path();
    let replay_ready = probe_tcpreplay(&replay_tool).await;

    // ========== PHASE 3 : Cœur catalogue/playlists ==========

    info!("🗂️ Loading capture catalog and playlists...");
    let persistence = Arc::new(JsonStore::new(
        config.catalog_file(),
        config.playlists_file(),
    ));
    let storage = Arc::new(DirStorage::new(captures_dir.clone()));
    let manager = CatalogManager::load(persistence, storage, default_interface)?;

    info!(
        "✅ {} capture(s), {} playlist(s)",
        manager.captures().await.len(),
        manager.playlists().await.len()
    );

    // ========== PHASE 4 : Serveur HTTP ==========

    let api_state = ApiState {
        manager: manager.clone(),
        captures_dir,
        replay_tool,
        replay_ready,
        interfaces: interfaces.clone(),
    };
    let observer_state = ObserverState {
        manager,
        version: VERSION.to_string(),
        replay_ready,
        interfaces,
        preferences: Arc::new(preferences_payload),
    };

    let mut server = Server::new_configured("PcapDeck");
    server
        .add_route("/info", || async {
            serde_json::json!({ "version": VERSION })
        })
        .await;
    server
        .add_router(
            "/api",
            catalog_api_router(api_state).merge(state_events_router(observer_state)),
        )
        .await;
    server.add_openapi(ApiDoc::openapi()).await;

    info!("🌐 Starting HTTP server...");
    server.start().await;

    info!("✅ PcapDeck is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
