//! Contrat de diffusion : instantanés après mutation et séquence d'accueil.

#![cfg(feature = "pcdserver")]

use pcdcatalog::sse::{onboarding_payloads, ObserverState};
use pcdcatalog::{
    CaptureStorage, CatalogManager, IngestedFile, PersistenceGateway, Playlist, StateEvent,
    StorageError, ALL_PLAYLIST,
};
use pcdutils::NicInfo;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MemStore {
    catalog: Mutex<Vec<pcdcatalog::Capture>>,
    playlists: Mutex<Vec<Playlist>>,
}

impl PersistenceGateway for MemStore {
    fn load_catalog(&self) -> pcdcatalog::Result<Vec<pcdcatalog::Capture>> {
        Ok(self.catalog.lock().unwrap().clone())
    }

    fn save_catalog(&self, captures: &[pcdcatalog::Capture]) -> pcdcatalog::Result<()> {
        *self.catalog.lock().unwrap() = captures.to_vec();
        Ok(())
    }

    fn load_playlists(&self) -> pcdcatalog::Result<Vec<Playlist>> {
        Ok(self.playlists.lock().unwrap().clone())
    }

    fn save_playlists(&self, playlists: &[Playlist]) -> pcdcatalog::Result<()> {
        *self.playlists.lock().unwrap() = playlists.to_vec();
        Ok(())
    }
}

struct NullStorage;

impl CaptureStorage for NullStorage {
    fn remove_file(&self, _filename: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn resolve(&self, filename: &str) -> PathBuf {
        PathBuf::from("/captures").join(filename)
    }
}

fn manager() -> CatalogManager {
    CatalogManager::load(
        Arc::new(MemStore::default()),
        Arc::new(NullStorage),
        Some("eth0".into()),
    )
    .unwrap()
}

fn file(name: &str) -> IngestedFile {
    IngestedFile {
        storage_filename: format!("stored-{name}"),
        original_name: name.to_string(),
        size_bytes: 64,
    }
}

#[tokio::test]
async fn catalog_mutations_broadcast_settled_snapshots() {
    let manager = manager();
    let mut rx = manager.subscribe();

    manager
        .ingest_batch(vec![file("a.pcap"), file("b.pcap")], None)
        .await
        .unwrap();

    // Une seule paire d'évènements pour tout le lot, état entièrement réglé
    let StateEvent::Captures(captures) = rx.recv().await.unwrap() else {
        panic!("expected a captures snapshot first");
    };
    assert_eq!(captures.len(), 2);

    let StateEvent::Playlists(playlists) = rx.recv().await.unwrap() else {
        panic!("expected a playlists snapshot second");
    };
    assert_eq!(playlists[0].name, ALL_PLAYLIST);
    assert_eq!(playlists[0].count(), 2);
    assert_eq!(
        playlists[0].captures,
        captures.iter().map(|c| c.id).collect::<Vec<_>>()
    );

    // Aucun autre évènement en attente
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn playlist_mutations_broadcast_playlists_only() {
    let manager = manager();
    let mut rx = manager.subscribe();

    manager.create_playlist("mix").await.unwrap();

    let StateEvent::Playlists(playlists) = rx.recv().await.unwrap() else {
        panic!("expected a playlists snapshot");
    };
    assert_eq!(playlists.len(), 2);

    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn onboarding_sequence_is_complete_and_ordered() {
    let manager = manager();
    manager
        .ingest_batch(vec![file("a.pcap")], None)
        .await
        .unwrap();

    let state = ObserverState {
        manager,
        version: "1.2.3".to_string(),
        replay_ready: true,
        interfaces: vec![NicInfo {
            name: "eth0".to_string(),
            addresses: vec!["192.168.1.10".to_string()],
        }],
        preferences: Arc::new(|| serde_json::json!({ "http_port": 3003 })),
    };

    let payloads = onboarding_payloads(&state).await;
    let names: Vec<_> = payloads.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        vec![
            "server_version",
            "preferences",
            "replay_ready",
            "interfaces",
            "captures",
            "playlists",
        ]
    );

    assert_eq!(payloads[0].1, serde_json::json!("1.2.3"));
    assert_eq!(payloads[2].1, serde_json::json!(true));
    assert_eq!(payloads[4].1.as_array().unwrap().len(), 1);
    // Le payload playlists transporte le compte dérivé
    assert_eq!(payloads[5].1[0]["count"], serde_json::json!(1));
}
