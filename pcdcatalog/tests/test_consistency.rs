use pcdcatalog::{
    CaptureStorage, CatalogManager, Error, IngestedFile, PersistenceGateway, Playlist,
    PlaylistSet, ReplaySettings, StorageError, ALL_PLAYLIST,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Persistance en mémoire pour les tests
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

/// Stockage dont toutes les suppressions réussissent
struct NullStorage;

impl CaptureStorage for NullStorage {
    fn remove_file(&self, _filename: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn resolve(&self, filename: &str) -> PathBuf {
        PathBuf::from("/captures").join(filename)
    }
}

/// Stockage qui échoue (défaillance réelle) sur un fichier précis
struct FailingStorage {
    fail_on: String,
}

impl CaptureStorage for FailingStorage {
    fn remove_file(&self, filename: &str) -> Result<(), StorageError> {
        if filename == self.fail_on {
            Err(StorageError::Failure {
                path: filename.to_string(),
                message: "permission denied".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn resolve(&self, filename: &str) -> PathBuf {
        PathBuf::from("/captures").join(filename)
    }
}

/// Stockage dont tous les fichiers sont déjà absents
struct MissingFileStorage;

impl CaptureStorage for MissingFileStorage {
    fn remove_file(&self, filename: &str) -> Result<(), StorageError> {
        Err(StorageError::NotFound(filename.to_string()))
    }

    fn resolve(&self, filename: &str) -> PathBuf {
        PathBuf::from("/captures").join(filename)
    }
}

fn manager_with(storage: Arc<dyn CaptureStorage>) -> CatalogManager {
    CatalogManager::load(Arc::new(MemStore::default()), storage, Some("eth0".into())).unwrap()
}

fn manager() -> CatalogManager {
    manager_with(Arc::new(NullStorage))
}

fn file(name: &str) -> IngestedFile {
    IngestedFile {
        storage_filename: format!("stored-{name}"),
        original_name: name.to_string(),
        size_bytes: 64,
    }
}

async fn assert_all_tracks_catalog(manager: &CatalogManager) {
    let catalog_ids: Vec<_> = manager.captures().await.iter().map(|c| c.id).collect();
    let all = manager.playlist(ALL_PLAYLIST).await.unwrap();
    assert_eq!(all.captures, catalog_ids);
    assert_eq!(all.count(), catalog_ids.len());
}

#[tokio::test]
async fn all_playlist_tracks_catalog_after_every_mutation() {
    let manager = manager();

    let ingested = manager
        .ingest_batch(vec![file("a.pcap"), file("b.pcap"), file("c.pcap")], None)
        .await
        .unwrap();
    assert_eq!(ingested.len(), 3);
    assert_all_tracks_catalog(&manager).await;

    manager.create_playlist("mix").await.unwrap();
    assert_all_tracks_catalog(&manager).await;

    manager.delete_captures(&[ingested[1].id]).await.unwrap();
    assert_all_tracks_catalog(&manager).await;

    manager.delete_playlist("mix").await.unwrap();
    assert_all_tracks_catalog(&manager).await;

    let remaining: Vec<_> = manager.captures().await.iter().map(|c| c.id).collect();
    assert_eq!(remaining, vec![ingested[0].id, ingested[2].id]);
}

#[tokio::test]
async fn create_with_taken_name_is_a_conflict() {
    let manager = manager();
    manager.create_playlist("mix").await.unwrap();

    let before = manager.playlists().await;
    assert!(matches!(
        manager.create_playlist("mix").await,
        Err(Error::PlaylistAlreadyExists(_))
    ));
    assert!(matches!(
        manager.create_playlist(ALL_PLAYLIST).await,
        Err(Error::PlaylistAlreadyExists(_))
    ));
    assert_eq!(manager.playlists().await, before);
}

#[tokio::test]
async fn created_playlist_inherits_all_interface() {
    let manager = manager();
    let created = manager.create_playlist("mix").await.unwrap();
    assert_eq!(created.settings.interface.as_deref(), Some("eth0"));
}

#[tokio::test]
async fn cascade_delete_scrubs_playlists_in_order() {
    let manager = manager();
    let ingested = manager
        .ingest_batch(
            vec![file("a.pcap"), file("b.pcap"), file("c.pcap")],
            Some("mix"),
        )
        .await;
    // La cible doit exister avant l'ingestion
    assert!(matches!(ingested, Err(Error::PlaylistNotFound(_))));

    manager.create_playlist("mix").await.unwrap();
    let ingested = manager
        .ingest_batch(
            vec![file("a.pcap"), file("b.pcap"), file("c.pcap")],
            Some("mix"),
        )
        .await
        .unwrap();
    let (a, b, c) = (ingested[0].id, ingested[1].id, ingested[2].id);

    manager.delete_captures(&[a, c]).await.unwrap();

    let mix = manager.playlist("mix").await.unwrap();
    assert_eq!(mix.captures, vec![b]);
    assert_eq!(mix.count(), 1);

    let all = manager.playlist(ALL_PLAYLIST).await.unwrap();
    assert_eq!(all.captures, vec![b]);
    assert_eq!(all.count(), 1);
}

#[tokio::test]
async fn storage_failure_aborts_the_whole_batch() {
    let persistence = Arc::new(MemStore::default());
    let probe = CatalogManager::load(
        persistence.clone(),
        Arc::new(NullStorage),
        Some("eth0".into()),
    )
    .unwrap();
    probe.create_playlist("mix").await.unwrap();
    let ingested = probe
        .ingest_batch(vec![file("a.pcap"), file("b.pcap")], Some("mix"))
        .await
        .unwrap();
    let (a, b) = (ingested[0].id, ingested[1].id);

    // Recharger le même état avec un stockage qui échoue sur le fichier de b
    let manager = CatalogManager::load(
        persistence,
        Arc::new(FailingStorage {
            fail_on: "stored-b.pcap".to_string(),
        }),
        Some("eth0".into()),
    )
    .unwrap();

    let result = manager.delete_captures(&[a, b]).await;
    assert!(matches!(result, Err(Error::StorageFailure(_))));

    // Aucun effet partiel : ni le catalogue ni les playlists n'ont bougé
    let ids: Vec<_> = manager.captures().await.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![a, b]);
    let mix = manager.playlist("mix").await.unwrap();
    assert_eq!(mix.captures, vec![a, b]);
    assert_all_tracks_catalog(&manager).await;
}

#[tokio::test]
async fn missing_backing_file_is_non_fatal() {
    let manager = manager_with(Arc::new(MissingFileStorage));
    let ingested = manager
        .ingest_batch(vec![file("a.pcap")], None)
        .await
        .unwrap();

    manager.delete_captures(&[ingested[0].id]).await.unwrap();
    assert!(manager.captures().await.is_empty());
    assert_all_tracks_catalog(&manager).await;
}

#[tokio::test]
async fn unknown_ids_are_skipped() {
    let manager = manager();
    let ingested = manager
        .ingest_batch(vec![file("a.pcap")], None)
        .await
        .unwrap();

    let removed = manager
        .delete_captures(&[uuid::Uuid::new_v4(), ingested[0].id])
        .await
        .unwrap();
    assert_eq!(removed.len(), 1);
    assert!(manager.captures().await.is_empty());
}

#[tokio::test]
async fn all_playlist_is_protected() {
    let manager = manager();
    manager
        .ingest_batch(vec![file("a.pcap")], None)
        .await
        .unwrap();

    assert!(matches!(
        manager.delete_playlist(ALL_PLAYLIST).await,
        Err(Error::AllPlaylistProtected)
    ));

    let body = Playlist::new(ALL_PLAYLIST, ReplaySettings::default());
    assert!(matches!(
        manager.replace_playlist(ALL_PLAYLIST, body).await,
        Err(Error::AllPlaylistProtected)
    ));

    assert!(matches!(
        manager.rename_playlist(ALL_PLAYLIST, "everything").await,
        Err(Error::AllPlaylistProtected)
    ));

    // Le remplacement d'une autre playlist ne peut pas s'approprier « All »
    manager.create_playlist("mix").await.unwrap();
    let body = Playlist::new(ALL_PLAYLIST, ReplaySettings::default());
    assert!(matches!(
        manager.replace_playlist("mix", body).await,
        Err(Error::AllPlaylistProtected)
    ));

    assert_all_tracks_catalog(&manager).await;
}

#[tokio::test]
async fn upload_batch_preserves_order() {
    let manager = manager();
    manager.create_playlist("mix").await.unwrap();
    manager
        .ingest_batch(vec![file("seed.pcap")], Some("mix"))
        .await
        .unwrap();

    let ingested = manager
        .ingest_batch(vec![file("x.pcap"), file("y.pcap")], Some("mix"))
        .await
        .unwrap();
    let (x, y) = (ingested[0].id, ingested[1].id);

    let mix = manager.playlist("mix").await.unwrap();
    assert_eq!(&mix.captures[mix.count() - 2..], &[x, y]);

    let all = manager.playlist(ALL_PLAYLIST).await.unwrap();
    assert_eq!(&all.captures[all.count() - 2..], &[x, y]);
}

#[tokio::test]
async fn replace_recomputes_membership_and_validates_references() {
    let manager = manager();
    manager.create_playlist("mix").await.unwrap();
    let ingested = manager
        .ingest_batch(vec![file("a.pcap"), file("b.pcap")], None)
        .await
        .unwrap();
    let (a, b) = (ingested[0].id, ingested[1].id);

    // Les doublons d'appartenance sont tolérés par conception
    let mut body = Playlist::new("mix", ReplaySettings::default());
    body.captures = vec![b, a, b];
    let updated = manager.replace_playlist("mix", body).await.unwrap();
    assert_eq!(updated.captures, vec![b, a, b]);
    assert_eq!(updated.count(), 3);

    // Une référence inconnue viole l'invariant 1 : rejet
    let mut body = Playlist::new("mix", ReplaySettings::default());
    body.captures = vec![uuid::Uuid::new_v4()];
    assert!(matches!(
        manager.replace_playlist("mix", body).await,
        Err(Error::CaptureNotFound(_))
    ));

    // Le changement d'identité passe par rename, pas par replace
    let body = Playlist::new("remix", ReplaySettings::default());
    assert!(matches!(
        manager.replace_playlist("mix", body).await,
        Err(Error::IdentityChange { .. })
    ));

    let body = Playlist::new("ghost", ReplaySettings::default());
    assert!(matches!(
        manager.replace_playlist("ghost", body).await,
        Err(Error::PlaylistNotFound(_))
    ));
}

#[tokio::test]
async fn rename_revalidates_uniqueness() {
    let manager = manager();
    manager.create_playlist("mix").await.unwrap();
    manager.create_playlist("other").await.unwrap();

    assert!(matches!(
        manager.rename_playlist("mix", "other").await,
        Err(Error::PlaylistAlreadyExists(_))
    ));
    assert!(matches!(
        manager.rename_playlist("mix", ALL_PLAYLIST).await,
        Err(Error::AllPlaylistProtected)
    ));

    let renamed = manager.rename_playlist("mix", "remix").await.unwrap();
    assert_eq!(renamed.name, "remix");
    assert!(matches!(
        manager.playlist("mix").await,
        Err(Error::PlaylistNotFound(_))
    ));
}

#[test]
fn duplicate_names_resolve_to_first_match() {
    // État anormal toléré défensivement : deux playlists du même nom
    let mut first = Playlist::new("dup", ReplaySettings::for_interface(Some("eth0".into())));
    let marker = uuid::Uuid::new_v4();
    first.captures = vec![marker];
    let second = Playlist::new("dup", ReplaySettings::default());

    let set = PlaylistSet::from_loaded(
        vec![
            Playlist::new(ALL_PLAYLIST, ReplaySettings::default()),
            first,
            second,
        ],
        vec![marker],
        None,
    );

    let found = set.find("dup").unwrap();
    assert_eq!(found.captures, vec![marker]);
}

#[tokio::test]
async fn replay_plan_applies_member_overrides() {
    let manager = manager();
    manager.create_playlist("mix").await.unwrap();
    let ingested = manager
        .ingest_batch(vec![file("a.pcap"), file("b.pcap")], Some("mix"))
        .await
        .unwrap();
    let b = ingested[1].id;

    let mut body = manager.playlist("mix").await.unwrap();
    body.capture_settings.insert(
        b,
        ReplaySettings {
            speed: pcdcatalog::ReplaySpeed::Topspeed,
            interface: None,
            looping: pcdcatalog::LoopMode::None,
        },
    );
    manager.replace_playlist("mix", body).await.unwrap();

    let plan = manager.replay_plan("mix").await.unwrap();
    assert_eq!(plan.len(), 2);
    // a : réglages de la playlist ; b : surcharge, interface héritée
    assert_eq!(plan[0].settings.speed, pcdcatalog::ReplaySpeed::Pcap);
    assert_eq!(plan[1].settings.speed, pcdcatalog::ReplaySpeed::Topspeed);
    assert_eq!(plan[1].settings.interface.as_deref(), Some("eth0"));
    assert_eq!(plan[0].path, PathBuf::from("/captures/stored-a.pcap"));
}
