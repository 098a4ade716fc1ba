//! Backup snapshots of registered keys

mod common;

use common::store_fixture::{sample_profile, StoreFixture};
use kvlite::{BackendKind, KeyDescriptor};

#[tokio::test]
async fn test_backup_contains_exactly_registered_values() {
    for kind in [BackendKind::File, BackendKind::Relational] {
        let fixture = StoreFixture::new(kind, "world").await;
        let counter = fixture.registry.register("counter", || 0_i64).unwrap();
        let profile = fixture
            .registry
            .register("players.frank", || sample_profile("nobody"))
            .unwrap();
        let motd = fixture.registry.register("motd", String::new).unwrap();
        let unregistered = KeyDescriptor::new("scratch", || 0_i64);

        assert!(fixture.store.set(&counter, &12).await);
        assert!(fixture.store.set(&profile, &sample_profile("frank")).await);
        assert!(fixture.store.set(&unregistered, &99).await);

        let report = fixture.store.backup_report().await;
        assert!(report.is_complete(), "{}: {:?}", kind, report);
        assert_eq!(report.backed_up, vec!["counter", "players.frank", "motd"]);
        assert_eq!(
            report.target,
            fixture.data_root().join("backups").join("world.yml")
        );

        let snapshot = fixture.open_backup().await;
        assert_eq!(snapshot.get(&counter).await, fixture.store.get(&counter).await);
        assert_eq!(snapshot.get(&profile).await, Some(sample_profile("frank")));
        assert_eq!(snapshot.get(&motd).await, None);
        assert_eq!(snapshot.get(&unregistered).await, None);
    }
}

#[tokio::test]
async fn test_backup_replaces_stale_snapshot() {
    let fixture = StoreFixture::new(BackendKind::Relational, "world").await;
    let counter = fixture.registry.register("counter", || 0_i64).unwrap();
    assert!(fixture.store.set(&counter, &1).await);

    let backups = fixture.data_root().join("backups");
    std::fs::create_dir_all(&backups).unwrap();
    std::fs::write(backups.join("world.yml"), "stale: true\ncounter: 500\n").unwrap();

    assert!(fixture.store.backup().await);

    let text = std::fs::read_to_string(backups.join("world.yml")).unwrap();
    let document: serde_yaml::Mapping = serde_yaml::from_str(&text).unwrap();
    assert_eq!(document.len(), 1);
    assert_eq!(
        document.get("counter"),
        Some(&serde_yaml::Value::Number(1.into()))
    );
}

#[tokio::test]
async fn test_unreadable_key_is_skipped() {
    let fixture = StoreFixture::new(BackendKind::Relational, "world").await;
    let counter = fixture.registry.register("counter", || 0_i64).unwrap();
    fixture.registry.register("broken", || 0_i64).unwrap();
    assert!(fixture.store.set(&counter, &8).await);

    let db = fixture.data_root().join("database").join("world.db");
    let conn = rusqlite::Connection::open(db).unwrap();
    conn.execute(
        "INSERT INTO key_value (key, value) VALUES ('broken', '{not json')",
        [],
    )
    .unwrap();
    drop(conn);

    let report = fixture.store.backup_report().await;
    assert!(!report.is_complete());
    assert_eq!(report.backed_up, vec!["counter"]);
    assert_eq!(report.skipped, vec!["broken"]);
    assert!(report.failed.is_empty());
    assert!(!fixture.store.backup().await);

    let snapshot = fixture.open_backup().await;
    assert_eq!(snapshot.get(&counter).await, Some(8));
}

#[tokio::test]
async fn test_backup_honours_custom_subpath() {
    let fixture = StoreFixture::with_config(BackendKind::File, "world", |config| {
        config.with_backup_subpath("snapshots")
    })
    .await;
    let counter = fixture.registry.register("counter", || 0_i64).unwrap();
    assert!(fixture.store.set(&counter, &4).await);

    assert!(fixture.store.backup().await);
    assert!(fixture
        .data_root()
        .join("snapshots")
        .join("world.yml")
        .exists());
    assert_eq!(fixture.open_backup().await.get(&counter).await, Some(4));
}
