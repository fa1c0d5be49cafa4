use fjall::PartitionCreateOptions;
use furrow::errors::{ErrorKind, FurrowError};
use furrow::migration::{migrate, rollback, MigrationSet, MigrationStep};
use furrow::store::{VersionStore, VersionStoreProvider};
use furrow_fjall_adapter::{encode_version, FjallVersionStore};
use furrow_int_test::test_util::{cleanup, create_test_context, random_path, run_test, StepJournal};
use std::fs;

#[test]
fn test_owned_store_opens_and_releases_keyspace() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.fjall_store();
            assert!(store.owns_keyspace());
            assert!(!store.is_open());

            store.setup()?;
            assert!(store.is_open());
            store.teardown()?;
            assert!(!store.is_open());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_borrowed_keyspace_is_left_open() {
    let path = random_path();
    let keyspace = fjall::Config::new(&path)
        .open()
        .expect("Failed to open keyspace");

    let fjall_store = FjallVersionStore::from_keyspace(keyspace.clone(), "data_migrations");
    assert!(!fjall_store.owns_keyspace());

    let journal = StepJournal::new();
    let steps = journal.steps(&[1, 2]);
    migrate(Some(&VersionStore::new(fjall_store.clone())), &steps, 0)
        .expect("Failed to migrate");

    // the caller can keep using its keyspace after the walk
    let partition = keyspace
        .open_partition("data_migrations", PartitionCreateOptions::default())
        .expect("Failed to open partition");
    assert!(partition
        .contains_key(encode_version(1))
        .expect("Failed to read partition"));
    assert!(partition
        .contains_key(encode_version(2))
        .expect("Failed to read partition"));
    partition
        .insert("unrelated", "value")
        .expect("Keyspace should still accept writes");

    let other = keyspace
        .open_partition("app_data", PartitionCreateOptions::default())
        .expect("Failed to open a second partition");
    other.insert("k", "v").expect("Failed to write app data");

    drop(other);
    drop(partition);
    drop(fjall_store);
    drop(keyspace);
    let _ = fs::remove_dir_all(&path);
}

#[test]
fn test_borrowed_keyspace_with_custom_partition() {
    let path = random_path();
    let keyspace = fjall::Config::new(&path)
        .open()
        .expect("Failed to open keyspace");

    let fjall_store = FjallVersionStore::from_keyspace(keyspace.clone(), "schema_versions");
    let store = VersionStore::new(fjall_store.clone());
    let steps: MigrationSet = (1..=2)
        .map(|v| MigrationStep::new(v).with_apply(|| Ok(())).with_revert(|| Ok(())))
        .collect();

    migrate(Some(&store), &steps, 0).expect("Failed to migrate");
    assert_eq!(fjall_store.applied_versions().expect("Failed to list"), vec![1, 2]);
    assert!(!keyspace.partition_exists("data_migrations"));

    rollback(Some(&store), &steps, 0).expect("Failed to roll back");
    assert!(fjall_store.applied_versions().expect("Failed to list").is_empty());

    drop(store);
    drop(fjall_store);
    drop(keyspace);
    let _ = fs::remove_dir_all(&path);
}

#[test]
fn test_setup_failure_stops_walk() {
    // no db path configured
    let fjall_store = FjallVersionStore::with_config().build();
    let journal = StepJournal::new();
    let steps = journal.steps(&[1]);

    let err = migrate(Some(&VersionStore::new(fjall_store)), &steps, 0)
        .expect_err("Migrate should fail in setup");

    assert_eq!(err.kind(), &ErrorKind::SetupError);
    assert_eq!(err.cause().map(FurrowError::kind), Some(&ErrorKind::ValidationError));
    assert!(journal.entries().is_empty());
}

#[test]
fn test_negative_and_large_versions() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            let steps = journal.steps(&[i64::MAX, -5, 0, 20240101]);

            migrate(Some(&ctx.version_store()), &steps, 0)?;

            let expected = vec![
                "up-5".to_string(),
                "up0".to_string(),
                "up20240101".to_string(),
                format!("up{}", i64::MAX),
            ];
            assert_eq!(journal.entries(), expected);
            assert_eq!(
                ctx.fjall_store().applied_versions()?,
                vec![-5, 0, 20240101, i64::MAX]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_store_contract_outside_orchestrator() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.fjall_store();
            assert_eq!(
                store.is_pending(1).expect_err("Store is not set up").kind(),
                &ErrorKind::StoreNotInitialized
            );

            store.setup()?;
            store.setup()?;
            assert!(store.is_pending(1)?);
            store.record_applied(1)?;
            store.record_applied(1)?;
            assert!(!store.is_pending(1)?);
            store.record_reverted(1)?;
            assert!(store.is_pending(1)?);
            store.teardown()?;
            Ok(())
        },
        cleanup,
    )
}
