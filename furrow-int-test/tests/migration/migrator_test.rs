use furrow::errors::ErrorKind;
use furrow::migration::MigrationSet;
use furrow::migrator::Migrator;
use furrow::store::memory::InMemoryVersionStore;
use furrow_int_test::test_util::{cleanup, create_test_context, failing_step, run_test, StepJournal};

#[test]
fn test_migrator_with_fjall_store() {
    run_test(
        create_test_context,
        |ctx| {
            let migrator = Migrator::builder()
                .version_store(ctx.fjall_store())
                .build();
            let journal = StepJournal::new();
            let steps = journal.steps(&[1, 2, 3]);

            migrator.migrate(&steps)?;
            migrator.rollback(&steps)?;

            assert_eq!(
                journal.entries(),
                vec!["up1", "up2", "up3", "down3", "down2", "down1"]
            );
            assert!(ctx.fjall_store().applied_versions()?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_migrator_limit_advances_one_version_per_run() {
    run_test(
        create_test_context,
        |ctx| {
            let migrator = Migrator::builder()
                .version_store(ctx.version_store())
                .limit(1)
                .build();
            let journal = StepJournal::new();
            let steps = journal.steps(&[1, 2]);

            migrator.migrate(&steps)?;
            assert_eq!(ctx.fjall_store().applied_versions()?, vec![1]);

            // the limit always covers the lowest version, which is now recorded
            migrator.migrate(&steps)?;
            assert_eq!(journal.entries(), vec!["up1"]);

            let unbounded = Migrator::builder()
                .version_store(ctx.version_store())
                .build();
            unbounded.migrate(&steps)?;
            assert_eq!(journal.entries(), vec!["up1", "up2"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_migrator_with_in_memory_store() {
    let record = InMemoryVersionStore::with_versions([1]);
    let migrator = Migrator::builder().version_store(record.clone()).build();
    let journal = StepJournal::new();
    let steps = journal.steps(&[1, 2, 3]);

    migrator.migrate(&steps).expect("Failed to migrate");

    assert_eq!(journal.entries(), vec!["up2", "up3"]);
    assert_eq!(record.applied_versions(), vec![1, 2, 3]);
    assert!(!record.is_open());
}

#[test]
fn test_migrator_surfaces_step_failure() {
    let record = InMemoryVersionStore::new();
    let migrator = Migrator::builder().version_store(record.clone()).build();
    let journal = StepJournal::new();
    let steps = MigrationSet::new()
        .add_step(journal.step(1))
        .add_step(failing_step(2, "broken step"));

    let err = migrator.migrate(&steps).expect_err("Migrate should fail");

    assert_eq!(err.kind(), &ErrorKind::StepActionError);
    assert_eq!(record.applied_versions(), vec![1]);
    assert!(!record.is_open());
}

#[test]
fn test_migrator_sow_and_reap_ignore_store() {
    let record = InMemoryVersionStore::with_versions([1, 2]);
    let migrator = Migrator::builder()
        .version_store(record.clone())
        .limit(1)
        .build();
    let journal = StepJournal::new();
    let steps = journal.steps(&[1, 2]);

    migrator.sow(&steps).expect("Failed to sow");
    migrator.reap(&steps).expect("Failed to reap");

    assert_eq!(journal.entries(), vec!["up1", "down2"]);
    assert_eq!(record.applied_versions(), vec![1, 2]);
}
