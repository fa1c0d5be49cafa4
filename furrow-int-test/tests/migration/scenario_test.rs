use furrow::errors::ErrorKind;
use furrow::migration::{migrate, reap, rollback, sow, MigrationSet, MigrationStep};
use furrow::store::VersionStoreProvider;
use furrow_int_test::test_util::{
    cleanup, create_test_context, failing_step, run_test, StepJournal,
};

// ==================== Unvalidated Walks ====================

#[test]
fn test_sow_runs_apply_actions_in_order() {
    let journal = StepJournal::new();
    let steps = MigrationSet::new()
        .add_step(journal.step(2))
        .add_step(MigrationStep::new(3))
        .add_step(journal.step(1));

    sow(&steps, 0).expect("Failed to sow");
    assert_eq!(journal.entries(), vec!["up1", "up2"]);
}

#[test]
fn test_reap_with_limit_runs_highest_versions() {
    let journal = StepJournal::new();
    let steps = journal.steps(&[1, 2, 3]);

    reap(&steps, 2).expect("Failed to reap");
    assert_eq!(journal.entries(), vec!["down3", "down2"]);
}

// ==================== Tracked Walks on Fjall ====================

#[test]
fn test_migrate_records_applied_versions() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            let steps = MigrationSet::new()
                .add_step(journal.step(1))
                .add_step(journal.step(2))
                .add_step(MigrationStep::new(3));

            migrate(Some(&ctx.version_store()), &steps, 0)?;

            assert_eq!(journal.entries(), vec!["up1", "up2"]);
            assert_eq!(ctx.fjall_store().applied_versions()?, vec![1, 2]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_migrate_skips_versions_already_recorded() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.fjall_store();
            store.setup()?;
            store.record_applied(1)?;
            store.teardown()?;

            let journal = StepJournal::new();
            let steps = journal.steps(&[1, 2]);
            migrate(Some(&ctx.version_store()), &steps, 0)?;

            assert_eq!(journal.entries(), vec!["up2"]);
            assert_eq!(store.applied_versions()?, vec![1, 2]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_migrate_limit_considers_first_version_only() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            let steps = journal.steps(&[3, 1, 2]);

            migrate(Some(&ctx.version_store()), &steps, 1)?;

            assert_eq!(journal.entries(), vec!["up1"]);
            assert_eq!(ctx.fjall_store().applied_versions()?, vec![1]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_failed_step_keeps_earlier_progress() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            let steps = MigrationSet::new()
                .add_step(journal.step(1))
                .add_step(failing_step(2, "migration error"))
                .add_step(journal.step(3));

            let err = migrate(Some(&ctx.version_store()), &steps, 0)
                .expect_err("Migrate should fail on version 2");

            assert_eq!(err.kind(), &ErrorKind::StepActionError);
            assert_eq!(err.root_cause().message(), "migration error");
            assert_eq!(journal.entries(), vec!["up1"]);

            let store = ctx.fjall_store();
            // teardown ran, so the keyspace was released
            assert!(!store.is_open());
            assert_eq!(store.applied_versions()?, vec![1]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_resume_after_fixing_failed_step() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            let broken = MigrationSet::new()
                .add_step(journal.step(1))
                .add_step(failing_step(2, "migration error"));
            assert!(migrate(Some(&ctx.version_store()), &broken, 0).is_err());

            let fixed = journal.steps(&[1, 2]);
            migrate(Some(&ctx.version_store()), &fixed, 0)?;

            assert_eq!(journal.entries(), vec!["up1", "up2"]);
            assert_eq!(ctx.fjall_store().applied_versions()?, vec![1, 2]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_migrate_twice_is_idempotent() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            let steps = journal.steps(&[1, 2, 3]);

            migrate(Some(&ctx.version_store()), &steps, 0)?;
            migrate(Some(&ctx.version_store()), &steps, 0)?;

            assert_eq!(journal.entries(), vec!["up1", "up2", "up3"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_migrate_then_rollback_empties_record() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            let steps = journal.steps(&[2, 3, 1]);

            migrate(Some(&ctx.version_store()), &steps, 0)?;
            rollback(Some(&ctx.version_store()), &steps, 0)?;

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
fn test_rollback_with_limit_reverts_newest_first() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            let steps = journal.steps(&[1, 2, 3]);
            migrate(Some(&ctx.version_store()), &steps, 0)?;
            journal.clear();

            rollback(Some(&ctx.version_store()), &steps, 2)?;

            assert_eq!(journal.entries(), vec!["down3", "down2"]);
            assert_eq!(ctx.fjall_store().applied_versions()?, vec![1]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_rollback_skips_pending_versions() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            migrate(Some(&ctx.version_store()), &journal.steps(&[1]), 0)?;
            journal.clear();

            rollback(Some(&ctx.version_store()), &journal.steps(&[1, 2]), 0)?;

            assert_eq!(journal.entries(), vec!["down1"]);
            assert!(ctx.fjall_store().applied_versions()?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_record_survives_reopen() {
    run_test(
        create_test_context,
        |ctx| {
            let journal = StepJournal::new();
            let steps = journal.steps(&[10, 20]);
            migrate(Some(&ctx.version_store()), &steps, 0)?;

            let reopened = ctx.reopen();
            assert_eq!(reopened.applied_versions()?, vec![10, 20]);

            journal.clear();
            let store = furrow::store::VersionStore::new(reopened);
            migrate(Some(&store), &steps, 0)?;
            assert!(journal.entries().is_empty());
            Ok(())
        },
        cleanup,
    )
}
