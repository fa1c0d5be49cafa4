use super::migration::{MigrationStep, Operation, Version};
use super::set::{limited_prefix, MigrationSet};
use crate::errors::{ErrorKind, FurrowError, FurrowResult};
use crate::store::VersionStore;
use std::fmt::{Display, Formatter};

/// Direction of a walk over a [`MigrationSet`].
///
/// The direction decides the step order, which action runs, which pending
/// answer means "skip" and how the version store is updated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending versions, runs `apply`, records versions as applied.
    Forward,
    /// Descending versions, runs `revert`, records versions as reverted.
    Reverse,
}

impl Direction {
    /// Orders the steps of `set` for this direction without touching `set`.
    pub fn order<'a>(&self, set: &'a MigrationSet) -> Vec<&'a MigrationStep> {
        match self {
            Direction::Forward => set.sorted_ascending(),
            Direction::Reverse => set.sorted_descending(),
        }
    }

    /// The action a step contributes to a walk in this direction.
    pub fn operation<'a>(&self, step: &'a MigrationStep) -> Option<&'a dyn Operation> {
        match self {
            Direction::Forward => step.apply(),
            Direction::Reverse => step.revert(),
        }
    }

    /// Whether a step whose pending state is `pending` takes part in the walk.
    ///
    /// Forward walks only act on pending versions, reverse walks only on
    /// versions that are recorded.
    #[inline]
    pub fn acts_on(&self, pending: bool) -> bool {
        match self {
            Direction::Forward => pending,
            Direction::Reverse => !pending,
        }
    }

    fn record(&self, store: &VersionStore, version: Version) -> FurrowResult<()> {
        match self {
            Direction::Forward => store.record_applied(version),
            Direction::Reverse => store.record_reverted(version),
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Direction::Forward => "apply",
            Direction::Reverse => "revert",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "migrate"),
            Direction::Reverse => write!(f, "rollback"),
        }
    }
}

/// Applies pending steps in ascending version order.
///
/// When a store is given, versions it already records are skipped and every
/// successful step is recorded. `limit` caps how many leading steps of the
/// ascending walk are considered; zero means all of them. A skipped step and
/// a step without an apply action still use up one slot of the limit.
///
/// A step with only a revert action is recorded like any other, so a later
/// rollback can run it. A step with no actions at all is passed over and
/// never recorded by a forward walk. Rollback still checks such a step
/// and removes it from the record if it is there.
///
/// The walk stops at the first error, which is returned. Steps completed
/// before the error stay applied and recorded. Once `setup` succeeded,
/// `teardown` runs on every exit path.
///
/// # Examples
///
/// ```rust
/// use furrow::migration::{migrate, MigrationSet, MigrationStep};
/// use furrow::store::memory::InMemoryVersionStore;
/// use furrow::store::VersionStore;
///
/// let record = InMemoryVersionStore::with_versions([1]);
/// let store = VersionStore::new(record.clone());
///
/// let steps = MigrationSet::new()
///     .add_step(MigrationStep::new(1).with_apply(|| panic!("already applied")))
///     .add_step(MigrationStep::new(2).with_apply(|| Ok(())));
///
/// migrate(Some(&store), &steps, 0).unwrap();
/// assert_eq!(record.applied_versions(), vec![1, 2]);
/// ```
pub fn migrate(store: Option<&VersionStore>, steps: &MigrationSet, limit: usize) -> FurrowResult<()> {
    run(store, steps, limit, Direction::Forward)
}

/// Reverts recorded steps in descending version order.
///
/// Mirrors [`migrate`]: versions the store reports as pending are skipped,
/// every successful revert removes its version from the record, and `limit`
/// caps the leading steps of the descending walk.
pub fn rollback(store: Option<&VersionStore>, steps: &MigrationSet, limit: usize) -> FurrowResult<()> {
    run(store, steps, limit, Direction::Reverse)
}

/// Runs every present apply action in ascending version order without
/// consulting or updating any version store.
pub fn sow(steps: &MigrationSet, limit: usize) -> FurrowResult<()> {
    run(None, steps, limit, Direction::Forward)
}

/// Runs every present revert action in descending version order without
/// consulting or updating any version store.
pub fn reap(steps: &MigrationSet, limit: usize) -> FurrowResult<()> {
    run(None, steps, limit, Direction::Reverse)
}

fn run(
    store: Option<&VersionStore>,
    steps: &MigrationSet,
    limit: usize,
    direction: Direction,
) -> FurrowResult<()> {
    match store {
        Some(store) => with_session(store, |store| walk(Some(store), steps, limit, direction)),
        None => walk(None, steps, limit, direction),
    }
}

/// Brackets `body` between `setup` and `teardown` of `store`.
///
/// `teardown` runs whenever `setup` succeeded, including when `body` panics.
/// If both `body` and `teardown` fail, the error of `body` is returned and
/// the teardown error is logged.
fn with_session<F>(store: &VersionStore, body: F) -> FurrowResult<()>
where
    F: FnOnce(&VersionStore) -> FurrowResult<()>,
{
    let session = Session::open(store)?;
    let outcome = body(store);
    let released = session.close();

    match (outcome, released) {
        (Err(err), Err(teardown_err)) => {
            log::error!(
                "Version store teardown failed after an earlier error: {}",
                teardown_err.root_cause()
            );
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), Err(teardown_err)) => {
            log::error!("{}: {}", teardown_err, teardown_err.root_cause());
            Err(teardown_err)
        }
        (Ok(()), Ok(())) => {
            log::debug!("Version store torn down");
            Ok(())
        }
    }
}

/// A set-up version store. Dropping it without [`close`](Session::close)
/// tears the store down, so an unwinding walk still releases it.
struct Session<'a> {
    store: &'a VersionStore,
    open: bool,
}

impl<'a> Session<'a> {
    fn open(store: &'a VersionStore) -> FurrowResult<Self> {
        store.setup().map_err(|err| {
            log::error!("Failed to set up version store: {}", err);
            FurrowError::new_with_cause("Failed to set up version store", ErrorKind::SetupError, err)
        })?;
        log::debug!("Version store set up");
        Ok(Session { store, open: true })
    }

    fn close(mut self) -> FurrowResult<()> {
        self.open = false;
        self.store.teardown().map_err(|err| {
            FurrowError::new_with_cause(
                "Failed to tear down version store",
                ErrorKind::TeardownError,
                err,
            )
        })
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.store.teardown() {
                log::error!("Failed to tear down version store while unwinding: {}", err);
            }
        }
    }
}

fn walk(
    store: Option<&VersionStore>,
    steps: &MigrationSet,
    limit: usize,
    direction: Direction,
) -> FurrowResult<()> {
    let ordered = direction.order(steps);
    let selected = limited_prefix(&ordered, limit);

    let mut performed = 0usize;
    let mut skipped = 0usize;

    for step in selected {
        let version = step.version();

        // forward only, a recorded placeholder can still be rolled back
        if direction == Direction::Forward && step.is_placeholder() {
            log::debug!("Skipping step {}, it has no actions", step);
            skipped += 1;
            continue;
        }

        if let Some(store) = store {
            let pending = store.is_pending(version).map_err(|err| {
                log::error!("Failed to check whether version {} is pending: {}", version, err);
                FurrowError::new_with_cause(
                    &format!("Failed to check whether version {} is pending", version),
                    ErrorKind::PendingCheckError,
                    err,
                )
            })?;

            if !direction.acts_on(pending) {
                log::debug!("Skipping version {}, nothing to {}", version, direction.verb());
                skipped += 1;
                continue;
            }
        }

        if let Some(operation) = direction.operation(step) {
            log::debug!("Running {} for step {}", direction.verb(), step);
            operation.run().map_err(|err| {
                log::error!("Failed to {} version {}: {}", direction.verb(), version, err);
                FurrowError::new_with_cause(
                    &format!("Failed to {} version {}", direction.verb(), version),
                    ErrorKind::StepActionError,
                    err,
                )
            })?;
        }

        if let Some(store) = store {
            direction.record(store, version).map_err(|err| {
                log::error!(
                    "Version {} ran its {} action but could not be recorded: {}",
                    version,
                    direction.verb(),
                    err
                );
                FurrowError::new_with_cause(
                    &format!("Failed to record {} of version {}", direction.verb(), version),
                    ErrorKind::RecordError,
                    err,
                )
            })?;
        }

        performed += 1;
    }

    log::info!(
        "Finished {}: {} steps run, {} skipped, {} beyond the limit",
        direction,
        performed,
        skipped,
        ordered.len() - selected.len()
    );
    Ok(())
}
