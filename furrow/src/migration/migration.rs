use crate::errors::FurrowResult;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Identifier of a migration step. Versions are totally ordered and must be
/// unique within one [`MigrationSet`](super::MigrationSet).
pub type Version = i64;

/// A single unit of user work run while applying or reverting a step.
///
/// Any `Fn() -> FurrowResult<()>` closure is an `Operation`; implement the
/// trait directly for operations that carry their own state and attach them
/// with [`MigrationStep::with_apply_operation`].
///
/// # Examples
///
/// ```rust
/// use furrow::errors::FurrowResult;
/// use furrow::migration::Operation;
///
/// struct CreateIndex {
///     name: &'static str,
/// }
///
/// impl Operation for CreateIndex {
///     fn run(&self) -> FurrowResult<()> {
///         println!("creating index {}", self.name);
///         Ok(())
///     }
/// }
///
/// let op = CreateIndex { name: "users_email" };
/// assert!(op.run().is_ok());
/// ```
pub trait Operation: Send + Sync {
    fn run(&self) -> FurrowResult<()>;
}

impl<F> Operation for F
where
    F: Fn() -> FurrowResult<()> + Send + Sync,
{
    #[inline]
    fn run(&self) -> FurrowResult<()> {
        self()
    }
}

/// One versioned unit of forward (apply) and optional backward (revert) work.
///
/// # Characteristics
/// - Immutable once built: the orchestrator only reads it
/// - Clone-able: clones share the same operation handles via `Arc`
/// - Either action may be absent; an absent action is a no-op for its direction
///
/// # Usage
/// ```rust
/// use furrow::migration::MigrationStep;
///
/// let step = MigrationStep::new(20240101)
///     .with_apply(|| Ok(()))
///     .with_revert(|| Ok(()));
///
/// assert_eq!(step.version(), 20240101);
/// assert!(step.has_apply() && step.has_revert());
/// ```
#[derive(Clone)]
pub struct MigrationStep {
    version: Version,
    apply: Option<Arc<dyn Operation>>,
    revert: Option<Arc<dyn Operation>>,
}

impl MigrationStep {
    /// Creates a step with no actions; add them with [`with_apply`](Self::with_apply)
    /// and [`with_revert`](Self::with_revert).
    pub fn new(version: Version) -> Self {
        MigrationStep {
            version,
            apply: None,
            revert: None,
        }
    }

    /// Sets the closure run when this step is applied.
    pub fn with_apply<F>(self, apply: F) -> Self
    where
        F: Fn() -> FurrowResult<()> + Send + Sync + 'static,
    {
        self.with_apply_operation(apply)
    }

    /// Sets the closure run when this step is reverted.
    pub fn with_revert<F>(self, revert: F) -> Self
    where
        F: Fn() -> FurrowResult<()> + Send + Sync + 'static,
    {
        self.with_revert_operation(revert)
    }

    /// Sets the [`Operation`] run when this step is applied.
    pub fn with_apply_operation(mut self, operation: impl Operation + 'static) -> Self {
        self.apply = Some(Arc::new(operation));
        self
    }

    /// Sets the [`Operation`] run when this step is reverted.
    pub fn with_revert_operation(mut self, operation: impl Operation + 'static) -> Self {
        self.revert = Some(Arc::new(operation));
        self
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn apply(&self) -> Option<&dyn Operation> {
        self.apply.as_deref()
    }

    #[inline]
    pub fn revert(&self) -> Option<&dyn Operation> {
        self.revert.as_deref()
    }

    #[inline]
    pub fn has_apply(&self) -> bool {
        self.apply.is_some()
    }

    #[inline]
    pub fn has_revert(&self) -> bool {
        self.revert.is_some()
    }

    /// A step with neither action only reserves its version. Forward walks
    /// pass over it without touching the version store.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.apply.is_none() && self.revert.is_none()
    }
}

impl Debug for MigrationStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationStep")
            .field("version", &self.version)
            .field("apply", &self.has_apply())
            .field("revert", &self.has_revert())
            .finish()
    }
}

impl Display for MigrationStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.version)
    }
}
