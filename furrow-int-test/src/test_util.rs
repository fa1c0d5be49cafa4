use furrow::errors::{ErrorKind, FurrowError, FurrowResult};
use furrow::migration::{MigrationSet, MigrationStep, Version};
use furrow::store::VersionStore;
use furrow_fjall_adapter::FjallVersionStore;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use std::{env, fs, thread};

/// Runs a test with retry logic and error handling.
///
/// `before` builds a fresh context for every attempt, so a retried test
/// never sees the state of a failed one. `after` runs even when `test`
/// returned an error.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> FurrowResult<()> + std::panic::RefUnwindSafe,
    B: Fn() -> FurrowResult<TestContext> + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> FurrowResult<()> + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| -> Result<(), String> {
            let ctx = before().map_err(|e| format!("Before run failed: {:?}", e))?;
            match test(ctx.clone()) {
                Ok(()) => after(ctx).map_err(|e| format!("After run failed: {:?}", e)),
                Err(e) => {
                    let _ = after(ctx);
                    Err(format!("Test failed: {:?}", e))
                }
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => {
                if attempt < MAX_RETRIES {
                    eprintln!(
                        "Test attempt {}/{} failed after {:?}: {}",
                        attempt, MAX_RETRIES, elapsed, e
                    );
                    thread::sleep(Duration::from_millis(100 * attempt as u64));
                }
                last_error = Some(e);
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                // assertion failures are deterministic, retrying them hides nothing
                panic!("Test panicked: {}", err_msg);
            }
        }
    }

    panic!(
        "Test failed after {} attempts: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

/// A temporary directory plus an owning fjall version store rooted in it.
#[derive(Clone)]
pub struct TestContext {
    path: String,
    store: FjallVersionStore,
}

impl TestContext {
    pub fn new(path: String, store: FjallVersionStore) -> Self {
        Self { path, store }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The concrete store, for inspecting the record.
    pub fn fjall_store(&self) -> FjallVersionStore {
        self.store.clone()
    }

    /// The store as the orchestrator sees it.
    pub fn version_store(&self) -> VersionStore {
        VersionStore::new(self.store.clone())
    }

    /// A second store over the same directory, as a later process would open it.
    pub fn reopen(&self) -> FjallVersionStore {
        fjall_store_at(&self.path)
    }
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    env::temp_dir()
        .join("furrow-test")
        .join(id.to_string())
        .to_string_lossy()
        .to_string()
}

/// Builds an owning store with the low memory preset to keep thread count down.
pub fn fjall_store_at(path: &str) -> FjallVersionStore {
    FjallVersionStore::with_config()
        .low_memory_preset()
        .db_path(path)
        .build()
}

pub fn create_test_context() -> FurrowResult<TestContext> {
    let path = random_path();
    if std::path::Path::new(&path).exists() {
        fs::remove_dir_all(&path)?;
    }
    Ok(TestContext::new(path.clone(), fjall_store_at(&path)))
}

pub fn cleanup(ctx: TestContext) -> FurrowResult<()> {
    let path = ctx.path().to_string();
    // release the keyspace before deleting its files
    drop(ctx);

    let mut retry = 0;
    while let Err(err) = fs::remove_dir_all(&path) {
        if err.kind() == std::io::ErrorKind::NotFound {
            break;
        }
        if retry >= 2 {
            return Err(err.into());
        }
        thread::sleep(Duration::from_millis(100));
        retry += 1;
    }
    Ok(())
}

/// Collects the order in which step actions run.
#[derive(Clone, Default)]
pub struct StepJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl StepJournal {
    pub fn new() -> Self {
        StepJournal::default()
    }

    /// A step whose actions log `up{version}` and `down{version}`.
    pub fn step(&self, version: Version) -> MigrationStep {
        let up = self.entries.clone();
        let down = self.entries.clone();
        MigrationStep::new(version)
            .with_apply(move || {
                up.lock().push(format!("up{}", version));
                Ok(())
            })
            .with_revert(move || {
                down.lock().push(format!("down{}", version));
                Ok(())
            })
    }

    /// A set of journaled steps, in the given insertion order.
    pub fn steps(&self, versions: &[Version]) -> MigrationSet {
        versions.iter().map(|v| self.step(*v)).collect()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear()
    }
}

/// A step whose apply and revert both fail with `message`.
pub fn failing_step(version: Version, message: &'static str) -> MigrationStep {
    MigrationStep::new(version)
        .with_apply(move || Err(FurrowError::new(message, ErrorKind::InternalError)))
        .with_revert(move || Err(FurrowError::new(message, ErrorKind::InternalError)))
}
