/// Default name of the collection that records applied versions.
pub const VERSION_RECORD_NAME: &str = "data_migrations";

/// A limit of zero places no bound on how many steps a walk processes.
pub const UNBOUNDED: usize = 0;
