use super::migration::{MigrationStep, Version};
use itertools::Itertools;

/// An unordered collection of [`MigrationStep`]s.
///
/// Steps can be added in any order. Every walk asks for a fresh ordered view
/// through [`sorted_ascending`](Self::sorted_ascending) or
/// [`sorted_descending`](Self::sorted_descending); the collection itself is
/// never reordered.
///
/// Version uniqueness is the caller's responsibility.
///
/// # Usage
/// ```rust
/// use furrow::migration::{MigrationSet, MigrationStep};
///
/// let set = MigrationSet::new()
///     .add_step(MigrationStep::new(3))
///     .add_step(MigrationStep::new(1))
///     .add_step(MigrationStep::new(2));
///
/// let ascending: Vec<i64> = set.sorted_ascending().iter().map(|s| s.version()).collect();
/// assert_eq!(ascending, vec![1, 2, 3]);
/// assert_eq!(set.versions(), vec![3, 1, 2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    steps: Vec<MigrationStep>,
}

impl MigrationSet {
    pub fn new() -> Self {
        MigrationSet { steps: Vec::new() }
    }

    /// Adds a step, returning the set for chaining.
    pub fn add_step(mut self, step: MigrationStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: MigrationStep) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The steps in insertion order.
    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// The versions in insertion order.
    pub fn versions(&self) -> Vec<Version> {
        self.steps.iter().map(MigrationStep::version).collect()
    }

    /// Returns a new view of the steps ordered by ascending version.
    pub fn sorted_ascending(&self) -> Vec<&MigrationStep> {
        self.steps
            .iter()
            .sorted_by_key(|step| step.version())
            .collect()
    }

    /// Returns a new view of the steps ordered by descending version.
    pub fn sorted_descending(&self) -> Vec<&MigrationStep> {
        self.steps
            .iter()
            .sorted_by(|a, b| b.version().cmp(&a.version()))
            .collect()
    }
}

impl From<Vec<MigrationStep>> for MigrationSet {
    fn from(steps: Vec<MigrationStep>) -> Self {
        MigrationSet { steps }
    }
}

impl FromIterator<MigrationStep> for MigrationSet {
    fn from_iter<I: IntoIterator<Item = MigrationStep>>(iter: I) -> Self {
        MigrationSet {
            steps: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MigrationSet {
    type Item = &'a MigrationStep;
    type IntoIter = std::slice::Iter<'a, MigrationStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Returns the first `limit` elements of an already ordered walk.
///
/// A `limit` of zero means no bound and returns the whole walk. A `limit`
/// larger than the walk is clamped to its length.
pub fn limited_prefix<T>(ordered: &[T], limit: usize) -> &[T] {
    if limit == 0 {
        return ordered;
    }
    if limit > ordered.len() {
        log::debug!(
            "Limit {} exceeds the {} available steps, processing all of them",
            limit,
            ordered.len()
        );
    }
    &ordered[..limit.min(ordered.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(versions: &[Version]) -> MigrationSet {
        versions.iter().map(|v| MigrationStep::new(*v)).collect()
    }

    fn versions_of(steps: &[&MigrationStep]) -> Vec<Version> {
        steps.iter().map(|s| s.version()).collect()
    }

    #[test]
    fn test_sorted_ascending() {
        let set = set_of(&[5, -2, 9, 0]);
        assert_eq!(versions_of(&set.sorted_ascending()), vec![-2, 0, 5, 9]);
    }

    #[test]
    fn test_sorted_descending() {
        let set = set_of(&[5, -2, 9, 0]);
        assert_eq!(versions_of(&set.sorted_descending()), vec![9, 5, 0, -2]);
    }

    #[test]
    fn test_sorting_leaves_collection_untouched() {
        let set = set_of(&[3, 1, 2]);
        let _ = set.sorted_ascending();
        let _ = set.sorted_descending();
        assert_eq!(set.versions(), vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_set() {
        let set = MigrationSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(set.sorted_ascending().is_empty());
        assert!(set.sorted_descending().is_empty());
    }

    #[test]
    fn test_add_step_and_push() {
        let mut set = MigrationSet::new().add_step(MigrationStep::new(1));
        set.push(MigrationStep::new(2));
        assert_eq!(set.len(), 2);
        assert_eq!(set.steps()[1].version(), 2);
    }

    #[test]
    fn test_from_vec_and_into_iter() {
        let set = MigrationSet::from(vec![MigrationStep::new(4), MigrationStep::new(8)]);
        let collected: Vec<Version> = (&set).into_iter().map(|s| s.version()).collect();
        assert_eq!(collected, vec![4, 8]);
    }

    #[test]
    fn test_limited_prefix_zero_is_unbounded() {
        let walk = [1, 2, 3];
        assert_eq!(limited_prefix(&walk, 0), &[1, 2, 3]);
    }

    #[test]
    fn test_limited_prefix_within_bounds() {
        let walk = [1, 2, 3];
        assert_eq!(limited_prefix(&walk, 1), &[1]);
        assert_eq!(limited_prefix(&walk, 2), &[1, 2]);
    }

    #[test]
    fn test_limited_prefix_at_and_past_length() {
        let walk = [1, 2, 3];
        assert_eq!(limited_prefix(&walk, 3), &[1, 2, 3]);
        assert_eq!(limited_prefix(&walk, 10), &[1, 2, 3]);
    }

    #[test]
    fn test_limited_prefix_on_empty_walk() {
        let walk: [Version; 0] = [];
        assert!(limited_prefix(&walk, 0).is_empty());
        assert!(limited_prefix(&walk, 4).is_empty());
    }

    #[test]
    fn test_limited_prefix_follows_walk_direction() {
        let set = set_of(&[1, 2, 3]);
        let descending = set.sorted_descending();
        assert_eq!(versions_of(limited_prefix(&descending, 2)), vec![3, 2]);
    }
}
