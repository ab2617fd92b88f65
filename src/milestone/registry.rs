//! Ordered set of milestones
//!
//! Membership is decided by identifier. Evaluation visits milestones in the
//! order they were added.

use tracing::debug;

use super::Milestone;

#[derive(Debug, Clone, Default)]
pub struct MilestoneRegistry {
    milestones: Vec<Milestone>,
}

impl MilestoneRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in voice and banner milestones when
    /// `defaults_enabled`, empty otherwise.
    pub fn with_defaults(defaults_enabled: bool) -> Self {
        let mut registry = Self::new();
        if defaults_enabled {
            registry.add(Milestone::default_voice());
            registry.add(Milestone::default_banner());
        }
        registry
    }

    /// Append a milestone unless one with the same identifier is present.
    ///
    /// Returns `true` when the milestone was added.
    pub fn add(&mut self, milestone: Milestone) -> bool {
        if self.milestones.contains(&milestone) {
            return false;
        }
        debug!(
            identifier = milestone.identifier(),
            kind = milestone.kind(),
            "Milestone added"
        );
        self.milestones.push(milestone);
        true
    }

    /// Add each milestone in order; duplicates collapse to one membership.
    ///
    /// Returns how many were added.
    pub fn add_all(&mut self, milestones: impl IntoIterator<Item = Milestone>) -> usize {
        milestones
            .into_iter()
            .map(|m| self.add(m))
            .filter(|added| *added)
            .count()
    }

    /// Remove the matching milestone, or every milestone for `None`.
    pub fn remove(&mut self, milestone: Option<&Milestone>) {
        match milestone {
            Some(m) => {
                self.remove_by_id(m.identifier());
            }
            None => self.clear(),
        }
    }

    /// Returns `true` when a milestone was removed.
    pub fn remove_by_id(&mut self, identifier: i64) -> bool {
        let before = self.milestones.len();
        self.milestones.retain(|m| m.identifier() != identifier);
        self.milestones.len() != before
    }

    pub fn clear(&mut self) {
        self.milestones.clear();
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    pub fn contains_id(&self, identifier: i64) -> bool {
        self.milestones.iter().any(|m| m.identifier() == identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones.iter()
    }

    /// Milestones in evaluation order, for the processor.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Milestone> {
        self.milestones.iter_mut()
    }

    /// Copy of the current membership, in evaluation order.
    pub fn snapshot(&self) -> Vec<Milestone> {
        self.milestones.clone()
    }

    /// Forget per-route firing state. Membership is kept.
    pub fn reset(&mut self) {
        self.milestones.iter_mut().for_each(Milestone::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_voice_then_banner() {
        let registry = MilestoneRegistry::with_defaults(true);
        let ids: Vec<i64> = registry.iter().map(Milestone::identifier).collect();
        assert_eq!(ids, vec![-1, -2]);
        assert!(MilestoneRegistry::with_defaults(false).is_empty());
    }

    #[test]
    fn add_is_idempotent() {
        let mut registry = MilestoneRegistry::new();
        assert!(registry.add(Milestone::step(5)));
        assert!(!registry.add(Milestone::step(5)));
        assert!(!registry.add(Milestone::voice(5)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn add_all_collapses_duplicates_and_keeps_order() {
        let mut registry = MilestoneRegistry::new();
        registry.add(Milestone::step(2));
        let added = registry.add_all(vec![
            Milestone::step(3),
            Milestone::step(2),
            Milestone::banner(4),
            Milestone::step(3),
        ]);
        assert_eq!(added, 2);
        let ids: Vec<i64> = registry.iter().map(Milestone::identifier).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn remove_variants() {
        let mut registry = MilestoneRegistry::with_defaults(true);
        registry.add(Milestone::step(1));

        registry.remove(Some(&Milestone::step(1)));
        assert_eq!(registry.len(), 2);

        assert!(!registry.remove_by_id(42));
        assert!(registry.remove_by_id(-1));
        assert!(!registry.contains_id(-1));
        assert!(registry.contains_id(-2));

        registry.remove(None);
        assert!(registry.is_empty());
    }
}
