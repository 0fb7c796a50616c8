//! Tag-set changes reported from an entity to the overlord.

use smallvec::SmallVec;

/// Net change of an entity's tag set since the overlord last looked.
///
/// Recording a tag as added and then as removed (or the reverse) cancels
/// out, so the overlord only ever sees the net difference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDelta {
    pub added: SmallVec<[String; 4]>,
    pub removed: SmallVec<[String; 4]>,
}

impl TagDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn record_added(&mut self, tag: &str) {
        if let Some(pos) = self.removed.iter().position(|t| t == tag) {
            self.removed.remove(pos);
        } else if !self.added.iter().any(|t| t == tag) {
            self.added.push(tag.to_owned());
        }
    }

    pub fn record_removed(&mut self, tag: &str) {
        if let Some(pos) = self.added.iter().position(|t| t == tag) {
            self.added.remove(pos);
        } else if !self.removed.iter().any(|t| t == tag) {
            self.removed.push(tag.to_owned());
        }
    }

    /// Diff between two tag sets.
    pub fn between(old: &[String], new: &[String]) -> Self {
        let mut delta = TagDelta::default();
        for tag in new.iter().filter(|t| !old.contains(t)) {
            delta.added.push(tag.clone());
        }
        for tag in old.iter().filter(|t| !new.contains(t)) {
            delta.removed.push(tag.clone());
        }
        delta
    }

    pub fn merge(&mut self, other: TagDelta) {
        for tag in &other.added {
            self.record_added(tag);
        }
        for tag in &other.removed {
            self.record_removed(tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_then_remove_cancels() {
        let mut delta = TagDelta::default();
        delta.record_added("enemy");
        delta.record_removed("enemy");
        assert!(delta.is_empty());
    }

    #[test]
    fn between_reports_exact_diff() {
        let delta = TagDelta::between(&tags(&["a", "b"]), &tags(&["b", "c"]));
        assert_eq!(delta.added.as_slice(), &["c".to_string()]);
        assert_eq!(delta.removed.as_slice(), &["a".to_string()]);
    }
}
