//! Sibling-name collision avoidance for copy, move and save-as.

use std::collections::HashSet;

const COPY_SUFFIX: &str = "_copy_";

/// Returns `desired` when no sibling uses it, otherwise `"{desired}_copy_{n}"`
/// for the smallest `n >= 1` that is free.
pub fn resolve_unique_name(desired: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(desired) {
        return desired.to_string();
    }

    let mut n: u64 = 1;
    loop {
        let candidate = format!("{desired}{COPY_SUFFIX}{n}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Sibling names for one destination, updated as a batch hands out names.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: HashSet<String>,
}

impl NameRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Resolution without reserving; repeated calls agree until `claim`.
    pub fn peek(&self, desired: &str) -> String {
        resolve_unique_name(desired, &self.names)
    }

    /// Resolves `desired` and reserves the result for the rest of the batch.
    pub fn claim(&mut self, desired: &str) -> String {
        let name = resolve_unique_name(desired, &self.names);
        self.names.insert(name.clone());
        name
    }

    /// Gives back a name whose request failed so later nodes may use it.
    pub fn release(&mut self, name: &str) {
        self.names.remove(name);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_free_name() {
        assert_eq!(resolve_unique_name("Pumps", &set(&["Valves"])), "Pumps");
    }

    #[test]
    fn appends_smallest_free_suffix() {
        let existing = set(&["Pumps", "Pumps_copy_1", "Pumps_copy_3"]);
        assert_eq!(resolve_unique_name("Pumps", &existing), "Pumps_copy_2");
    }

    #[test]
    fn result_is_never_in_the_sibling_set() {
        let mut existing = set(&["a"]);
        for _ in 0..50 {
            let name = resolve_unique_name("a", &existing);
            assert!(!existing.contains(&name));
            existing.insert(name);
        }
    }

    #[test]
    fn resolution_is_idempotent_for_unchanged_set() {
        let existing = set(&["Cameras", "Cameras_copy_1"]);
        let first = resolve_unique_name("Cameras", &existing);
        let second = resolve_unique_name("Cameras", &existing);
        assert_eq!(first, second);
        assert_eq!(first, "Cameras_copy_2");
    }

    #[test]
    fn registry_never_hands_out_a_name_twice() {
        let mut registry = NameRegistry::new(["Lenses"]);
        assert_eq!(registry.peek("Lenses"), registry.peek("Lenses"));
        assert_eq!(registry.claim("Lenses"), "Lenses_copy_1");
        assert_eq!(registry.claim("Lenses"), "Lenses_copy_2");
        assert_eq!(registry.claim("Mirrors"), "Mirrors");
        assert_eq!(registry.claim("Mirrors"), "Mirrors_copy_1");
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn released_names_become_available_again() {
        let mut registry = NameRegistry::new(["Lenses"]);
        let claimed = registry.claim("Lenses");
        registry.release(&claimed);
        assert_eq!(registry.claim("Lenses"), claimed);
    }
}
