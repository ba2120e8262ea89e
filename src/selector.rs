//! Resolves a name fragment typed by the user to exactly one brew.
//!
//! A brew matches when its short name equals the pattern, or when its full
//! identity contains the pattern. Both comparisons ignore case (Unicode folding), and a
//! `.` in the pattern is read as `::` so `patterns.factory` works as well.

use crate::error::{BrewError, BrewResult};
use crate::module::Descriptor;
use crate::registry::{BrewEntry, Registry};

pub fn matches(descriptor: &Descriptor, pattern: &str) -> bool {
    let pattern = normalize(pattern);
    if pattern.is_empty() {
        return false;
    }

    descriptor.short_name().to_lowercase() == pattern
        || descriptor.identity().to_lowercase().contains(&pattern)
}

pub fn select<'a>(registry: &'a Registry, pattern: &str) -> BrewResult<&'a BrewEntry> {
    let found: Vec<&BrewEntry> = registry
        .iter()
        .filter(|entry| matches(entry.descriptor(), pattern))
        .collect();

    match found.as_slice() {
        [] => Err(BrewError::not_found(pattern)),
        [only] => Ok(*only),
        many => Err(BrewError::ambiguous(
            pattern,
            many.iter().map(|entry| entry.identity().to_string()).collect(),
        )),
    }
}

fn normalize(pattern: &str) -> String {
    pattern.trim().to_lowercase().replace('.', "::")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::registry_of;
    use proptest::prelude::*;

    #[test]
    fn test_exact_short_name() {
        let registry = registry_of(&["Factory", "Strategy"]);
        assert_eq!(select(&registry, "Factory").unwrap().identity(), "Factory");
    }

    #[test]
    fn test_case_insensitive_substring() {
        let registry = registry_of(&["Factory"]);
        assert_eq!(select(&registry, "fAC").unwrap().identity(), "Factory");
    }

    #[test]
    fn test_case_folding_covers_non_ascii() {
        let registry = registry_of(&["demos::Café", "demos::Factory"]);
        assert_eq!(select(&registry, "CAFÉ").unwrap().identity(), "demos::Café");
        assert_eq!(select(&registry, "afé").unwrap().identity(), "demos::Café");
    }

    #[test]
    fn test_ambiguous_lists_candidates_in_order() {
        let registry = registry_of(&["Strategy", "Stranger"]);
        match select(&registry, "Str") {
            Err(BrewError::Ambiguous { pattern, candidates }) => {
                assert_eq!(pattern, "Str");
                assert_eq!(candidates, vec!["Stranger", "Strategy"]);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found() {
        let registry = registry_of(&["Factory", "Strategy"]);
        assert!(matches!(
            select(&registry, "NoSuchModule"),
            Err(BrewError::NotFound { pattern }) if pattern == "NoSuchModule"
        ));
    }

    #[test]
    fn test_blank_pattern_matches_nothing() {
        let registry = registry_of(&["Factory"]);
        assert!(matches!(select(&registry, "   "), Err(BrewError::NotFound { .. })));
    }

    #[test]
    fn test_dotted_pattern_matches_path() {
        let registry = registry_of(&[
            "brew::features::cqrs::simple",
            "brew::features::patterns::factory",
        ]);
        let entry = select(&registry, "CQRS.Simple").unwrap();
        assert_eq!(entry.identity(), "brew::features::cqrs::simple");
    }

    #[test]
    fn test_short_name_match_on_qualified_identity() {
        let descriptor = Descriptor::new("brew::features::patterns::singleton", None);
        assert!(matches(&descriptor, "Singleton"));
        assert!(matches(&descriptor, "patterns::single"));
        assert!(!matches(&descriptor, "strategy"));
    }

    proptest! {
        #[test]
        fn test_selection_agrees_with_match_count(
            names in prop::collection::btree_set("[a-c]{1,4}", 1..8),
            pattern in "[a-cA-C]{1,3}",
        ) {
            let identities: Vec<&str> = names.iter().map(String::as_str).collect();
            let registry = registry_of(&identities);
            let needle = pattern.to_ascii_lowercase();
            let expected: Vec<&str> = identities
                .iter()
                .copied()
                .filter(|name| name.contains(needle.as_str()))
                .collect();

            match select(&registry, &pattern) {
                Ok(entry) => {
                    prop_assert_eq!(expected.len(), 1);
                    prop_assert_eq!(entry.identity(), expected[0]);
                }
                Err(BrewError::NotFound { .. }) => prop_assert!(expected.is_empty()),
                Err(BrewError::Ambiguous { candidates, .. }) => {
                    prop_assert!(expected.len() >= 2);
                    prop_assert_eq!(candidates, expected.iter().map(|s| s.to_string()).collect::<Vec<_>>());
                }
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }
    }
}
