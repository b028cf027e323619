//! Property-based tests for identifier pattern matching

use cachekit::pattern::{compile, compile_all};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_.+-]{1,8}"
}

fn id() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(segment(), 1..5)
}

proptest! {
    #[test]
    fn test_every_id_matches_itself(segments in id()) {
        let id = segments.join(":");
        prop_assert!(compile(&id).unwrap().matches(&id));
    }

    #[test]
    fn test_prefix_matches_descendants(segments in id(), extra in id()) {
        let prefix = segments.join(":");
        let descendant = format!("{}:{}", prefix, extra.join(":"));
        prop_assert!(compile(&prefix).unwrap().matches(&descendant));
    }

    #[test]
    fn test_literal_does_not_match_partial_segment(segments in id(), tail in segment()) {
        let pattern = segments.join(":");
        let longer = format!("{}{}", pattern, tail);
        prop_assert!(!compile(&pattern).unwrap().matches(&longer));
    }

    #[test]
    fn test_star_replaces_exactly_one_segment(segments in id(), index in any::<prop::sample::Index>()) {
        let i = index.index(segments.len());
        let mut pattern_segments = segments.clone();
        pattern_segments[i] = "*".to_string();
        let pattern = compile(&pattern_segments.join(":")).unwrap();
        prop_assert!(pattern.matches(&segments.join(":")));
    }

    #[test]
    fn test_star_stays_within_segment(head in segment(), left in "[a-z]{1,4}", right in "[a-z]{1,4}") {
        let id = format!("{}:{}:{}", head, left, right);
        let single = compile(&format!("{}:{}*{}", head, left, right)).unwrap();
        let double = compile(&format!("{}:{}**{}", head, left, right)).unwrap();
        prop_assert!(!single.matches(&id));
        prop_assert!(double.matches(&id));
    }

    #[test]
    fn test_double_star_matches_any_tail(head in segment(), rest in id()) {
        let pattern = compile(&format!("{}:**", head)).unwrap();
        let full_id = format!("{}:{}", head, rest.join(":"));
        prop_assert!(pattern.matches(&full_id));
    }

    #[test]
    fn test_empty_pattern_set_matches_everything(segments in id()) {
        let set = compile_all(Vec::<String>::new()).unwrap();
        prop_assert!(set.matches(&segments.join(":")));
        prop_assert!(compile("").unwrap().matches(&segments.join(":")));
    }

    #[test]
    fn test_three_or_more_stars_rejected(run in 3usize..8, prefix in segment()) {
        let pattern = format!("{}:{}", prefix, "*".repeat(run));
        prop_assert!(compile(&pattern).is_err());
    }
}
