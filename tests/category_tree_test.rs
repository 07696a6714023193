use std::collections::HashSet;

use catalog_admin::catalog::{
    count_descendants, find_by_id, flatten, is_descendant_of, reparent_candidates, search,
    ExpandedKeys,
};
use catalog_admin::models::Category;
use proptest::prelude::*;

fn cat(id: &str, name: &str, children: Vec<Category>) -> Category {
    Category {
        children: (!children.is_empty()).then_some(children),
        ..Category::new(id, name)
    }
}

/// Root > Mid > Leaf plus an unrelated sibling root.
fn three_level_forest() -> Vec<Category> {
    vec![
        cat(
            "root",
            "Apparel",
            vec![cat(
                "mid",
                "Shoes",
                vec![cat("leaf", "Trail Runners", vec![])],
            )],
        ),
        cat("other", "Garden", vec![]),
    ]
}

#[test]
fn flatten_emits_preorder_rows_with_levels() {
    let forest = three_level_forest();
    let mut expanded = ExpandedKeys::new();
    expanded.expand_all(&forest);

    let rows = flatten(&forest, &expanded);
    let summary: Vec<_> = rows
        .iter()
        .map(|row| (row.id, row.level, row.parent_key))
        .collect();
    assert_eq!(
        summary,
        [
            ("root", 0, None),
            ("mid", 1, Some("root")),
            ("leaf", 2, Some("mid")),
            ("other", 0, None),
        ]
    );
    assert!(rows[0].has_children);
    assert!(!rows[0].is_leaf);
    assert!(rows[2].is_leaf);
}

#[test]
fn flatten_skips_children_of_collapsed_nodes() {
    let forest = three_level_forest();
    // Initial load expands roots only.
    let expanded = ExpandedKeys::for_initial_load(&forest);

    let ids: Vec<_> = flatten(&forest, &expanded).iter().map(|r| r.id).collect();
    assert_eq!(ids, ["root", "mid", "other"]);
}

#[test]
fn flatten_is_idempotent_for_fixed_state() {
    let forest = three_level_forest();
    let expanded = ExpandedKeys::for_initial_load(&forest);

    assert_eq!(flatten(&forest, &expanded), flatten(&forest, &expanded));
}

#[test]
fn flatten_terminates_on_self_referencing_ids() {
    // Malformed backend payload: "root" appears again inside its own subtree.
    let forest = vec![cat(
        "root",
        "Apparel",
        vec![cat("mid", "Shoes", vec![cat("root", "Apparel again", vec![])])],
    )];
    let mut expanded = ExpandedKeys::new();
    expanded.expand_all(&forest);

    let rows = flatten(&forest, &expanded);
    let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, ["root", "mid"]);
}

#[test]
fn search_includes_ancestors_of_matches() {
    let forest = three_level_forest();
    let ids: Vec<_> = search(&forest, "trail").iter().map(|r| r.id).collect();
    assert_eq!(ids, ["root", "mid", "leaf"]);
}

#[test]
fn search_is_case_insensitive() {
    let forest = three_level_forest();
    let ids: Vec<_> = search(&forest, "SHOES").iter().map(|r| r.id).collect();
    assert_eq!(ids, ["root", "mid"]);
}

#[test]
fn search_without_matches_is_empty() {
    let forest = three_level_forest();
    assert!(search(&forest, "no such category").is_empty());
}

#[test]
fn search_with_empty_query_flattens_everything() {
    let forest = three_level_forest();
    let ids: Vec<_> = search(&forest, "").iter().map(|r| r.id).collect();
    assert_eq!(ids, ["root", "mid", "leaf", "other"]);
}

#[test]
fn search_reaches_matches_below_non_matching_nodes() {
    // "Apparel" matches at the root; "mid" does not match but still carries
    // a matching descendant, so all three surface.
    let forest = three_level_forest();
    let ids: Vec<_> = search(&forest, "a").iter().map(|r| r.id).collect();
    assert!(ids.contains(&"root"));
    assert!(ids.contains(&"leaf"));
    assert!(ids.contains(&"mid"));
}

#[test]
fn count_descendants_ignores_repeated_ids() {
    let forest = three_level_forest();
    let root = find_by_id(&forest, "root").expect("root exists");
    assert_eq!(count_descendants(root), 2);

    let leaf = find_by_id(&forest, "leaf").expect("leaf exists");
    assert_eq!(count_descendants(leaf), 0);

    let looped = cat(
        "a",
        "A",
        vec![cat("b", "B", vec![cat("a", "A again", vec![])])],
    );
    assert_eq!(count_descendants(&looped), 1);
}

#[test]
fn descendant_checks_are_directional() {
    let forest = three_level_forest();
    assert!(is_descendant_of("mid", "root", &forest));
    assert!(is_descendant_of("leaf", "root", &forest));
    assert!(!is_descendant_of("root", "mid", &forest));
    assert!(!is_descendant_of("other", "root", &forest));
    // Unknown ancestor cannot confirm anything.
    assert!(!is_descendant_of("mid", "missing", &forest));
    // A node is not its own descendant.
    assert!(!is_descendant_of("root", "root", &forest));
}

#[test]
fn reparent_candidates_prevent_cycles() {
    let forest = three_level_forest();
    let ids: Vec<_> = reparent_candidates(&forest, "mid")
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, ["root", "other"]);
}

#[test]
fn expanded_keys_lifecycle() {
    let forest = three_level_forest();

    let mut expanded = ExpandedKeys::for_initial_load(&forest);
    assert!(expanded.contains("root"));
    assert!(expanded.contains("other"));
    assert!(!expanded.contains("mid"));

    expanded.toggle("mid");
    assert!(expanded.contains("mid"));
    expanded.toggle("mid");
    assert!(!expanded.contains("mid"));

    expanded.expand_all(&forest);
    assert_eq!(expanded.len(), 4);

    expanded.collapse_all();
    assert!(expanded.is_empty());
}

fn category_strategy() -> impl Strategy<Value = Category> {
    // A tiny id alphabet forces duplicate ids, exercising the visited guards.
    let leaf = ("[a-e]{1,2}", "[A-Za-z]{1,10}").prop_map(|(id, name)| Category::new(id, name));
    leaf.prop_recursive(3, 32, 4, |inner| {
        (
            "[a-e]{1,2}",
            "[A-Za-z]{1,10}",
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(id, name, children)| Category {
                children: (!children.is_empty()).then_some(children),
                ..Category::new(id, name)
            })
    })
}

proptest! {
    #[test]
    fn flatten_is_idempotent_and_duplicate_free(
        forest in prop::collection::vec(category_strategy(), 0..4)
    ) {
        let mut expanded = ExpandedKeys::new();
        expanded.expand_all(&forest);

        let first = flatten(&forest, &expanded);
        let second = flatten(&forest, &expanded);
        prop_assert_eq!(&first, &second);

        let mut seen = HashSet::new();
        for row in &first {
            prop_assert!(seen.insert(row.id), "id {} emitted twice", row.id);
        }
    }

    #[test]
    fn search_never_exceeds_full_flatten(
        forest in prop::collection::vec(category_strategy(), 0..4),
        query in "[a-zA-Z]{0,3}",
    ) {
        let everything = search(&forest, "");
        let filtered = search(&forest, &query);
        prop_assert!(filtered.len() <= everything.len());

        let all_ids: HashSet<_> = everything.iter().map(|r| r.id).collect();
        for row in &filtered {
            prop_assert!(all_ids.contains(row.id));
        }
    }
}
