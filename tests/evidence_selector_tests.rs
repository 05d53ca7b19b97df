// Tests for exam evidence selection
//
// Selection must always be a subset of the loaded list, unknown ids are
// no-ops, and search is a non-mutating view.

mod support;

use encounter_capture::evidence::EvidenceSelector;
use support::exam_record;

fn loaded_selector() -> EvidenceSelector {
    let mut selector = EvidenceSelector::new();
    selector.replace(vec![
        exam_record(1, "blood-panel.pdf"),
        exam_record(2, "chest-xray.png"),
        exam_record(3, "Blood-culture.pdf"),
    ]);
    selector
}

#[test]
fn test_loaded_items_start_unselected() {
    let selector = loaded_selector();
    assert_eq!(selector.len(), 3);
    assert!(selector.items().iter().all(|item| !item.selected));
    assert!(selector.selected_ids().is_empty());
}

#[test]
fn test_toggle_flips_selection() {
    let mut selector = loaded_selector();

    selector.toggle(2);
    assert_eq!(selector.selected_ids(), vec![2]);

    selector.toggle(2);
    assert!(selector.selected_ids().is_empty(), "Second toggle deselects");
}

#[test]
fn test_selected_stays_subset_of_available_with_unknown_ids() {
    let mut selector = loaded_selector();

    // A mix of real and unknown ids; unknown ones are no-ops
    for id in [1, 99, 3, -7, 1, 2, 1000] {
        selector.toggle(id);
    }

    let available: Vec<i64> = selector.items().iter().map(|item| item.id).collect();
    for id in selector.selected_ids() {
        assert!(
            available.contains(&id),
            "Selected id {id} is not in the available list"
        );
    }
    // 1 toggled twice (off), 3 and 2 once (on)
    assert_eq!(selector.selected_ids(), vec![2, 3]);
}

#[test]
fn test_search_is_case_insensitive_and_does_not_mutate() {
    let mut selector = loaded_selector();
    selector.toggle(1);

    let names: Vec<&str> = selector.search("blood").map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["blood-panel.pdf", "Blood-culture.pdf"]);

    // Search can be re-run and the underlying list is untouched
    assert_eq!(selector.search("blood").count(), 2);
    assert_eq!(selector.len(), 3);
    assert_eq!(selector.selected_ids(), vec![1]);
}

#[test]
fn test_search_empty_query_matches_everything() {
    let selector = loaded_selector();
    assert_eq!(selector.search("").count(), 3);
    assert_eq!(selector.search("   ").count(), 3);
    assert_eq!(selector.search("no-such-exam").count(), 0);
}

#[test]
fn test_replace_resets_selection() {
    let mut selector = loaded_selector();
    selector.toggle(1);
    selector.toggle(2);

    selector.replace(vec![exam_record(1, "blood-panel.pdf")]);
    assert_eq!(selector.len(), 1);
    assert!(
        selector.selected_ids().is_empty(),
        "A fresh load must drop earlier selections"
    );
}
