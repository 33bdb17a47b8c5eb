//! Suggestion feed: source precedence, case-insensitive dedup, caps, and
//! history recording rules.

use keymaster_core::{
    CatalogStore, MemCatalog, MemHistory, SearchController, Shortcut, SuggestionKind,
};

fn shortcut(id: i64, keys: &str, desc: &str, cat: &str) -> Shortcut {
    Shortcut {
        id: Some(id),
        keys: keys.into(),
        description: desc.into(),
        category: cat.into(),
        app_name: "Editor".into(),
        learned: false,
    }
}

#[test]
fn blank_input_shows_history_most_recent_first() {
    let history = MemHistory::with_entries(vec!["paste".into(), "copy".into()]);
    let mut controller = SearchController::new(history);

    controller.refresh_suggestions(&[]);

    let texts: Vec<_> = controller.suggestions().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["paste", "copy"]);
    assert!(controller
        .suggestions()
        .iter()
        .all(|s| s.kind == SuggestionKind::History && s.count.is_none()));
}

#[test]
fn popular_term_wins_over_case_insensitive_history_duplicate() {
    let history = MemHistory::with_entries(vec!["Copy".into()]);
    let mut controller = SearchController::new(history);

    controller.input_changed("co", &[]);

    let copies: Vec<_> = controller
        .suggestions()
        .iter()
        .filter(|s| s.text.eq_ignore_ascii_case("copy"))
        .collect();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].text, "copy");
    assert_eq!(copies[0].kind, SuggestionKind::Popular);
    assert_eq!(copies[0].count, Some(5));
}

#[test]
fn shortcut_matches_surface_the_key_combination_text() {
    let shortcuts = vec![shortcut(1, "Ctrl+G", "Go to line", "Navigate")];
    let mut controller = SearchController::new(MemHistory::new());

    controller.input_changed("go to", &shortcuts);

    let texts: Vec<_> = controller.suggestions().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["Ctrl+G"]);
    assert_eq!(controller.suggestions()[0].count, Some(1));
}

#[test]
fn shortcut_category_and_keys_also_match() {
    let shortcuts = vec![
        shortcut(1, "Ctrl+Tab", "Cycle editors", "Tabs"),
        shortcut(2, "Alt+F4", "Close window", "Windows"),
    ];
    let mut controller = SearchController::new(MemHistory::new());

    controller.input_changed("tab", &shortcuts);

    let texts: Vec<_> = controller.suggestions().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["Ctrl+Tab"]);
}

#[test]
fn feed_is_capped_at_eight() {
    let shortcuts: Vec<_> = (0..12)
        .map(|i| shortcut(i, &format!("Ctrl+{i}"), "Does a thing", "Misc"))
        .collect();
    let mut controller = SearchController::new(MemHistory::new());

    controller.input_changed("ctrl", &shortcuts);

    assert_eq!(controller.suggestions().len(), 8);
}

#[test]
fn duplicate_shortcut_keys_collapse_to_first_occurrence() {
    let shortcuts = vec![
        shortcut(1, "Ctrl+K", "Delete line", "Editing"),
        shortcut(2, "ctrl+k", "Delete word", "Editing"),
    ];
    let mut controller = SearchController::new(MemHistory::new());

    controller.input_changed("delete", &shortcuts);
    assert_eq!(controller.suggestions().len(), 1);
    assert_eq!(controller.suggestions()[0].text, "Ctrl+K");
}

#[tokio::test]
async fn history_caps_at_five_most_recent() {
    let store = CatalogStore::new(MemCatalog::new());
    let mut controller = SearchController::new(MemHistory::new());

    for query in ["one", "two", "three", "four", "five", "six"] {
        controller.choose(query, &store).await;
    }

    assert_eq!(controller.history(), ["six", "five", "four", "three", "two"]);
}

#[tokio::test]
async fn repeating_a_query_moves_it_to_the_front_without_duplicating() {
    let store = CatalogStore::new(MemCatalog::new());
    let mut controller = SearchController::new(MemHistory::new());

    controller.choose("copy", &store).await;
    controller.choose("paste", &store).await;
    controller.choose("copy", &store).await;

    assert_eq!(controller.history(), ["copy", "paste"]);
}

#[tokio::test]
async fn history_duplicates_are_case_sensitive() {
    let store = CatalogStore::new(MemCatalog::new());
    let mut controller = SearchController::new(MemHistory::new());

    controller.choose("Copy", &store).await;
    controller.choose("copy", &store).await;

    assert_eq!(controller.history(), ["copy", "Copy"]);
}

#[tokio::test]
async fn accepted_searches_write_through_to_the_history_store() {
    let store = CatalogStore::new(MemCatalog::new());
    let mut controller = SearchController::new(MemHistory::new());

    controller.choose("navigation", &store).await;

    // The in-memory session list and the durable store agree.
    assert_eq!(controller.history(), ["navigation"]);
}
