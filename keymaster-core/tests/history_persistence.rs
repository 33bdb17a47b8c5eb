use std::fs;

use keymaster_core::{HistoryStore, JsonHistoryStore, SearchController};

#[test]
fn save_then_load_round_trips_through_the_json_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonHistoryStore::new(dir.path());

    let entries = vec!["copy".to_string(), "paste".to_string()];
    store.save(&entries).expect("save");

    assert!(store.path().ends_with("search-history.json"));
    assert_eq!(store.load().expect("load"), entries);
}

#[test]
fn missing_file_loads_as_empty_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonHistoryStore::new(dir.path());
    assert!(store.load().expect("load").is_empty());
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonHistoryStore::new(dir.path().join("nested/state"));

    store.save(&["undo".to_string()]).expect("save");
    assert_eq!(store.load().expect("load"), ["undo"]);
}

#[test]
fn load_truncates_oversized_files_to_the_limit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonHistoryStore::new(dir.path());
    fs::write(
        store.path(),
        r#"["a","b","c","d","e","f","g"]"#,
    )
    .expect("write");

    assert_eq!(store.load().expect("load"), ["a", "b", "c", "d", "e"]);
}

#[test]
fn corrupt_file_degrades_the_controller_to_an_empty_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = JsonHistoryStore::new(dir.path());
    fs::write(store.path(), "not json at all").expect("write");

    assert!(store.load().is_err());

    let controller = SearchController::new(JsonHistoryStore::new(dir.path()));
    assert!(controller.history().is_empty());
}

#[test]
fn controller_picks_up_previously_persisted_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    JsonHistoryStore::new(dir.path())
        .save(&["window".to_string(), "save".to_string()])
        .expect("save");

    let controller = SearchController::new(JsonHistoryStore::new(dir.path()));
    assert_eq!(controller.history(), ["window", "save"]);
}
