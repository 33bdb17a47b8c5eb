//! Debounce contract: trailing-edge fire, one timer per burst, immediate
//! paths cancel the timer, disposal cancels without firing.

use std::time::Duration;

use keymaster_core::{CatalogStore, MemCatalog, MemHistory, SearchController};

type Store = CatalogStore<MemCatalog>;
type Controller = SearchController<MemHistory>;

fn setup() -> (Store, Controller) {
    (
        CatalogStore::new(MemCatalog::new()),
        SearchController::new(MemHistory::new()),
    )
}

/// Sleep until the pending deadline, then fire, the way an event loop
/// drives `deadline()` + `fire_due()`.
async fn run_timer(controller: &mut Controller, store: &Store) -> bool {
    match controller.deadline() {
        Some(deadline) => {
            tokio::time::sleep_until(deadline).await;
            controller.fire_due(store).await
        }
        None => false,
    }
}

#[tokio::test(start_paused = true)]
async fn burst_of_keystrokes_fires_once_with_final_text() {
    let (store, mut controller) = setup();

    for text in ["s", "sa", "sav", "savi", "save"] {
        controller.input_changed(text, &store.shortcuts());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(controller.is_debouncing());

    assert!(run_timer(&mut controller, &store).await);

    assert!(!controller.is_debouncing());
    assert_eq!(store.client().call_count("search_shortcuts"), 1);
    assert_eq!(store.client().call_count("search_shortcuts(save,"), 1);
    assert_eq!(controller.history(), ["save"]);
}

#[tokio::test(start_paused = true)]
async fn timer_does_not_fire_before_its_deadline() {
    let (store, mut controller) = setup();
    controller.input_changed("undo", &[]);

    assert!(!controller.fire_due(&store).await);
    assert!(controller.is_debouncing());
    assert_eq!(store.client().call_count("search_shortcuts"), 0);
}

#[tokio::test(start_paused = true)]
async fn accept_with_open_panel_adopts_first_suggestion() {
    let (store, mut controller) = setup();
    controller.input_changed("co", &[]);
    assert!(controller.panel_open());
    assert!(!controller.suggestions().is_empty());

    controller.accept(&store).await;

    assert_eq!(controller.value(), "copy");
    assert!(!controller.panel_open());
    assert!(!controller.is_debouncing());
    assert_eq!(store.client().call_count("search_shortcuts(copy,"), 1);
    assert_eq!(controller.history(), ["copy"]);

    // The cancelled timer never fires a second search.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!controller.fire_due(&store).await);
    assert_eq!(store.client().call_count("search_shortcuts"), 1);
}

#[tokio::test(start_paused = true)]
async fn accept_with_closed_panel_commits_raw_input() {
    let (store, mut controller) = setup();
    controller.input_changed("zzz", &[]);
    controller.close_panel();

    controller.accept(&store).await;

    assert_eq!(store.client().call_count("search_shortcuts(zzz,"), 1);
    assert_eq!(controller.history(), ["zzz"]);
}

#[tokio::test(start_paused = true)]
async fn accept_with_blank_input_records_no_history() {
    let (store, mut controller) = setup();
    controller.accept(&store).await;

    // A blank commit goes through the store's full-reload path.
    assert_eq!(store.client().call_count("get_shortcuts"), 1);
    assert!(controller.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn choosing_a_suggestion_fires_immediately() {
    let (store, mut controller) = setup();
    controller.input_changed("na", &[]);

    controller.choose("navigation", &store).await;

    assert_eq!(controller.value(), "navigation");
    assert!(!controller.panel_open());
    assert!(!controller.is_debouncing());
    assert_eq!(store.client().call_count("search_shortcuts(navigation,"), 1);
    assert_eq!(controller.history(), ["navigation"]);
}

#[tokio::test(start_paused = true)]
async fn clearing_fires_a_blank_search_and_reloads() {
    let (store, mut controller) = setup();
    controller.input_changed("save", &[]);

    controller.clear(&store).await;

    assert_eq!(controller.value(), "");
    assert!(!controller.is_debouncing());
    assert_eq!(store.client().call_count("search_shortcuts"), 0);
    assert_eq!(store.client().call_count("get_shortcuts"), 1);
    assert!(controller.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn disposal_cancels_the_pending_timer_without_firing() {
    let (store, mut controller) = setup();
    controller.input_changed("save", &[]);

    controller.cancel();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(!controller.fire_due(&store).await);
    assert_eq!(store.client().calls().len(), 0);
}
