//! Repository and discovery tests against an in-memory store with the real
//! migrations applied.

use cardstock::db;
use cardstock::error::AppError;
use cardstock::services::{code, patch};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn pool() -> SqlitePool {
    // A single connection keeps every operation on the same in-memory db.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
    pool
}

async fn add_user(pool: &SqlitePool, id: &str, name: &str) {
    sqlx::query("INSERT INTO users (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await
        .expect("insert user");
}

fn deck_json(name: &str, language: &str, public: bool) -> Value {
    json!({
        "name": name,
        "calls": [[["Why not ", {}, "?"]]],
        "responses": ["Reasons.", "Chaos."],
        "language": language,
        "public": public
    })
}

fn ops(raw: Value) -> json_patch::Patch {
    patch::parse(raw).expect("valid patch")
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;

    let initial = deck_json("First Deck", "en", true);
    let id = db::create_deck(&pool, initial.clone(), "u1").await.unwrap();

    let deck = db::get_deck(&pool, id).await.unwrap();
    assert_eq!(deck.version, 1);
    assert_eq!(deck.author, "Alice");
    assert_eq!(serde_json::to_value(&deck.editable).unwrap(), initial);
}

#[tokio::test]
async fn invalid_content_is_a_bad_deck() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;

    let no_slot = json!({
        "name": "Broken",
        "calls": [[["No slot here."]]],
        "responses": []
    });
    assert!(matches!(
        db::create_deck(&pool, no_slot, "u1").await,
        Err(AppError::BadDeck)
    ));
}

#[tokio::test]
async fn missing_deck_is_not_found() {
    let pool = pool().await;
    assert!(matches!(db::get_deck(&pool, 999).await, Err(AppError::DeckNotFound)));
    assert!(matches!(db::get_summary(&pool, 999).await, Err(AppError::DeckNotFound)));
}

#[tokio::test]
async fn version_test_guard_detects_conflicts_and_writes_nothing() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    let initial = deck_json("Guarded", "en", false);
    let id = db::create_deck(&pool, initial.clone(), "u1").await.unwrap();

    let stale = ops(json!([
        { "op": "test", "path": "/version", "value": 7 },
        { "op": "replace", "path": "/name", "value": "Changed" }
    ]));
    assert!(matches!(
        db::update_deck(&pool, id, "u1", &stale).await,
        Err(AppError::PatchTestFailed)
    ));

    let deck = db::get_deck(&pool, id).await.unwrap();
    assert_eq!(deck.version, 1);
    assert_eq!(serde_json::to_value(&deck.editable).unwrap(), initial);
}

#[tokio::test]
async fn successful_patches_strictly_increase_version() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    let id = db::create_deck(&pool, deck_json("Original", "en", false), "u1")
        .await
        .unwrap();

    let first = ops(json!([
        { "op": "test", "path": "/version", "value": 1 },
        { "op": "replace", "path": "/name", "value": "Renamed" }
    ]));
    let deck = db::update_deck(&pool, id, "u1", &first).await.unwrap();
    assert_eq!(deck.version, 2);
    assert_eq!(deck.editable.name, "Renamed");

    let second = ops(json!([
        { "op": "add", "path": "/responses/-", "value": "Another response." }
    ]));
    let deck = db::update_deck(&pool, id, "u1", &second).await.unwrap();
    assert_eq!(deck.version, 3);
    assert_eq!(deck.editable.responses.len(), 3);

    let stored = db::get_deck(&pool, id).await.unwrap();
    assert_eq!(stored.version, 3);
    assert_eq!(stored.editable.name, "Renamed");
}

#[tokio::test]
async fn patches_producing_invalid_content_are_bad_patches() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    let initial = deck_json("Fragile", "en", false);
    let id = db::create_deck(&pool, initial.clone(), "u1").await.unwrap();

    // Replacing the only slot with plain text breaks the authoring rules.
    let breaks_invariant = ops(json!([
        { "op": "replace", "path": "/calls/0/0/1", "value": "plain" }
    ]));
    assert!(matches!(
        db::update_deck(&pool, id, "u1", &breaks_invariant).await,
        Err(AppError::BadPatch)
    ));

    let unknown_field = ops(json!([
        { "op": "add", "path": "/junk", "value": 1 }
    ]));
    assert!(matches!(
        db::update_deck(&pool, id, "u1", &unknown_field).await,
        Err(AppError::BadPatch)
    ));

    let bad_path = ops(json!([
        { "op": "replace", "path": "/calls/9/0/0", "value": "x" }
    ]));
    assert!(matches!(
        db::update_deck(&pool, id, "u1", &bad_path).await,
        Err(AppError::BadPatch)
    ));

    let deck = db::get_deck(&pool, id).await.unwrap();
    assert_eq!(deck.version, 1);
    assert_eq!(serde_json::to_value(&deck.editable).unwrap(), initial);
}

#[tokio::test]
async fn patching_someone_elses_deck_is_not_found() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    add_user(&pool, "u2", "Bob").await;
    let id = db::create_deck(&pool, deck_json("Mine", "en", false), "u1")
        .await
        .unwrap();

    let rename = ops(json!([{ "op": "replace", "path": "/name", "value": "Stolen" }]));
    assert!(matches!(
        db::update_deck(&pool, id, "u2", &rename).await,
        Err(AppError::DeckNotFound)
    ));

    let deck = db::get_deck(&pool, id).await.unwrap();
    assert_eq!(deck.editable.name, "Mine");
}

#[tokio::test]
async fn patched_server_fields_are_ignored_on_write() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    let id = db::create_deck(&pool, deck_json("Server Owned", "en", false), "u1")
        .await
        .unwrap();

    let smuggle = ops(json!([
        { "op": "replace", "path": "/author", "value": "Impostor" },
        { "op": "replace", "path": "/version", "value": 99 }
    ]));
    let deck = db::update_deck(&pool, id, "u1", &smuggle).await.unwrap();
    assert_eq!(deck.author, "Alice");
    assert_eq!(deck.version, 2);

    let stored = db::get_deck(&pool, id).await.unwrap();
    assert_eq!(stored.author, "Alice");
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn deletion_is_ownership_gated() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    add_user(&pool, "u2", "Bob").await;
    let id = db::create_deck(&pool, deck_json("Keep Me", "en", false), "u1")
        .await
        .unwrap();

    assert!(matches!(
        db::delete_deck(&pool, id, "u2").await,
        Err(AppError::DeckNotFound)
    ));
    assert!(db::get_deck(&pool, id).await.is_ok());

    db::delete_deck(&pool, id, "u1").await.unwrap();
    assert!(matches!(db::get_deck(&pool, id).await, Err(AppError::DeckNotFound)));
}

#[tokio::test]
async fn account_deletion_removes_owned_decks_explicitly() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    let a = db::create_deck(&pool, deck_json("One", "en", true), "u1").await.unwrap();
    let b = db::create_deck(&pool, deck_json("Two", "en", false), "u1").await.unwrap();

    db::delete_decks_for_author(&pool, "u1").await.unwrap();
    db::delete_user(&pool, "u1").await.unwrap();

    assert!(matches!(db::get_deck(&pool, a).await, Err(AppError::DeckNotFound)));
    assert!(matches!(db::get_deck(&pool, b).await, Err(AppError::DeckNotFound)));
}

#[tokio::test]
async fn summaries_reflect_the_stored_document() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    let id = db::create_deck(&pool, deck_json("Summarized", "en", true), "u1")
        .await
        .unwrap();

    let summary = db::get_summary(&pool, id).await.unwrap();
    assert_eq!(summary.name, "Summarized");
    assert_eq!(summary.author, "Alice");
    assert_eq!(summary.language.as_deref(), Some("en"));
    assert_eq!(summary.calls, 1);
    assert_eq!(summary.responses, 2);
    assert!(summary.public);
    assert_eq!(summary.version, 1);

    // Summaries are recomputed from the document of record, so a patch is
    // visible immediately.
    let rename = ops(json!([{ "op": "replace", "path": "/name", "value": "Fresh" }]));
    db::update_deck(&pool, id, "u1", &rename).await.unwrap();
    let summary = db::get_summary(&pool, id).await.unwrap();
    assert_eq!(summary.name, "Fresh");
    assert_eq!(summary.version, 2);
}

#[tokio::test]
async fn author_listings_order_and_filter() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    add_user(&pool, "u2", "Bob").await;
    db::create_deck(&pool, deck_json("Old Public", "en", true), "u1").await.unwrap();
    db::create_deck(&pool, deck_json("Private", "en", false), "u1").await.unwrap();
    db::create_deck(&pool, deck_json("New Public", "en", true), "u1").await.unwrap();
    db::create_deck(&pool, deck_json("Not Mine", "en", true), "u2").await.unwrap();

    let all = db::get_summaries_for_author(&pool, "u1", false).await.unwrap();
    let names: Vec<_> = all.iter().map(|cs| cs.summary.name.as_str()).collect();
    assert_eq!(names, ["New Public", "Private", "Old Public"]);

    let ids: Vec<i64> = all.iter().map(|cs| code::decode(&cs.code).unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] > w[1]));

    let public = db::get_summaries_for_author(&pool, "u1", true).await.unwrap();
    let names: Vec<_> = public.iter().map(|cs| cs.summary.name.as_str()).collect();
    assert_eq!(names, ["New Public", "Old Public"]);
}

#[tokio::test]
async fn browse_pages_public_decks_by_recency() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    for i in 0..25 {
        db::create_deck(&pool, deck_json(&format!("Deck {i}"), "en", true), "u1")
            .await
            .unwrap();
    }
    db::create_deck(&pool, deck_json("Hidden", "en", false), "u1").await.unwrap();

    let first = db::browse(&pool, None, None, 0).await.unwrap();
    assert_eq!(first.len(), 20);
    assert_eq!(first[0].summary.name, "Deck 24");
    let ids: Vec<i64> = first.iter().map(|cs| code::decode(&cs.code).unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] > w[1]));

    let second = db::browse(&pool, None, None, 1).await.unwrap();
    assert_eq!(second.len(), 5);
    assert_eq!(second.last().unwrap().summary.name, "Deck 0");

    let all_names: Vec<_> = first
        .iter()
        .chain(second.iter())
        .map(|cs| cs.summary.name.as_str())
        .collect();
    assert!(!all_names.contains(&"Hidden"));

    let third = db::browse(&pool, None, None, 2).await.unwrap();
    assert!(third.is_empty());
}

#[tokio::test]
async fn browse_query_ranks_matches_first_then_pages_the_rest_by_recency() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    // Oldest deck is the only match, so only ranking can put it first.
    db::create_deck(&pool, deck_json("Zombie Apocalypse", "en", true), "u1")
        .await
        .unwrap();
    for i in 0..24 {
        db::create_deck(&pool, deck_json(&format!("Filler {i}"), "en", true), "u1")
            .await
            .unwrap();
    }

    let first = db::browse(&pool, Some("zombie"), Some("en"), 0).await.unwrap();
    assert_eq!(first.len(), 20);
    assert_eq!(first[0].summary.name, "Zombie Apocalypse");
    let rest: Vec<_> = first[1..].iter().map(|cs| cs.summary.name.as_str()).collect();
    let expected: Vec<String> = (5..24).rev().map(|i| format!("Filler {i}")).collect();
    assert_eq!(rest, expected);

    let second = db::browse(&pool, Some("zombie"), Some("en"), 1).await.unwrap();
    let names: Vec<_> = second.iter().map(|cs| cs.summary.name.as_str()).collect();
    assert_eq!(names, ["Filler 4", "Filler 3", "Filler 2", "Filler 1", "Filler 0"]);
}

#[tokio::test]
async fn browse_query_sees_responses_and_respects_the_public_flag() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;

    let mut with_response = deck_json("Innocuous", "en", true);
    with_response["responses"] = json!(["A perfectly ordinary xylophone."]);
    db::create_deck(&pool, with_response, "u1").await.unwrap();

    // Newer than the match, so it only comes second because it doesn't match.
    db::create_deck(&pool, deck_json("Plain", "en", true), "u1").await.unwrap();

    let mut private = deck_json("Secret Xylophone", "en", false);
    private["responses"] = json!(["Also a xylophone."]);
    db::create_deck(&pool, private, "u1").await.unwrap();

    let results = db::browse(&pool, Some("xylophone"), None, 0).await.unwrap();
    let names: Vec<_> = results.iter().map(|cs| cs.summary.name.as_str()).collect();
    assert_eq!(names, ["Innocuous", "Plain"]);
}

#[tokio::test]
async fn browse_filters_by_exact_language() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    db::create_deck(&pool, deck_json("English Deck", "en", true), "u1").await.unwrap();
    db::create_deck(&pool, deck_json("French Deck", "fr", true), "u1").await.unwrap();

    let french = db::browse(&pool, None, Some("fr"), 0).await.unwrap();
    let names: Vec<_> = french.iter().map(|cs| cs.summary.name.as_str()).collect();
    assert_eq!(names, ["French Deck"]);

    let everything = db::browse(&pool, None, None, 0).await.unwrap();
    assert_eq!(everything.len(), 2);
}

#[tokio::test]
async fn blank_queries_fall_back_to_recency() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    db::create_deck(&pool, deck_json("Only Deck", "en", true), "u1").await.unwrap();

    let results = db::browse(&pool, Some("   "), None, 0).await.unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn deck_codes_round_trip_for_issued_identifiers() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    let id = db::create_deck(&pool, deck_json("Coded", "en", false), "u1")
        .await
        .unwrap();

    let encoded = code::encode(id);
    assert!(encoded.len() >= 5);
    assert_eq!(code::decode(&encoded).unwrap(), id);
}

#[tokio::test]
async fn guest_sign_in_is_idempotent() {
    let pool = pool().await;
    let first = db::find_or_create_guest(&pool).await.unwrap();
    let second = db::find_or_create_guest(&pool).await.unwrap();
    assert_eq!(first.id, second.id);

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn renaming_a_user_changes_future_reads() {
    let pool = pool().await;
    add_user(&pool, "u1", "Alice").await;
    let id = db::create_deck(&pool, deck_json("Renamer", "en", false), "u1")
        .await
        .unwrap();

    db::rename_user(&pool, "u1", "Alicia").await.unwrap();
    let deck = db::get_deck(&pool, id).await.unwrap();
    assert_eq!(deck.author, "Alicia");

    let decks = db::get_decks_for_author(&pool, "u1").await.unwrap();
    assert_eq!(decks.len(), 1);
    assert_eq!(decks[0].author, "Alicia");
}
