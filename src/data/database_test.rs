//! Database tests

use super::*;
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

async fn seed_user(db: &Database, email: &str) -> User {
    let user = User {
        id: EntityId::new().0,
        email: email.to_string(),
        name: email.to_string(),
        created_at: Utc::now(),
    };
    assert!(db.insert_user_if_absent(&user).await.unwrap());
    user
}

async fn seed_media(db: &Database, title: &str, media_type: MediaType) -> MediaItem {
    let media = MediaItem::from_spec(MediaSpec::new(title, media_type));
    db.insert_media(&media).await.unwrap();
    media
}

async fn seed_collection(db: &Database, user: &User, title: &str) -> Collection {
    let collection = Collection {
        id: EntityId::new().0,
        user_id: user.id.clone(),
        title: title.to_string(),
        is_public: false,
        created_at: Utc::now(),
    };
    db.insert_collection(&collection, &[]).await.unwrap();
    collection
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_user_insert_is_idempotent_by_email() {
    let (db, _temp_dir) = create_test_db().await;

    let user = seed_user(&db, "reader@example.com").await;

    let duplicate = User {
        id: EntityId::new().0,
        email: user.email.clone(),
        name: "someone else".to_string(),
        created_at: Utc::now(),
    };
    assert!(!db.insert_user_if_absent(&duplicate).await.unwrap());

    let stored = db.get_user_by_email("reader@example.com").await.unwrap().unwrap();
    assert_eq!(stored.id, user.id);
    assert_eq!(db.get_user(&user.id).await.unwrap().unwrap().email, user.email);
    assert!(db.get_user("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_media_round_trip_keeps_empty_and_absent_apart() {
    let (db, _temp_dir) = create_test_db().await;

    let mut spec = MediaSpec::new("Dune", MediaType::Movie);
    spec.year = Some(2021);
    spec.genres = Some(Vec::new());
    spec.creators = Some(
        json!({"director": "Denis Villeneuve"})
            .as_object()
            .cloned()
            .unwrap(),
    );
    spec.metadata = Some(JsonMap::new());
    let media = MediaItem::from_spec(spec);
    db.insert_media(&media).await.unwrap();

    let stored = db.get_media(&media.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Dune");
    assert_eq!(stored.year, Some(2021));
    assert_eq!(stored.genres, Some(Vec::new()));
    assert_eq!(stored.metadata, Some(JsonMap::new()));
    assert_eq!(stored.original_title, None);
    assert_eq!(stored.duration, None);
    assert_eq!(
        stored.creators.unwrap().get("director"),
        Some(&json!("Denis Villeneuve"))
    );
}

#[tokio::test]
async fn test_media_update() {
    let (db, _temp_dir) = create_test_db().await;

    let mut media = seed_media(&db, "Dun", MediaType::Book).await;
    let mut spec = MediaSpec::new("Dune", MediaType::Book);
    spec.year = Some(1965);
    media.apply_spec(spec);

    assert!(db.update_media(&media).await.unwrap());

    let stored = db.get_media(&media.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Dune");
    assert_eq!(stored.year, Some(1965));

    let ghost = MediaItem::from_spec(MediaSpec::new("Ghost", MediaType::Book));
    assert!(!db.update_media(&ghost).await.unwrap());
}

#[tokio::test]
async fn test_media_search() {
    let (db, _temp_dir) = create_test_db().await;

    seed_media(&db, "Dune", MediaType::Movie).await;
    seed_media(&db, "Dune", MediaType::Book).await;
    seed_media(&db, "Dune: Part Two", MediaType::Movie).await;
    seed_media(&db, "Arrival", MediaType::Movie).await;

    // Case-insensitive substring, ordered by title
    let hits = db.search_media("dUNE", None).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.windows(2).all(|w| w[0].title <= w[1].title));

    // Filtered by type
    let movies = db.search_media("dune", Some(MediaType::Movie)).await.unwrap();
    assert_eq!(movies.len(), 2);
    assert!(movies.iter().all(|m| m.media_type == MediaType::Movie));
    assert_eq!(movies[0].title, "Dune");

    assert!(db.search_media("Solaris", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_media_search_treats_wildcards_literally() {
    let (db, _temp_dir) = create_test_db().await;

    seed_media(&db, "100% Orange Juice", MediaType::Game).await;
    seed_media(&db, "1000 Orange Juice", MediaType::Game).await;
    seed_media(&db, "snake_case", MediaType::Video).await;
    seed_media(&db, "snakeXcase", MediaType::Video).await;

    let percent = db.search_media("100%", None).await.unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].title, "100% Orange Juice");

    let underscore = db.search_media("e_c", None).await.unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].title, "snake_case");
}

#[tokio::test]
async fn test_media_search_orders_titles_ignoring_case() {
    let (db, _temp_dir) = create_test_db().await;

    seed_media(&db, "Banana Apple", MediaType::Book).await;
    seed_media(&db, "apple pie", MediaType::Book).await;
    seed_media(&db, "Crab Apple", MediaType::Book).await;

    let titles: Vec<_> = db
        .search_media("apple", None)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.title)
        .collect();
    assert_eq!(titles, vec!["apple pie", "Banana Apple", "Crab Apple"]);
}

#[tokio::test]
async fn test_media_search_is_capped() {
    let (db, _temp_dir) = create_test_db().await;

    for i in 0..(MEDIA_SEARCH_LIMIT + 5) {
        seed_media(&db, &format!("Episode {i:02}"), MediaType::Tv).await;
    }

    let hits = db.search_media("episode", None).await.unwrap();
    assert_eq!(hits.len() as i64, MEDIA_SEARCH_LIMIT);
}

#[tokio::test]
async fn test_entry_crud() {
    let (db, _temp_dir) = create_test_db().await;

    let user = seed_user(&db, "crud@example.com").await;
    let media = seed_media(&db, "Arrival", MediaType::Movie).await;

    let mut fields = EntryFields::with_status(EntryStatus::Planned);
    fields.progress = Some(JsonMap::new());
    let entry = db.insert_entry(&user.id, &media.id, &fields).await.unwrap();
    assert_eq!(entry.user_id, user.id);
    assert_eq!(entry.media, media);
    assert_eq!(entry.progress, Some(JsonMap::new()));
    assert_eq!(entry.rating, None);

    let mut changed = EntryFields::with_status(EntryStatus::Completed);
    changed.rating = Some(4.5);
    changed.review_md = Some("**great**".to_string());
    let updated = db.update_entry(&entry.id, &changed).await.unwrap().unwrap();
    assert_eq!(updated.status, EntryStatus::Completed);
    assert_eq!(updated.rating, Some(4.5));
    assert_eq!(updated.progress, None);
    assert!(updated.updated_at >= entry.updated_at);

    assert!(db.update_entry("missing", &changed).await.unwrap().is_none());

    assert!(db.delete_entry(&entry.id).await.unwrap());
    assert!(!db.delete_entry(&entry.id).await.unwrap());
    assert!(db.get_entry(&entry.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_entry_listing_order_and_filters() {
    let (db, _temp_dir) = create_test_db().await;

    let user = seed_user(&db, "lists@example.com").await;
    let other = seed_user(&db, "other@example.com").await;
    let movie = seed_media(&db, "Heat", MediaType::Movie).await;
    let book = seed_media(&db, "Neuromancer", MediaType::Book).await;

    let first = db
        .insert_entry(&user.id, &movie.id, &EntryFields::with_status(EntryStatus::Completed))
        .await
        .unwrap();
    let second = db
        .insert_entry(&user.id, &book.id, &EntryFields::with_status(EntryStatus::Planned))
        .await
        .unwrap();
    db.insert_entry(&other.id, &movie.id, &EntryFields::with_status(EntryStatus::Planned))
        .await
        .unwrap();

    let all = db.list_entries_by_user(&user.id, None, None).await.unwrap();
    let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);

    // Touching the older entry moves it to the front
    db.update_entry(&first.id, &EntryFields::with_status(EntryStatus::Dropped))
        .await
        .unwrap();
    let all = db.list_entries_by_user(&user.id, None, None).await.unwrap();
    assert_eq!(all[0].id, first.id);

    let planned = db
        .list_entries_by_user(&user.id, Some(EntryStatus::Planned), None)
        .await
        .unwrap();
    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].id, second.id);

    let movies = db
        .list_entries_by_user(&user.id, None, Some(MediaType::Movie))
        .await
        .unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].media.id, movie.id);

    let by_media = db
        .list_entries_by_user_and_media(&user.id, &movie.id)
        .await
        .unwrap();
    assert_eq!(by_media.len(), 1);
    assert_eq!(by_media[0].id, first.id);
}

#[tokio::test]
async fn test_entry_with_missing_media_fails_read() {
    let (db, _temp_dir) = create_test_db().await;

    let user = seed_user(&db, "orphan@example.com").await;
    let media = seed_media(&db, "Vanished", MediaType::Anime).await;
    let entry = db
        .insert_entry(&user.id, &media.id, &EntryFields::with_status(EntryStatus::Planned))
        .await
        .unwrap();

    db.delete_media_unchecked_for_test(&media.id).await.unwrap();

    let error = db.get_entry(&entry.id).await.expect_err("orphan must fail");
    assert!(matches!(error, crate::error::AppError::Internal(_)));
    assert!(db.list_entries_by_user(&user.id, None, None).await.is_err());
}

#[tokio::test]
async fn test_collection_membership_positions() {
    let (db, _temp_dir) = create_test_db().await;

    let user = seed_user(&db, "col@example.com").await;
    let collection = seed_collection(&db, &user, "Favourites").await;

    let mut entry_ids = Vec::new();
    for title in ["A", "B", "C"] {
        let media = seed_media(&db, title, MediaType::Game).await;
        let entry = db
            .insert_entry(&user.id, &media.id, &EntryFields::with_status(EntryStatus::Completed))
            .await
            .unwrap();
        entry_ids.push(entry.id);
    }

    db.add_collection_entries(&collection.id, &entry_ids[..2])
        .await
        .unwrap();
    // Re-adding a member is a no-op
    db.add_collection_entries(&collection.id, &[entry_ids[0].clone(), entry_ids[2].clone()])
        .await
        .unwrap();

    let members = db.get_collection_entries(&collection.id).await.unwrap();
    let ids: Vec<_> = members.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, entry_ids);
    assert_eq!(members[0].media.title, "A");

    let removed = db
        .remove_collection_entries(&collection.id, &[entry_ids[1].clone(), "nope".to_string()])
        .await
        .unwrap();
    assert_eq!(removed, 1);
    let ids: Vec<_> = db
        .get_collection_entries(&collection.id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![entry_ids[0].clone(), entry_ids[2].clone()]);

    db.replace_collection_entries(&collection.id, &[entry_ids[2].clone(), entry_ids[1].clone()])
        .await
        .unwrap();
    let ids: Vec<_> = db
        .get_collection_entries(&collection.id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![entry_ids[2].clone(), entry_ids[1].clone()]);

    // Deleting an entry drops it from the collection
    db.delete_entry(&entry_ids[2]).await.unwrap();
    let members = db.get_collection_entries(&collection.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, entry_ids[1]);
}

#[tokio::test]
async fn test_collection_insert_rolls_back_on_bad_member() {
    let (db, _temp_dir) = create_test_db().await;

    let user = seed_user(&db, "atomic@example.com").await;
    let media = seed_media(&db, "Hades", MediaType::Game).await;
    let entry = db
        .insert_entry(&user.id, &media.id, &EntryFields::with_status(EntryStatus::Planned))
        .await
        .unwrap();

    let collection = Collection {
        id: EntityId::new().0,
        user_id: user.id.clone(),
        title: "Roguelikes".to_string(),
        is_public: false,
        created_at: Utc::now(),
    };
    let result = db
        .insert_collection(&collection, &[entry.id.clone(), "missing-entry".to_string()])
        .await;
    assert!(result.is_err());
    assert!(db.get_collection(&collection.id).await.unwrap().is_none());
    assert!(db.list_collections_by_user(&user.id).await.unwrap().is_empty());

    db.insert_collection(&collection, &[entry.id.clone()])
        .await
        .unwrap();
    let members = db.get_collection_entries(&collection.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, entry.id);
}

#[tokio::test]
async fn test_collection_update_and_delete() {
    let (db, _temp_dir) = create_test_db().await;

    let user = seed_user(&db, "owner@example.com").await;
    let older = seed_collection(&db, &user, "Older").await;
    let newer = seed_collection(&db, &user, "Newer").await;

    let listed = db.list_collections_by_user(&user.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);

    assert!(db.update_collection(&older.id, "Renamed", true).await.unwrap());
    let stored = db.get_collection(&older.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Renamed");
    assert!(stored.is_public);

    assert!(db.delete_collection(&older.id).await.unwrap());
    assert!(db.get_collection(&older.id).await.unwrap().is_none());
    assert!(!db.update_collection(&older.id, "x", false).await.unwrap());
}

#[tokio::test]
async fn test_share_token_storage() {
    let (db, _temp_dir) = create_test_db().await;

    let share = ShareToken::issue("0f".repeat(16), ShareKind::Profile, "user-1", Utc::now());
    db.insert_share_token(&share).await.unwrap();

    let stored = db.get_share_token(&share.token).await.unwrap().unwrap();
    assert_eq!(stored.kind, "profile");
    assert_eq!(stored.target_id, "user-1");
    assert_eq!(stored.expires_at, share.expires_at);

    // Duplicate token is a storage error, not a silent overwrite
    assert!(db.insert_share_token(&share).await.is_err());

    db.set_share_kind_for_test(&share.token, "playlist")
        .await
        .unwrap();
    let stored = db.get_share_token(&share.token).await.unwrap().unwrap();
    assert_eq!(stored.share_kind(), None);

    assert!(db.get_share_token("missing").await.unwrap().is_none());
}
