use std::path::PathBuf;

use chrono::{Duration, Utc};
use news_core::source::{curated_articles, generated_articles};
use news_core::{Category, FavoriteItem, FavoritesStore, PreferencesStore, StorageConfig};

fn temp_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "newsreader_{}_{}",
        label,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    dir
}

#[tokio::test]
async fn favorites_persist_newest_first() {
    let dir = temp_dir("favorites");
    let path = dir.join("favorites.json");
    let config = StorageConfig::default();
    let articles = curated_articles();

    let store = FavoritesStore::load_from(&path, &config).await;
    assert!(store.add(&articles[0]).await);
    assert!(store.add(&articles[1]).await);
    assert!(!store.add(&articles[0]).await);

    let reopened = FavoritesStore::load_from(&path, &config).await;
    let ids: Vec<_> = reopened.list().await.into_iter().map(|f| f.id).collect();
    assert_eq!(ids, ["2", "1"]);

    assert!(!reopened.toggle(&articles[1]).await);
    assert!(!reopened.is_favorite("2").await);
    assert!(reopened.remove("1").await);
    assert!(!reopened.remove("1").await);
    assert_eq!(reopened.count().await, 0);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn favorites_evict_oldest_past_the_limit() {
    let config = StorageConfig {
        max_favorites: 3,
        ..StorageConfig::default()
    };
    let store = FavoritesStore::in_memory(&config);
    for article in curated_articles().iter().take(4) {
        store.add(article).await;
    }

    let ids: Vec<_> = store.list().await.into_iter().map(|f| f.id).collect();
    assert_eq!(ids, ["4", "3", "2"]);
}

#[tokio::test]
async fn hundred_and_first_favorite_evicts_the_oldest() {
    let store = FavoritesStore::in_memory(&StorageConfig::default());
    for article in generated_articles(1, 101) {
        assert!(store.add(&article).await);
    }

    let items = store.list().await;
    assert_eq!(items.len(), 100);
    assert_eq!(items[0].id, "generated-1-100");
    assert_eq!(items[99].id, "generated-1-1");
    assert!(!store.is_favorite("generated-1-0").await);
}

#[tokio::test]
async fn expired_favorites_are_dropped_on_load() {
    let dir = temp_dir("favorites_expiry");
    let path = dir.join("favorites.json");
    let articles = curated_articles();

    let saved = vec![
        FavoriteItem::from_article(&articles[0], Utc::now() - Duration::days(2)),
        FavoriteItem::from_article(&articles[1], Utc::now() - Duration::days(31)),
    ];
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(&path, serde_json::to_vec(&saved).unwrap())
        .await
        .unwrap();

    let store = FavoritesStore::load_from(&path, &StorageConfig::default()).await;
    let ids: Vec<_> = store.list().await.into_iter().map(|f| f.id).collect();
    assert_eq!(ids, ["1"]);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn corrupted_favorites_fall_back_to_tmp_copy() {
    let dir = temp_dir("favorites_corrupt");
    let path = dir.join("favorites.json");
    let articles = curated_articles();
    tokio::fs::create_dir_all(&dir).await.unwrap();

    let saved = vec![FavoriteItem::from_article(&articles[2], Utc::now())];
    tokio::fs::write(&path, b"{ not json").await.unwrap();
    tokio::fs::write(
        dir.join("favorites.json.tmp"),
        serde_json::to_vec(&saved).unwrap(),
    )
    .await
    .unwrap();

    let store = FavoritesStore::load_from(&path, &StorageConfig::default()).await;
    assert!(store.is_favorite("3").await);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn stored_favorites_use_camel_case() {
    let item = FavoriteItem::from_article(&curated_articles()[0], Utc::now());
    let json = serde_json::to_value(&item).unwrap();
    assert!(json.get("imageUrl").is_some());
    assert!(json.get("addedAt").is_some());
    assert_eq!(json["source"], "TechNews");
}

#[tokio::test]
async fn preferences_merge_missing_fields_with_defaults() {
    let dir = temp_dir("preferences");
    let path = dir.join("preferences.json");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(&path, br#"{ "darkMode": true }"#).await.unwrap();

    let store = PreferencesStore::load_from(&path).await;
    let prefs = store.get().await;
    assert!(prefs.dark_mode);
    assert_eq!(
        prefs.interests,
        [Category::General, Category::Technology, Category::Science]
    );

    let _ = tokio::fs::remove_dir_all(&dir).await;
}

#[tokio::test]
async fn preferences_toggle_and_persist() {
    let dir = temp_dir("preferences_toggle");
    let path = dir.join("preferences.json");

    let store = PreferencesStore::load_from(&path).await;
    assert!(!store.toggle_interest(Category::Science).await);
    assert!(store.toggle_interest(Category::Sports).await);
    store.set_dark_mode(true).await;

    let reopened = PreferencesStore::load_from(&path).await;
    assert_eq!(
        reopened.interests().await,
        [Category::General, Category::Technology, Category::Sports]
    );
    assert!(reopened.has_interest(Category::Sports).await);
    assert!(reopened.get().await.dark_mode);

    reopened.reset().await;
    assert!(!reopened.get().await.dark_mode);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
