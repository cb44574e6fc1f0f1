use std::sync::Arc;

use news_core::{Category, FeedConfig, LoadOutcome, PersonalizedFeed, SimulatedSource};

fn feed(interests: Vec<Category>) -> PersonalizedFeed {
    PersonalizedFeed::new(interests, Arc::new(SimulatedSource::default()), &FeedConfig::default())
}

#[tokio::test(start_paused = true)]
async fn mixes_only_selected_interests() {
    let feed = feed(vec![Category::Technology, Category::Science]);
    assert_eq!(feed.start().await.unwrap(), LoadOutcome::Fetched);

    let state = feed.state();
    assert_eq!(state.articles.len(), 10);
    assert!(state
        .articles
        .iter()
        .all(|a| matches!(a.category, Category::Technology | Category::Science)));
    assert!(state.articles.iter().all(|a| a.id.ends_with("-1")));
}

#[tokio::test(start_paused = true)]
async fn empty_interest_set_does_not_fetch() {
    let feed = feed(Vec::new());
    assert_eq!(feed.start().await.unwrap(), LoadOutcome::Skipped);

    let state = feed.state();
    assert!(state.articles.is_empty());
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn changing_interests_restarts_from_page_one() {
    let feed = feed(vec![Category::Sports]);
    feed.start().await.unwrap();
    feed.load_more().await.unwrap();
    assert_eq!(feed.state().page, 2);

    assert_eq!(
        feed.set_interests(vec![Category::Sports]).await.unwrap(),
        LoadOutcome::Skipped
    );

    assert_eq!(
        feed.set_interests(vec![Category::Health]).await.unwrap(),
        LoadOutcome::Fetched
    );
    let state = feed.state();
    assert_eq!(state.page, 1);
    assert_eq!(state.articles.len(), 10);
    assert!(state.articles.iter().all(|a| a.category == Category::Health));
}

#[tokio::test(start_paused = true)]
async fn stops_after_the_last_page() {
    let feed = feed(vec![Category::General]);
    feed.start().await.unwrap();
    while feed.load_more().await.unwrap() == LoadOutcome::Fetched {}

    let state = feed.state();
    assert_eq!(state.page, 5);
    assert!(!state.has_more);
    assert_eq!(state.articles.len(), 50);
}

#[tokio::test(start_paused = true)]
async fn refresh_replaces_articles() {
    let feed = feed(vec![Category::Business]);
    feed.start().await.unwrap();
    feed.load_more().await.unwrap();

    feed.refresh().await.unwrap();
    let state = feed.state();
    assert_eq!(state.page, 1);
    assert_eq!(state.articles.len(), 10);
    assert!(!state.refreshing);
}

#[tokio::test(start_paused = true)]
async fn interest_change_supersedes_in_flight_load() {
    let feed = feed(vec![Category::Sports]);

    let (stale, fresh) = tokio::join!(feed.load(1), feed.set_interests(vec![Category::Health]));

    assert_eq!(stale.unwrap(), LoadOutcome::Superseded);
    assert_eq!(fresh.unwrap(), LoadOutcome::Fetched);

    let state = feed.state();
    assert_eq!(state.articles.len(), 10);
    assert!(state.articles.iter().all(|a| a.category == Category::Health));
    assert!(state.error.is_none());
    assert!(!state.loading);
}
