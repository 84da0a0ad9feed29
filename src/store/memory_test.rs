use super::*;
use crate::doc::ItemContent;
use crate::geom::Point;
use crate::payload::{MediaKind, Subcollection};

fn audio() -> Item {
    Item::new(Point::new(1.0, 1.0), 40.0, 40.0, ItemContent::Audio { url: "a.mp3".into() })
}

fn media(id: &str) -> MediaEntry {
    MediaEntry {
        id: id.into(),
        name: id.into(),
        url: format!("data:{id}"),
        kind: MediaKind::Image,
        subcollection: Some(Subcollection::Media),
    }
}

#[tokio::test]
async fn pages_list_oldest_first_per_scrapbook() {
    let store = MemoryStore::new();
    let first = store.create_page("book").await.unwrap();
    let second = store.seed_page("book", vec![audio()]).await;
    store.create_page("other").await.unwrap();

    let pages = store.list_pages("book").await.unwrap();
    let ids: Vec<Uuid> = pages.iter().map(|p| p.id).collect();
    assert_eq!(ids, [first, second]);
    assert_eq!(pages[1].items.len(), 1);
    assert!(store.list_pages("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn save_overwrites_items_and_bumps_updated_at() {
    let store = MemoryStore::new();
    let id = store.seed_page("book", vec![audio(), audio()]).await;
    let before = store.page("book", id).await.unwrap();

    let items = vec![audio()];
    store.save_items("book", id, &items).await.unwrap();

    let after = store.page("book", id).await.unwrap();
    assert_eq!(after.items, items);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
    assert_eq!(store.writes().await.len(), 1);
}

#[tokio::test]
async fn save_to_unknown_page_fails() {
    let store = MemoryStore::new();
    let missing = Uuid::new_v4();
    let err = store.save_items("book", missing, &[]).await.unwrap_err();
    assert!(matches!(err, StoreError::PageNotFound(id) if id == missing));
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn failure_injection_rejects_writes() {
    let store = MemoryStore::new();
    let id = store.create_page("book").await.unwrap();

    store.fail_saves(true).await;
    assert!(matches!(store.save_items("book", id, &[]).await, Err(StoreError::Unavailable(_))));
    store.fail_creates(true).await;
    assert!(matches!(store.create_page("book").await, Err(StoreError::Unavailable(_))));

    store.fail_saves(false).await;
    store.save_items("book", id, &[]).await.unwrap();
}

#[tokio::test]
async fn media_lists_newest_first() {
    let store = MemoryStore::new();
    store.insert_media("book", media("old")).await;
    store.insert_media("book", media("new")).await;
    let ids: Vec<String> = store
        .list_media("book")
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, ["new", "old"]);
}
