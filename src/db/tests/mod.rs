use crate::dedup::dedup_key;
use crate::db::*;
use tempfile::NamedTempFile;


/// Open a fresh database backed by a temp file
///
/// The file handle must stay alive for the duration of the test.
async fn open_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

/// Build a new item whose dedup key is derived from `slug`
fn new_item(slug: &str) -> NewItem {
    let source_url = format!("https://news.example.com/{slug}");
    let raw_title = format!("Story {slug}");
    NewItem {
        dedup_key: dedup_key(&source_url, &raw_title),
        source_url,
        source_name: "Example News".to_string(),
        raw_title: raw_title.clone(),
        raw_content: format!("Full text of {slug}."),
        headline: raw_title,
        summary: format!("Summary of {slug}."),
    }
}

/// Insert an item and approve it
async fn insert_approved(db: &Database, slug: &str) -> ItemId {
    let id = db.insert_item(&new_item(slug)).await.unwrap();
    db.transition(id, &[ItemState::Pending], ItemState::Approved)
        .await
        .unwrap();
    id
}
