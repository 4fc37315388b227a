use bytes::Bytes;
use chrono::Duration;

use daystack_core::{filetype, Attachment, OwnerRef};
use daystack_db::{DbError, Registry, SqliteRegistry};

fn record(owner: &OwnerRef, name: &str, data: &[u8]) -> Attachment {
    Attachment::new(
        owner.clone(),
        name,
        data.len() as i64,
        filetype::is_image(name),
    )
}

#[tokio::test]
async fn insert_then_get_round_trips() {
    let db = SqliteRegistry::open_in_memory().unwrap();
    let owner = OwnerRef::task("t1");
    let data = b"fake png bytes";
    let rec = record(&owner, "photo.png", data);

    db.insert(&rec, Bytes::from_static(data), Some(Bytes::from_static(b"thumb")))
        .await
        .unwrap();

    let fetched = db.get(&rec.id).await.unwrap();
    assert_eq!(fetched.id, rec.id);
    assert_eq!(fetched.owner, owner);
    assert_eq!(fetched.file_name, "photo.png");
    assert_eq!(fetched.file_type, "png");
    assert_eq!(fetched.mime_type, "image/png");
    assert_eq!(fetched.size_bytes, data.len() as i64);
    assert!(fetched.is_image);

    let blob = db.read_blob(&rec.id).await.unwrap();
    assert_eq!(blob.as_ref(), data);
    let thumb = db.read_thumbnail(&rec.id).await.unwrap();
    assert_eq!(thumb.as_deref(), Some(b"thumb".as_slice()));
}

#[tokio::test]
async fn insert_without_thumbnail_reads_back_none() {
    let db = SqliteRegistry::open_in_memory().unwrap();
    let rec = record(&OwnerRef::task("t1"), "notes.pdf", b"pdf");

    db.insert(&rec, Bytes::from_static(b"pdf"), None)
        .await
        .unwrap();

    assert!(db.read_thumbnail(&rec.id).await.unwrap().is_none());
}

#[tokio::test]
async fn get_missing_returns_not_found() {
    let db = SqliteRegistry::open_in_memory().unwrap();
    let err = db.get("no-such-id").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));

    let err = db.read_blob("no-such-id").await.unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)));

    // Thumbnail lookups degrade to None instead of erroring; renderers
    // fall back to the type glyph either way.
    assert!(db.read_thumbnail("no-such-id").await.unwrap().is_none());
}

#[tokio::test]
async fn list_is_newest_first_with_insertion_tiebreak() {
    let db = SqliteRegistry::open_in_memory().unwrap();
    let owner = OwnerRef::habit("h1");

    let mut first = record(&owner, "a.txt", b"a");
    let mut second = record(&owner, "b.txt", b"b");
    let mut third = record(&owner, "c.txt", b"c");
    let base = first.created_at;
    first.created_at = base - Duration::seconds(20);
    second.created_at = base - Duration::seconds(10);
    third.created_at = base;

    db.insert(&first, Bytes::from_static(b"a"), None).await.unwrap();
    db.insert(&second, Bytes::from_static(b"b"), None).await.unwrap();
    db.insert(&third, Bytes::from_static(b"c"), None).await.unwrap();

    let listed = db.list_by_owner(&owner).await.unwrap();
    let names: Vec<&str> = listed.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(names, ["c.txt", "b.txt", "a.txt"]);

    // Identical timestamps: later insert wins the tie.
    let mut tie_a = record(&owner, "tie_a.txt", b"x");
    let mut tie_b = record(&owner, "tie_b.txt", b"y");
    tie_a.created_at = base + Duration::seconds(5);
    tie_b.created_at = base + Duration::seconds(5);
    db.insert(&tie_a, Bytes::from_static(b"x"), None).await.unwrap();
    db.insert(&tie_b, Bytes::from_static(b"y"), None).await.unwrap();

    let listed = db.list_by_owner(&owner).await.unwrap();
    assert_eq!(listed[0].file_name, "tie_b.txt");
    assert_eq!(listed[1].file_name, "tie_a.txt");
}

#[tokio::test]
async fn list_is_scoped_to_one_owner() {
    let db = SqliteRegistry::open_in_memory().unwrap();
    let task = OwnerRef::task("t1");
    let goal = OwnerRef::goal("g1");
    // Same id string under a different kind is a different owner.
    let task_like_goal = OwnerRef::goal("t1");

    db.insert(&record(&task, "a.txt", b"a"), Bytes::from_static(b"a"), None)
        .await
        .unwrap();
    db.insert(&record(&goal, "b.txt", b"b"), Bytes::from_static(b"b"), None)
        .await
        .unwrap();

    assert_eq!(db.list_by_owner(&task).await.unwrap().len(), 1);
    assert_eq!(db.list_by_owner(&goal).await.unwrap().len(), 1);
    assert!(db.list_by_owner(&task_like_goal).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_is_idempotent_and_releases_blobs() {
    let db = SqliteRegistry::open_in_memory().unwrap();
    let rec = record(&OwnerRef::event("e1"), "ticket.pdf", b"pdf");
    db.insert(&rec, Bytes::from_static(b"pdf"), None)
        .await
        .unwrap();

    assert!(db.delete(&rec.id).await.unwrap());
    assert!(!db.delete(&rec.id).await.unwrap());

    assert!(matches!(
        db.get(&rec.id).await.unwrap_err(),
        DbError::NotFound(_)
    ));
    assert!(matches!(
        db.read_blob(&rec.id).await.unwrap_err(),
        DbError::NotFound(_)
    ));
}

#[tokio::test]
async fn delete_by_owner_cascades_only_that_owner() {
    let db = SqliteRegistry::open_in_memory().unwrap();
    let doomed = OwnerRef::task("doomed");
    let survivor = OwnerRef::task("survivor");

    for name in ["one.txt", "two.txt", "three.txt"] {
        db.insert(&record(&doomed, name, b"x"), Bytes::from_static(b"x"), None)
            .await
            .unwrap();
    }
    let keep = record(&survivor, "keep.txt", b"k");
    db.insert(&keep, Bytes::from_static(b"k"), None)
        .await
        .unwrap();

    let removed = db.delete_by_owner(&doomed).await.unwrap();
    assert_eq!(removed, 3);
    assert!(db.list_by_owner(&doomed).await.unwrap().is_empty());

    // Repeat cascade is a no-op.
    assert_eq!(db.delete_by_owner(&doomed).await.unwrap(), 0);

    let remaining = db.list_by_owner(&survivor).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(db.read_blob(&keep.id).await.is_ok());
}

#[tokio::test]
async fn id_collision_fails_and_leaves_original_intact() {
    let db = SqliteRegistry::open_in_memory().unwrap();
    let owner = OwnerRef::task("t1");
    let rec = record(&owner, "original.txt", b"original");
    db.insert(&rec, Bytes::from_static(b"original"), None)
        .await
        .unwrap();

    let mut clash = record(&owner, "impostor.txt", b"impostor");
    clash.id = rec.id.clone();
    let err = db
        .insert(&clash, Bytes::from_static(b"impostor"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Internal(_)));

    // The failed insert rolled back as a unit: one record, original bytes.
    let listed = db.list_by_owner(&owner).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_name, "original.txt");
    assert_eq!(db.read_blob(&rec.id).await.unwrap().as_ref(), b"original");
}
