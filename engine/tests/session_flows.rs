//! End-to-end flows of a media session against in-memory remote stores.

mod common;

use casa_engine::{
    storage, Error, Gallery, MediaId, MediaKind, MediaRecord, MediaRepository, MediaSession,
    NoticeLevel, MAX_FEATURED,
};
use common::{files, FakeBlobs, FakeRepo, BASE_URL, BUCKET};
use std::sync::Arc;

type Session = MediaSession<Arc<FakeRepo>, Arc<FakeBlobs>>;

const PROPERTY: &str = "prop-1";

fn stored_row(repo: &FakeRepo, blobs: &FakeBlobs, sort_order: i64) -> MediaRecord {
    let row = repo.seed(PROPERTY, MediaKind::Image, sort_order);
    if let Some(path) = storage::path_from_public_url(&row.url, BUCKET) {
        blobs.put(&path);
    }
    row
}

async fn open_with_images(count: i64) -> (Session, Arc<FakeRepo>, Arc<FakeBlobs>) {
    let repo = FakeRepo::shared();
    let blobs = FakeBlobs::shared();
    for order in 1..=count {
        stored_row(&repo, &blobs, order);
    }
    let session = MediaSession::open(Some(PROPERTY.to_string()), repo.clone(), blobs.clone())
        .await
        .unwrap();
    (session, repo, blobs)
}

fn image_ids(session: &Session) -> Vec<String> {
    session
        .gallery()
        .records(MediaKind::Image)
        .iter()
        .map(|r| r.id.as_str().to_string())
        .collect()
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn upload_orders_after_remote_rows_missing_locally() {
    let repo = FakeRepo::shared();
    let blobs = FakeBlobs::shared();
    // Rows written by another editor; this session's mirror never saw them.
    for order in 1..=3 {
        repo.seed(PROPERTY, MediaKind::Image, order);
    }
    let mut session = MediaSession::new(
        Gallery::new(Some(PROPERTY.to_string())),
        repo.clone(),
        blobs.clone(),
    );

    let summary = session
        .upload(MediaKind::Image, files(&["a.jpg", "b.jpg", "c.jpg"]))
        .await;

    let orders: Vec<i64> = summary.added.iter().map(|r| r.sort_order).collect();
    assert_eq!(orders, vec![4, 5, 6]);
    assert!(summary.failed.is_empty());
    assert!(summary.added.iter().all(MediaRecord::is_persisted));

    let mut remote: Vec<i64> = repo.rows().iter().map(|r| r.sort_order).collect();
    remote.sort_unstable();
    assert_eq!(remote, vec![1, 2, 3, 4, 5, 6]);

    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "3 images added");
    assert!(!session.gallery().has_pending());
    session.gallery().check_invariants().unwrap();
}

#[tokio::test]
async fn upload_without_property_keeps_records_local() {
    let repo = FakeRepo::shared();
    let blobs = FakeBlobs::shared();
    let mut session = MediaSession::open(None, repo.clone(), blobs.clone())
        .await
        .unwrap();

    let summary = session
        .upload(MediaKind::Floorplan, files(&["ground floor.png"]))
        .await;

    assert_eq!(summary.added.len(), 1);
    let record = &summary.added[0];
    assert!(record.id.is_temporary());
    assert!(record.id.as_str().starts_with("temp-"));
    assert_eq!(record.property_id, None);
    assert_eq!(record.sort_order, 1);
    assert!(repo.calls().is_empty());

    let paths = blobs.paths();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].starts_with("temp/"));
    assert!(record.url.starts_with(BASE_URL));
    assert_eq!(session.take_notices()[0].message, "1 floorplan added");
}

#[tokio::test]
async fn upload_skips_failed_files_and_reports_them() {
    let (mut session, _repo, blobs) = open_with_images(0).await;
    blobs.fail_next("upload", 1);

    let summary = session
        .upload(MediaKind::Image, files(&["broken.jpg", "ok.jpg"]))
        .await;

    assert_eq!(summary.added.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].filename, "broken.jpg");
    assert_eq!(session.gallery().len(MediaKind::Image), 1);

    let levels: Vec<NoticeLevel> = session.take_notices().iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NoticeLevel::Error, NoticeLevel::Success]);
}

#[tokio::test]
async fn failed_insert_removes_uploaded_file() {
    let (mut session, repo, blobs) = open_with_images(0).await;
    repo.fail_next("insert", 1);

    let summary = session
        .upload(MediaKind::Image, files(&["first.jpg", "second.jpg"]))
        .await;

    assert_eq!(summary.added.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(blobs.paths().len(), 1);
    assert_eq!(repo.rows().len(), 1);
    assert!(!session.gallery().has_pending());
}

#[tokio::test]
async fn empty_batch_warns() {
    let (mut session, _repo, _blobs) = open_with_images(0).await;
    let summary = session.upload(MediaKind::Image, Vec::new()).await;

    assert!(summary.added.is_empty());
    let notices = session.take_notices();
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert_eq!(notices[0].message, "No files added");
}

// ============================================================================
// Remove
// ============================================================================

#[tokio::test]
async fn removing_main_image_clears_pointer() {
    let repo = FakeRepo::shared();
    let blobs = FakeBlobs::shared();
    let mut main = stored_row(&repo, &blobs, 1);
    main.is_main = true;
    let other = stored_row(&repo, &blobs, 2);
    let mut session = MediaSession::new(
        Gallery::from_records(Some(PROPERTY.to_string()), vec![main.clone(), other.clone()]),
        repo.clone(),
        blobs.clone(),
    );
    assert_eq!(session.gallery().main_image_url(), Some(main.url.as_str()));

    let removed = session.remove(MediaKind::Image, 0).await.unwrap();

    assert_eq!(removed.id, main.id);
    assert_eq!(session.gallery().main_image_url(), None);
    assert_eq!(image_ids(&session), vec![other.id.as_str().to_string()]);
    assert!(repo.row(main.id.as_str()).is_none());
    assert_eq!(blobs.paths().len(), 1);
}

#[tokio::test]
async fn removing_other_image_keeps_main() {
    let repo = FakeRepo::shared();
    let blobs = FakeBlobs::shared();
    let mut main = stored_row(&repo, &blobs, 1);
    main.is_main = true;
    let other = stored_row(&repo, &blobs, 2);
    let mut session = MediaSession::new(
        Gallery::from_records(Some(PROPERTY.to_string()), vec![main.clone(), other]),
        repo,
        blobs,
    );

    session.remove(MediaKind::Image, 1).await.unwrap();
    assert_eq!(session.gallery().main_image_url(), Some(main.url.as_str()));
}

#[tokio::test]
async fn failed_delete_leaves_state_untouched() {
    let (mut session, repo, blobs) = open_with_images(3).await;
    let before = session.gallery().export_state();
    let paths_before = blobs.paths();
    repo.fail_next("delete_by_id", 1);

    let result = session.remove(MediaKind::Image, 1).await;

    assert!(matches!(result, Err(Error::Remote(_))));
    assert_eq!(session.gallery().export_state(), before);
    assert_eq!(blobs.paths(), paths_before);
    assert_eq!(repo.rows().len(), 3);

    let notices = session.take_notices();
    assert_eq!(notices.last().map(|n| n.level), Some(NoticeLevel::Error));
}

#[tokio::test]
async fn remove_row_deleted_elsewhere_still_removes_locally() {
    let (mut session, repo, blobs) = open_with_images(2).await;
    let gone = session.gallery().get(MediaKind::Image, 0).unwrap().clone();
    let gone_id = gone.id.server_id().unwrap().to_string();
    repo.delete_by_id(&gone_id).await.unwrap();

    let removed = session.remove(MediaKind::Image, 0).await.unwrap();

    assert_eq!(removed.id, gone.id);
    assert_eq!(session.gallery().len(MediaKind::Image), 1);
    assert!(session.gallery().pending().is_empty());
    assert_eq!(blobs.paths().len(), 1);
    assert_eq!(
        session.take_notices().last().map(|n| n.level),
        Some(NoticeLevel::Success)
    );
}

#[tokio::test]
async fn remove_out_of_range_is_rejected() {
    let (mut session, repo, _blobs) = open_with_images(1).await;
    let calls = repo.calls();

    let result = session.remove(MediaKind::Image, 5).await;
    assert!(matches!(
        result,
        Err(Error::IndexOutOfRange { index: 5, len: 1, .. })
    ));
    assert_eq!(repo.calls(), calls);
}

#[tokio::test]
async fn remove_without_server_id_looks_up_by_url() {
    let repo = FakeRepo::shared();
    let blobs = FakeBlobs::shared();
    let row = stored_row(&repo, &blobs, 1);
    // A record that was inserted remotely but never got its id back.
    let local = MediaRecord::local(row.url.clone(), MediaKind::Image, 1, 42);
    let mut session = MediaSession::new(
        Gallery::from_records(Some(PROPERTY.to_string()), vec![local]),
        repo.clone(),
        blobs.clone(),
    );

    session.remove(MediaKind::Image, 0).await.unwrap();

    assert!(repo.rows().is_empty());
    assert!(blobs.paths().is_empty());
    assert!(session.gallery().is_empty());
}

#[tokio::test]
async fn duplicate_url_matches_refuse_to_delete() {
    let repo = FakeRepo::shared();
    let blobs = FakeBlobs::shared();
    let row = stored_row(&repo, &blobs, 1);
    let mut twin = row.clone();
    twin.id = MediaId::Persisted("row-twin".into());
    twin.sort_order = 2;
    repo.seed_record(twin);

    let local = MediaRecord::local(row.url.clone(), MediaKind::Image, 1, 42);
    let mut session = MediaSession::new(
        Gallery::from_records(Some(PROPERTY.to_string()), vec![local]),
        repo.clone(),
        blobs,
    );
    let before = session.gallery().export_state();

    let result = session.remove(MediaKind::Image, 0).await;

    assert!(matches!(result, Err(Error::DuplicateUrl { count: 2, .. })));
    assert_eq!(repo.rows().len(), 2);
    assert_eq!(session.gallery().export_state(), before);
}

// ============================================================================
// Main image and featured set
// ============================================================================

#[tokio::test]
async fn set_main_moves_flag_remotely_and_locally() {
    let (mut session, repo, _blobs) = open_with_images(3).await;
    session.set_main(0).await.unwrap();
    session.set_main(2).await.unwrap();

    let ids = image_ids(&session);
    let main_rows: Vec<String> = repo
        .rows()
        .into_iter()
        .filter(|r| r.is_main)
        .map(|r| r.id.as_str().to_string())
        .collect();
    assert_eq!(main_rows, vec![ids[2].clone()]);
    assert_eq!(
        session.gallery().main_image().map(|r| r.id.as_str()),
        Some(ids[2].as_str())
    );
    session.gallery().check_invariants().unwrap();
}

#[tokio::test]
async fn failed_mark_main_restores_previous_main() {
    let (mut session, repo, _blobs) = open_with_images(2).await;
    session.set_main(0).await.unwrap();
    let ids = image_ids(&session);
    repo.fail_next("mark_main", 1);

    let result = session.set_main(1).await;

    assert!(result.is_err());
    assert_eq!(repo.row(&ids[0]).map(|r| r.is_main), Some(true));
    assert_eq!(repo.row(&ids[1]).map(|r| r.is_main), Some(false));
    assert_eq!(
        session.gallery().main_image().map(|r| r.id.as_str()),
        Some(ids[0].as_str())
    );
    assert!(!session.gallery().has_pending());

    let calls = repo.calls();
    let tail: Vec<&str> = calls[calls.len() - 3..].to_vec();
    assert_eq!(tail, vec!["clear_main", "mark_main", "mark_main"]);
}

#[tokio::test]
async fn set_main_rejects_unsaved_records_on_saved_property() {
    let repo = FakeRepo::shared();
    let local = MediaRecord::local("https://api.test/x.jpg", MediaKind::Image, 1, 7);
    let mut session = MediaSession::new(
        Gallery::from_records(Some(PROPERTY.to_string()), vec![local]),
        repo.clone(),
        FakeBlobs::shared(),
    );

    assert!(matches!(session.set_main(0).await, Err(Error::NotPersisted(_))));
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn featured_cap_blocks_fifth_without_remote_call() {
    let (mut session, repo, _blobs) = open_with_images(6).await;
    for index in 0..MAX_FEATURED {
        assert!(session.toggle_featured(index).await.unwrap());
    }
    let featured_before = session.gallery().export_state().featured_images;
    let calls_before = repo.calls();
    session.take_notices();

    let result = session.toggle_featured(4).await;

    assert_eq!(result, Err(Error::FeaturedLimit { limit: MAX_FEATURED }));
    assert_eq!(repo.calls(), calls_before);
    assert_eq!(session.gallery().export_state().featured_images, featured_before);
    let notices = session.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
}

#[tokio::test]
async fn unfeaturing_removes_exactly_that_image() {
    let (mut session, repo, _blobs) = open_with_images(5).await;
    for index in 0..MAX_FEATURED {
        session.toggle_featured(index).await.unwrap();
    }
    let before: Vec<String> = session
        .gallery()
        .featured_urls()
        .into_iter()
        .map(str::to_owned)
        .collect();

    assert!(!session.toggle_featured(1).await.unwrap());

    let after: Vec<String> = session
        .gallery()
        .featured_urls()
        .into_iter()
        .map(str::to_owned)
        .collect();
    let expected: Vec<String> = before
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 1)
        .map(|(_, url)| url.clone())
        .collect();
    assert_eq!(after, expected);
    assert_eq!(repo.rows().iter().filter(|r| r.is_featured).count(), 3);

    // With a slot free again, the fifth image can be featured.
    assert!(session.toggle_featured(4).await.unwrap());
    assert_eq!(session.gallery().featured_count(), MAX_FEATURED);
}

#[tokio::test]
async fn failed_toggle_keeps_flag() {
    let (mut session, repo, _blobs) = open_with_images(1).await;
    repo.fail_next("set_featured", 1);

    assert!(session.toggle_featured(0).await.is_err());
    assert_eq!(session.gallery().featured_count(), 0);
    assert!(!session.gallery().has_pending());
}

// ============================================================================
// Reorder
// ============================================================================

#[tokio::test]
async fn reorder_persists_new_positions() {
    let (mut session, repo, _blobs) = open_with_images(3).await;
    let ids = image_ids(&session);

    session.reorder(MediaKind::Image, 2, 0).await.unwrap();

    assert_eq!(
        image_ids(&session),
        vec![ids[2].clone(), ids[0].clone(), ids[1].clone()]
    );
    assert_eq!(repo.row(&ids[2]).map(|r| r.sort_order), Some(1));
    assert_eq!(repo.row(&ids[0]).map(|r| r.sort_order), Some(2));
    assert_eq!(repo.row(&ids[1]).map(|r| r.sort_order), Some(3));
    session.gallery().check_invariants().unwrap();
}

#[tokio::test]
async fn failed_reorder_reloads_remote_order() {
    let (mut session, repo, _blobs) = open_with_images(3).await;
    let ids = image_ids(&session);
    repo.fail_next("set_sort_order", 1);

    assert!(session.reorder(MediaKind::Image, 0, 2).await.is_err());

    assert_eq!(image_ids(&session), ids);
    assert!(!session.gallery().has_pending());
}

// ============================================================================
// Attach on first save
// ============================================================================

#[tokio::test]
async fn attach_replaces_temporary_ids() {
    let repo = FakeRepo::shared();
    let blobs = FakeBlobs::shared();
    let mut session = MediaSession::open(None, repo.clone(), blobs.clone())
        .await
        .unwrap();
    session
        .upload(MediaKind::Image, files(&["a.jpg", "b.jpg"]))
        .await;
    session
        .upload(MediaKind::Floorplan, files(&["plan.pdf"]))
        .await;
    let temporaries: Vec<MediaId> = session
        .gallery()
        .all_records()
        .map(|r| r.id.clone())
        .collect();

    // Someone else already attached an image to the freshly saved row.
    repo.seed("prop-9", MediaKind::Image, 1);
    let summary = session.attach_to_property("prop-9").await;

    assert_eq!(summary.attached.len(), 3);
    assert!(summary.failed.is_empty());
    let replaced: Vec<MediaId> = summary.attached.iter().map(|(t, _)| t.clone()).collect();
    assert_eq!(replaced, temporaries);
    assert!(session.gallery().all_records().all(MediaRecord::is_persisted));
    assert_eq!(session.gallery().property_id(), Some("prop-9"));
    session.gallery().check_invariants().unwrap();

    let mut image_orders: Vec<i64> = repo
        .rows()
        .iter()
        .filter(|r| r.kind == MediaKind::Image)
        .map(|r| r.sort_order)
        .collect();
    image_orders.sort_unstable();
    assert_eq!(image_orders, vec![1, 2, 3]);
}

#[tokio::test]
async fn attach_failures_keep_temporary_ids() {
    let repo = FakeRepo::shared();
    let mut session = MediaSession::open(None, repo.clone(), FakeBlobs::shared())
        .await
        .unwrap();
    session
        .upload(MediaKind::Image, files(&["a.jpg", "b.jpg"]))
        .await;
    repo.fail_next("insert", 1);

    let summary = session.attach_to_property(PROPERTY).await;

    assert_eq!(summary.attached.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    let temporary = session
        .gallery()
        .all_records()
        .filter(|r| r.id.is_temporary())
        .count();
    assert_eq!(temporary, 1);
    session.gallery().check_invariants().unwrap();
    assert_eq!(
        session.take_notices().last().map(|n| n.level),
        Some(NoticeLevel::Error)
    );
}

#[tokio::test]
async fn attach_again_persists_records_left_over() {
    let repo = FakeRepo::shared();
    let mut session = MediaSession::open(None, repo.clone(), FakeBlobs::shared())
        .await
        .unwrap();
    session
        .upload(MediaKind::Image, files(&["a.jpg", "b.jpg"]))
        .await;
    repo.fail_next("insert", 1);

    let first = session.attach_to_property(PROPERTY).await;
    assert_eq!(first.failed.len(), 1);
    assert!(session.has_unattached());

    let second = session.attach_to_property(PROPERTY).await;

    assert_eq!(second.attached.len(), 1);
    assert!(second.failed.is_empty());
    assert!(!session.has_unattached());
    assert!(session.gallery().all_records().all(MediaRecord::is_persisted));
    session.gallery().check_invariants().unwrap();

    let mut orders: Vec<i64> = repo.rows().iter().map(|r| r.sort_order).collect();
    orders.sort_unstable();
    assert_eq!(orders, vec![1, 2]);
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn refresh_picks_up_changes_from_another_session() {
    let repo = FakeRepo::shared();
    let blobs = FakeBlobs::shared();
    stored_row(&repo, &blobs, 1);

    let mut mine = MediaSession::open(Some(PROPERTY.to_string()), repo.clone(), blobs.clone())
        .await
        .unwrap();
    let mut theirs = MediaSession::open(Some(PROPERTY.to_string()), repo.clone(), blobs.clone())
        .await
        .unwrap();

    theirs
        .upload(MediaKind::Image, files(&["new.jpg"]))
        .await;
    theirs.remove(MediaKind::Image, 0).await.unwrap();

    let result = mine.refresh().await.unwrap();
    assert_eq!(result.added.len(), 1);
    assert_eq!(result.dropped.len(), 1);
    assert_eq!(mine.gallery().export_state(), theirs.gallery().export_state());
}

#[tokio::test]
async fn refresh_without_property_is_noop() {
    let mut session = MediaSession::open(None, FakeRepo::shared(), FakeBlobs::shared())
        .await
        .unwrap();
    assert!(session.refresh().await.unwrap().is_noop());
}
