#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{cell, insert_study, lock_study, sample_snapshot, setup_test_db, unlock_study};
use studymdr_core::errors::ExErrorKind;
use studymdr_core::flowchart::{SoAItemType, SoALayout};
use studymdr_core::snapshot::{compute_snapshot_digest, SoASnapshot};
use studymdr_store::snapshot::{
    disconnect_heads, disconnect_soa_snapshot, fetch_snapshot_row, head_version,
    list_snapshot_rows, load_soa_snapshot, save_soa_snapshot, set_head, snapshot_exists,
};

const UID: &str = "Study_000001";

fn save(
    conn: &mut rusqlite::Connection,
    version: u32,
    layout: SoALayout,
    snapshot: &SoASnapshot,
) -> studymdr_store::Result<()> {
    let tx = conn.transaction().unwrap();
    save_soa_snapshot(&tx, UID, version, layout, snapshot)?;
    set_head(&tx, UID, layout, version)?;
    tx.commit().unwrap();
    Ok(())
}

#[test]
fn test_save_refused_for_unlocked_version() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, UID);

    let err = save(&mut conn, 1, SoALayout::Protocol, &sample_snapshot("Weight")).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::IllegalState);
    assert_eq!(err.version(), Some(1));
    assert!(!snapshot_exists(&conn, UID, 1, SoALayout::Protocol).unwrap());
}

#[test]
fn test_saved_snapshot_loads_back_exactly() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, UID);
    lock_study(&mut conn, UID, "v1");

    let snapshot = sample_snapshot("Weight");
    save(&mut conn, 1, SoALayout::Protocol, &snapshot).unwrap();

    assert_eq!(
        load_soa_snapshot(&conn, UID, Some(1), SoALayout::Protocol).unwrap(),
        snapshot
    );
    // Other layouts of the same version are independent keys
    assert!(load_soa_snapshot(&conn, UID, Some(1), SoALayout::Detailed)
        .unwrap()
        .is_empty());

    let row = fetch_snapshot_row(&conn, UID, 1, SoALayout::Protocol).unwrap();
    assert_eq!(row.cell_ref_count, 2);
    assert_eq!(row.footnote_ref_count, 1);
    assert_eq!(row.digest, compute_snapshot_digest(&snapshot).unwrap());
}

#[test]
fn test_hidden_row_flag_survives_reload() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, UID);
    lock_study(&mut conn, UID, "v1");

    let mut snapshot = sample_snapshot("Hidden lab");
    snapshot.cell_references[1].row_hidden = true;
    save(&mut conn, 1, SoALayout::Detailed, &snapshot).unwrap();

    let loaded = load_soa_snapshot(&conn, UID, Some(1), SoALayout::Detailed).unwrap();
    assert!(!loaded.cell_references[0].row_hidden);
    assert!(loaded.cell_references[1].row_hidden);
    assert_eq!(loaded, snapshot);
}

#[test]
fn test_resave_replaces_all_references() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, UID);
    lock_study(&mut conn, UID, "v1");

    save(&mut conn, 1, SoALayout::Detailed, &sample_snapshot("Weight")).unwrap();
    let smaller = SoASnapshot {
        cell_references: vec![cell(0, 1, SoAItemType::StudyEpoch, "E9", "Follow-up")],
        footnote_references: Vec::new(),
    };
    save(&mut conn, 1, SoALayout::Detailed, &smaller).unwrap();

    assert_eq!(
        load_soa_snapshot(&conn, UID, Some(1), SoALayout::Detailed).unwrap(),
        smaller
    );
    assert_eq!(list_snapshot_rows(&conn, UID).unwrap().len(), 1);
    // Replacing the head's snapshot keeps the head
    assert_eq!(head_version(&conn, UID, SoALayout::Detailed).unwrap(), Some(1));
}

#[test]
fn test_empty_snapshot_distinguished_from_missing() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, UID);
    lock_study(&mut conn, UID, "v1");

    save(&mut conn, 1, SoALayout::Operational, &SoASnapshot::default()).unwrap();

    assert!(load_soa_snapshot(&conn, UID, Some(1), SoALayout::Operational)
        .unwrap()
        .is_empty());
    assert!(snapshot_exists(&conn, UID, 1, SoALayout::Operational).unwrap());
    assert!(!snapshot_exists(&conn, UID, 1, SoALayout::Protocol).unwrap());

    let err = fetch_snapshot_row(&conn, UID, 1, SoALayout::Protocol).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_versionless_load_follows_head_until_unlock() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, UID);
    lock_study(&mut conn, UID, "v1");
    save(&mut conn, 1, SoALayout::Protocol, &sample_snapshot("Weight")).unwrap();

    assert_eq!(
        load_soa_snapshot(&conn, UID, None, SoALayout::Protocol).unwrap(),
        sample_snapshot("Weight")
    );

    unlock_study(&mut conn, UID);
    assert_eq!(disconnect_heads(&conn, UID).unwrap(), 1);
    assert!(load_soa_snapshot(&conn, UID, None, SoALayout::Protocol)
        .unwrap()
        .is_empty());
    // The historical version is untouched
    assert_eq!(
        load_soa_snapshot(&conn, UID, Some(1), SoALayout::Protocol).unwrap(),
        sample_snapshot("Weight")
    );

    lock_study(&mut conn, UID, "v2");
    save(&mut conn, 2, SoALayout::Protocol, &sample_snapshot("Body weight")).unwrap();
    assert_eq!(head_version(&conn, UID, SoALayout::Protocol).unwrap(), Some(2));
    assert_eq!(
        load_soa_snapshot(&conn, UID, None, SoALayout::Protocol).unwrap(),
        sample_snapshot("Body weight")
    );
    assert_eq!(
        load_soa_snapshot(&conn, UID, Some(1), SoALayout::Protocol).unwrap(),
        sample_snapshot("Weight")
    );
}

#[test]
fn test_disconnect_snapshot_removes_key_and_head() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, UID);
    lock_study(&mut conn, UID, "v1");
    save(&mut conn, 1, SoALayout::Protocol, &sample_snapshot("Weight")).unwrap();

    let tx = conn.transaction().unwrap();
    assert!(disconnect_soa_snapshot(&tx, UID, 1, SoALayout::Protocol).unwrap());
    assert!(!disconnect_soa_snapshot(&tx, UID, 1, SoALayout::Protocol).unwrap());
    tx.commit().unwrap();

    assert!(!snapshot_exists(&conn, UID, 1, SoALayout::Protocol).unwrap());
    assert_eq!(head_version(&conn, UID, SoALayout::Protocol).unwrap(), None);
    assert!(load_soa_snapshot(&conn, UID, Some(1), SoALayout::Protocol)
        .unwrap()
        .is_empty());
}

#[test]
fn test_failed_save_leaves_previous_snapshot() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, UID);
    lock_study(&mut conn, UID, "v1");
    save(&mut conn, 1, SoALayout::Protocol, &sample_snapshot("Weight")).unwrap();

    {
        let tx = conn.transaction().unwrap();
        save_soa_snapshot(&tx, UID, 1, SoALayout::Protocol, &SoASnapshot::default()).unwrap();
        // Head for a version without snapshot fails; transaction rolls back on drop
        assert!(set_head(&tx, UID, SoALayout::Protocol, 9).is_err());
    }

    assert_eq!(
        load_soa_snapshot(&conn, UID, Some(1), SoALayout::Protocol).unwrap(),
        sample_snapshot("Weight")
    );
}
