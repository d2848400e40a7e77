//! Read-only sessions and connection failures

mod common;

use common::*;
use duckframe::{query_with, EngineError, SessionConfig, Sources};
use tempfile::tempdir;

const SEED: &str = "CREATE TABLE items (id INTEGER, label VARCHAR); \
                    INSERT INTO items VALUES (1, 'one'), (2, 'two');";

fn readonly() -> duckframe::SessionConfigBuilder {
    SessionConfig::builder().readonly(true)
}

#[test]
fn test_reads_succeed_on_readonly_store() {
    let dir = tempdir().unwrap();
    let path = create_store(&dir, "ro.duckdb", SEED);

    let result = query_with(path.as_path(), "SELECT * FROM items ORDER BY id", readonly()).unwrap();
    assert_eq!(result.row_count(), 2);
    assert_eq!(text(&result, 1, "label"), "two");
}

#[test]
fn test_writes_fail_on_readonly_store() {
    let dir = tempdir().unwrap();
    let path = create_store(&dir, "ro.duckdb", SEED);

    for sql in [
        "INSERT INTO items VALUES (3, 'three')",
        "UPDATE items SET label = 'uno' WHERE id = 1",
        "CREATE TABLE more_items (id INTEGER)",
    ] {
        let result = query_with(path.as_path(), sql, readonly());
        assert!(result.is_err(), "{} should fail on a read-only store", sql);
    }

    let after = query_with(path.as_path(), "SELECT label FROM items ORDER BY id", readonly())
        .unwrap();
    assert_eq!(text(&after, 0, "label"), "one");
}

#[test]
fn test_attached_store_is_readonly() {
    let dir = tempdir().unwrap();
    let path = create_store(&dir, "attached.duckdb", SEED);
    let sources = Sources::new().with("shop", path);

    let read = query_with(sources.clone(), "SELECT COUNT(*) AS n FROM shop.items", readonly())
        .unwrap();
    assert_eq!(int(&read, 0, "n"), 2);

    let write = query_with(sources, "INSERT INTO shop.items VALUES (9, 'nine')", readonly());
    assert!(write.is_err());
}

#[test]
fn test_readonly_has_no_effect_in_memory() {
    let statements = vec![
        "CREATE TABLE scratch (x INTEGER)",
        "INSERT INTO scratch VALUES (1), (2), (3)",
        "SELECT SUM(x) AS total FROM scratch",
    ];

    let with = query_with(":memory:", statements.clone(), readonly()).unwrap();
    let without = query_with(":memory:", statements, SessionConfig::builder()).unwrap();

    assert_eq!(with, without);
    assert_eq!(int(&with, 0, "total"), 6);
}

#[test]
fn test_missing_file_readonly_is_connection_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.duckdb");

    let err = query_with(missing.as_path(), "SELECT 1", readonly()).unwrap_err();
    assert!(matches!(err, EngineError::SourceUnavailable(_)), "{}", err);
    assert!(!missing.exists());
}

#[test]
fn test_corrupt_file_is_connection_error() {
    let dir = tempdir().unwrap();
    let junk = create_junk_file(dir.path(), "junk.duckdb");

    for options in [readonly(), SessionConfig::builder()] {
        let err = query_with(junk.as_path(), "SELECT 1", options).unwrap_err();
        assert!(matches!(err, EngineError::Open { .. }), "{}", err);
    }
}
