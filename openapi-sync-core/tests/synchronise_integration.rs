use std::path::PathBuf;

use mockall::Sequence;
use serde_json::{json, Value};
use tempfile::tempdir;

use openapi_sync_core::config::{SyncConfig, RAW_CHANGE_DESCRIPTION, TRANSFORMED_CHANGE_DESCRIPTION};
use openapi_sync_core::contract::{MockFetcher, MockRemoteSync, MockVersionedStorage, RecordId};
use openapi_sync_core::error::{FetchError, PublishError, Stage, StorageError, SyncErrorKind};
use openapi_sync_core::synchronise::{synchronise, SyncOutcome};

const URL: &str = "https://api.example.com/openapi.json";

fn upstream_document() -> Value {
    json!({
        "openapi": "3.0.1",
        "paths": {
            "/cameras": { "get": { "tags": ["DenyList"] } },
            "/token": { "post": { "security": [{ "GetToken": [] }] } }
        },
        "components": {
            "securitySchemes": {
                "ApiKey": { "type": "apiKey" },
                "GetToken": { "type": "apiKey", "description": "Token auth" }
            }
        }
    })
}

fn fetcher_returning(doc: Value) -> MockFetcher {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(move |_| Ok(doc.clone()));
    fetcher
}

fn storage_error() -> StorageError {
    StorageError::Command {
        command: "git commit".to_string(),
        code: Some(1),
        stderr: "boom".to_string(),
    }
}

#[tokio::test]
async fn test_unchanged_document_short_circuits_without_commit_or_publish() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());
    let fetcher = fetcher_returning(upstream_document());

    let mut storage = MockVersionedStorage::new();
    let raw_path = config.raw_path();
    storage
        .expect_is_target_changed()
        .withf(move |p| p == raw_path.as_path())
        .times(1)
        .returning(|_| Ok(false));
    // No record_change / publish expectations: any call would panic.
    let remote = MockRemoteSync::new();

    let outcome = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect("Unchanged run should succeed");

    assert_eq!(outcome, SyncOutcome::Unchanged);
    assert!(config.raw_path().exists(), "Raw file is saved before detection");
    assert!(!config.transformed_pretty_path().exists());
    assert!(!config.transformed_compact_path().exists());
}

#[tokio::test]
async fn test_changed_document_commits_and_publishes_raw_then_transformed() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());
    let fetcher = fetcher_returning(upstream_document());

    let mut seq = Sequence::new();
    let mut storage = MockVersionedStorage::new();
    let mut remote = MockRemoteSync::new();

    storage
        .expect_is_target_changed()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(true));

    let raw_path = config.raw_path();
    storage
        .expect_record_change()
        .withf(move |paths, description| {
            paths == [raw_path.clone()] && description == RAW_CHANGE_DESCRIPTION
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(RecordId("aaaaaaaa1111".to_string())));

    remote
        .expect_publish()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));

    let expected_pair: Vec<PathBuf> = vec![
        config.transformed_pretty_path(),
        config.transformed_compact_path(),
    ];
    storage
        .expect_record_change()
        .withf(move |paths, description| {
            paths == expected_pair.as_slice() && description == TRANSFORMED_CHANGE_DESCRIPTION
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(RecordId("bbbbbbbb2222".to_string())));

    remote
        .expect_publish()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));

    let outcome = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect("Changed run should succeed");

    assert_eq!(
        outcome,
        SyncOutcome::Published {
            raw_record: RecordId("aaaaaaaa1111".to_string()),
            transformed_record: RecordId("bbbbbbbb2222".to_string()),
        }
    );

    // Raw artifact: sorted keys, four-space indent.
    let raw = std::fs::read_to_string(config.raw_path()).unwrap();
    assert!(raw.starts_with("{\n    \"components\""), "raw was: {raw}");
    assert!(raw.find("\"/cameras\"").unwrap() < raw.find("\"/token\"").unwrap());

    // Transformed artifacts: /token first, GetToken gone.
    let pretty = std::fs::read_to_string(config.transformed_pretty_path()).unwrap();
    let compact = std::fs::read_to_string(config.transformed_compact_path()).unwrap();
    assert!(pretty.find("\"/token\"").unwrap() < pretty.find("\"/cameras\"").unwrap());
    assert!(!pretty.contains("GetToken"));
    assert!(!compact.contains('\n'));

    let from_pretty: Value = serde_json::from_str(&pretty).unwrap();
    let from_compact: Value = serde_json::from_str(&compact).unwrap();
    assert_eq!(from_pretty, from_compact);
    assert_eq!(
        from_pretty["components"]["securitySchemes"]["ApiKey"]["description"],
        "Token auth"
    );
    assert_eq!(
        from_pretty["paths"]["/cameras"]["get"]["tags"],
        json!(["Deny List"])
    );
    assert_eq!(
        from_pretty["paths"]["/cameras"]["get"]["security"],
        json!([{ "ApiToken": [] }])
    );
}

#[tokio::test]
async fn test_fetch_failure_aborts_before_any_other_stage() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());

    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch().times(1).returning(|url| {
        Err(FetchError::Status {
            url: url.to_string(),
            status: 503,
        })
    });
    let storage = MockVersionedStorage::new();
    let remote = MockRemoteSync::new();

    let err = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect_err("Fetch failure must abort");

    assert_eq!(err.stage, Stage::Fetch);
    assert!(matches!(err.cause, SyncErrorKind::Fetch(FetchError::Status { status: 503, .. })));
    assert!(!config.raw_path().exists());
}

#[tokio::test]
async fn test_malformed_document_is_reported_as_parse_error() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());

    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch().times(1).returning(|url| {
        Err(FetchError::Malformed {
            url: url.to_string(),
            source: serde_json::from_str::<Value>("{not json").unwrap_err(),
        })
    });
    let storage = MockVersionedStorage::new();
    let remote = MockRemoteSync::new();

    let err = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect_err("Malformed document must abort");

    assert_eq!(err.stage, Stage::Fetch);
    assert!(matches!(err.cause, SyncErrorKind::Parse(_)));
}

#[tokio::test]
async fn test_save_failure_aborts_before_detection() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path().join("does-not-exist"));
    let fetcher = fetcher_returning(upstream_document());
    let storage = MockVersionedStorage::new();
    let remote = MockRemoteSync::new();

    let err = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect_err("Save failure must abort");

    assert_eq!(err.stage, Stage::Save);
    assert!(matches!(err.cause, SyncErrorKind::Io { .. }));
}

#[tokio::test]
async fn test_detection_failure_aborts_instead_of_reporting_no_change() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());
    let fetcher = fetcher_returning(upstream_document());

    let mut storage = MockVersionedStorage::new();
    storage
        .expect_is_target_changed()
        .times(1)
        .returning(|p| Err(StorageError::NotARepository(p.to_path_buf())));
    let remote = MockRemoteSync::new();

    let err = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect_err("Storage failure must abort");

    assert_eq!(err.stage, Stage::Detect);
    assert!(matches!(
        err.cause,
        SyncErrorKind::Storage(StorageError::NotARepository(_))
    ));
}

#[tokio::test]
async fn test_raw_commit_failure_aborts_before_publish() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());
    let fetcher = fetcher_returning(upstream_document());

    let mut storage = MockVersionedStorage::new();
    storage.expect_is_target_changed().returning(|_| Ok(true));
    storage
        .expect_record_change()
        .times(1)
        .returning(|_, _| Err(storage_error()));
    let remote = MockRemoteSync::new();

    let err = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect_err("Commit failure must abort");

    assert_eq!(err.stage, Stage::CommitRaw);
    assert!(!config.transformed_pretty_path().exists());
}

#[tokio::test]
async fn test_raw_push_failure_aborts_before_transform() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());
    let fetcher = fetcher_returning(upstream_document());

    let mut storage = MockVersionedStorage::new();
    storage.expect_is_target_changed().returning(|_| Ok(true));
    storage
        .expect_record_change()
        .times(1)
        .returning(|_, _| Ok(RecordId("cafebabe".to_string())));
    let mut remote = MockRemoteSync::new();
    remote.expect_publish().times(1).returning(|| {
        Err(PublishError::Rejected {
            remote: "origin".to_string(),
            branch: "main".to_string(),
            summary: "non-fast-forward".to_string(),
        })
    });

    let err = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect_err("Push failure must abort");

    assert_eq!(err.stage, Stage::PushRaw);
    assert!(matches!(err.cause, SyncErrorKind::Publish(PublishError::Rejected { .. })));
    assert!(!config.transformed_pretty_path().exists());
    assert!(!config.transformed_compact_path().exists());
}

#[tokio::test]
async fn test_transform_write_failure_aborts_before_transformed_commit() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());
    // A directory in place of the output file makes the write fail.
    std::fs::create_dir(config.transformed_pretty_path()).unwrap();
    let fetcher = fetcher_returning(upstream_document());

    let mut storage = MockVersionedStorage::new();
    storage.expect_is_target_changed().returning(|_| Ok(true));
    storage
        .expect_record_change()
        .times(1)
        .returning(|_, _| Ok(RecordId("cafebabe".to_string())));
    let mut remote = MockRemoteSync::new();
    remote.expect_publish().times(1).returning(|| Ok(()));

    let err = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect_err("Transform failure must abort");

    assert_eq!(err.stage, Stage::Transform);
    assert!(matches!(err.cause, SyncErrorKind::Io { .. }));
}

#[tokio::test]
async fn test_transformed_commit_failure_aborts_before_final_publish() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());
    let fetcher = fetcher_returning(upstream_document());

    let mut storage = MockVersionedStorage::new();
    storage.expect_is_target_changed().returning(|_| Ok(true));
    storage
        .expect_record_change()
        .withf(|_, description| description == RAW_CHANGE_DESCRIPTION)
        .times(1)
        .returning(|_, _| Ok(RecordId("cafebabe".to_string())));
    storage
        .expect_record_change()
        .withf(|_, description| description == TRANSFORMED_CHANGE_DESCRIPTION)
        .times(1)
        .returning(|_, _| Err(storage_error()));
    let mut remote = MockRemoteSync::new();
    remote.expect_publish().times(1).returning(|| Ok(()));

    let err = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect_err("Transformed commit failure must abort");

    assert_eq!(err.stage, Stage::CommitTransformed);
}

#[tokio::test]
async fn test_transformed_push_failure_is_terminal() {
    let dir = tempdir().unwrap();
    let config = SyncConfig::new(URL, dir.path());
    let fetcher = fetcher_returning(upstream_document());

    let mut seq = Sequence::new();
    let mut storage = MockVersionedStorage::new();
    storage.expect_is_target_changed().returning(|_| Ok(true));
    storage
        .expect_record_change()
        .times(2)
        .returning(|_, _| Ok(RecordId("cafebabe".to_string())));
    let mut remote = MockRemoteSync::new();
    remote
        .expect_publish()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    remote
        .expect_publish()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Err(PublishError::NoRemote));

    let err = synchronise(&config, &fetcher, &storage, &remote)
        .await
        .expect_err("Final push failure must abort");

    assert_eq!(err.stage, Stage::PushTransformed);
    assert_eq!(err.to_string(), "push_transformed stage failed: publish error: no remote configured");
}
