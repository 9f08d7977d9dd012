//! S3 storage integration tests.
//!
//! Run with credentials in the environment:
//!   cargo test -p ppe-storage --test storage_tests -- --ignored

use std::time::Duration;

/// Test S3 connection and bucket access.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_s3_connection() {
    dotenvy::dotenv().ok();

    let client = ppe_storage::S3Client::from_env()
        .await
        .expect("Failed to create S3 client");

    client
        .check_connectivity()
        .await
        .expect("Failed to check S3 connectivity");

    println!("S3 connectivity check passed");
}

/// Test presigned URL generation.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_presigned_url() {
    dotenvy::dotenv().ok();

    let client = ppe_storage::S3Client::from_env()
        .await
        .expect("Failed to create S3 client");

    let url = client
        .frame_url("frame_20240101_000000.jpg", Duration::from_secs(3600))
        .await
        .expect("Failed to generate presigned URL");

    println!("Presigned URL: {}", url);
    assert!(url.contains("X-Amz-Signature"));
}

/// Test frame upload, existence check and delete cycle.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_frame_upload_delete() {
    dotenvy::dotenv().ok();

    let client = ppe_storage::S3Client::from_env()
        .await
        .expect("Failed to create S3 client");

    let key = "frame_integration_test.jpg";

    client
        .upload_frame(key, b"not really a jpeg".to_vec())
        .await
        .expect("Failed to upload frame");

    assert!(client.exists(key).await.expect("Failed to check object"));

    let listed = client
        .list_objects(ppe_storage::FRAME_PREFIX)
        .await
        .expect("Failed to list frames");
    assert!(listed.iter().any(|o| o.key == key));

    client.delete_object(key).await.expect("Failed to delete frame");
    assert!(!client.exists(key).await.expect("Failed to check object"));
}

/// Test writing the violation snapshot to the state bucket.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_violation_snapshot_write() {
    use ppe_models::{EquipmentCategory, EvidenceBatch, EvidenceRecord};

    dotenvy::dotenv().ok();

    let client = ppe_storage::S3Client::from_env()
        .await
        .expect("Failed to create S3 client");

    let batch = EvidenceBatch::new(vec![EvidenceRecord::new(
        "frame_integration_test.jpg".into(),
        [EquipmentCategory::HandCover].into_iter().collect(),
        chrono::Utc::now(),
    )]);

    client
        .write_violation_snapshot(&batch)
        .await
        .expect("Failed to write violation snapshot");
}
