//! Integration tests against a live platform project
//!
//! These tests need `VMS_PLATFORM__URL` and `VMS_PLATFORM__ANON_KEY` pointing
//! at a project with the visitor desk schema, so they are ignored by default:
//! `cargo test -p common -- --ignored`.

use common::{AppConfig, PlatformClient, Query};

#[tokio::test]
#[ignore]
async fn test_platform_integration() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let client = PlatformClient::new(&config.platform)?;

    assert!(client.health_check().await?, "Platform health check failed");

    let departments: Vec<serde_json::Value> = client
        .fetch_all(&Query::table("departments").select("id,name").limit(5))
        .await?;
    assert!(departments.len() <= 5, "Limit was not applied");

    let total = client.count(&Query::table("visits")).await?;
    let cancelled = client
        .count(&Query::table("visits").eq("status", "cancelled"))
        .await?;
    assert!(cancelled <= total, "Filtered count exceeds total");

    let missing = client
        .fetch_one::<serde_json::Value>(&Query::table("visits").eq("id", uuid::Uuid::nil()))
        .await;
    assert!(
        missing.is_err_and(|e| e.is_not_found()),
        "Missing visit was not reported as not found"
    );

    client
        .delete(&Query::table("visits").eq("id", uuid::Uuid::nil()))
        .await?;

    Ok(())
}
