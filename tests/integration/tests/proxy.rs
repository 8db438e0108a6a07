//! Remote dispatch integration tests.

use acct_admin_api::Operation;
use acct_integration_tests::{mint_token, TestEnv, JWT_SECRET};
use acct_model::ADMINS_GROUP;
use acct_server::ServerConfig;
use reqwest::StatusCode;
use serde_json::json;

/// Starts a front server that forwards list-users to `backend`.
async fn front_for(backend: &TestEnv) -> anyhow::Result<TestEnv> {
    let mut config = ServerConfig::for_testing(JWT_SECRET);
    config
        .remote_urls
        .insert(Operation::ListUsers, backend.url(Operation::ListUsers.path()));
    TestEnv::with_config(config).await
}

/// The remote response comes back byte for byte.
#[tokio::test]
async fn test_remote_response_is_relayed() -> anyhow::Result<()> {
    let backend = TestEnv::new().await?;
    backend.seed("remote@corp.io", &["USERS"]);
    let front = front_for(&backend).await?;
    let admin = mint_token("boss@corp.io", &[ADMINS_GROUP]);

    let direct = backend
        .client
        .post(backend.url("/admin/list-users"))
        .bearer_auth(&admin)
        .json(&json!({}))
        .send()
        .await?;
    let direct_status = direct.status();
    let direct_bytes = direct.bytes().await?;

    let relayed = front
        .client
        .post(front.url("/admin/list-users"))
        .bearer_auth(&admin)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(relayed.status(), direct_status);
    assert_eq!(
        relayed
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(relayed.bytes().await?, direct_bytes);

    assert!(front.directory.calls().is_empty());
    Ok(())
}

/// Remote errors are relayed, not rewritten.
#[tokio::test]
async fn test_remote_errors_are_relayed() -> anyhow::Result<()> {
    let backend = TestEnv::new().await?;
    let front = front_for(&backend).await?;

    let (status, body) = front.post("/admin/list-users", None, &json!({})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
    assert!(backend.directory.calls().is_empty());
    assert!(front.directory.calls().is_empty());

    Ok(())
}

/// Operations without a remote URL still run locally.
#[tokio::test]
async fn test_other_operations_stay_local() -> anyhow::Result<()> {
    let backend = TestEnv::new().await?;
    let front = front_for(&backend).await?;
    let admin = mint_token("boss@corp.io", &[ADMINS_GROUP]);

    let (status, body) = front
        .post(
            "/admin/create-user",
            Some(&admin),
            &json!({"email": "local@example.com"}),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "local@example.com");

    assert!(front.directory.account("local@example.com").is_some());
    assert!(backend.directory.is_empty());
    Ok(())
}

/// Stopping a server ends serving.
#[tokio::test]
async fn test_stop_closes_listener() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.stop();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let result = env.client.get(env.url("/health")).send().await;
    assert!(result.is_err());
    Ok(())
}
