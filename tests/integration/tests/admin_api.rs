//! Admin API integration tests.

use acct_directory::Primitive;
use acct_integration_tests::{mint_token, TestEnv};
use acct_model::ADMINS_GROUP;
use reqwest::StatusCode;
use serde_json::json;

/// Tests health endpoints.
#[tokio::test]
async fn test_health_endpoints() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    for path in ["/health", "/health/live", "/health/ready"] {
        let response = env.client.get(env.url(path)).send().await?;
        assert!(response.status().is_success(), "{path} should return success");
    }

    Ok(())
}

/// Walks one account through create, list, get, update and delete.
#[tokio::test]
async fn test_account_lifecycle() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let admin = mint_token("boss@corp.io", &[ADMINS_GROUP]);

    let (status, body) = env
        .post(
            "/admin/create-user",
            Some(&admin),
            &json!({"email": "  Jane.Doe@Example.com ", "groups": ["USERS"]}),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "username": "jane.doe@example.com"}));

    let (status, body) = env
        .post(
            "/admin/create-user",
            Some(&admin),
            &json!({"email": "Jane.Doe@Example.com", "groups": ["USERS"]}),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"userExists": true}));
    assert_eq!(env.directory.len(), 1);
    assert_eq!(env.directory.calls_to(Primitive::AddToGroup).len(), 1);

    let (_, body) = env
        .post(
            "/admin/get-user",
            Some(&admin),
            &json!({"username": "jane.doe@example.com"}),
        )
        .await?;
    assert_eq!(body["user"]["enabled"], true);
    assert_eq!(body["user"]["groups"], json!(["USERS"]));

    let (status, body) = env
        .post("/admin/list-users", Some(&admin), &json!({"search": "JANE"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().expect("users array");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "jane.doe@example.com");
    assert_eq!(users[0]["email"], "jane.doe@example.com");
    assert_eq!(users[0]["groups"], json!(["USERS"]));

    let (status, body) = env
        .post(
            "/admin/update-user",
            Some(&admin),
            &json!({
                "username": "jane.doe@example.com",
                "disable": true,
                "addGroups": ["EDITORS"],
                "removeGroups": ["USERS"],
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "groups": ["EDITORS"]}));

    let (status, body) = env
        .post(
            "/admin/get-user",
            Some(&admin),
            &json!({"username": "jane.doe@example.com"}),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["enabled"], false);
    assert_eq!(body["user"]["groups"], json!(["EDITORS"]));

    let (status, body) = env
        .post(
            "/admin/delete-user",
            Some(&admin),
            &json!({"sub": "jane.doe@example.com"}),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "deleted": true}));

    let (_, body) = env
        .post(
            "/admin/get-user",
            Some(&admin),
            &json!({"username": "jane.doe@example.com"}),
        )
        .await?;
    assert_eq!(body, json!({"user": null}));
    assert!(env.directory.is_empty());

    Ok(())
}

/// Tests the delete guard over HTTP.
#[tokio::test]
async fn test_delete_rules() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.seed("boss@corp.io", &[ADMINS_GROUP]);
    env.seed("root@corp.io", &[ADMINS_GROUP]);
    let admin = mint_token("boss@corp.io", &[ADMINS_GROUP]);

    let cases = [
        (
            json!({}),
            StatusCode::BAD_REQUEST,
            json!({"ok": false, "reason": "missing_target"}),
        ),
        (
            json!({"sub": "Boss@Corp.io"}),
            StatusCode::OK,
            json!({"ok": false, "reason": "cannot_delete_self"}),
        ),
        (
            json!({"sub": "root@corp.io"}),
            StatusCode::OK,
            json!({"ok": false, "reason": "target_is_admin"}),
        ),
        (
            json!({"sub": "ghost@corp.io"}),
            StatusCode::OK,
            json!({"ok": true, "deleted": false, "reason": "not_found"}),
        ),
    ];

    for (request, expected_status, expected_body) in cases {
        let (status, body) = env.post("/admin/delete-user", Some(&admin), &request).await?;
        assert_eq!(status, expected_status, "{request}");
        assert_eq!(body, expected_body, "{request}");
    }

    assert_eq!(env.directory.len(), 2);
    Ok(())
}

/// Tests that only administrators get through.
#[tokio::test]
async fn test_authentication() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let (status, body) = env.post("/admin/list-users", None, &json!({})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = env
        .post("/admin/list-users", Some("not-a-jwt"), &json!({}))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let member = mint_token("ann@example.com", &["USERS"]);
    let (status, body) = env
        .post(
            "/admin/create-user",
            Some(&member),
            &json!({"email": "new@example.com"}),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    assert!(env.directory.is_empty());
    Ok(())
}

/// Tests validation errors over HTTP.
#[tokio::test]
async fn test_invalid_email() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let admin = mint_token("boss@corp.io", &[ADMINS_GROUP]);

    let (status, body) = env
        .post("/admin/create-user", Some(&admin), &json!({"email": "nope"}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_email");
    assert_eq!(env.directory.mutation_count(), 0);

    Ok(())
}
