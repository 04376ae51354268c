#![allow(clippy::unwrap_used)]

use crate::{
    api::{auth::EMAIL_HEADER, router},
    errors::Result,
    test_utils::{RecordingMailer, setup_test_db, test_state},
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    email: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(email) = email {
        builder = builder.header(EMAIL_HEADER, email);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn app_with_user(email: &str) -> Result<Router> {
    let db = setup_test_db().await?;
    let app = router(test_state(db, Arc::new(RecordingMailer::new()), None));
    let (status, _) = send(&app, Method::POST, "/api/auth/signin", Some(email), None).await;
    assert_eq!(status, StatusCode::OK);
    Ok(app)
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let db = setup_test_db().await?;
    let app = router(test_state(db, Arc::new(RecordingMailer::new()), None));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_requests_without_identity_are_unauthorized() -> Result<()> {
    let app = app_with_user("someone@example.com").await?;

    let (status, body) = send(&app, Method::GET, "/api/user", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));
    Ok(())
}

#[tokio::test]
async fn test_unknown_user_is_not_found() -> Result<()> {
    let app = app_with_user("known@example.com").await?;

    let stranger = Some("stranger@example.com");
    let (status, _) = send(&app, Method::GET, "/api/folder", stranger, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_user_profile_and_key_status() -> Result<()> {
    let email = "profile@example.com";
    let app = app_with_user(email).await?;

    let patch = json!({
        "name": "Pat",
        "aiKeys": { "openai": "sk-live" },
        "settings": { "monthlyBudget": 3000.0, "fixedExpenses": [], "currency": "$" }
    });
    let (status, user) = send(&app, Method::PATCH, "/api/user", Some(email), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["name"], "Pat");
    assert_eq!(user["settings"]["monthlyBudget"], 3000.0);
    assert!(user.get("aiKeys").is_none());

    let (status, keys) =
        send(&app, Method::GET, "/api/user/ai-keys/status", Some(email), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(keys["openai"], true);
    assert_eq!(keys["anthropic"], false);

    let bad = json!({ "settings": { "monthlyBudget": -5.0 } });
    let (status, _) = send(&app, Method::PATCH, "/api/user", Some(email), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_folder_page_entry_flow() -> Result<()> {
    let email = "flow@example.com";
    let app = app_with_user(email).await?;

    let (status, folder) = send(
        &app,
        Method::POST,
        "/api/folder",
        Some(email),
        Some(json!({ "name": "Trips" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(folder["order"], 0);
    let folder_id = folder["id"].as_i64().unwrap();

    let (status, page) = send(
        &app,
        Method::POST,
        "/api/page",
        Some(email),
        Some(json!({ "title": "Lisbon", "folderId": folder_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(page["days"].as_array().unwrap().len(), 7);
    let page_id = page["id"].as_i64().unwrap();

    let entry_uri = format!("/api/page/{page_id}/day/2/entry");
    let (status, created) = send(
        &app,
        Method::POST,
        &entry_uri,
        Some(email),
        Some(json!({ "title": "Tram", "amount": 3.5, "category": "Transport" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let entry_id = created["entry"]["_id"].as_str().unwrap().to_string();
    assert_eq!(created["page"]["days"][1]["entries"][0]["title"], "Tram");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/page/{page_id}/day/8/entry"),
        Some(email),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        &entry_uri,
        Some(email),
        Some(json!({ "amount": -1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, page) = send(
        &app,
        Method::PATCH,
        &format!("/api/page/{page_id}/day/2/entry/{entry_id}"),
        Some(email),
        Some(json!({ "amount": 4.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["days"][1]["entries"][0]["amount"], 4.0);

    let (status, listed) = send(
        &app,
        Method::GET,
        &format!("/api/page?folderId={folder_id}"),
        Some(email),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/folder/{folder_id}"),
        Some(email),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let page_uri = format!("/api/page/{page_id}");
    let (status, _) = send(&app, Method::GET, &page_uri, Some(email), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_weekly_summary_without_data() -> Result<()> {
    let email = "summary@example.com";
    let app = app_with_user(email).await?;

    let (status, summary) = send(
        &app,
        Method::POST,
        "/api/ai/summary/weekly",
        Some(email),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["type"], "weekly");
    assert_eq!(summary["totalSpent"], 0.0);
    assert_eq!(summary["id"], Value::Null);

    let (status, listed) =
        send(&app, Method::GET, "/api/ai/summary/weekly", Some(email), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_daily_summary_rejects_unknown_provider() -> Result<()> {
    let email = "provider@example.com";
    let app = app_with_user(email).await?;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/ai/summary/daily",
        Some(email),
        Some(json!({ "provider": "cohere" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_daily_summary_rejects_malformed_body() -> Result<()> {
    let email = "malformed@example.com";
    let app = app_with_user(email).await?;

    for body in [
        json!({ "pageId": "12", "provider": "openai" }),
        json!({ "pageId": 999, "dayIndex": "two" }),
    ] {
        let (status, error) = send(
            &app,
            Method::POST,
            "/api/ai/summary/daily",
            Some(email),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["error"].as_str().unwrap().contains("Invalid JSON body"));
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/ai/summary/daily")
        .header(EMAIL_HEADER, email)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"pageId\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_summary_without_body_uses_defaults() -> Result<()> {
    let email = "nobody@example.com";
    let app = app_with_user(email).await?;

    let (status, summary) = send(
        &app,
        Method::POST,
        "/api/ai/summary/weekly",
        Some(email),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["type"], "weekly");
    Ok(())
}

#[tokio::test]
async fn test_cron_requires_configured_secret() -> Result<()> {
    let db = setup_test_db().await?;
    let unprotected = router(test_state(db.clone(), Arc::new(RecordingMailer::new()), None));
    let protected = router(test_state(db, Arc::new(RecordingMailer::new()), Some("s3cret")));

    let request = |token: Option<&str>| {
        let mut builder = Request::builder().uri("/api/cron/weekly-email");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    };

    let response = unprotected.oneshot(request(Some("anything"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = protected.clone().oneshot(request(Some("wrong"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = protected.oneshot(request(Some("s3cret"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({
            "message": "Weekly emails processed",
            "results": { "total": 0, "success": 0, "failed": 0, "errors": [] }
        })
    );
    Ok(())
}
