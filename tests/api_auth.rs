mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use common::{TestApp, anonymous_json, message};

#[tokio::test]
async fn register_is_open_only_until_first_user() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let creds = json!({"username": "admin", "password": "s3cret!"});

    let (status, body) = app
        .send(anonymous_json(Method::POST, "/api/auth/register", creds))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message(&body), "User registered successfully");

    let (status, _) = app
        .send(anonymous_json(
            Method::POST,
            "/api/auth/register",
            json!({"username": "intruder", "password": "123456"}),
        ))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(app.json(
            Method::POST,
            "/api/auth/register",
            json!({"username": "admin", "password": "another1"}),
        ))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Username already exists");

    let (status, body) = app
        .send(app.json(
            Method::POST,
            "/api/auth/register",
            json!({"username": "editor", "password": "123"}),
        ))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Password must be at least 6 characters long");
    Ok(())
}

#[tokio::test]
async fn login_issues_token_and_cookie_then_logout_revokes() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    app.send(anonymous_json(
        Method::POST,
        "/api/auth/register",
        json!({"username": "admin", "password": "s3cret!"}),
    ))
    .await?;

    let (status, _) = app
        .send(anonymous_json(
            Method::POST,
            "/api/auth/login",
            json!({"username": "admin", "password": "wrong-password"}),
        ))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let resp = tower::ServiceExt::oneshot(
        app.router.clone(),
        anonymous_json(
            Method::POST,
            "/api/auth/login",
            json!({"username": "admin", "password": "s3cret!"}),
        ),
    )
    .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("edupanel_session="), "{cookie}");
    assert!(cookie.contains("HttpOnly"));

    let bytes = http_body_util::BodyExt::collect(resp.into_body())
        .await?
        .to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["username"], "admin");

    let by_cookie = Request::builder()
        .uri("/api/books")
        .header(header::COOKIE, format!("edupanel_session={token}"))
        .body(Body::empty())?;
    let (status, _) = app.send(by_cookie).await?;
    assert_eq!(status, StatusCode::OK);

    let logout = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/logout")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let (status, _) = app.send(logout).await?;
    assert_eq!(status, StatusCode::OK);

    let after = Request::builder()
        .uri("/api/books")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let (status, _) = app.send(after).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn reads_require_a_session_too() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let req = Request::builder()
        .uri("/api/courses/all")
        .header(header::AUTHORIZATION, "Bearer not-a-real-token")
        .body(Body::empty())?;
    let (status, body) = app.send(req).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(message(&body), "Unauthorized");
    Ok(())
}

#[tokio::test]
async fn healthz_is_public() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let req = Request::builder().uri("/healthz").body(Body::empty())?;
    let (status, body) = app.send(req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok\n"));
    Ok(())
}
