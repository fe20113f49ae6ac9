//! Google Calendar bridge tests, run against a fake provider.

mod support;

use axum::http::{header::LOCATION, StatusCode};
use serde_json::json;
use std::sync::atomic::Ordering;
use tower::ServiceExt;

use lawdesk_server::repos::IntegrationStore;
use support::*;

const ALICE: &str = "alice";
const BOB: &str = "bob";
const AARON: &str = "aaron";
const ALICE_EMAIL: &str = "alice@lawfirm.example";

/// Run the OAuth callback and return status and Location header
async fn callback(app: &axum::Router, query: &str) -> (StatusCode, Option<String>) {
    let response = app
        .clone()
        .oneshot(make_request(
            "GET",
            &format!("/api/calendar/callback{}", query),
            None,
            None,
        ))
        .await
        .unwrap();

    let location = response
        .headers()
        .get(LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    (response.status(), location)
}

/// Callback query carrying `code` and a valid state for `user_id`
fn granted(code: &str, user_id: &str) -> String {
    format!("?code={}&state={}", code, oauth_state_for(user_id))
}

async fn fetch_events(app: &axum::Router, user_id: &str) -> (StatusCode, serde_json::Value) {
    send(
        app,
        make_request(
            "POST",
            "/api/calendar/events",
            Some(&token_for(user_id)),
            Some(json!({ "user_id": user_id })),
        ),
    )
    .await
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_auth_url_requires_session() {
    let env = TestEnv::new();
    let app = env.app();

    let (status, _) = send(&app, make_request("GET", "/api/calendar/auth", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        make_request("GET", "/api/calendar/auth", Some(&token_for(ALICE)), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let auth_url = body["authUrl"].as_str().unwrap();
    assert!(auth_url.contains("access_type=offline"));

    // The state handed to Google identifies the caller
    let state = local_uri(auth_url)
        .split("state=")
        .nth(1)
        .unwrap()
        .to_string();
    assert_eq!(
        lawdesk_server::security::verify_oauth_state(
            &state,
            TEST_SECRET,
            chrono::Utc::now().timestamp(),
            600
        ),
        Some(ALICE.to_string())
    );
}

#[tokio::test]
async fn test_callback_stores_tokens_and_redirects() {
    let env = TestEnv::new();
    let app = env.app();

    seed(&app, ALICE, "profiles", profile_row(ALICE, ALICE_EMAIL)).await;
    env.calendar.set_account_email(ALICE_EMAIL);

    let (status, location) = callback(&app, &granted("xyz", ALICE)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        location.as_deref(),
        Some("http://localhost:5173/calendar?google_auth_success=true")
    );

    let integration = env.state().integrations.get(ALICE).await.unwrap().unwrap();
    assert_eq!(integration.google_access_token.as_deref(), Some("access-xyz"));
    assert_eq!(integration.google_refresh_token.as_deref(), Some("refresh-xyz"));
}

#[tokio::test]
async fn test_callback_for_unknown_account_stores_nothing() {
    let env = TestEnv::new();
    let app = env.app();

    seed(&app, ALICE, "profiles", profile_row(ALICE, ALICE_EMAIL)).await;
    env.calendar.set_account_email("stranger@example.com");

    let (status, location) = callback(&app, &granted("xyz", ALICE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(location.is_none());

    assert!(env.state().integrations.get(ALICE).await.unwrap().is_none());
}

#[tokio::test]
async fn test_callback_rejects_denied_or_missing_code() {
    let env = TestEnv::new();
    let app = env.app();

    let (status, _) = callback(&app, "?error=access_denied").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = callback(&app, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = callback(&app, "?code=xyz").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = callback(&app, &granted("bad-code", ALICE)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_callback_rejects_forged_state() {
    let env = TestEnv::new();
    let app = env.app();

    seed(&app, ALICE, "profiles", profile_row(ALICE, ALICE_EMAIL)).await;
    env.calendar.set_account_email(ALICE_EMAIL);

    let forged = lawdesk_server::security::issue_oauth_state(
        ALICE,
        chrono::Utc::now().timestamp() + 300,
        "wrong-secret",
    );
    let (status, _) = callback(&app, &format!("?code=xyz&state={}", forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A session token is not an OAuth state
    let (status, _) = callback(&app, &format!("?code=xyz&state={}", token_for(ALICE))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(env.state().integrations.get(ALICE).await.unwrap().is_none());
}

#[tokio::test]
async fn test_tokens_never_land_on_another_account() {
    let env = TestEnv::new();
    let app = env.app();

    seed(&app, ALICE, "profiles", profile_row(ALICE, ALICE_EMAIL)).await;

    // Aaron cannot put Alice's address on his profile
    let (status, _) = send(
        &app,
        make_request(
            "PUT",
            "/api/collections/profiles",
            Some(&token_for(AARON)),
            Some(profile_row(AARON, ALICE_EMAIL)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    seed(&app, AARON, "profiles", profile_row(AARON, "aaron@lawfirm.example")).await;

    // Aaron starting the flow but consenting with Alice's Google account
    env.calendar.set_account_email(ALICE_EMAIL);
    let (status, _) = callback(&app, &granted("stolen", AARON)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(env.state().integrations.get(AARON).await.unwrap().is_none());
    assert!(env.state().integrations.get(ALICE).await.unwrap().is_none());

    // Alice connecting stores the tokens on her account only
    let (status, _) = callback(&app, &granted("alicegrant", ALICE)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let alice = env.state().integrations.get(ALICE).await.unwrap().unwrap();
    assert_eq!(alice.google_refresh_token.as_deref(), Some("refresh-alicegrant"));
    assert!(env.state().integrations.get(AARON).await.unwrap().is_none());
}

// =============================================================================
// Events
// =============================================================================

#[tokio::test]
async fn test_events_refresh_before_every_fetch() {
    let env = TestEnv::new();
    let app = env.app();
    env.state()
        .integrations
        .store_tokens(ALICE, "stale", Some("refresh-token"))
        .await
        .unwrap();

    let (status, body) = fetch_events(&app, ALICE).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], "google-evt1");
    assert_eq!(events[0]["title"], "Hearing: Smith v. Jones");
    assert_eq!(events[0]["backgroundColor"], "#4285F4");
    assert_eq!(events[0]["extendedProps"]["type"], "google");

    fetch_events(&app, ALICE).await;

    assert_eq!(env.calendar.refresh_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        env.calendar.listed_with(),
        vec!["refreshed-1".to_string(), "refreshed-2".to_string()]
    );

    let integration = env.state().integrations.get(ALICE).await.unwrap().unwrap();
    assert_eq!(integration.google_access_token.as_deref(), Some("refreshed-2"));
    assert_eq!(integration.google_refresh_token.as_deref(), Some("refresh-token"));
}

#[tokio::test]
async fn test_events_without_refresh_token_use_stored_token() {
    let env = TestEnv::new();
    let app = env.app();
    env.state()
        .integrations
        .store_tokens(ALICE, "access", None)
        .await
        .unwrap();

    let (status, _) = fetch_events(&app, ALICE).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(env.calendar.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(env.calendar.listed_with(), vec!["access".to_string()]);
}

#[tokio::test]
async fn test_failed_refresh_disconnects() {
    let env = TestEnv::new();
    let app = env.app();
    env.state()
        .integrations
        .store_tokens(ALICE, "access", Some("revoked"))
        .await
        .unwrap();
    env.calendar.fail_refresh.store(true, Ordering::SeqCst);

    let (status, body) = fetch_events(&app, ALICE).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("reconnect"));
    assert!(env.calendar.listed_with().is_empty());

    let integration = env.state().integrations.get(ALICE).await.unwrap().unwrap();
    assert!(integration.google_access_token.is_none());
    assert!(integration.google_refresh_token.is_none());

    // Nothing left to fetch with until the user reconnects
    let (status, _) = fetch_events(&app, ALICE).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_events_for_other_user_are_rejected() {
    let env = TestEnv::new();
    let app = env.app();
    env.state()
        .integrations
        .store_tokens(BOB, "access", None)
        .await
        .unwrap();

    let (status, _) = send(
        &app,
        make_request(
            "POST",
            "/api/calendar/events",
            Some(&token_for(ALICE)),
            Some(json!({ "user_id": BOB })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(env.calendar.listed_with().is_empty());
}

#[tokio::test]
async fn test_events_without_integration_not_found() {
    let env = TestEnv::new();
    let (status, _) = fetch_events(&env.app(), ALICE).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_disconnect_clears_tokens() {
    let env = TestEnv::new();
    let app = env.app();
    let token = token_for(ALICE);

    let (status, _) = send(
        &app,
        make_request("DELETE", "/api/calendar/integration", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    env.state()
        .integrations
        .store_tokens(ALICE, "access", Some("refresh"))
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        make_request("DELETE", "/api/calendar/integration", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Google Calendar disconnected");

    let integration = env.state().integrations.get(ALICE).await.unwrap().unwrap();
    assert!(integration.google_access_token.is_none());
    assert!(integration.google_refresh_token.is_none());
}
