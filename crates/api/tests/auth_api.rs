//! HTTP-level integration tests for registration, login, token refresh,
//! logout and admin user management.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, delete_auth, expect_status, get_auth, post_json, post_json_auth,
    put_json_auth, user_with_token, TEST_PASSWORD,
};
use placement_core::roles::Role;
use sqlx::PgPool;

async fn login(app: axum::Router, username: &str, password: &str) -> axum::response::Response {
    post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "username": username, "password": password }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn register_returns_tokens_for_self_service_role(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "gulf_sponsor",
        "email": "Sponsor@Example.com",
        "password": "a-long-enough-password",
        "role": "sponsor",
        "company_name": "Gulf Homes"
    });
    let json = expect_status(
        post_json(app, "/api/v1/auth/register", body).await,
        StatusCode::CREATED,
    )
    .await;

    assert!(json["data"]["access_token"].is_string());
    assert!(json["data"]["refresh_token"].is_string());
    assert_eq!(json["data"]["user"]["role"], "sponsor");
    assert_eq!(json["data"]["user"]["email"], "sponsor@example.com");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_admin_role(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "sneaky",
        "email": "sneaky@example.com",
        "password": "a-long-enough-password",
        "role": "admin"
    });
    let json = expect_status(
        post_json(app, "/api/v1/auth/register", body).await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "agent_one",
        "email": "agent@example.com",
        "password": "short",
        "role": "agent"
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_duplicate_username_is_conflict(pool: PgPool) {
    create_user(&pool, "taken", Role::Agent).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "taken",
        "email": "other@example.com",
        "password": "a-long-enough-password",
        "role": "agent"
    });
    let json = expect_status(
        post_json(app, "/api/v1/auth/register", body).await,
        StatusCode::CONFLICT,
    )
    .await;
    assert_eq!(json["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Login, lockout, refresh, logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn login_success_returns_token_pair(pool: PgPool) {
    let user = create_user(&pool, "recruiter", Role::Recruitment).await;
    let app = common::build_test_app(pool);

    let json = expect_status(login(app, "recruiter", TEST_PASSWORD).await, StatusCode::OK).await;

    assert!(json["data"]["expires_in"].is_number());
    assert_eq!(json["data"]["user"]["id"], user.id);
    assert_eq!(json["data"]["user"]["role"], "recruitment");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_wrong_password_and_unknown_user_are_401(pool: PgPool) {
    create_user(&pool, "agent", Role::Agent).await;
    let app = common::build_test_app(pool);

    let response = login(app.clone(), "agent", "wrong-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(app, "ghost", "whatever").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn five_failures_lock_the_account(pool: PgPool) {
    create_user(&pool, "forgetful", Role::Agent).await;
    let app = common::build_test_app(pool);

    for _ in 0..5 {
        let response = login(app.clone(), "forgetful", "wrong-password").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked.
    let json = expect_status(
        login(app, "forgetful", TEST_PASSWORD).await,
        StatusCode::FORBIDDEN,
    )
    .await;
    assert!(json["error"].as_str().unwrap().contains("locked"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_rotates_the_token(pool: PgPool) {
    create_user(&pool, "rotator", Role::Sponsor).await;
    let app = common::build_test_app(pool);

    let json = expect_status(
        login(app.clone(), "rotator", TEST_PASSWORD).await,
        StatusCode::OK,
    )
    .await;
    let refresh_token = json["data"]["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let refreshed = expect_status(
        post_json(app.clone(), "/api/v1/auth/refresh", body.clone()).await,
        StatusCode::OK,
    )
    .await;
    assert_ne!(refreshed["data"]["refresh_token"], refresh_token.as_str());

    // The old token was revoked by the rotation.
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn logout_revokes_refresh_tokens(pool: PgPool) {
    create_user(&pool, "leaver", Role::Agent).await;
    let app = common::build_test_app(pool);

    let json = expect_status(
        login(app.clone(), "leaver", TEST_PASSWORD).await,
        StatusCode::OK,
    )
    .await;
    let access = json["data"]["access_token"].as_str().unwrap();
    let refresh_token = json["data"]["refresh_token"].as_str().unwrap();

    let response = common::post_auth(app.clone(), "/api/v1/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(app, "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn me_returns_profile_with_role_name(pool: PgPool) {
    let (user, token) = user_with_token(&pool, "whoami", Role::Agent).await;
    let app = common::build_test_app(pool);

    let json = expect_status(get_auth(app, "/api/v1/auth/me", &token).await, StatusCode::OK).await;

    assert_eq!(json["data"]["id"], user.id);
    assert_eq!(json["data"]["role"], "agent");
    assert!(json["data"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn garbage_token_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get_auth(app, "/api/v1/auth/me", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn non_admin_cannot_list_users(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "plain", Role::Sponsor).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/admin/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_creates_lists_and_updates_users(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "root", Role::Admin).await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "username": "new_agent",
        "email": "new_agent@example.com",
        "password": "a-long-enough-password",
        "role_id": 4
    });
    let created = expect_status(
        post_json_auth(app.clone(), "/api/v1/admin/users", body, &admin_token).await,
        StatusCode::CREATED,
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["role"], "agent");

    let listed = expect_status(
        get_auth(app.clone(), "/api/v1/admin/users?role_id=4", &admin_token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(listed["data"]["total"], 1);

    let update = serde_json::json!({ "company_name": "Manila Staffing" });
    let updated = expect_status(
        put_json_auth(app, &format!("/api/v1/admin/users/{id}"), update, &admin_token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["data"]["company_name"], "Manila Staffing");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deactivated_user_cannot_log_in(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "root", Role::Admin).await;
    let target = create_user(&pool, "soon_gone", Role::Agent).await;
    let app = common::build_test_app(pool);

    let response = delete_auth(
        app.clone(),
        &format!("/api/v1/admin/users/{}", target.id),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = login(app, "soon_gone", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_cannot_deactivate_self(pool: PgPool) {
    let (admin, admin_token) = user_with_token(&pool, "root", Role::Admin).await;
    let app = common::build_test_app(pool);

    let response =
        delete_auth(app, &format!("/api/v1/admin/users/{}", admin.id), &admin_token).await;
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_lists_seeded_roles(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "root", Role::Admin).await;
    let app = common::build_test_app(pool);

    let json = expect_status(
        get_auth(app, "/api/v1/admin/roles", &admin_token).await,
        StatusCode::OK,
    )
    .await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["admin", "sponsor", "recruitment", "agent"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn role_change_is_reflected_immediately(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "root", Role::Admin).await;
    let target = create_user(&pool, "switcher", Role::Agent).await;
    let app = common::build_test_app(pool);

    let update = serde_json::json!({ "role_id": 3 });
    let updated = expect_status(
        put_json_auth(
            app,
            &format!("/api/v1/admin/users/{}", target.id),
            update,
            &admin_token,
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["data"]["role"], "recruitment");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn login_records_client_details_on_the_session(pool: PgPool) {
    let user = create_user(&pool, "traveller", Role::Sponsor).await;
    let app = common::build_test_app(pool.clone());

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .header("user-agent", "placement-mobile/2.1")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(axum::body::Body::from(
            serde_json::json!({ "username": "traveller", "password": TEST_PASSWORD }).to_string(),
        ))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (user_agent, ip): (Option<String>, Option<String>) = sqlx::query_as(
        "SELECT user_agent, ip_address FROM user_sessions WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(user_agent.as_deref(), Some("placement-mobile/2.1"));
    assert_eq!(ip.as_deref(), Some("203.0.113.7"));
}
