//! Router tests against an in-memory SQLite store with a frozen "today".

use argon2::{Argon2, PasswordHasher as _, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::NaiveDate;
use cohort_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AdminGate, ApiState, ProgramConfig, api_router};

const ADMIN_PASSWORD: &str = "open sesame";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Program starts Monday 2026-02-23; today is Wednesday 2026-03-04.
async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();

  let mut program = ProgramConfig::new(d(2026, 2, 23));
  program.pinned_today = Some(d(2026, 3, 4));
  program.holidays.insert(d(2026, 3, 3), "Founders' Day");

  let salt = SaltString::generate(&mut OsRng);
  let password_hash = Argon2::default()
    .hash_password(ADMIN_PASSWORD.as_bytes(), &salt)
    .unwrap()
    .to_string();

  api_router(ApiState::new(store, program, AdminGate { password_hash }))
}

async fn call(
  app: &Router,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let req = match body {
    Some(v) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(v.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

/// Log in and return `(token, participant_id)`.
async fn login(app: &Router, username: &str) -> (String, String) {
  let (status, body) =
    call(app, "POST", "/session", None, Some(json!({ "username": username }))).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  (
    body["token"].as_str().unwrap().to_owned(),
    body["participant"]["participant_id"].as_str().unwrap().to_owned(),
  )
}

async fn submit(app: &Router, token: &str, date: &str, kind: &str) {
  let (status, body) = call(
    app,
    "PUT",
    "/submissions",
    Some(token),
    Some(json!({ "date": date, "kind": kind })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
}

fn cell<'a>(grid: &'a Value, date: &str) -> &'a Value {
  grid["weeks"]
    .as_array()
    .unwrap()
    .iter()
    .flat_map(|w| w.as_array().unwrap())
    .find(|c| c["date"] == date)
    .unwrap_or_else(|| panic!("{date} not in grid"))
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_registers_once_then_reuses_participant() {
  let app = app().await;
  let (t1, id1) = login(&app, "minji").await;
  let (t2, id2) = login(&app, " minji ").await;

  assert_eq!(id1, id2);
  assert_ne!(t1, t2);

  let (status, list) = call(&app, "GET", "/participants", Some(&t1), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blank_username_is_rejected() {
  let app = app().await;
  let (status, body) =
    call(&app, "POST", "/session", None, Some(json!({ "username": "   " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_or_unknown_token_is_unauthorized() {
  let app = app().await;

  let req = Request::builder().uri("/community").body(Body::empty()).unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert_eq!(resp.headers()[header::WWW_AUTHENTICATE], "Bearer");

  let (status, _) = call(&app, "GET", "/community", Some("forged"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_token() {
  let app = app().await;
  let (token, id) = login(&app, "jun").await;

  let (status, body) = call(&app, "GET", "/session", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["participant"]["participant_id"], id);
  assert_eq!(body["admin_unlocked"], false);

  let (status, _) = call(&app, "DELETE", "/session", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = call(&app, "GET", "/session", Some(&token), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Participants ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_participant_is_not_found() {
  let app = app().await;
  let (token, _) = login(&app, "jun").await;
  let uri = format!("/participants/{}", uuid::Uuid::new_v4());
  let (status, _) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_update_and_taken_name() {
  let app = app().await;
  login(&app, "ahn").await;
  let (token, _) = login(&app, "kim").await;

  let (status, body) = call(
    &app,
    "PATCH",
    "/participants/me",
    Some(&token),
    Some(json!({ "username": "kimmy", "avatar": "🦔" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["username"], "kimmy");
  assert_eq!(body["avatar"], "🦔");

  let (status, _) = call(
    &app,
    "PATCH",
    "/participants/me",
    Some(&token),
    Some(json!({ "username": "ahn" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

// ─── Submissions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_replaces_and_delete_removes() {
  let app = app().await;
  let (token, id) = login(&app, "jun").await;

  let (status, first) = call(
    &app,
    "PUT",
    "/submissions",
    Some(&token),
    Some(json!({ "date": "2026-03-02", "kind": "journal" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["link"], "completed");

  let (_, second) = call(
    &app,
    "PUT",
    "/submissions",
    Some(&token),
    Some(json!({ "date": "2026-03-02", "kind": "journal", "link": "https://blog.example/1" })),
  )
  .await;
  assert_eq!(second["submission_id"], first["submission_id"]);
  assert_eq!(second["link"], "https://blog.example/1");

  let uri = format!("/participants/{id}/submissions");
  let (_, list) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(list.as_array().unwrap().len(), 1);

  let (status, _) =
    call(&app, "DELETE", "/submissions/2026-03-02/journal", Some(&token), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) =
    call(&app, "DELETE", "/submissions/2026-03-02/journal", Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submission_before_program_start_is_refused() {
  let app = app().await;
  let (token, _) = login(&app, "jun").await;
  let (status, _) = call(
    &app,
    "PUT",
    "/submissions",
    Some(&token),
    Some(json!({ "date": "2026-02-20", "kind": "journal" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn amount_only_on_account_ledger() {
  let app = app().await;
  let (token, _) = login(&app, "jun").await;

  let (status, _) = call(
    &app,
    "PUT",
    "/submissions",
    Some(&token),
    Some(json!({ "date": "2026-03-02", "kind": "journal", "amount": 5000 })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, body) = call(
    &app,
    "PUT",
    "/submissions",
    Some(&token),
    Some(json!({ "date": "2026-03-02", "kind": "account", "amount": 5000 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["amount"], 5000);
}

// ─── Progress ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fine_reflects_current_column_flag() {
  let app = app().await;
  let (token, id) = login(&app, "jun").await;

  // Monday to Thursday complete, Friday empty.
  for date in ["2026-02-23", "2026-02-24", "2026-02-25", "2026-02-26"] {
    for kind in ["journal", "account", "thread", "mate"] {
      submit(&app, &token, date, kind).await;
    }
  }

  let uri = format!("/participants/{id}/fine?on=2026-03-02");
  let (status, report) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["week_start"], "2026-02-23");
  assert_eq!(report["total_misses"], 4);
  assert_eq!(report["amount"], 40_000);

  let (status, _) = call(
    &app,
    "PUT",
    "/participants/me/column",
    Some(&token),
    Some(json!({ "enabled": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, report) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(report["required_per_day"], 5);
  assert_eq!(report["amount"], 90_000);
}

#[tokio::test]
async fn fine_defaults_to_today() {
  let app = app().await;
  let (token, id) = login(&app, "jun").await;

  // Today is 2026-03-04, so the evaluated week is the first program week.
  let uri = format!("/participants/{id}/fine");
  let (_, report) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(report["week_start"], "2026-02-23");
  assert_eq!(report["amount"], 200_000);
}

#[tokio::test]
async fn weekday_holiday_is_still_fined() {
  let app = app().await;
  let (token, id) = login(&app, "jun").await;

  // 2026-03-03 is a configured holiday inside the evaluated week.
  let uri = format!("/participants/{id}/fine?on=2026-03-09");
  let (status, report) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["week_start"], "2026-03-02");
  let days: Vec<_> = report["days"]
    .as_array()
    .unwrap()
    .iter()
    .map(|d| d["date"].as_str().unwrap())
    .collect();
  assert!(days.contains(&"2026-03-03"), "{days:?}");
  assert_eq!(report["amount"], 200_000);
}

#[tokio::test]
async fn fine_at_the_start_of_time_is_bad_request() {
  let app = app().await;
  let (token, id) = login(&app, "jun").await;

  let uri = format!("/participants/{id}/fine?on=-262143-01-03");
  let (status, body) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  // The router keeps serving afterwards.
  let (status, _) = call(&app, "GET", "/session", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn calendar_classifies_cells() {
  let app = app().await;
  let (token, id) = login(&app, "jun").await;

  for kind in ["journal", "account", "thread", "mate"] {
    submit(&app, &token, "2026-03-02", kind).await;
  }

  let uri = format!("/participants/{id}/calendar/2026/3");
  let (status, grid) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(grid["required"], 4);

  assert_eq!(cell(&grid, "2026-03-01")["state"], "rest_day");
  assert_eq!(cell(&grid, "2026-03-02")["state"], "complete");
  assert_eq!(cell(&grid, "2026-03-03")["state"], "rest_day");
  assert_eq!(cell(&grid, "2026-03-03")["holiday"], "Founders' Day");
  assert_eq!(cell(&grid, "2026-03-04")["state"], "upcoming");
  assert_eq!(cell(&grid, "2026-03-05")["state"], "upcoming");

  submit(&app, &token, "2026-03-04", "journal").await;
  submit(&app, &token, "2026-03-04", "thread").await;
  let (_, grid) = call(&app, "GET", &uri, Some(&token), None).await;
  let today = cell(&grid, "2026-03-04");
  assert_eq!(today["state"], "partial");
  assert_eq!(today["band"], "half");

  let (_, feb) =
    call(&app, "GET", &format!("/participants/{id}/calendar/2026/2"), Some(&token), None).await;
  assert_eq!(cell(&feb, "2026-02-20")["state"], "locked");
  assert_eq!(cell(&feb, "2026-02-27")["state"], "missing");
}

#[tokio::test]
async fn calendar_rejects_invalid_month() {
  let app = app().await;
  let (token, id) = login(&app, "jun").await;
  let uri = format!("/participants/{id}/calendar/2026/13");
  let (status, _) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn daily_status_lists_every_kind() {
  let app = app().await;
  let (token, id) = login(&app, "jun").await;
  submit(&app, &token, "2026-03-04", "journal").await;

  let uri = format!("/participants/{id}/status");
  let (status, body) = call(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["date"], "2026-03-04");
  assert_eq!(body["required"], 4);

  let kinds = body["kinds"].as_array().unwrap();
  assert_eq!(kinds.len(), 5);
  assert_eq!(kinds[0], json!({ "kind": "journal", "status": "done" }));
  assert_eq!(kinds[1], json!({ "kind": "account", "status": "missing" }));
  assert_eq!(kinds[4], json!({ "kind": "column", "status": "not_required" }));
}

#[tokio::test]
async fn community_lists_viewer_first() {
  let app = app().await;
  let (seo, _) = login(&app, "seo").await;
  login(&app, "ahn").await;
  let (kim, _) = login(&app, "kim").await;
  submit(&app, &seo, "2026-03-04", "journal").await;

  let (status, body) = call(&app, "GET", "/community", Some(&kim), None).await;
  assert_eq!(status, StatusCode::OK);
  let names: Vec<_> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["username"].as_str().unwrap())
    .collect();
  assert_eq!(names, ["kim", "ahn", "seo"]);

  let submitted: Vec<_> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["has_submitted_today"].as_bool().unwrap())
    .collect();
  assert_eq!(submitted, [false, false, true]);

  // Yesterday nobody had logged anything.
  let (_, body) = call(&app, "GET", "/community?on=2026-03-03", Some(&kim), None).await;
  assert!(body.as_array().unwrap().iter().all(|e| e["has_submitted_today"] == false));
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_require_unlock() {
  let app = app().await;
  let (admin, _) = login(&app, "admin").await;
  let (other, other_id) = login(&app, "jun").await;
  submit(&app, &other, "2026-03-02", "journal").await;

  let (status, _) = call(&app, "GET", "/admin/submissions", Some(&admin), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(
    &app,
    "POST",
    "/session/admin",
    Some(&admin),
    Some(json!({ "password": "wrong" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = call(
    &app,
    "POST",
    "/session/admin",
    Some(&admin),
    Some(json!({ "password": ADMIN_PASSWORD })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["admin_unlocked"], true);

  let (status, records) =
    call(&app, "GET", "/admin/submissions?limit=10", Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(records[0]["username"], "jun");

  // Unlocking is per session.
  let (status, _) = call(&app, "GET", "/admin/submissions", Some(&other), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let uri = format!("/participants/{other_id}");
  let (status, _) = call(&app, "DELETE", &uri, Some(&admin), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&app, "DELETE", &uri, Some(&admin), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = call(&app, "GET", "/session", Some(&other), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}
