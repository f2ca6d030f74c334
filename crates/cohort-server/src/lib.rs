//! HTTP server wiring for the cohort tracker: configuration loading and the
//! top-level router.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use axum::Router;
use cohort_api::{ApiState, ProgramConfig, api_router};
use cohort_core::store::CohortStore;
use config::{ConfigBuilder, builder::DefaultState};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/cohort/cohort.db") }

/// Runtime server configuration, deserialised from `config.toml` and
/// `COHORT_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// argon2 PHC string. Empty disables the admin view.
  #[serde(default)]
  pub admin_password_hash: String,
  pub program:             ProgramConfig,
}

impl ServerConfig {
  /// Read `path` (if it exists) and overlay the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      config::Config::builder().add_source(config::File::from(path).required(false)),
    )
  }

  /// Nested keys use a double underscore, e.g. `COHORT_PROGRAM__START`.
  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .add_source(
        config::Environment::with_prefix("COHORT")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api`, with request tracing.
pub fn app<S>(state: ApiState<S>) -> Router
where
  S: CohortStore + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use chrono::NaiveDate;
  use cohort_api::AdminGate;
  use cohort_store_sqlite::SqliteStore;
  use config::FileFormat;
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> anyhow::Result<ServerConfig> {
    ServerConfig::from_builder(
      config::Config::builder().add_source(config::File::from_str(toml, FileFormat::Toml)),
    )
  }

  #[test]
  fn minimal_config_uses_defaults() {
    let cfg = parse(
      r#"
      [program]
      start = "2026-02-23"
      "#,
    )
    .unwrap();

    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert!(cfg.admin_password_hash.is_empty());
    assert_eq!(cfg.program.start, NaiveDate::from_ymd_opt(2026, 2, 23).unwrap());
    assert_eq!(cfg.program.fine_per_miss, 10_000);
    assert!(cfg.program.pinned_today.is_none());
  }

  #[test]
  fn holidays_and_rates_are_read() {
    let cfg = parse(
      r#"
      port = 9000
      store_path = "/var/lib/cohort.db"

      [program]
      start = "2026-02-23"
      fine_per_miss = 5000
      utc_offset_minutes = 540

      [program.holidays]
      "2026-03-01" = "Independence Movement Day"
      "#,
    )
    .unwrap();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/cohort.db"));
    assert_eq!(cfg.program.fine_per_miss, 5000);
    assert_eq!(cfg.program.utc_offset_minutes, 540);
    assert_eq!(
      cfg.program.holidays.name(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
      Some("Independence Movement Day")
    );
  }

  #[test]
  fn program_start_is_required() {
    assert!(parse("port = 9000").is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let home = std::env::var("HOME").unwrap();
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let program = ProgramConfig::new(NaiveDate::from_ymd_opt(2026, 2, 23).unwrap());
    let state = ApiState::new(store, program, AdminGate { password_hash: String::new() });
    let app = app(state);

    let req = Request::builder()
      .method("POST")
      .uri("/api/session")
      .header("content-type", "application/json")
      .body(Body::from(r#"{"username":"jun"}"#))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder().uri("/session").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
