//! Shared fixtures for unit tests: settings, token minting and a recording audit sink.

use std::io;
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use crate::config::{Config, JwtSettings};
use crate::services::auth::audit::{AuditSink, AuthorizationDecision};
use crate::services::auth::{Identity, TokenValidator};
use crate::state::AppState;

pub const SIGNING_KEY: &str = "k1";
pub const ISSUER: &str = "https://issuer";
pub const AUDIENCE: &str = "gw";
pub const SUBJECT: &str = "user-123";

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        issuer: ISSUER.to_string(),
        audience: AUDIENCE.to_string(),
        signing_key: SIGNING_KEY.to_string(),
    }
}

pub fn config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_ISSUER" => Some(ISSUER.to_string()),
        "JWT_AUDIENCE" => Some(AUDIENCE.to_string()),
        "JWT_SIGNING_KEY" => Some(SIGNING_KEY.to_string()),
        _ => None,
    })
    .expect("test config")
}

pub fn validator() -> TokenValidator {
    TokenValidator::new(&jwt_settings())
}

pub fn state(audit: RecordingAuditSink) -> AppState {
    AppState::new(
        Arc::new(validator()),
        crate::api::route_scopes().expect("route scopes"),
        Arc::new(audit),
    )
}

pub fn claims(scope: &str, exp: i64) -> Value {
    json!({
        "sub": SUBJECT,
        "exp": exp,
        "iss": ISSUER,
        "aud": AUDIENCE,
        "scope": scope,
    })
}

pub fn sign_with(alg: Algorithm, key: &[u8], claims: &Value) -> String {
    jsonwebtoken::encode(&Header::new(alg), claims, &EncodingKey::from_secret(key))
        .expect("sign test token")
}

/// Hand-built compact token with an arbitrary header and a literal signature segment.
pub fn assemble(header: &Value, claims: &Value, signature: &str) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        signature
    )
}

pub fn sign(claims: &Value) -> String {
    sign_with(Algorithm::HS256, SIGNING_KEY.as_bytes(), claims)
}

pub fn token_expiring_at(scope: &str, exp: i64) -> String {
    sign(&claims(scope, exp))
}

/// Valid for an hour from now.
pub fn token(scope: &str) -> String {
    token_expiring_at(scope, chrono::Utc::now().timestamp() + 3600)
}

pub fn identity(scope: &str) -> Identity {
    let claims = validator().validate(&token(scope)).expect("valid test token");
    Identity::new(claims)
}

#[derive(Debug, Clone, Default)]
pub struct RecordingAuditSink {
    records: Arc<Mutex<Vec<AuthorizationDecision>>>,
}

impl RecordingAuditSink {
    pub fn records(&self) -> Vec<AuthorizationDecision> {
        self.records.lock().expect("audit lock").clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, decision: &AuthorizationDecision) {
        self.records
            .lock()
            .expect("audit lock")
            .push(decision.clone());
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a JSON subscriber at TRACE and return every event it emitted.
pub fn capture_logs(f: impl FnOnce()) -> Vec<Value> {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().expect("log lock").clone();
    String::from_utf8(bytes)
        .expect("utf-8 log output")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json log line"))
        .collect()
}
