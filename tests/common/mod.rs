use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tempfile::TempDir;
use woodstove::session::SessionStore;
use woodstove::storage::{MemoryStorage, TokenStorage};

/// 2100-01-01T00:00:00Z
#[allow(dead_code)]
pub const FAR_FUTURE: i64 = 4_102_444_800;

/// Builds a compact token whose payload carries the given claims.
#[allow(dead_code)]
pub fn make_token(email: &str, name: &str, picture: &str, exp: i64) -> String {
    let payload = serde_json::json!({
        "email": email,
        "name": name,
        "picture": picture,
        "exp": exp,
    });
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload.to_string()),
        "signature"
    )
}

#[allow(dead_code)]
pub fn valid_token() -> String {
    make_token("cook@example.com", "Camp Cook", "https://img.example.com/c.png", FAR_FUTURE)
}

/// A restored store over shared in-memory storage holding `token`.
#[allow(dead_code)]
pub fn signed_in_store(token: &str) -> (Arc<SessionStore>, MemoryStorage) {
    let storage = MemoryStorage::new();
    storage.set("auth_token", token).expect("seed token");
    let store = SessionStore::new(Arc::new(storage.clone()));
    store.initialize();
    (Arc::new(store), storage)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
