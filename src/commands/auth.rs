//! Sign-in, sign-out and session status commands

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::commands::open_session;
use crate::config::Config;
use crate::credential;
use crate::error::{Result, WoodstoveError};
use crate::identity::{IdentityBridge, IdentityProvider, LoopbackIdentityProvider};
use crate::session::{Session, SessionPhase, SessionStore, User};
use crate::storage;

/// Element id the sign-in button is mounted under on the hosted page.
const SIGN_IN_MOUNT_POINT: &str = "signin";

/// Options for [`login`] that may override configuration
#[derive(Debug, Clone, Default)]
pub struct LoginArgs {
    pub client_id: Option<String>,
    pub port: Option<u16>,
    pub timeout_seconds: u64,
    pub no_browser: bool,
}

/// Sign in through the loopback-hosted identity page
///
/// Waits until the widget delivers a credential that decodes, persists it
/// and prints the signed-in user. Credentials that fail to decode are
/// reported and the wait continues.
///
/// # Errors
///
/// Returns an error if no client id is configured, the sign-in page cannot
/// be started, or no credential arrives before the timeout.
pub async fn login(config: Config, args: LoginArgs) -> Result<()> {
    let client_id = args
        .client_id
        .unwrap_or_else(|| config.identity.client_id.clone());
    if client_id.trim().is_empty() {
        return Err(WoodstoveError::Config(
            "identity.client_id is required to sign in (set it in config, WOODSTOVE_CLIENT_ID or --client-id)"
                .to_string(),
        )
        .into());
    }

    let mut provider =
        LoopbackIdentityProvider::new(args.port.unwrap_or(config.identity.callback_port));
    if args.no_browser {
        provider = provider.without_browser();
    }
    let provider = Arc::new(provider);

    let storage = storage::from_config(&config.storage)?;
    if !storage.is_available() {
        tracing::warn!("token storage is disabled; the sign-in will not be remembered");
    }
    let session = SessionStore::new(storage)
        .with_token_key(config.storage.key.clone())
        .with_identity_provider(provider.clone() as Arc<dyn IdentityProvider>);
    session.initialize();

    let bridge = IdentityBridge::from_config(
        Some(provider.clone() as Arc<dyn IdentityProvider>),
        &config.identity,
    );
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    bridge
        .begin_sign_in(&client_id, move |token| {
            let _ = tx.send(token);
        })
        .await;
    if !bridge.is_loaded() {
        return Err(
            WoodstoveError::Identity("the sign-in page could not be started".to_string()).into(),
        );
    }
    bridge.render_sign_in_button(SIGN_IN_MOUNT_POINT);

    let wait = Duration::from_secs(args.timeout_seconds);
    let user = tokio::time::timeout(wait, receive_sign_in(&session, &mut rx))
        .await
        .map_err(|_| {
            WoodstoveError::Identity(format!(
                "no sign-in completed within {} seconds",
                args.timeout_seconds
            ))
        })??;

    tracing::info!(email = %user.email, "signed in");
    println!(
        "{} Signed in as {} <{}>",
        "✓".green(),
        user.display_name.bold(),
        user.email
    );
    Ok(())
}

async fn receive_sign_in(
    session: &SessionStore,
    rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<User> {
    while let Some(token) = rx.recv().await {
        match session.sign_in_with_credential(token) {
            Ok(user) => return Ok(user),
            Err(e) => {
                tracing::warn!("discarding credential: {}", e);
                eprintln!("{} {}", "Sign-in failed:".red(), e);
            }
        }
    }
    Err(WoodstoveError::Identity("sign-in page closed".to_string()).into())
}

/// Sign out: forget the stored token
pub fn logout(config: &Config) -> Result<()> {
    let session = open_session(config)?;
    let was_signed_in = session.snapshot().is_authenticated();
    session.logout();

    if was_signed_in {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

/// Machine-readable session summary. Never includes the token itself.
#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

impl<'a> StatusReport<'a> {
    fn from_session(session: &'a Session) -> Self {
        let expires_at = session
            .token()
            .and_then(|token| credential::decode(token).ok())
            .and_then(|decoded| decoded.expires_at())
            .map(|at| at.to_rfc3339());
        Self {
            phase: session.phase(),
            user: session.user(),
            expires_at,
        }
    }
}

/// Print the current session
pub fn status(config: &Config, json: bool) -> Result<()> {
    let session = open_session(config)?.snapshot();
    let report = StatusReport::from_session(&session);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(WoodstoveError::Serialization)?
        );
        return Ok(());
    }

    match report.user {
        Some(user) => {
            println!("{} {}", "Signed in as".green(), user.display_name.bold());
            println!("Email:    {}", user.email);
            if !user.avatar_url.is_empty() {
                println!("Avatar:   {}", user.avatar_url);
            }
            if let Some(expires_at) = &report.expires_at {
                println!("Expires:  {}", expires_at);
            }
        }
        None => {
            println!("{}", "Not signed in.".yellow());
            println!("Run {} to sign in.", "woodstove login".cyan());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::tests::token_expiring_at;

    fn user() -> User {
        User {
            email: "a@b.com".to_string(),
            display_name: "A".to_string(),
            avatar_url: "p".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_requires_client_id() {
        let mut config = Config::default();
        config.storage.backend = crate::config::StorageBackend::Memory;

        let err = login(
            config,
            LoginArgs {
                timeout_seconds: 1,
                no_browser: true,
                ..LoginArgs::default()
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("client_id"));
    }

    #[tokio::test]
    async fn test_receive_sign_in_skips_malformed_credentials() {
        let session = SessionStore::new(Arc::new(crate::storage::MemoryStorage::new()));
        session.initialize();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send("garbage".to_string()).unwrap();
        tx.send(token_expiring_at(4_102_444_800)).unwrap();

        let user = receive_sign_in(&session, &mut rx).await.expect("signed in");
        assert_eq!(user.email, "a@b.com");
        assert!(session.snapshot().is_authenticated());
    }

    #[tokio::test]
    async fn test_receive_sign_in_errors_when_channel_closes() {
        let session = SessionStore::new(Arc::new(crate::storage::MemoryStorage::new()));
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        drop(tx);
        assert!(receive_sign_in(&session, &mut rx).await.is_err());
    }

    #[test]
    fn test_status_report_omits_token() {
        let token = token_expiring_at(4_102_444_800);
        let session = Session::authenticated(user(), token.clone());
        let json = serde_json::to_string(&StatusReport::from_session(&session)).unwrap();

        assert!(!json.contains(&token));
        assert!(json.contains("\"phase\":\"authenticated\""));
        assert!(json.contains("2100-01-01T00:00:00+00:00"));
    }

    #[test]
    fn test_status_report_anonymous() {
        let session = Session::anonymous();
        let json = serde_json::to_value(StatusReport::from_session(&session)).unwrap();
        assert_eq!(json, serde_json::json!({"phase": "anonymous"}));
    }
}
