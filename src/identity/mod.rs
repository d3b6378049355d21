//! Identity provider bridge
//!
//! The external sign-in widget (Google Identity Services) is modelled as the
//! [`IdentityProvider`] capability: something that can be loaded, initialized
//! with a client id and a credential callback, asked to render a button or
//! show its one-tap prompt, and told to stop auto-selecting an account.
//!
//! [`IdentityBridge`] adapts that capability to the session store's
//! vocabulary: it loads the provider once, forwards the issued credential
//! string, and silently does nothing when no provider is available.
//!
//! # Module Layout
//!
//! - [`loopback`] -- production adapter hosting the sign-in page on a
//!   loopback port
//! - `fake` -- recording stub used by unit tests (cfg(test) only)

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::IdentityConfig;
use crate::error::Result;

pub mod loopback;

#[cfg(test)]
pub mod fake;

pub use loopback::LoopbackIdentityProvider;

/// URL of the external identity script.
pub const GSI_SCRIPT_URL: &str = "https://accounts.google.com/gsi/client";

/// Widget response delivered to the credential callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialResponse {
    /// The issued compact ID token
    pub credential: String,
    /// How the user selected the account (`auto`, `btn`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_by: Option<String>,
}

/// Callback invoked by the widget once a credential has been issued.
pub type CredentialCallback = Arc<dyn Fn(CredentialResponse) + Send + Sync>;

/// Initialization parameters for the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub client_id: String,
    /// Let the widget sign a returning user in without a click
    pub auto_select: bool,
}

/// Appearance of the rendered sign-in button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonOptions {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default = "default_width")]
    pub width: u32,
}

fn default_theme() -> String {
    "outline".to_string()
}

fn default_size() -> String {
    "large".to_string()
}

fn default_width() -> u32 {
    250
}

impl Default for ButtonOptions {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            size: default_size(),
            width: default_width(),
        }
    }
}

/// The external sign-in widget.
///
/// Mirrors the widget's global surface: `initialize`, `renderButton`,
/// `prompt` and `disableAutoSelect`, plus `load` for making the widget
/// available in the first place.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Makes the widget available.
    ///
    /// # Errors
    ///
    /// Returns an error if the widget cannot be loaded. The bridge absorbs
    /// it; sign-in simply never completes.
    async fn load(&self) -> Result<()>;

    /// Configures the widget and registers the credential callback.
    fn initialize(&self, config: &WidgetConfig, callback: CredentialCallback);

    /// Draws a sign-in button into `mount_point`.
    fn render_button(&self, mount_point: &str, options: &ButtonOptions);

    /// Displays the one-tap prompt.
    fn prompt(&self);

    /// Stops the widget from silently re-selecting the last account.
    fn disable_auto_select(&self);
}

/// Adapter between the sign-in widget and the session store.
///
/// # Examples
///
/// ```
/// use woodstove::identity::{ButtonOptions, IdentityBridge};
///
/// # #[tokio::main]
/// # async fn main() {
/// // Without a provider every entry point is a silent no-op.
/// let bridge = IdentityBridge::new(None, true, ButtonOptions::default());
/// bridge.begin_sign_in("client-id", |_token| {}).await;
/// bridge.render_sign_in_button("signin");
/// assert!(!bridge.is_loaded());
/// # }
/// ```
pub struct IdentityBridge {
    provider: Option<Arc<dyn IdentityProvider>>,
    auto_select: bool,
    button: ButtonOptions,
    loaded: OnceCell<bool>,
}

impl IdentityBridge {
    /// `provider` is `None` where no sign-in widget can exist.
    pub fn new(
        provider: Option<Arc<dyn IdentityProvider>>,
        auto_select: bool,
        button: ButtonOptions,
    ) -> Self {
        Self {
            provider,
            auto_select,
            button,
            loaded: OnceCell::new(),
        }
    }

    pub fn from_config(
        provider: Option<Arc<dyn IdentityProvider>>,
        config: &IdentityConfig,
    ) -> Self {
        Self::new(provider, config.auto_select, config.button.clone())
    }

    /// Loads the widget (once), initializes it with `client_id` and a
    /// callback forwarding the issued credential to `on_token`, then shows
    /// the one-tap prompt.
    ///
    /// A load failure is logged and remembered; `on_token` is then never
    /// invoked and later calls do not retry.
    pub async fn begin_sign_in<F>(&self, client_id: &str, on_token: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let Some(provider) = &self.provider else {
            tracing::debug!("no identity provider; sign-in unavailable");
            return;
        };

        let loaded = *self
            .loaded
            .get_or_init(|| async move {
                match provider.load().await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!("identity provider failed to load: {:#}", e);
                        false
                    }
                }
            })
            .await;
        if !loaded {
            return;
        }

        let config = WidgetConfig {
            client_id: client_id.to_string(),
            auto_select: self.auto_select,
        };
        provider.initialize(
            &config,
            Arc::new(move |response: CredentialResponse| on_token(response.credential)),
        );
        provider.prompt();
    }

    /// Asks the widget to draw its button; no-op when it is not loaded.
    pub fn render_sign_in_button(&self, mount_point: &str) {
        match &self.provider {
            Some(provider) if self.is_loaded() => provider.render_button(mount_point, &self.button),
            _ => tracing::debug!(mount_point, "sign-in button unavailable"),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().copied().unwrap_or(false)
    }
}
