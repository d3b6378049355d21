//! Loopback-hosted Google Identity Services page
//!
//! A command-line client has no DOM to load the sign-in script into, so
//! [`LoopbackIdentityProvider`] hosts one: `load()` binds `127.0.0.1:<port>`
//! and serves a page that loads the script from [`GSI_SCRIPT_URL`],
//! configured in redirect mode with a `login_uri` pointing back at the
//! loopback `/callback` route. When the user picks an account the widget
//! POSTs the issued credential there, and the registered callback receives
//! it.
//!
//! The callback validates Google's double-submit CSRF token: the
//! `g_csrf_token` form field must equal the `g_csrf_token` cookie.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use crate::error::{Result, WoodstoveError};
use crate::identity::{
    ButtonOptions, CredentialCallback, CredentialResponse, IdentityProvider, WidgetConfig,
    GSI_SCRIPT_URL,
};

/// Element id used for the button when `render_button` was never called.
const DEFAULT_MOUNT_POINT: &str = "g_id_signin";

/// Double-submit cookie set by the widget alongside the form field.
const CSRF_COOKIE: &str = "g_csrf_token";

/// What the hosted page needs to know, updated through the provider trait.
struct PageState {
    widget: Option<WidgetConfig>,
    button: Option<(String, ButtonOptions)>,
    callback: Option<CredentialCallback>,
    login_uri: String,
}

type SharedPage = Arc<Mutex<PageState>>;

/// [`IdentityProvider`] serving the sign-in page on a loopback port.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use woodstove::identity::{ButtonOptions, IdentityBridge, LoopbackIdentityProvider};
///
/// # #[tokio::main]
/// # async fn main() {
/// let provider = Arc::new(LoopbackIdentityProvider::new(0));
/// let bridge = IdentityBridge::new(Some(provider), true, ButtonOptions::default());
/// bridge
///     .begin_sign_in("my-client-id.apps.googleusercontent.com", |token| {
///         println!("received {} byte credential", token.len());
///     })
///     .await;
/// # }
/// ```
pub struct LoopbackIdentityProvider {
    port: u16,
    open_browser: bool,
    page: SharedPage,
    addr: OnceLock<SocketAddr>,
    server: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl LoopbackIdentityProvider {
    /// `port` 0 picks an ephemeral port.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            open_browser: true,
            page: Arc::new(Mutex::new(PageState {
                widget: None,
                button: None,
                callback: None,
                login_uri: String::new(),
            })),
            addr: OnceLock::new(),
            server: Mutex::new(None),
        }
    }

    /// Disables launching the system browser from `prompt()`.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    /// Address of the hosted page once loaded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.addr.get().copied()
    }

    /// URL of the hosted sign-in page once loaded.
    pub fn page_url(&self) -> Option<String> {
        self.local_addr().map(|addr| format!("http://{addr}/"))
    }

    fn page(&self) -> std::sync::MutexGuard<'_, PageState> {
        // A poisoned lock only means a callback panicked; the state is
        // still usable.
        self.page.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Attempts to open the page in the user's default browser.
    ///
    /// Errors are intentionally ignored; the URL is also printed.
    fn try_open_browser(&self, url: &str) {
        #[cfg(target_os = "macos")]
        {
            let _ = std::process::Command::new("open").arg(url).spawn();
        }
        #[cfg(target_os = "linux")]
        {
            let _ = std::process::Command::new("xdg-open").arg(url).spawn();
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            let _ = url;
        }
    }
}

impl Drop for LoopbackIdentityProvider {
    fn drop(&mut self) {
        if let Ok(mut server) = self.server.lock() {
            if let Some(handle) = server.take() {
                handle.abort();
            }
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for LoopbackIdentityProvider {
    async fn load(&self) -> Result<()> {
        if self.addr.get().is_some() {
            return Ok(());
        }

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", self.port))
            .await
            .map_err(|e| {
                WoodstoveError::Identity(format!("failed to bind sign-in listener: {e}"))
            })?;
        let addr = listener
            .local_addr()
            .map_err(|e| WoodstoveError::Identity(format!("failed to get local address: {e}")))?;

        self.page().login_uri = format!("http://{addr}/callback");
        let _ = self.addr.set(addr);

        let app = router(Arc::clone(&self.page));
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!("sign-in page server stopped: {}", e);
            }
        });
        if let Ok(mut server) = self.server.lock() {
            *server = Some(handle);
        }

        tracing::debug!(%addr, "sign-in page listening");
        Ok(())
    }

    fn initialize(&self, config: &WidgetConfig, callback: CredentialCallback) {
        let mut page = self.page();
        page.widget = Some(config.clone());
        page.callback = Some(callback);
    }

    fn render_button(&self, mount_point: &str, options: &ButtonOptions) {
        self.page().button = Some((mount_point.to_string(), options.clone()));
    }

    fn prompt(&self) {
        let Some(url) = self.page_url() else {
            tracing::debug!("prompt before load; ignoring");
            return;
        };
        eprintln!("Open the following URL in your browser to sign in:\n{url}");
        if self.open_browser {
            self.try_open_browser(&url);
        }
    }

    fn disable_auto_select(&self) {
        if let Some(widget) = self.page().widget.as_mut() {
            widget.auto_select = false;
        }
    }
}

fn router(page: SharedPage) -> Router {
    Router::new()
        .route("/", get(sign_in_page))
        .route("/callback", post(callback))
        .with_state(page)
}

async fn sign_in_page(State(page): State<SharedPage>) -> Response {
    let state = page.lock().unwrap_or_else(|e| e.into_inner());
    match &state.widget {
        Some(widget) => {
            Html(render_page(widget, state.button.as_ref(), &state.login_uri)).into_response()
        }
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Sign-in has not been initialized.",
        )
            .into_response(),
    }
}

/// Form fields POSTed by the widget in redirect mode.
#[derive(Debug, Deserialize)]
struct CallbackForm {
    credential: String,
    g_csrf_token: String,
    #[serde(default)]
    select_by: Option<String>,
}

async fn callback(
    State(page): State<SharedPage>,
    jar: CookieJar,
    Form(form): Form<CallbackForm>,
) -> Response {
    let cookie_token = jar.get(CSRF_COOKIE).map(Cookie::value);
    if cookie_token != Some(form.g_csrf_token.as_str()) {
        tracing::warn!("rejected sign-in callback: CSRF token mismatch");
        return (
            StatusCode::BAD_REQUEST,
            "Failed to verify double submit cookie.",
        )
            .into_response();
    }

    let callback = page
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .callback
        .clone();
    let Some(callback) = callback else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Sign-in has not been initialized.")
            .into_response();
    };

    callback(CredentialResponse {
        credential: form.credential,
        select_by: form.select_by,
    });
    Html("<p>Signed in. You may close this tab.</p>").into_response()
}

fn render_page(
    widget: &WidgetConfig,
    button: Option<&(String, ButtonOptions)>,
    login_uri: &str,
) -> String {
    let (mount_point, options) = match button {
        Some((mount_point, options)) => (mount_point.as_str(), options.clone()),
        None => (DEFAULT_MOUNT_POINT, ButtonOptions::default()),
    };
    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>Woodstove sign-in</title>
<script src="{script}" async defer></script>
</head>
<body>
<div id="g_id_onload"
     data-client_id="{client_id}"
     data-login_uri="{login_uri}"
     data-ux_mode="redirect"
     data-auto_select="{auto_select}"></div>
<div class="g_id_signin"
     id="{mount_point}"
     data-type="standard"
     data-theme="{theme}"
     data-size="{size}"
     data-width="{width}"></div>
</body>
</html>
"#,
        script = GSI_SCRIPT_URL,
        client_id = escape_attr(&widget.client_id),
        login_uri = escape_attr(login_uri),
        auto_select = widget.auto_select,
        mount_point = escape_attr(mount_point),
        theme = escape_attr(&options.theme),
        size = escape_attr(&options.size),
        width = options.width,
    )
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
