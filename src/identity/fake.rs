//! Recording identity provider for unit tests
//!
//! [`FakeIdentityProvider`] implements [`IdentityProvider`] in memory: it
//! records every call and lets the test play the widget's part by emitting a
//! credential through the registered callback.

use std::sync::Mutex;

use crate::error::{Result, WoodstoveError};
use crate::identity::{
    ButtonOptions, CredentialCallback, CredentialResponse, IdentityProvider, WidgetConfig,
};

#[derive(Default)]
struct Calls {
    load: usize,
    initialize: Vec<WidgetConfig>,
    render: Vec<(String, ButtonOptions)>,
    prompt: usize,
    disable_auto_select: usize,
    callback: Option<CredentialCallback>,
}

/// In-memory [`IdentityProvider`] stub.
#[derive(Default)]
pub struct FakeIdentityProvider {
    fail_load: bool,
    calls: Mutex<Calls>,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose `load` always fails, as when the script is blocked.
    pub fn failing() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    /// Plays the widget: delivers `credential` to the registered callback.
    pub fn emit_credential(&self, credential: &str) {
        let callback = self.calls.lock().unwrap().callback.clone();
        if let Some(callback) = callback {
            callback(CredentialResponse {
                credential: credential.to_string(),
                select_by: Some("btn".to_string()),
            });
        }
    }

    pub fn load_calls(&self) -> usize {
        self.calls.lock().unwrap().load
    }

    pub fn initialized_with(&self) -> Vec<WidgetConfig> {
        self.calls.lock().unwrap().initialize.clone()
    }

    pub fn rendered(&self) -> Vec<(String, ButtonOptions)> {
        self.calls.lock().unwrap().render.clone()
    }

    pub fn prompt_calls(&self) -> usize {
        self.calls.lock().unwrap().prompt
    }

    pub fn disable_auto_select_calls(&self) -> usize {
        self.calls.lock().unwrap().disable_auto_select
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn load(&self) -> Result<()> {
        self.calls.lock().unwrap().load += 1;
        if self.fail_load {
            return Err(WoodstoveError::Identity("script blocked".into()).into());
        }
        Ok(())
    }

    fn initialize(&self, config: &WidgetConfig, callback: CredentialCallback) {
        let mut calls = self.calls.lock().unwrap();
        calls.initialize.push(config.clone());
        calls.callback = Some(callback);
    }

    fn render_button(&self, mount_point: &str, options: &ButtonOptions) {
        self.calls
            .lock()
            .unwrap()
            .render
            .push((mount_point.to_string(), options.clone()));
    }

    fn prompt(&self) {
        self.calls.lock().unwrap().prompt += 1;
    }

    fn disable_auto_select(&self) {
        self.calls.lock().unwrap().disable_auto_select += 1;
    }
}
