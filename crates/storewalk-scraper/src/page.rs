//! The browser capability the traversal drives.
//!
//! Everything above this module talks to one tab through [`PageHandle`];
//! `crate::browser::ChromeSession` is the production implementation.

use async_trait::async_trait;

use crate::error::PageError;

/// What must be true of an element for a [`Condition`] to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// Attached to the DOM.
    Present,
    /// Attached, rendered with a non-empty box, and not hidden by style.
    Visible,
}

/// A DOM readiness condition, checked one-shot by [`PageHandle::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub selector: String,
    pub state: ElementState,
}

impl Condition {
    #[must_use]
    pub fn present(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            state: ElementState::Present,
        }
    }

    #[must_use]
    pub fn visible(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            state: ElementState::Visible,
        }
    }

    /// In-page expression evaluating to `true` when the condition holds.
    #[must_use]
    pub fn probe_script(&self) -> String {
        let selector = js_string(&self.selector);
        match self.state {
            ElementState::Present => format!("document.querySelector({selector}) !== null"),
            ElementState::Visible => format!(
                r"(() => {{
    const el = document.querySelector({selector});
    if (!el) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}})()"
            ),
        }
    }
}

/// Browser permissions the traversal may need to grant up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Geolocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Tab,
}

impl Key {
    /// DOM `KeyboardEvent.key` name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Key::Enter => "Enter",
            Key::Escape => "Escape",
            Key::Tab => "Tab",
        }
    }
}

/// One browser tab.
///
/// Only one mutating call (`navigate`, `click`, `type_text`, `send_key`) is
/// issued at a time. [`PageHandle::probe`] may run concurrently from several
/// race watchers and must not change page state.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Navigates and waits for the load event.
    async fn navigate(&self, url: &str) -> Result<(), PageError>;

    /// Evaluates an expression and returns its JSON-serialized value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, PageError>;

    async fn click(&self, selector: &str) -> Result<(), PageError>;

    /// Focuses the element and types `text` into it.
    async fn type_text(&self, selector: &str, text: &str) -> Result<(), PageError>;

    /// Sends a key press to the focused element.
    async fn send_key(&self, key: Key) -> Result<(), PageError>;

    async fn grant_permission(&self, permission: Permission, origin: &str)
        -> Result<(), PageError>;

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), PageError>;

    /// Checks `condition` once.
    async fn probe(&self, condition: &Condition) -> Result<bool, PageError> {
        let value = self.evaluate(&condition.probe_script()).await?;
        value.as_bool().ok_or_else(|| {
            PageError::Evaluate(format!("condition probe returned non-boolean {value}"))
        })
    }
}

/// Renders `s` as a JavaScript string literal.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}
