//! A scripted in-memory [`PageHandle`] for driving the scraper without a browser.
//!
//! Each URL maps to a [`PageFixture`] describing which selectors exist (and
//! how long after navigation they appear) and what in-page scripts return.
//! Time is measured with `tokio::time::Instant`, so tests run under a paused
//! clock.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use storewalk_core::SiteProfile;
use storewalk_scraper::{
    Condition, ElementState, Key, PageError, PageHandle, Permission, TraversalSettings, WaitPolicy,
};

pub const ORIGIN: &str = "https://sbermarket.ru";
pub const ADDRESS: &str = "Тверская улица, 1";

#[derive(Debug, Clone, Default)]
pub struct PageFixture {
    /// Selector -> delay after navigation before it is attached.
    elements: HashMap<String, Duration>,
    /// Attached but not visible.
    hidden: HashSet<String>,
    /// First entry whose needle occurs in the script answers the evaluation.
    evaluations: Vec<(String, Result<Value, String>)>,
    failing_clicks: HashSet<String>,
    failing_probes: HashSet<String>,
}

impl PageFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(self, selector: &str) -> Self {
        self.element_after(selector, Duration::ZERO)
    }

    pub fn element_after(mut self, selector: &str, delay: Duration) -> Self {
        self.elements.insert(selector.to_owned(), delay);
        self
    }

    pub fn hidden_element(mut self, selector: &str) -> Self {
        self.elements.insert(selector.to_owned(), Duration::ZERO);
        self.hidden.insert(selector.to_owned());
        self
    }

    pub fn eval(mut self, needle: &str, value: Value) -> Self {
        self.evaluations.push((needle.to_owned(), Ok(value)));
        self
    }

    pub fn eval_error(mut self, needle: &str, message: &str) -> Self {
        self.evaluations
            .push((needle.to_owned(), Err(message.to_owned())));
        self
    }

    pub fn failing_click(mut self, selector: &str) -> Self {
        self.failing_clicks.insert(selector.to_owned());
        self
    }

    pub fn failing_probe(mut self, selector: &str) -> Self {
        self.failing_probes.insert(selector.to_owned());
        self
    }
}

#[derive(Debug)]
struct State {
    current: Option<String>,
    navigated_at: Instant,
    /// Elements removed by a click since the last navigation.
    removed: HashSet<String>,
    calls: Vec<String>,
    probes: usize,
}

#[derive(Debug)]
pub struct FakePage {
    pages: HashMap<String, PageFixture>,
    failing_navigations: HashSet<String>,
    fail_grant: bool,
    fail_viewport: bool,
    fail_typing: bool,
    state: Mutex<State>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failing_navigations: HashSet::new(),
            fail_grant: false,
            fail_viewport: false,
            fail_typing: false,
            state: Mutex::new(State {
                current: None,
                navigated_at: Instant::now(),
                removed: HashSet::new(),
                calls: Vec::new(),
                probes: 0,
            }),
        }
    }

    /// A page that is already "loaded" with `fixture`, for tests that skip navigation.
    pub fn showing(fixture: PageFixture) -> Self {
        let page = Self::new().page("about:blank", fixture);
        page.state.lock().unwrap().current = Some("about:blank".to_owned());
        page
    }

    pub fn page(mut self, url: &str, fixture: PageFixture) -> Self {
        self.pages.insert(url.to_owned(), fixture);
        self
    }

    pub fn failing_navigation(mut self, url: &str) -> Self {
        self.failing_navigations.insert(url.to_owned());
        self
    }

    pub fn failing_grant(mut self) -> Self {
        self.fail_grant = true;
        self
    }

    pub fn failing_viewport(mut self) -> Self {
        self.fail_viewport = true;
        self
    }

    pub fn failing_typing(mut self) -> Self {
        self.fail_typing = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("navigate ").map(str::to_owned))
            .collect()
    }

    pub fn probe_count(&self) -> usize {
        self.state.lock().unwrap().probes
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn fixture(&self) -> Option<&PageFixture> {
        let state = self.state.lock().unwrap();
        state.current.as_ref().and_then(|url| self.pages.get(url))
    }

    fn is_attached(&self, selector: &str) -> bool {
        let state = self.state.lock().unwrap();
        let Some(fixture) = state.current.as_ref().and_then(|url| self.pages.get(url)) else {
            return false;
        };
        if state.removed.contains(selector) {
            return false;
        }
        fixture
            .elements
            .get(selector)
            .is_some_and(|delay| state.navigated_at.elapsed() >= *delay)
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.record(format!("navigate {url}"));
        if self.failing_navigations.contains(url) {
            return Err(PageError::Navigation {
                url: url.to_owned(),
                reason: "net::ERR_CONNECTION_RESET".to_owned(),
            });
        }
        let mut state = self.state.lock().unwrap();
        state.current = Some(url.to_owned());
        state.navigated_at = Instant::now();
        state.removed.clear();
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, PageError> {
        let Some(fixture) = self.fixture() else {
            return Ok(Value::Array(Vec::new()));
        };
        match fixture
            .evaluations
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
        {
            Some((_, Ok(value))) => Ok(value.clone()),
            Some((_, Err(message))) => Err(PageError::Evaluate(message.clone())),
            None => Ok(Value::Array(Vec::new())),
        }
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        self.record(format!("click {selector}"));
        let failing = self
            .fixture()
            .is_some_and(|f| f.failing_clicks.contains(selector));
        if failing {
            return Err(PageError::Protocol("element is not clickable".to_owned()));
        }
        if !self.is_attached(selector) {
            return Err(PageError::ElementNotFound {
                selector: selector.to_owned(),
            });
        }
        self.state
            .lock()
            .unwrap()
            .removed
            .insert(selector.to_owned());
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), PageError> {
        self.record(format!("type {selector} {text}"));
        if self.fail_typing || !self.is_attached(selector) {
            return Err(PageError::ElementNotFound {
                selector: selector.to_owned(),
            });
        }
        Ok(())
    }

    async fn send_key(&self, key: Key) -> Result<(), PageError> {
        self.record(format!("key {}", key.as_str()));
        Ok(())
    }

    async fn grant_permission(
        &self,
        permission: Permission,
        origin: &str,
    ) -> Result<(), PageError> {
        self.record(format!("grant {permission:?} {origin}"));
        if self.fail_grant {
            return Err(PageError::Protocol("permission denied".to_owned()));
        }
        Ok(())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), PageError> {
        self.record(format!("viewport {width}x{height}"));
        if self.fail_viewport {
            return Err(PageError::Protocol("emulation unavailable".to_owned()));
        }
        Ok(())
    }

    async fn probe(&self, condition: &Condition) -> Result<bool, PageError> {
        self.state.lock().unwrap().probes += 1;
        let failing = self
            .fixture()
            .is_some_and(|f| f.failing_probes.contains(&condition.selector));
        if failing {
            return Err(PageError::Evaluate("execution context was destroyed".to_owned()));
        }
        let attached = self.is_attached(&condition.selector);
        Ok(match condition.state {
            ElementState::Present => attached,
            ElementState::Visible => {
                attached
                    && !self
                        .fixture()
                        .is_some_and(|f| f.hidden.contains(&condition.selector))
            }
        })
    }
}

pub fn policy(timeout_ms: u64) -> WaitPolicy {
    WaitPolicy::new(
        Duration::from_millis(timeout_ms),
        Duration::from_millis(100),
    )
}

pub fn settings() -> TraversalSettings {
    TraversalSettings {
        origin: ORIGIN.to_owned(),
        delivery_address: ADDRESS.to_owned(),
        viewport: Some((1920, 1080)),
        wait: policy(30_000),
        layout: policy(30_000),
        overlay: policy(5_000),
        typing_settle: Duration::from_secs(2),
        max_categories_per_store: 3,
        run_timeout: Duration::from_secs(360),
    }
}

pub fn profile() -> SiteProfile {
    SiteProfile::default()
}

pub fn store_url(store_id: &str) -> String {
    profile().store_url(ORIGIN, store_id)
}
