//! Chrome DevTools backend for [`PageHandle`].
//!
//! Launches a local Chromium through `chromiumoxide`, drives one tab, and
//! runs the protocol handler on the only task this crate ever spawns.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{GrantPermissionsParams, PermissionType};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::{Handler, Page};
use futures::StreamExt;
use storewalk_core::AppConfig;
use tokio::task::JoinHandle;

use crate::error::{PageError, ScraperError};
use crate::page::{Key, PageHandle, Permission};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl BrowserOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            headless: config.headless,
            window_width: config.window_width,
            window_height: config.window_height,
        }
    }
}

/// A launched browser with a single working tab.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Starts Chromium and opens a blank tab.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Launch`] if the browser cannot be configured,
    /// started, or asked for a tab.
    pub async fn launch(options: &BrowserOptions) -> Result<Self, ScraperError> {
        let mut builder =
            BrowserConfig::builder().window_size(options.window_width, options.window_height);
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScraperError::Launch)?;

        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::Launch(e.to_string()))?;
        let handler = spawn_handler(handler);

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(ScraperError::Launch(format!("failed to open tab: {e}")));
            }
        };

        tracing::info!(
            headless = options.headless,
            width = options.window_width,
            height = options.window_height,
            "browser launched"
        );
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Closes the browser and stops the protocol handler.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "browser process did not exit cleanly");
        }
        self.handler.abort();
        if let Err(e) = self.handler.await {
            if !e.is_cancelled() {
                tracing::warn!(error = %e, "browser handler task failed");
            }
        }
    }
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!(error = %e, "browser handler event error");
            }
        }
    })
}

fn protocol(e: impl std::fmt::Display) -> PageError {
    PageError::Protocol(e.to_string())
}

#[async_trait]
impl PageHandle for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| PageError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, PageError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PageError::Evaluate(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| PageError::ElementNotFound {
                selector: selector.to_owned(),
            })?;
        element.click().await.map_err(protocol)?;
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), PageError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| PageError::ElementNotFound {
                selector: selector.to_owned(),
            })?;
        element.click().await.map_err(protocol)?;
        element.type_str(text).await.map_err(protocol)?;
        Ok(())
    }

    async fn send_key(&self, key: Key) -> Result<(), PageError> {
        let focused = self
            .page
            .find_element(":focus")
            .await
            .map_err(|_| PageError::ElementNotFound {
                selector: ":focus".to_owned(),
            })?;
        focused.press_key(key.as_str()).await.map_err(protocol)?;
        Ok(())
    }

    async fn grant_permission(
        &self,
        permission: Permission,
        origin: &str,
    ) -> Result<(), PageError> {
        let kind = match permission {
            Permission::Geolocation => PermissionType::Geolocation,
        };
        let params = GrantPermissionsParams::builder()
            .permission(kind)
            .origin(origin)
            .build()
            .map_err(PageError::Protocol)?;
        self.browser.execute(params).await.map_err(protocol)?;
        Ok(())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<(), PageError> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(PageError::Protocol)?;
        self.page.execute(params).await.map_err(protocol)?;
        Ok(())
    }
}
