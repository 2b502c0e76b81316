use std::path::Path;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::layout::Point;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::util::{resolve_profile_dir, ProfileDir};

/// One launched browser with the single page a run drives.
pub struct CdpAdapter {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    profile: ProfileDir,
}

impl CdpAdapter {
    pub async fn launch(config: &CdpConfig) -> Result<Self, AdapterError> {
        let profile = resolve_profile_dir(config.user_data_dir.as_ref()).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch)
                .with_hint(format!("profile dir: {}", err))
        })?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(&profile.path)
            .window_size(config.window.width, config.window.height)
            .viewport(CdpViewport {
                width: config.window.width,
                height: config.window.height,
                ..Default::default()
            })
            .launch_timeout(config.launch_timeout)
            .request_timeout(config.request_timeout);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(exe) = &config.executable {
            builder = builder.chrome_executable(exe);
        }
        let browser_config = builder
            .build()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Launch).with_hint(err))?;

        info!(
            headless = config.headless,
            window = %config.window,
            profile = %profile.path.display(),
            "launching chromium"
        );
        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|err| {
            AdapterError::new(AdapterErrorKind::Launch).with_hint(err.to_string())
        })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "cdp handler error");
                }
            }
            debug!("cdp handler loop ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(AdapterError::cdp)?;

        Ok(Self {
            browser,
            page,
            handler_task,
            profile,
        })
    }

    pub async fn goto(&self, url: &str, timeout: Duration) -> Result<(), AdapterError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(AdapterError::cdp(err)),
            Err(_) => Err(AdapterError::new(AdapterErrorKind::NavTimeout)
                .with_hint(format!("{} after {}ms", url, timeout.as_millis()))
                .retriable(true)),
        }
    }

    pub async fn url(&self) -> Result<String, AdapterError> {
        let url = self.page.url().await.map_err(AdapterError::cdp)?;
        Ok(url.unwrap_or_default())
    }

    /// Evaluates an expression (promises are awaited) and decodes its JSON value.
    pub async fn evaluate<T: DeserializeOwned>(&self, expression: &str) -> Result<T, AdapterError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(AdapterError::script)?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(AdapterError::script)?;
        result.into_value::<T>().map_err(AdapterError::script)
    }

    /// Inserts text at the current focus as if typed.
    pub async fn insert_text(&self, text: &str) -> Result<(), AdapterError> {
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(AdapterError::cdp)?;
        Ok(())
    }

    /// Dispatches a native mouse click at page coordinates.
    pub async fn click_at(&self, x: f64, y: f64) -> Result<(), AdapterError> {
        self.page
            .click(Point::new(x, y))
            .await
            .map_err(AdapterError::cdp)?;
        Ok(())
    }

    pub async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), AdapterError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                AdapterError::new(AdapterErrorKind::Screenshot).with_hint(err.to_string())
            })?;
        }
        let params = ScreenshotParams::builder().full_page(full_page).build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|err| {
                AdapterError::new(AdapterErrorKind::Screenshot).with_hint(err.to_string())
            })?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), AdapterError> {
        let closed = self.browser.close().await;
        if let Err(err) = self.browser.wait().await {
            debug!(error = %err, "waiting for chromium exit failed");
        }
        self.handler_task.abort();
        if let Err(err) = self.profile.release().await {
            warn!(
                dir = %self.profile.path.display(),
                error = %err,
                "failed to remove temporary profile"
            );
        }
        closed.map(|_| ()).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Closed).with_hint(err.to_string())
        })
    }
}
