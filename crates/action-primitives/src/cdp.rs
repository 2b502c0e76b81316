//! [`BrowserPort`] over a live Chromium page.

use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdp_adapter::CdpAdapter;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::errors::ActionError;
use crate::port::BrowserPort;
use crate::scripts::{self, ScriptReply};
use crate::types::{
    AnchorDescriptor, ClickOptions, ElementRef, ElementState, ScrollTarget, SelectMethod, WaitTier,
};
use crate::waiting::{poll_until, DefaultWaitStrategy};

#[derive(Debug, Deserialize)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct LoadState {
    ready: String,
    resources: usize,
}

pub struct CdpBrowserPort {
    adapter: Arc<CdpAdapter>,
    waits: DefaultWaitStrategy,
}

impl CdpBrowserPort {
    pub fn new(adapter: Arc<CdpAdapter>) -> Self {
        Self {
            adapter,
            waits: DefaultWaitStrategy::default(),
        }
    }

    pub fn with_wait_strategy(mut self, waits: DefaultWaitStrategy) -> Self {
        self.waits = waits;
        self
    }

    pub fn adapter(&self) -> &Arc<CdpAdapter> {
        &self.adapter
    }

    async fn run<T: DeserializeOwned>(
        &self,
        script: String,
        target: &(dyn Display + Sync),
    ) -> Result<T, ActionError> {
        let reply: ScriptReply<T> = self.adapter.evaluate(&script).await?;
        reply.into_result(target)
    }

    async fn load_state(&self) -> Result<LoadState, ActionError> {
        self.run(scripts::load_state(), &"document").await
    }

    async fn wait_dom_ready(&self, deadline: Instant) -> Result<bool, ActionError> {
        let timeout = deadline.saturating_duration_since(Instant::now());
        poll_until(timeout, self.waits.poll_interval(), move || async move {
            let state = self.load_state().await?;
            Ok::<_, ActionError>(state.ready != "loading")
        })
        .await
    }

    async fn wait_idle(&self, deadline: Instant) -> Result<bool, ActionError> {
        let quiet = Duration::from_millis(self.waits.network_quiet_ms);
        let mut last: Option<(usize, Instant)> = None;
        loop {
            let state = self.load_state().await?;
            let now = Instant::now();
            if state.ready == "complete" {
                match last {
                    Some((seen, since)) if seen == state.resources => {
                        if now.duration_since(since) >= quiet {
                            return Ok(true);
                        }
                    }
                    _ => last = Some((state.resources, now)),
                }
            } else {
                last = None;
            }
            if now >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.waits.poll_interval().min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl BrowserPort for CdpBrowserPort {
    async fn navigate(
        &self,
        url: &str,
        tier: WaitTier,
        timeout: Duration,
    ) -> Result<(), ActionError> {
        let started = Instant::now();
        debug!(url, ?tier, "navigating");
        self.adapter.goto(url, timeout).await?;
        if tier != WaitTier::None {
            let remaining = timeout.saturating_sub(started.elapsed());
            self.wait_for_load(tier, remaining).await?;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ActionError> {
        Ok(self.adapter.url().await?)
    }

    async fn wait_for_url(&self, pattern: &Regex, timeout: Duration) -> Result<(), ActionError> {
        let adapter = &self.adapter;
        let matched = poll_until(timeout, self.waits.poll_interval(), move || async move {
            let url = adapter.url().await?;
            Ok::<_, ActionError>(pattern.is_match(&url))
        })
        .await?;
        if matched {
            return Ok(());
        }
        let last = self.adapter.url().await.unwrap_or_default();
        Err(ActionError::NavigationTimeout(format!(
            "url did not match /{}/ within {}ms (last: {})",
            pattern,
            timeout.as_millis(),
            last
        )))
    }

    async fn wait_for_load(&self, tier: WaitTier, timeout: Duration) -> Result<(), ActionError> {
        let deadline = Instant::now() + timeout;
        let reached = match tier {
            WaitTier::None => true,
            WaitTier::DomReady => self.wait_dom_ready(deadline).await?,
            WaitTier::Idle => self.wait_dom_ready(deadline).await? && self.wait_idle(deadline).await?,
        };
        if reached {
            Ok(())
        } else {
            Err(ActionError::NavigationTimeout(format!(
                "page did not reach {:?} within {}ms",
                tier,
                timeout.as_millis()
            )))
        }
    }

    async fn count(&self, anchor: &AnchorDescriptor) -> Result<usize, ActionError> {
        self.run(scripts::count(anchor)?, anchor).await
    }

    async fn probe(
        &self,
        element: &ElementRef,
        attributes: &[String],
    ) -> Result<ElementState, ActionError> {
        self.run(scripts::probe(element, attributes)?, element).await
    }

    async fn text_content(&self, element: &ElementRef) -> Result<String, ActionError> {
        self.run(scripts::text_content(element)?, element).await
    }

    async fn input_value(&self, element: &ElementRef) -> Result<String, ActionError> {
        self.run(scripts::input_value(element)?, element).await
    }

    async fn descendant_count(
        &self,
        element: &ElementRef,
        css: &str,
    ) -> Result<usize, ActionError> {
        self.run(scripts::descendant_count(element, css)?, element)
            .await
    }

    async fn click(&self, element: &ElementRef, options: ClickOptions) -> Result<(), ActionError> {
        if options.force {
            trace!(%element, "dom click");
            return self.run(scripts::dom_click(element)?, element).await;
        }
        let point: Point = self.run(scripts::click_point(element)?, element).await?;
        trace!(%element, x = point.x, y = point.y, "native click");
        self.adapter.click_at(point.x, point.y).await?;
        Ok(())
    }

    async fn fill(&self, element: &ElementRef, value: &str) -> Result<(), ActionError> {
        self.run(scripts::fill(element, value)?, element).await
    }

    async fn type_text(
        &self,
        element: &ElementRef,
        text: &str,
        delay: Duration,
    ) -> Result<(), ActionError> {
        self.run::<()>(scripts::focus(element)?, element).await?;
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.adapter.insert_text(ch.encode_utf8(&mut buf)).await?;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    async fn select_option(
        &self,
        element: &ElementRef,
        method: SelectMethod,
        item: &str,
    ) -> Result<(), ActionError> {
        self.run(scripts::select_option(element, method, item)?, element)
            .await
    }

    async fn check(&self, element: &ElementRef) -> Result<(), ActionError> {
        let checked: bool = self.run(scripts::check(element)?, element).await?;
        if !checked {
            debug!(%element, "element did not report checked after click");
        }
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), ActionError> {
        self.run(scripts::scroll_into_view(element)?, element)
            .await
    }

    async fn scroll(&self, target: &ScrollTarget) -> Result<(), ActionError> {
        self.run(scripts::scroll_page(target)?, &"page").await
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), ActionError> {
        self.adapter.screenshot(path, full_page).await?;
        Ok(())
    }
}
