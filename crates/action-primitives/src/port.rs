use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::errors::ActionError;
use crate::types::{
    AnchorDescriptor, ClickOptions, ElementRef, ElementState, ScrollTarget, SelectMethod, WaitTier,
};

/// The page operations the locator, gate and flows rely on.
///
/// Every element operation re-resolves its [`ElementRef`] against the live
/// page. An index past the current match count yields
/// [`ActionError::ElementNotFound`].
#[async_trait]
pub trait BrowserPort: Send + Sync {
    /// Navigate and wait for `tier`, bounded by `timeout`
    async fn navigate(&self, url: &str, tier: WaitTier, timeout: Duration)
        -> Result<(), ActionError>;

    async fn current_url(&self) -> Result<String, ActionError>;

    /// Wait until the current URL matches `pattern`
    async fn wait_for_url(&self, pattern: &Regex, timeout: Duration) -> Result<(), ActionError>;

    async fn wait_for_load(&self, tier: WaitTier, timeout: Duration) -> Result<(), ActionError>;

    /// Number of nodes the anchor currently resolves to
    async fn count(&self, anchor: &AnchorDescriptor) -> Result<usize, ActionError>;

    /// Visibility, class and the requested attributes of one match
    async fn probe(
        &self,
        element: &ElementRef,
        attributes: &[String],
    ) -> Result<ElementState, ActionError>;

    async fn text_content(&self, element: &ElementRef) -> Result<String, ActionError>;

    async fn input_value(&self, element: &ElementRef) -> Result<String, ActionError>;

    /// Number of descendants of `element` matching `css`
    async fn descendant_count(&self, element: &ElementRef, css: &str)
        -> Result<usize, ActionError>;

    async fn click(&self, element: &ElementRef, options: ClickOptions) -> Result<(), ActionError>;

    /// Replace the field value
    async fn fill(&self, element: &ElementRef, value: &str) -> Result<(), ActionError>;

    /// Focus the field and type `text` key by key
    async fn type_text(
        &self,
        element: &ElementRef,
        text: &str,
        delay: Duration,
    ) -> Result<(), ActionError>;

    async fn select_option(
        &self,
        element: &ElementRef,
        method: SelectMethod,
        item: &str,
    ) -> Result<(), ActionError>;

    /// Tick a checkbox or radio (no-op when already checked)
    async fn check(&self, element: &ElementRef) -> Result<(), ActionError>;

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), ActionError>;

    async fn scroll(&self, target: &ScrollTarget) -> Result<(), ActionError>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), ActionError>;

    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
