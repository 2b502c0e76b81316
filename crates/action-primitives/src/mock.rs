//! In-memory page for exercising locators, gates and flows without Chromium.
//!
//! Elements are matched by the exact selector strings they are registered
//! with (or their tag name), so tests describe a DOM by listing which
//! selectors each node answers to.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::time::Instant;

use crate::errors::ActionError;
use crate::port::BrowserPort;
use crate::types::{
    AnchorDescriptor, AttrOp, ClickOptions, ElementRef, ElementState, ScrollTarget, SelectMethod,
    TextMode, WaitTier,
};
use crate::waiting::poll_until;

/// One node of the mock DOM.
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    pub tag: String,
    pub selectors: Vec<String>,
    pub text: String,
    pub class: String,
    pub attrs: BTreeMap<String, String>,
    pub role: Option<String>,
    pub visible: bool,
    pub enabled: bool,
    pub value: String,
    pub checked: bool,
    /// `(value, label)` pairs of a `<select>`
    pub options: Vec<(String, String)>,
    pub selected: Option<usize>,
    pub parent: Option<usize>,
    pub appears_after: Option<Duration>,
    pub class_after_click: Option<String>,
    pub url_after_click: Option<String>,
    pub click_error: Option<ActionError>,
    /// Child lookups fail as if the node was re-rendered after its probe
    pub detached_children: bool,
}

impl MockElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            visible: true,
            enabled: true,
            ..Default::default()
        }
    }

    pub fn matching(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Options of a `<select>`, used as both value and label.
    pub fn options(mut self, labels: &[&str]) -> Self {
        self.options = labels
            .iter()
            .map(|l| (l.to_string(), l.to_string()))
            .collect();
        self
    }

    pub fn child_of(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = Some(delay);
        self
    }

    pub fn on_click_class(mut self, class: impl Into<String>) -> Self {
        self.class_after_click = Some(class.into());
        self
    }

    pub fn on_click_navigate(mut self, url: impl Into<String>) -> Self {
        self.url_after_click = Some(url.into());
        self
    }

    pub fn failing_clicks(mut self, err: ActionError) -> Self {
        self.click_error = Some(err);
        self
    }

    pub fn detached_children(mut self) -> Self {
        self.detached_children = true;
        self
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "class" if !self.class.is_empty() => Some(self.class.as_str()),
            _ => self.attrs.get(name).map(String::as_str),
        }
    }

    fn matches_css(&self, selector: &str) -> bool {
        self.tag == selector || self.selectors.iter().any(|s| s == selector)
    }

    fn implied_role(&self) -> Option<&str> {
        if let Some(role) = &self.role {
            return Some(role.as_str());
        }
        match self.tag.as_str() {
            "button" => Some("button"),
            "li" => Some("listitem"),
            "a" => Some("link"),
            "select" => Some("combobox"),
            _ => None,
        }
    }
}

/// Operations recorded by [`MockPage`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum MockAction {
    Navigate(String),
    Click { id: usize, force: bool },
    Fill { id: usize, value: String },
    Type { id: usize, text: String },
    Select { id: usize, method: SelectMethod, item: String },
    Check { id: usize },
    ScrollIntoView { id: usize },
    Scroll(ScrollTarget),
    Screenshot { path: PathBuf, full_page: bool },
}

#[derive(Default)]
struct MockState {
    url: String,
    elements: Vec<MockElement>,
    failing: Vec<(AnchorDescriptor, ActionError)>,
    stalled: Vec<AnchorDescriptor>,
    log: Vec<MockAction>,
}

pub struct MockPage {
    state: Mutex<MockState>,
    created: Instant,
}

fn normalise(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl MockPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(MockState {
                url: url.into(),
                ..Default::default()
            }),
            created: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a node and returns its id.
    pub fn add(&self, element: MockElement) -> usize {
        let mut state = self.lock();
        state.elements.push(element);
        state.elements.len() - 1
    }

    /// Lookups of `anchor` fail with `err`.
    pub fn fail_lookups(&self, anchor: AnchorDescriptor, err: ActionError) {
        self.lock().failing.push((anchor, err));
    }

    /// Lookups of `anchor` never return.
    pub fn stall_lookups(&self, anchor: AnchorDescriptor) {
        self.lock().stalled.push(anchor);
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.lock().url = url.into();
    }

    pub fn url(&self) -> String {
        self.lock().url.clone()
    }

    pub fn element(&self, id: usize) -> Option<MockElement> {
        self.lock().elements.get(id).cloned()
    }

    pub fn actions(&self) -> Vec<MockAction> {
        self.lock().log.clone()
    }

    /// Ids of clicked nodes, in click order.
    pub fn clicked(&self) -> Vec<usize> {
        self.lock()
            .log
            .iter()
            .filter_map(|a| match a {
                MockAction::Click { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn present(&self, element: &MockElement) -> bool {
        match element.appears_after {
            Some(delay) => self.created.elapsed() >= delay,
            None => true,
        }
    }

    fn matches(&self, state: &MockState, anchor: &AnchorDescriptor) -> Result<Vec<usize>, ActionError> {
        if let Some((_, err)) = state.failing.iter().find(|(a, _)| a == anchor) {
            return Err(err.clone());
        }
        let in_scope = |el: &MockElement, scope: &Option<String>| {
            scope.as_deref().map_or(true, |s| el.matches_css(s))
        };
        let pattern = match anchor {
            AnchorDescriptor::Text {
                content,
                mode: TextMode::Pattern,
                ..
            } => Some(
                Regex::new(content)
                    .map_err(|err| ActionError::Cdp(format!("invalid pattern: {}", err)))?,
            ),
            _ => None,
        };
        let parents = match anchor {
            AnchorDescriptor::Nested { parent, .. } => self.matches(state, parent)?,
            _ => Vec::new(),
        };

        let mut out = Vec::new();
        for (id, el) in state.elements.iter().enumerate() {
            if !self.present(el) {
                continue;
            }
            let hit = match anchor {
                AnchorDescriptor::Css { selector } => el.matches_css(selector),
                AnchorDescriptor::Text {
                    scope,
                    content,
                    mode,
                } => {
                    let text = normalise(&el.text);
                    in_scope(el, scope)
                        && match mode {
                            TextMode::Contains => text
                                .to_lowercase()
                                .contains(&normalise(content).to_lowercase()),
                            TextMode::Exact => text == content.trim(),
                            TextMode::Pattern => {
                                pattern.as_ref().is_some_and(|re| re.is_match(&text))
                            }
                        }
                }
                AnchorDescriptor::Attribute {
                    scope,
                    name,
                    op,
                    value,
                } => {
                    let wanted = value.as_deref().unwrap_or("");
                    in_scope(el, scope)
                        && match (el.attribute(name), op) {
                            (None, _) => false,
                            (Some(_), AttrOp::Present) => true,
                            (Some(v), AttrOp::Equals) => v == wanted,
                            (Some(v), AttrOp::Contains) => v.contains(wanted),
                        }
                }
                AnchorDescriptor::Role { role, name } => {
                    el.implied_role() == Some(role.as_str())
                        && name.as_deref().map_or(true, |n| {
                            let label = el.attrs.get("aria-label").unwrap_or(&el.text);
                            normalise(label).to_lowercase().contains(&n.to_lowercase())
                        })
                }
                AnchorDescriptor::Nested { css, .. } => {
                    el.matches_css(css) && self.has_ancestor_in(state, el, &parents)
                }
            };
            if hit {
                out.push(id);
            }
        }
        Ok(out)
    }

    fn has_ancestor_in(&self, state: &MockState, el: &MockElement, ids: &[usize]) -> bool {
        let mut cursor = el.parent;
        while let Some(id) = cursor {
            if ids.contains(&id) {
                return true;
            }
            cursor = state.elements.get(id).and_then(|p| p.parent);
        }
        false
    }

    fn resolve(&self, state: &MockState, element: &ElementRef) -> Result<usize, ActionError> {
        let matches = self.matches(state, &element.anchor)?;
        matches.get(element.index).copied().ok_or_else(|| {
            ActionError::ElementNotFound(format!(
                "{} (only {} match(es))",
                element,
                matches.len()
            ))
        })
    }

    fn is_stalled(&self, anchor: &AnchorDescriptor) -> bool {
        self.lock().stalled.iter().any(|a| a == anchor)
    }

    fn with_element<T>(
        &self,
        element: &ElementRef,
        f: impl FnOnce(&mut MockState, usize) -> Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        let mut state = self.lock();
        let id = self.resolve(&state, element)?;
        f(&mut state, id)
    }

    fn clamp_to_maxlength(el: &MockElement, value: String) -> String {
        match el.attrs.get("maxlength").and_then(|m| m.parse::<usize>().ok()) {
            Some(max) => value.chars().take(max).collect(),
            None => value,
        }
    }
}

#[async_trait]
impl BrowserPort for MockPage {
    async fn navigate(
        &self,
        url: &str,
        _tier: WaitTier,
        _timeout: Duration,
    ) -> Result<(), ActionError> {
        let mut state = self.lock();
        state.url = url.to_string();
        state.log.push(MockAction::Navigate(url.to_string()));
        Ok(())
    }

    async fn current_url(&self) -> Result<String, ActionError> {
        Ok(self.url())
    }

    async fn wait_for_url(&self, pattern: &Regex, timeout: Duration) -> Result<(), ActionError> {
        let matched = poll_until(timeout, Duration::from_millis(100), move || async move {
            Ok::<_, ActionError>(pattern.is_match(&self.url()))
        })
        .await?;
        if matched {
            Ok(())
        } else {
            Err(ActionError::NavigationTimeout(format!(
                "url did not match /{}/ (last: {})",
                pattern,
                self.url()
            )))
        }
    }

    async fn wait_for_load(&self, _tier: WaitTier, _timeout: Duration) -> Result<(), ActionError> {
        Ok(())
    }

    async fn count(&self, anchor: &AnchorDescriptor) -> Result<usize, ActionError> {
        if self.is_stalled(anchor) {
            std::future::pending::<()>().await;
        }
        let state = self.lock();
        Ok(self.matches(&state, anchor)?.len())
    }

    async fn probe(
        &self,
        element: &ElementRef,
        attributes: &[String],
    ) -> Result<ElementState, ActionError> {
        self.with_element(element, |state, id| {
            let el = &state.elements[id];
            Ok(ElementState {
                visible: el.visible,
                enabled: el.enabled,
                tag: el.tag.clone(),
                class: el.class.clone(),
                attributes: attributes
                    .iter()
                    .filter_map(|name| el.attribute(name).map(|v| (name.clone(), v.to_string())))
                    .collect(),
            })
        })
    }

    async fn text_content(&self, element: &ElementRef) -> Result<String, ActionError> {
        self.with_element(element, |state, id| Ok(state.elements[id].text.clone()))
    }

    async fn input_value(&self, element: &ElementRef) -> Result<String, ActionError> {
        self.with_element(element, |state, id| Ok(state.elements[id].value.clone()))
    }

    async fn descendant_count(
        &self,
        element: &ElementRef,
        css: &str,
    ) -> Result<usize, ActionError> {
        let state = self.lock();
        let id = self.resolve(&state, element)?;
        if state.elements[id].detached_children {
            return Err(ActionError::ElementNotFound(element.to_string()));
        }
        let children = state
            .elements
            .iter()
            .filter(|el| el.matches_css(css) && self.has_ancestor_in(&state, el, &[id]))
            .count();
        let options = if css == "option" {
            state.elements[id].options.len()
        } else {
            0
        };
        Ok(children + options)
    }

    async fn click(&self, element: &ElementRef, options: ClickOptions) -> Result<(), ActionError> {
        self.with_element(element, |state, id| {
            let el = &mut state.elements[id];
            if let Some(err) = &el.click_error {
                return Err(err.clone());
            }
            if !options.force && !el.visible {
                return Err(ActionError::ElementNotVisible(element.to_string()));
            }
            if !options.force && !el.enabled {
                return Err(ActionError::ActionTimeout(format!(
                    "{} is disabled",
                    element
                )));
            }
            if el.tag == "input" {
                match el.attrs.get("type").map(String::as_str) {
                    Some("checkbox") => el.checked = !el.checked,
                    Some("radio") => el.checked = true,
                    _ => {}
                }
            }
            if let Some(class) = el.class_after_click.take() {
                el.class = class;
            }
            let navigate = el.url_after_click.clone();
            if let Some(url) = navigate {
                state.url = url;
            }
            state.log.push(MockAction::Click {
                id,
                force: options.force,
            });
            Ok(())
        })
    }

    async fn fill(&self, element: &ElementRef, value: &str) -> Result<(), ActionError> {
        self.with_element(element, |state, id| {
            let el = &mut state.elements[id];
            if !el.visible {
                return Err(ActionError::ElementNotVisible(element.to_string()));
            }
            el.value = Self::clamp_to_maxlength(el, value.to_string());
            state.log.push(MockAction::Fill {
                id,
                value: value.to_string(),
            });
            Ok(())
        })
    }

    async fn type_text(
        &self,
        element: &ElementRef,
        text: &str,
        delay: Duration,
    ) -> Result<(), ActionError> {
        self.with_element(element, |state, id| {
            let el = &mut state.elements[id];
            if !el.visible {
                return Err(ActionError::ElementNotVisible(element.to_string()));
            }
            let typed = format!("{}{}", el.value, text);
            el.value = Self::clamp_to_maxlength(el, typed);
            state.log.push(MockAction::Type {
                id,
                text: text.to_string(),
            });
            Ok(())
        })?;
        let keys = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        tokio::time::sleep(delay * keys).await;
        Ok(())
    }

    async fn select_option(
        &self,
        element: &ElementRef,
        method: SelectMethod,
        item: &str,
    ) -> Result<(), ActionError> {
        self.with_element(element, |state, id| {
            let el = &mut state.elements[id];
            let index = match method {
                SelectMethod::Index => item.parse::<usize>().ok(),
                SelectMethod::Value => el.options.iter().position(|(v, _)| v == item),
                SelectMethod::Text => el.options.iter().position(|(_, l)| l == item.trim()),
            }
            .filter(|i| *i < el.options.len())
            .ok_or_else(|| ActionError::Cdp(format!("option not found: {}", item)))?;
            el.selected = Some(index);
            el.value = el.options[index].0.clone();
            state.log.push(MockAction::Select {
                id,
                method,
                item: item.to_string(),
            });
            Ok(())
        })
    }

    async fn check(&self, element: &ElementRef) -> Result<(), ActionError> {
        self.with_element(element, |state, id| {
            state.elements[id].checked = true;
            state.log.push(MockAction::Check { id });
            Ok(())
        })
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), ActionError> {
        self.with_element(element, |state, id| {
            state.log.push(MockAction::ScrollIntoView { id });
            Ok(())
        })
    }

    async fn scroll(&self, target: &ScrollTarget) -> Result<(), ActionError> {
        self.lock().log.push(MockAction::Scroll(target.clone()));
        Ok(())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<(), ActionError> {
        self.lock().log.push(MockAction::Screenshot {
            path: path.to_path_buf(),
            full_page,
        });
        Ok(())
    }
}
