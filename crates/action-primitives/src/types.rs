//! Core data types for page operations

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Built-in waiting tiers for actions
///
/// - None: no waiting
/// - DomReady: document parsed (`readyState` past `loading`)
/// - Idle: document complete and resource loading quiet for a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaitTier {
    None,
    #[default]
    DomReady,
    Idle,
}

/// How a text anchor compares an element's normalised text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextMode {
    /// Case-insensitive substring
    #[default]
    Contains,
    /// Whole trimmed text, case-sensitive
    Exact,
    /// Regular expression over the trimmed text
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrOp {
    Equals,
    Contains,
    Present,
}

/// One strategy for finding elements on the page.
///
/// Anchors are plain data: they serialise into the in-page resolver and can
/// be written in YAML intent files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorDescriptor {
    /// CSS selector (selector lists allowed)
    Css { selector: String },

    /// Elements under `scope` (any element when unset) whose text matches
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
        content: String,
        #[serde(default)]
        mode: TextMode,
    },

    /// Elements under `scope` whose attribute satisfies `op`
    Attribute {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
        name: String,
        op: AttrOp,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },

    /// ARIA role (explicit or implied by the tag) with an optional name fragment
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Descendants matching `css` inside every match of `parent`
    Nested {
        parent: Box<AnchorDescriptor>,
        css: String,
    },
}

impl AnchorDescriptor {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    pub fn text(scope: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Text {
            scope: Some(scope.into()),
            content: content.into(),
            mode: TextMode::Contains,
        }
    }

    pub fn text_exact(scope: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Text {
            scope: Some(scope.into()),
            content: content.into(),
            mode: TextMode::Exact,
        }
    }

    pub fn text_pattern(scope: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Text {
            scope: Some(scope.into()),
            content: pattern.into(),
            mode: TextMode::Pattern,
        }
    }

    pub fn attr(
        scope: impl Into<String>,
        name: impl Into<String>,
        op: AttrOp,
        value: Option<&str>,
    ) -> Self {
        Self::Attribute {
            scope: Some(scope.into()),
            name: name.into(),
            op,
            value: value.map(str::to_string),
        }
    }

    pub fn role(role: impl Into<String>, name: Option<&str>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.map(str::to_string),
        }
    }

    pub fn nested(parent: AnchorDescriptor, css: impl Into<String>) -> Self {
        Self::Nested {
            parent: Box::new(parent),
            css: css.into(),
        }
    }

    /// Reference to the `index`-th match of this anchor.
    pub fn nth(&self, index: usize) -> ElementRef {
        ElementRef {
            anchor: self.clone(),
            index,
        }
    }
}

impl fmt::Display for AnchorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorDescriptor::Css { selector } => write!(f, "css:{}", selector),
            AnchorDescriptor::Text {
                scope,
                content,
                mode,
            } => {
                let scope = scope.as_deref().unwrap_or("*");
                match mode {
                    TextMode::Contains => write!(f, "text:{}:has('{}')", scope, content),
                    TextMode::Exact => write!(f, "text:{}:is('{}')", scope, content),
                    TextMode::Pattern => write!(f, "text:{}:re(/{}/)", scope, content),
                }
            }
            AnchorDescriptor::Attribute {
                scope,
                name,
                op,
                value,
            } => {
                let scope = scope.as_deref().unwrap_or("*");
                let value = value.as_deref().unwrap_or("");
                match op {
                    AttrOp::Equals => write!(f, "attr:{}[{}='{}']", scope, name, value),
                    AttrOp::Contains => write!(f, "attr:{}[{}*='{}']", scope, name, value),
                    AttrOp::Present => write!(f, "attr:{}[{}]", scope, name),
                }
            }
            AnchorDescriptor::Role { role, name } => match name {
                Some(name) => write!(f, "role:{}[name~='{}']", role, name),
                None => write!(f, "role:{}", role),
            },
            AnchorDescriptor::Nested { parent, css } => write!(f, "{} >> {}", parent, css),
        }
    }
}

/// The `index`-th match of an anchor.
///
/// Handles into the live DOM go stale on every re-render, so an element
/// reference is re-resolved from its anchor on each operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    pub anchor: AnchorDescriptor,
    pub index: usize,
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.anchor, self.index)
    }
}

/// Snapshot of an element taken by [`crate::BrowserPort::probe`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    pub visible: bool,
    pub enabled: bool,
    pub tag: String,
    pub class: String,
    /// Requested attributes that are present on the element
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementState {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickOptions {
    /// Dispatch the click without actionability checks
    pub force: bool,
}

impl ClickOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// Select method for dropdown selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectMethod {
    /// Select by visible text
    Text,

    /// Select by value attribute
    #[default]
    Value,

    /// Select by index (0-based)
    Index,
}

/// Where to scroll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollTarget {
    Top,
    Bottom,
    /// Scroll by pixel amount (positive=down, negative=up)
    Pixels(i32),
    Element(ElementRef),
}
