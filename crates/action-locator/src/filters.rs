//! Secondary exclusion filters applied to visible matches.

use action_primitives::{ActionError, BrowserPort, ElementRef, ElementState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementFilter {
    /// Reject when the class attribute contains any word (case-insensitive)
    ExcludeClassWords { words: Vec<String> },

    /// Reject when the attribute contains `needle`
    ExcludeAttrContains { name: String, needle: String },

    /// Reject when the attribute is an integer below `threshold`.
    /// Present but non-numeric values are rejected too.
    ExcludeNumericAttrBelow { name: String, threshold: i64 },

    /// Require the attribute to be present with one of `values`
    RequireAttrOneOf { name: String, values: Vec<String> },

    /// Require at least `min` descendants matching `css`
    MinDescendants { css: String, min: usize },
}

impl ElementFilter {
    pub fn exclude_classes<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ExcludeClassWords {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Attribute this filter needs from a probe.
    fn attribute(&self) -> Option<&str> {
        match self {
            ElementFilter::ExcludeAttrContains { name, .. }
            | ElementFilter::ExcludeNumericAttrBelow { name, .. }
            | ElementFilter::RequireAttrOneOf { name, .. } => Some(name.as_str()),
            ElementFilter::ExcludeClassWords { .. } | ElementFilter::MinDescendants { .. } => None,
        }
    }

    /// Returns the rejection reason, or `None` when the element passes.
    pub async fn reject_reason(
        &self,
        port: &dyn BrowserPort,
        element: &ElementRef,
        state: &ElementState,
    ) -> Result<Option<String>, ActionError> {
        let reason = match self {
            ElementFilter::ExcludeClassWords { words } => {
                let class = state.class.to_lowercase();
                words
                    .iter()
                    .find(|w| class.contains(&w.to_lowercase()))
                    .map(|w| format!("class '{}' contains '{}'", state.class, w))
            }
            ElementFilter::ExcludeAttrContains { name, needle } => state
                .attr(name)
                .filter(|v| v.contains(needle.as_str()))
                .map(|v| format!("{}='{}' contains '{}'", name, v, needle)),
            ElementFilter::ExcludeNumericAttrBelow { name, threshold } => {
                match state.attr(name) {
                    None => None,
                    Some(raw) => match raw.trim().parse::<i64>() {
                        Ok(n) if n < *threshold => {
                            Some(format!("{}={} below {}", name, n, threshold))
                        }
                        Ok(_) => None,
                        Err(_) => Some(format!("{}='{}' is not numeric", name, raw)),
                    },
                }
            }
            ElementFilter::RequireAttrOneOf { name, values } => match state.attr(name) {
                Some(v) if values.iter().any(|allowed| allowed == v) => None,
                Some(v) => Some(format!("{}='{}' not in {:?}", name, v, values)),
                None => Some(format!("{} missing", name)),
            },
            ElementFilter::MinDescendants { css, min } => {
                let found = port.descendant_count(element, css).await?;
                (found < *min).then(|| format!("{} '{}' descendant(s), need {}", found, css, min))
            }
        };
        Ok(reason)
    }
}

/// Attribute names the probe must return for `filters`.
pub fn required_attributes(filters: &[ElementFilter]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in filters.iter().filter_map(ElementFilter::attribute) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// First rejection among `filters`, in order.
pub async fn first_rejection(
    filters: &[ElementFilter],
    port: &dyn BrowserPort,
    element: &ElementRef,
    state: &ElementState,
) -> Result<Option<String>, ActionError> {
    for filter in filters {
        if let Some(reason) = filter.reject_reason(port, element, state).await? {
            return Ok(Some(reason));
        }
    }
    Ok(None)
}
