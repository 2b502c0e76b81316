//! In-page scripts evaluated by [`crate::CdpBrowserPort`].
//!
//! Every element script resolves its anchor from scratch and answers with a
//! small JSON envelope tagged by `status`.

use serde::Deserialize;

use crate::errors::ActionError;
use crate::types::{AnchorDescriptor, ElementRef, ScrollTarget, SelectMethod};

const PRELUDE: &str = r#"
const __bfNorm = (s) => (s || '').replace(/\s+/g, ' ').trim();
const __bfOk = (v) => ({ status: 'ok', value: v === undefined ? null : v });
const __bfRoles = {
  button: 'button, input[type="button"], input[type="submit"], input[type="reset"]',
  link: 'a[href]',
  list: 'ul, ol',
  listitem: 'li',
  checkbox: 'input[type="checkbox"]',
  radio: 'input[type="radio"]',
  combobox: 'select',
  option: 'option',
  textbox: 'input:not([type]), input[type="text"], input[type="email"], input[type="tel"], textarea',
  heading: 'h1, h2, h3, h4, h5, h6',
  dialog: 'dialog',
};
const __bfResolve = (a) => {
  switch (a.kind) {
    case 'css':
      return Array.from(document.querySelectorAll(a.selector));
    case 'text': {
      const all = Array.from(document.querySelectorAll(a.scope || '*'));
      const mode = a.mode || 'contains';
      if (mode === 'exact') {
        return all.filter((el) => __bfNorm(el.textContent) === a.content.trim());
      }
      if (mode === 'pattern') {
        const re = new RegExp(a.content);
        return all.filter((el) => re.test(__bfNorm(el.textContent)));
      }
      const needle = __bfNorm(a.content).toLowerCase();
      return all.filter((el) => __bfNorm(el.textContent).toLowerCase().includes(needle));
    }
    case 'attribute': {
      const all = Array.from(document.querySelectorAll(a.scope || '*'));
      return all.filter((el) => {
        const v = el.getAttribute(a.name);
        if (v === null) return false;
        if (a.op === 'present') return true;
        if (a.op === 'equals') return v === (a.value || '');
        return v.includes(a.value || '');
      });
    }
    case 'role': {
      const implied = __bfRoles[a.role];
      const sel = implied ? `[role="${a.role}"], ${implied}` : `[role="${a.role}"]`;
      let all = Array.from(document.querySelectorAll(sel));
      if (a.name) {
        const n = a.name.toLowerCase();
        all = all.filter((el) =>
          __bfNorm(el.getAttribute('aria-label') || el.textContent).toLowerCase().includes(n));
      }
      return all;
    }
    case 'nested': {
      const out = [];
      for (const p of __bfResolve(a.parent)) {
        for (const el of p.querySelectorAll(a.css)) {
          if (!out.includes(el)) out.push(el);
        }
      }
      return out;
    }
  }
  return [];
};
const __bfVisible = (el) => {
  if (!el.isConnected) return false;
  const st = window.getComputedStyle(el);
  if (st.visibility === 'hidden' || st.display === 'none') return false;
  const r = el.getBoundingClientRect();
  return r.width > 0 && r.height > 0;
};
"#;

/// Reply envelope produced by every script.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum ScriptReply<T> {
    Ok { value: T },
    Missing { count: usize },
    Hidden,
    Error { message: String },
}

impl<T> ScriptReply<T> {
    pub(crate) fn into_result(self, target: &(dyn std::fmt::Display + Sync)) -> Result<T, ActionError> {
        match self {
            ScriptReply::Ok { value } => Ok(value),
            ScriptReply::Missing { count } => Err(ActionError::ElementNotFound(format!(
                "{} (only {} match(es))",
                target, count
            ))),
            ScriptReply::Hidden => Err(ActionError::ElementNotVisible(target.to_string())),
            ScriptReply::Error { message } => {
                Err(ActionError::Cdp(format!("{}: {}", target, message)))
            }
        }
    }
}

fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ActionError> {
    serde_json::to_string(value)
        .map_err(|err| ActionError::Cdp(format!("failed to encode script argument: {}", err)))
}

fn wrap(body: &str) -> String {
    format!(
        "(() => {{{prelude}\ntry {{\n{body}\n}} catch (e) {{ return {{ status: 'error', message: String((e && e.message) || e) }}; }}\n}})()",
        prelude = PRELUDE,
        body = body
    )
}

pub(crate) fn count(anchor: &AnchorDescriptor) -> Result<String, ActionError> {
    Ok(wrap(&format!(
        "return __bfOk(__bfResolve({}).length);",
        json(anchor)?
    )))
}

/// Script running `body` with `el` bound to the referenced element.
pub(crate) fn on_element(element: &ElementRef, body: &str) -> Result<String, ActionError> {
    Ok(wrap(&format!(
        "const __els = __bfResolve({anchor});\nconst el = __els[{index}];\nif (!el) return {{ status: 'missing', count: __els.length }};\n{body}",
        anchor = json(&element.anchor)?,
        index = element.index,
        body = body
    )))
}

pub(crate) fn probe(element: &ElementRef, attributes: &[String]) -> Result<String, ActionError> {
    on_element(
        element,
        &format!(
            "return __bfOk({{
  visible: __bfVisible(el),
  enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true',
  tag: el.tagName.toLowerCase(),
  class: el.getAttribute('class') || '',
  attributes: Object.fromEntries({attrs}.map((n) => [n, el.getAttribute(n)]).filter(([, v]) => v !== null)),
}});",
            attrs = json(attributes)?
        ),
    )
}

pub(crate) fn text_content(element: &ElementRef) -> Result<String, ActionError> {
    on_element(element, "return __bfOk(el.textContent || '');")
}

pub(crate) fn input_value(element: &ElementRef) -> Result<String, ActionError> {
    on_element(
        element,
        "return __bfOk('value' in el ? String(el.value) : (el.textContent || ''));",
    )
}

pub(crate) fn descendant_count(element: &ElementRef, css: &str) -> Result<String, ActionError> {
    on_element(
        element,
        &format!("return __bfOk(el.querySelectorAll({}).length);", json(css)?),
    )
}

pub(crate) fn dom_click(element: &ElementRef) -> Result<String, ActionError> {
    on_element(
        element,
        "el.scrollIntoView({ block: 'center', inline: 'center' });\nel.click();\nreturn __bfOk(null);",
    )
}

/// Scrolls the element into view and returns its centre for a native click.
pub(crate) fn click_point(element: &ElementRef) -> Result<String, ActionError> {
    on_element(
        element,
        "el.scrollIntoView({ block: 'center', inline: 'center' });
if (!__bfVisible(el)) return { status: 'hidden' };
if (el.disabled) return { status: 'error', message: 'element is disabled' };
const r = el.getBoundingClientRect();
return __bfOk({ x: r.left + r.width / 2, y: r.top + r.height / 2 });",
    )
}

pub(crate) fn fill(element: &ElementRef, value: &str) -> Result<String, ActionError> {
    on_element(
        element,
        &format!(
            "const v = {value};
el.focus();
const desc = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value');
if (desc && desc.set) desc.set.call(el, v); else el.value = v;
el.dispatchEvent(new Event('input', {{ bubbles: true }}));
el.dispatchEvent(new Event('change', {{ bubbles: true }}));
return __bfOk(null);",
            value = json(value)?
        ),
    )
}

pub(crate) fn focus(element: &ElementRef) -> Result<String, ActionError> {
    on_element(
        element,
        "el.scrollIntoView({ block: 'center' });\nel.focus();\nreturn __bfOk(null);",
    )
}

pub(crate) fn select_option(
    element: &ElementRef,
    method: SelectMethod,
    item: &str,
) -> Result<String, ActionError> {
    let method = match method {
        SelectMethod::Text => "text",
        SelectMethod::Value => "value",
        SelectMethod::Index => "index",
    };
    on_element(
        element,
        &format!(
            "const item = {item};
if (el.tagName !== 'SELECT') return {{ status: 'error', message: 'not a <select> element' }};
const opts = Array.from(el.options);
let idx = -1;
if ('{method}' === 'index') idx = Number(item);
else if ('{method}' === 'value') idx = opts.findIndex((o) => o.value === item);
else idx = opts.findIndex((o) => __bfNorm(o.textContent) === item.trim());
if (!(idx >= 0 && idx < opts.length)) return {{ status: 'error', message: 'option not found: ' + item }};
el.selectedIndex = idx;
el.dispatchEvent(new Event('input', {{ bubbles: true }}));
el.dispatchEvent(new Event('change', {{ bubbles: true }}));
return __bfOk(null);",
            item = json(item)?,
            method = method
        ),
    )
}

pub(crate) fn check(element: &ElementRef) -> Result<String, ActionError> {
    on_element(element, "if (!el.checked) el.click();\nreturn __bfOk(!!el.checked);")
}

pub(crate) fn scroll_into_view(element: &ElementRef) -> Result<String, ActionError> {
    on_element(
        element,
        "el.scrollIntoView({ block: 'center' });\nreturn __bfOk(null);",
    )
}

pub(crate) fn scroll_page(target: &ScrollTarget) -> Result<String, ActionError> {
    match target {
        ScrollTarget::Top => Ok(wrap("window.scrollTo(0, 0);\nreturn __bfOk(null);")),
        ScrollTarget::Bottom => Ok(wrap(
            "window.scrollTo(0, document.body.scrollHeight);\nreturn __bfOk(null);",
        )),
        ScrollTarget::Pixels(dy) => Ok(wrap(&format!(
            "window.scrollBy(0, {});\nreturn __bfOk(null);",
            dy
        ))),
        ScrollTarget::Element(element) => scroll_into_view(element),
    }
}

/// Document readiness plus the number of resource entries seen so far.
pub(crate) fn load_state() -> String {
    wrap(
        "return __bfOk({ ready: document.readyState, resources: performance.getEntriesByType('resource').length });",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_scripts_embed_anchor_and_index() {
        let el = AnchorDescriptor::css("label[ng-click]").nth(3);
        let script = text_content(&el).unwrap();
        assert!(script.contains(r#"{"kind":"css","selector":"label[ng-click]"}"#));
        assert!(script.contains("__els[3]"));
        assert!(script.starts_with("(() => {"));
        assert!(script.ends_with("})()"));
    }

    #[test]
    fn fill_escapes_value() {
        let el = AnchorDescriptor::css("input").nth(0);
        let script = fill(&el, "it's \"quoted\"").unwrap();
        assert!(script.contains(r#"const v = "it's \"quoted\"";"#));
    }

    #[test]
    fn replies_map_to_action_errors() {
        let el = AnchorDescriptor::css("#x").nth(1);
        let missing: ScriptReply<()> = serde_json::from_str(r#"{"status":"missing","count":1}"#).unwrap();
        assert!(matches!(
            missing.into_result(&el),
            Err(ActionError::ElementNotFound(_))
        ));
        let hidden: ScriptReply<()> = serde_json::from_str(r#"{"status":"hidden"}"#).unwrap();
        assert!(matches!(
            hidden.into_result(&el),
            Err(ActionError::ElementNotVisible(_))
        ));
        let ok: ScriptReply<usize> =
            serde_json::from_str(r#"{"status":"ok","value":4}"#).unwrap();
        assert_eq!(ok.into_result(&el).unwrap(), 4);
    }
}
