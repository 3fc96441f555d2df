//! Scripts evaluated inside the page.
//!
//! Every script that can fail returns a JSON string envelope
//! (`{"status": "ok", "value": ...}` and friends) so that absence and
//! in-page exceptions come back as data instead of CDP exception details.

use crate::errors::{HarnessError, Result};
use serde::Deserialize;
use serde_json::Value;

pub const LOCATION_HASH: &str = "document.location.hash";
pub const BODY_HTML: &str = "document.body.innerHTML";

/// Attribute stamped on nodes handed out as element handles.
pub const HANDLE_ATTRIBUTE: &str = "data-e2e-handle";

/// Requires the application to expose `window.UrlPattern`.
pub const URL_MATCHES_FN: &str = r#"(pattern) => {
    const url = document.location.hash.replace('#', '');
    return (new window.UrlPattern(pattern)).match(url) !== null;
}"#;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScriptOutcome {
    Ok { value: Value },
    Missing,
    Detached,
    Failed { message: String },
}

impl ScriptOutcome {
    /// Decode the string a script returned.
    pub fn parse(raw: Option<Value>) -> Result<Self> {
        match raw {
            Some(Value::String(json)) => Ok(serde_json::from_str(&json)?),
            other => Err(HarnessError::JavaScriptFailed(format!(
                "script returned no envelope: {:?}",
                other
            ))),
        }
    }

    /// Unwrap a value, turning absence of `selector` into `NotFound`.
    pub fn into_value(self, selector: &str) -> Result<Value> {
        match self {
            ScriptOutcome::Ok { value } => Ok(value),
            ScriptOutcome::Missing => Err(HarnessError::not_found(selector)),
            ScriptOutcome::Detached => Err(HarnessError::Browser(format!(
                "element handle detached while resolving {:?}",
                selector
            ))),
            ScriptOutcome::Failed { message } => Err(HarnessError::JavaScriptFailed(message)),
        }
    }
}

/// Root node expression: the document, or a previously stamped element.
pub fn root_expression(handle: Option<&str>) -> String {
    match handle {
        None => "document".to_string(),
        Some(token) => format!(
            "document.querySelector({})",
            js_string(&handle_selector(token))
        ),
    }
}

pub fn handle_selector(token: &str) -> String {
    format!("[{}=\"{}\"]", HANDLE_ATTRIBUTE, token)
}

fn envelope(root: &str, body: &str) -> String {
    format!(
        r#"(async () => {{
    try {{
        const root = {root};
        if (!root) return JSON.stringify({{ status: 'detached' }});
        {body}
    }} catch (e) {{
        return JSON.stringify({{ status: 'failed', message: String(e && e.message || e) }});
    }}
}})()"#,
        root = root,
        body = body
    )
}

/// Stamp the first match with a handle token (reusing an existing one) and return the token.
pub fn tag_first_script(root: &str, selector: &str, token: &str) -> String {
    let body = format!(
        r#"const el = root.querySelector({selector});
        if (!el) return JSON.stringify({{ status: 'ok', value: null }});
        if (!el.hasAttribute('{attr}')) el.setAttribute('{attr}', {token});
        return JSON.stringify({{ status: 'ok', value: el.getAttribute('{attr}') }});"#,
        selector = js_string(selector),
        attr = HANDLE_ATTRIBUTE,
        token = js_string(token)
    );
    envelope(root, &body)
}

/// Stamp every match and return the tokens in document order.
pub fn tag_all_script(root: &str, selector: &str, token_prefix: &str) -> String {
    let body = format!(
        r#"const els = Array.from(root.querySelectorAll({selector}));
        const tokens = els.map((el, i) => {{
            if (!el.hasAttribute('{attr}')) el.setAttribute('{attr}', {prefix} + i);
            return el.getAttribute('{attr}');
        }});
        return JSON.stringify({{ status: 'ok', value: tokens }});"#,
        selector = js_string(selector),
        attr = HANDLE_ATTRIBUTE,
        prefix = js_string(token_prefix)
    );
    envelope(root, &body)
}

pub fn eval_one_script(root: &str, selector: &str, function: &str) -> String {
    let body = format!(
        r#"const el = root.querySelector({selector});
        if (!el) return JSON.stringify({{ status: 'missing' }});
        const value = await ({function})(el);
        return JSON.stringify({{ status: 'ok', value: value === undefined ? null : value }});"#,
        selector = js_string(selector),
        function = function
    );
    envelope(root, &body)
}

pub fn eval_all_script(root: &str, selector: &str, function: &str) -> String {
    let body = format!(
        r#"const els = Array.from(root.querySelectorAll({selector}));
        const value = await ({function})(els);
        return JSON.stringify({{ status: 'ok', value: value === undefined ? null : value }});"#,
        selector = js_string(selector),
        function = function
    );
    envelope(root, &body)
}

/// Call `function(...args)` once and report its truthiness.
pub fn predicate_script(function: &str, args: &[Value]) -> String {
    let args = serde_json::to_string(args).unwrap_or_else(|_| "[]".to_string());
    let body = format!(
        r#"const value = await ({function})(...{args});
        return JSON.stringify({{ status: 'ok', value: !!value }});"#,
        function = function,
        args = args
    );
    envelope("document", &body)
}

/// A JavaScript string literal for `value`.
pub fn js_string(value: &str) -> String {
    // JSON string literals are valid JavaScript string literals
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}
