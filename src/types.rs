use std::fmt;

/// Attribute carrying test-only hooks on DOM nodes.
pub const HOOK_ATTRIBUTE: &str = "data-hook";

/// A selector descriptor in one of the three addressing modes.
///
/// Hooks are the primary way to address elements: a stable marker
/// attribute that does not move when styling or structure changes.
/// Attribute selectors cover elements without a hook, and `Raw` is the
/// escape hatch for anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Hook {
        name: String,
        pseudo_class: Option<String>,
    },
    Attr {
        name: String,
        pseudo_class: Option<String>,
    },
    Raw(String),
}

impl Selector {
    pub fn hook(name: impl Into<String>) -> Self {
        Selector::Hook {
            name: name.into(),
            pseudo_class: None,
        }
    }

    pub fn attr(name: impl Into<String>) -> Self {
        Selector::Attr {
            name: name.into(),
            pseudo_class: None,
        }
    }

    pub fn raw(css: impl Into<String>) -> Self {
        Selector::Raw(css.into())
    }

    /// Appends a pseudo-class fragment such as `:hover` or `:focus`.
    pub fn pseudo(self, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        match self {
            Selector::Hook { name, .. } => Selector::Hook {
                name,
                pseudo_class: Some(fragment),
            },
            Selector::Attr { name, .. } => Selector::Attr {
                name,
                pseudo_class: Some(fragment),
            },
            Selector::Raw(css) => Selector::Raw(format!("{}{}", css, fragment)),
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            Selector::Hook { name, pseudo_class } => format!(
                "[{}=\"{}\"]{}",
                HOOK_ATTRIBUTE,
                escape_css_string(name),
                pseudo_class.as_deref().unwrap_or("")
            ),
            Selector::Attr { name, pseudo_class } => {
                format!("[{}]{}", name, pseudo_class.as_deref().unwrap_or(""))
            }
            Selector::Raw(css) => css.clone(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl From<&str> for Selector {
    fn from(css: &str) -> Self {
        Selector::Raw(css.to_string())
    }
}

impl From<String> for Selector {
    fn from(css: String) -> Self {
        Selector::Raw(css)
    }
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
