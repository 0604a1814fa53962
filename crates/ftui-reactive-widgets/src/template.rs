#![forbid(unsafe_code)]

//! Data-only render templates.
//!
//! A [`Template`] says which element to emit and where each input key lands:
//! in the element's text or in a named attribute. Templates carry no code,
//! so they can be stored and loaded as JSON:
//!
//! ```
//! use ftui_reactive_widgets::{FieldTarget, Template};
//!
//! let t = Template::from_json(r#"{
//!     "tag": "a",
//!     "fields": [
//!         { "key": "label", "target": "text", "reactive": true },
//!         { "key": "url", "target": { "attr": "href" } }
//!     ],
//!     "attrs": { "class": "nav" },
//!     "unready": { "kind": "placeholder", "text": "…" }
//! }"#).unwrap();
//! assert_eq!(t.fields[1].target, FieldTarget::Attr("href".into()));
//! assert_eq!(t.reactive_keys(), vec!["label"]);
//! ```

use std::collections::BTreeMap;

use ftui_reactive::{ReactiveError, Result};
use serde::{Deserialize, Serialize};

/// Where a mapped value is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTarget {
    Text,
    Attr(String),
}

/// One key-to-target mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub key: String,
    pub target: FieldTarget,
    /// Declared as a reactive input of the component.
    #[serde(default)]
    pub reactive: bool,
}

impl FieldMapping {
    #[must_use]
    pub fn text(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: FieldTarget::Text,
            reactive: false,
        }
    }

    #[must_use]
    pub fn attr(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: FieldTarget::Attr(name.into()),
            reactive: false,
        }
    }

    #[must_use]
    pub fn reactive(mut self) -> Self {
        self.reactive = true;
        self
    }
}

/// What to render while some tracked key is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum UnreadyStrategy {
    /// Nothing at all.
    #[default]
    Empty,
    /// The element with static attributes and this text.
    Placeholder(String),
    /// The element with whatever values are available.
    Partial,
}

/// A leaf element template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub tag: String,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub unready: UnreadyStrategy,
    /// Emit `<tag ... />` with no text content.
    #[serde(default)]
    pub void: bool,
}

impl Template {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            fields: Vec::new(),
            attrs: BTreeMap::new(),
            unready: UnreadyStrategy::default(),
            void: false,
        }
    }

    #[must_use]
    pub fn field(mut self, mapping: FieldMapping) -> Self {
        self.fields.push(mapping);
        self
    }

    #[must_use]
    pub fn static_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn unready(mut self, strategy: UnreadyStrategy) -> Self {
        self.unready = strategy;
        self
    }

    #[must_use]
    pub fn void(mut self) -> Self {
        self.void = true;
        self
    }

    /// Keys marked reactive, first occurrence order, no repeats.
    #[must_use]
    pub fn reactive_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for f in self.fields.iter().filter(|f| f.reactive) {
            if !keys.contains(&f.key.as_str()) {
                keys.push(&f.key);
            }
        }
        keys
    }

    /// Parse and validate a template.
    pub fn from_json(json: &str) -> Result<Self> {
        let template: Self = serde_json::from_str(json)
            .map_err(|err| ReactiveError::template(format!("invalid template json: {err}")))?;
        template.validate()?;
        tracing::debug!(
            tag = %template.tag,
            fields = template.fields.len(),
            "template loaded"
        );
        Ok(template)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| ReactiveError::template(format!("template not serializable: {err}")))
    }

    /// Check names and mapping consistency.
    ///
    /// A key may feed several targets, but each target is written at most
    /// once and a key is either reactive everywhere or nowhere.
    pub fn validate(&self) -> Result<()> {
        if !is_name(&self.tag) {
            return Err(ReactiveError::template(format!(
                "invalid tag name {:?}",
                self.tag
            )));
        }
        if let Some(name) = self.attrs.keys().find(|n| !is_name(n)) {
            return Err(ReactiveError::template(format!(
                "invalid attribute name {name:?}"
            )));
        }
        if self.void && self.fields.iter().any(|f| f.target == FieldTarget::Text) {
            return Err(ReactiveError::template(format!(
                "void element <{}> cannot map text",
                self.tag
            )));
        }

        let mut attr_targets: Vec<&str> = Vec::new();
        for (i, f) in self.fields.iter().enumerate() {
            if f.key.is_empty() {
                return Err(ReactiveError::template("empty field key"));
            }
            if let FieldTarget::Attr(name) = &f.target {
                if !is_name(name) {
                    return Err(ReactiveError::template(format!(
                        "invalid attribute name {name:?}"
                    )));
                }
                if attr_targets.contains(&name.as_str()) || self.attrs.contains_key(name) {
                    return Err(ReactiveError::template(format!(
                        "attribute {name:?} mapped twice"
                    )));
                }
                attr_targets.push(name);
            }
            let conflicting = self.fields[..i]
                .iter()
                .any(|prev| prev.key == f.key && prev.reactive != f.reactive);
            if conflicting {
                return Err(ReactiveError::template(format!(
                    "key {:?} is both reactive and static",
                    f.key
                )));
            }
        }
        Ok(())
    }
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}
