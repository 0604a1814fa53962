#![forbid(unsafe_code)]

//! Template-driven reactive element.

use std::borrow::Cow;

use ftui_reactive::{
    ComponentInstance, Declaration, Inputs, ReactiveConfig, RenderPaths, RenderView, Result,
    SourceRef,
};
use serde_json::Value;

use crate::markup::Markup;
use crate::template::{FieldTarget, Template, UnreadyStrategy};

/// A component instance rendering a [`ReactiveElement`].
pub type ElementComponent = ComponentInstance<Value, ReactiveElement>;

/// Render paths over a [`Template`].
///
/// Tracked keys (reactive inputs and fixed sources) are read from render
/// state; any other mapped key is read from the raw static inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactiveElement {
    template: Template,
}

impl ReactiveElement {
    pub fn new(template: Template) -> Result<Self> {
        template.validate()?;
        Ok(Self { template })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Template::from_json(json).map(|template| Self { template })
    }

    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Reactive inputs taken from the template's reactive fields.
    #[must_use]
    pub fn declaration(&self) -> Declaration<Value> {
        Declaration::from_parts(
            self.template.reactive_keys(),
            Vec::<(String, SourceRef<Value>)>::new(),
        )
    }

    /// Wrap into a component, adding `fixed` as fixed sources.
    pub fn into_component<K: Into<String>>(
        self,
        inputs: Inputs<Value>,
        fixed: impl IntoIterator<Item = (K, SourceRef<Value>)>,
    ) -> Result<ElementComponent> {
        self.into_component_with_config(inputs, fixed, ReactiveConfig::from_env())
    }

    pub fn into_component_with_config<K: Into<String>>(
        self,
        inputs: Inputs<Value>,
        fixed: impl IntoIterator<Item = (K, SourceRef<Value>)>,
        config: ReactiveConfig,
    ) -> Result<ElementComponent> {
        let mut declaration = self.declaration();
        for (key, source) in fixed {
            declaration = declaration.fixed_source(key, source);
        }
        ComponentInstance::with_config(declaration, inputs, self, config)
    }

    fn write(&self, view: &RenderView<'_, Value>, placeholder: Option<&str>, busy: bool) -> Markup {
        let t = &self.template;
        let mut w = Markup::element(&t.tag);
        for (name, value) in &t.attrs {
            w = w.attr(name, value);
        }
        if placeholder.is_none() {
            for f in &t.fields {
                if let FieldTarget::Attr(name) = &f.target
                    && let Some(value) = lookup(view, &f.key)
                {
                    w = w.attr(name, &value_text(value));
                }
            }
        }
        if busy {
            w = w.attr("aria-busy", "true");
        }
        if t.void {
            return w.finish_void();
        }

        match placeholder {
            Some(text) => w = w.text(text),
            None => {
                let parts: Vec<Cow<'_, str>> = t
                    .fields
                    .iter()
                    .filter(|f| f.target == FieldTarget::Text)
                    .filter_map(|f| lookup(view, &f.key))
                    .map(value_text)
                    .collect();
                if !parts.is_empty() {
                    w = w.text(&parts.join(" "));
                }
            }
        }
        w.finish()
    }
}

impl RenderPaths<Value> for ReactiveElement {
    type Output = Markup;

    fn unready_render(&self, view: &RenderView<'_, Value>) -> Markup {
        tracing::trace!(tag = %self.template.tag, pending = ?view.pending_keys(), "unready render");
        match &self.template.unready {
            UnreadyStrategy::Empty => Markup::default(),
            UnreadyStrategy::Placeholder(text) => self.write(view, Some(text), true),
            UnreadyStrategy::Partial => self.write(view, None, true),
        }
    }

    fn ready_render(&self, view: &RenderView<'_, Value>) -> Markup {
        self.write(view, None, false)
    }
}

fn lookup<'a>(view: &RenderView<'a, Value>, key: &str) -> Option<&'a Value> {
    if view.tracked_keys().iter().any(|k| k == key) {
        view.get(key)
    } else {
        view.inputs().value(key)
    }
}

/// Text form of a JSON value: strings verbatim, `null` empty, others as JSON.
#[must_use]
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}
