#![forbid(unsafe_code)]

//! Stock templates for common leaf elements.
//!
//! Each constructor marks its value keys reactive; callers that bind a key
//! as a fixed source instead can clear the flag on the returned template.

use crate::template::{FieldMapping, Template, UnreadyStrategy};

/// `<span>{text}</span>`
#[must_use]
pub fn span(text: &str) -> Template {
    Template::new("span").field(FieldMapping::text(text).reactive())
}

/// `<div>{text}</div>`
#[must_use]
pub fn div(text: &str) -> Template {
    Template::new("div").field(FieldMapping::text(text).reactive())
}

/// `<label for="{target}">{text}</label>`; `target` is a static input.
#[must_use]
pub fn label(text: &str, target: &str) -> Template {
    Template::new("label")
        .field(FieldMapping::attr(target, "for"))
        .field(FieldMapping::text(text).reactive())
}

/// `<a href="{href}">{text}</a>`
#[must_use]
pub fn link(text: &str, href: &str) -> Template {
    Template::new("a")
        .field(FieldMapping::attr(href, "href").reactive())
        .field(FieldMapping::text(text).reactive())
}

/// `<img src="{src}" alt="{alt}" />`; `alt` is a static input.
#[must_use]
pub fn image(src: &str, alt: &str) -> Template {
    Template::new("img")
        .void()
        .field(FieldMapping::attr(src, "src").reactive())
        .field(FieldMapping::attr(alt, "alt"))
}

/// `<progress value="{value}" max="{max}"></progress>`
///
/// Shows the indeterminate bar (no `value`) while unresolved.
#[must_use]
pub fn progress(value: &str, max: u32) -> Template {
    Template::new("progress")
        .static_attr("max", max.to_string())
        .field(FieldMapping::attr(value, "value").reactive())
        .unready(UnreadyStrategy::Partial)
}

/// `<time datetime="{key}">{key}</time>`
#[must_use]
pub fn time(key: &str) -> Template {
    Template::new("time")
        .field(FieldMapping::attr(key, "datetime").reactive())
        .field(FieldMapping::text(key).reactive())
}

/// Look up a stock template by tag-like name, bound to `key`.
///
/// Two-key variants use `key` for the reactive value and `"{key}_for"`,
/// `"{key}_href"` or `"{key}_alt"` for the second key.
#[must_use]
pub fn by_name(name: &str, key: &str) -> Option<Template> {
    let t = match name {
        "span" => span(key),
        "div" => div(key),
        "label" => label(key, &format!("{key}_for")),
        "link" | "a" => link(key, &format!("{key}_href")),
        "image" | "img" => image(key, &format!("{key}_alt")),
        "progress" => progress(key, 100),
        "time" => time(key),
        _ => return None,
    };
    Some(t)
}
