#![forbid(unsafe_code)]

//! Escaped markup output.

use std::fmt;

use v_htmlescape::escape;

/// A rendered markup fragment. Text and attribute values are always escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Markup(String);

impl Markup {
    /// Start writing `<tag ...>`.
    #[must_use]
    pub fn element(tag: &str) -> ElementWriter {
        let mut buf = String::with_capacity(tag.len() * 2 + 16);
        buf.push('<');
        buf.push_str(tag);
        ElementWriter {
            buf,
            tag: tag.to_owned(),
            opened: false,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Markup {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Incremental writer for a single element.
///
/// Attributes must be written before any text.
#[derive(Debug)]
pub struct ElementWriter {
    buf: String,
    tag: String,
    opened: bool,
}

impl ElementWriter {
    /// Append ` name="value"`. Ignored once text has been written.
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if self.opened {
            tracing::warn!(tag = %self.tag, attr = name, "attribute after text dropped");
            return self;
        }
        self.buf.push(' ');
        self.buf.push_str(name);
        self.buf.push_str("=\"");
        self.buf.push_str(&escape(value).to_string());
        self.buf.push('"');
        self
    }

    /// Append escaped text content.
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.open();
        self.buf.push_str(&escape(text).to_string());
        self
    }

    /// Close with `</tag>`.
    #[must_use]
    pub fn finish(mut self) -> Markup {
        self.open();
        self.buf.push_str("</");
        self.buf.push_str(&self.tag);
        self.buf.push('>');
        Markup(self.buf)
    }

    /// Close as a void element (`<tag ... />`).
    #[must_use]
    pub fn finish_void(mut self) -> Markup {
        self.buf.push_str(" />");
        Markup(self.buf)
    }

    fn open(&mut self) {
        if !self.opened {
            self.buf.push('>');
            self.opened = true;
        }
    }
}
