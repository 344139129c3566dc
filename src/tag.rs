//! Tag descriptors: the unit of markup the builder emits.
//!
//! A [`TagDescriptor`] is one `<img>` or `<source>` element: a tag name plus
//! an insertion-ordered attribute map. Emission order is part of the render
//! contract, so attributes live in an [`IndexMap`] and serialize exactly in
//! the order they were set.
//!
//! ## Attribute whitelists
//!
//! Callers can hand arbitrary pass-through attributes (`data-*`, `usemap`)
//! to a render call. Before a tag picks up its computed attributes, the
//! pass-through set is filtered per tag kind:
//!
//! - `img` never carries `media`, `sizes` or `type` from the pass-through
//!   set (a computed `sizes` may still be added later by the builder).
//! - `source` keeps *only* `media`, `sizes`, `type` and `srcset`.
//!
//! Everything is escaped on serialization, never on insertion, so attribute
//! values can be read back verbatim (the retina pass rewrites `srcset` in
//! place).

use indexmap::IndexMap;

/// Which element a descriptor renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Img,
    Source,
}

impl TagKind {
    pub fn name(self) -> &'static str {
        match self {
            TagKind::Img => "img",
            TagKind::Source => "source",
        }
    }
}

/// One element to emit: tag kind plus ordered attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct TagDescriptor {
    kind: TagKind,
    attributes: IndexMap<String, String>,
}

impl TagDescriptor {
    pub fn new(kind: TagKind) -> Self {
        Self {
            kind,
            attributes: IndexMap::new(),
        }
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// Set an attribute. A repeated name keeps its original position.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Remove an attribute, preserving the order of the remaining ones.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Drop attributes the tag kind may not carry. Applied to the
    /// pass-through attribute set before computed attributes are added.
    pub fn retain_allowed(&mut self) {
        match self.kind {
            TagKind::Img => {
                self.attributes
                    .retain(|name, _| !matches!(name.as_str(), "media" | "sizes" | "type"));
            }
            TagKind::Source => {
                self.attributes.retain(|name, _| {
                    matches!(name.as_str(), "media" | "sizes" | "type" | "srcset")
                });
            }
        }
    }

    /// Serialize as a void element, attributes in insertion order.
    pub fn render(&self) -> String {
        let mut out = String::from("<");
        out.push_str(self.kind.name());
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
        out.push_str(" />");
        out
    }
}

/// Escape a value for the double-quoted attribute context.
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
