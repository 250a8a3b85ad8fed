//! Pending edits to a parsed document and their serialization
//!
//! The parsed tree is never mutated. Removals, unwrapped elements and
//! changed attributes are recorded by node id and applied while the
//! document is written back out.

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{HashMap, HashSet};

/// Elements without an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text content is written verbatim
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];

type Attributes = Vec<(String, String)>;

#[derive(Debug, Default)]
pub(crate) struct Edits {
    removed: HashSet<NodeId>,
    unwrapped: HashSet<NodeId>,
    attributes: HashMap<NodeId, Attributes>,
}

impl Edits {
    /// Elements matching `selector` that are still part of the document
    pub fn live<'a>(&self, document: &'a Html, selector: &Selector) -> Vec<ElementRef<'a>> {
        document
            .select(selector)
            .filter(|element| !self.is_removed(element))
            .collect()
    }

    fn is_removed(&self, element: &ElementRef<'_>) -> bool {
        std::iter::once(element.id())
            .chain(element.ancestors().map(|node| node.id()))
            .any(|id| self.removed.contains(&id))
    }

    /// Removes the element and everything inside it
    pub fn remove(&mut self, element: &ElementRef<'_>) {
        self.removed.insert(element.id());
    }

    /// Replaces the element by its children
    pub fn unwrap(&mut self, element: &ElementRef<'_>) {
        self.unwrapped.insert(element.id());
    }

    /// Current value of an attribute, with pending changes applied
    pub fn attr(&self, element: &ElementRef<'_>, name: &str) -> Option<String> {
        match self.attributes.get(&element.id()) {
            Some(attrs) => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            None => element.value().attr(name).map(str::to_string),
        }
    }

    pub fn set_attr(&mut self, element: &ElementRef<'_>, name: &str, value: impl Into<String>) {
        let value = value.into();
        let attrs = self.attributes_mut(element);
        match attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, current)) => *current = value,
            None => attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, element: &ElementRef<'_>, name: &str) {
        if self.attr(element, name).is_some() {
            self.attributes_mut(element).retain(|(key, _)| key != name);
        }
    }

    fn attributes_mut(&mut self, element: &ElementRef<'_>) -> &mut Attributes {
        self.attributes.entry(element.id()).or_insert_with(|| {
            element
                .value()
                .attrs()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect()
        })
    }

    /// Serializes the document with every pending edit applied
    pub fn apply(&self, document: &Html) -> String {
        let mut out = String::new();
        for child in document.tree.root().children() {
            self.write_node(&mut out, child);
        }
        out
    }

    fn write_node(&self, out: &mut String, node: NodeRef<'_, Node>) {
        if self.removed.contains(&node.id()) {
            return;
        }

        match node.value() {
            Node::Document | Node::Fragment => self.write_children(out, node),
            Node::Doctype(doctype) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(doctype.name());
                out.push('>');
            }
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Text(text) => {
                let raw = node
                    .parent()
                    .and_then(|parent| parent.value().as_element())
                    .is_some_and(|parent| RAW_TEXT_ELEMENTS.contains(&parent.name()));
                if raw {
                    out.push_str(text);
                } else {
                    push_escaped(out, text, false);
                }
            }
            Node::Element(element) => {
                if self.unwrapped.contains(&node.id()) {
                    self.write_children(out, node);
                    return;
                }

                let name = element.name();
                out.push('<');
                out.push_str(name);
                match self.attributes.get(&node.id()) {
                    Some(attrs) => {
                        for (key, value) in attrs {
                            push_attribute(out, key, value);
                        }
                    }
                    None => {
                        for (key, value) in element.attrs() {
                            push_attribute(out, key, value);
                        }
                    }
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&name) {
                    return;
                }
                self.write_children(out, node);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            _ => {}
        }
    }

    fn write_children(&self, out: &mut String, node: NodeRef<'_, Node>) {
        for child in node.children() {
            self.write_node(out, child);
        }
    }
}

fn push_attribute(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    push_escaped(out, value, true);
    out.push('"');
}

fn push_escaped(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
