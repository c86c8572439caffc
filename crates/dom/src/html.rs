use scraper::{ElementRef, Html, Node};
use thiserror::Error;

use crate::document::{Document, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HtmlError {
    #[error("{0} cannot hold markup")]
    NotAContainer(NodeId),
}

impl Document {
    /// Builds a document whose `<body>` holds the given fragment.
    pub fn from_body_html(html: &str) -> Result<Self, HtmlError> {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append_html(body, html)?;
        Ok(doc)
    }

    /// Parses `html` as a `<body>` fragment and appends the resulting nodes
    /// to `parent`.
    ///
    /// Tree construction follows html5ever: misnested and unclosed tags are
    /// repaired, comments and doctypes are dropped.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>, HtmlError> {
        if !matches!(self.data(parent), NodeData::Element(_) | NodeData::Document) {
            return Err(HtmlError::NotAContainer(parent));
        }
        let fragment = Html::parse_fragment(html);
        if !fragment.errors.is_empty() {
            tracing::debug!(errors = ?fragment.errors, "repaired malformed markup");
        }
        Ok(self.import_children(parent, fragment.root_element()))
    }

    fn import_children(&mut self, parent: NodeId, source: ElementRef<'_>) -> Vec<NodeId> {
        let mut imported = Vec::new();
        for child in source.children() {
            let node = match child.value() {
                Node::Text(text) => Some(self.create_text(&**text)),
                Node::Element(_) => ElementRef::wrap(child).map(|el| self.import_element(el)),
                _ => None,
            };
            if let Some(node) = node {
                self.append_child(parent, node);
                imported.push(node);
            }
        }
        imported
    }

    fn import_element(&mut self, source: ElementRef<'_>) -> NodeId {
        let element = self.create_element(source.value().name());
        for (name, value) in source.value().attrs() {
            self.set_attribute(element, name, value);
        }
        self.import_children(element, source);
        element
    }

    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<(), HtmlError> {
        self.remove_children(id);
        self.append_html(id, html)?;
        Ok(())
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Document => {
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
            }
            NodeData::Text(text) => out.push_str(&escape(text, false)),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(el.tag());
                for (k, v) in el.attrs() {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape(v, true));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&el.tag()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(el.tag());
                out.push('>');
            }
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' | '>' if attribute => out.push(c),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes_differently() {
        assert_eq!(escape("a < b & \"c\"", false), "a &lt; b &amp; \"c\"");
        assert_eq!(escape("a > b & \"c\"", true), "a > b &amp; &quot;c&quot;");
        assert_eq!(escape("\u{a0}", false), "&nbsp;");
    }

    #[test]
    fn markup_cannot_be_appended_to_text() {
        let mut doc = Document::new();
        let text = doc.create_text("x");
        assert_eq!(
            doc.append_html(text, "<b>y</b>"),
            Err(HtmlError::NotAContainer(text))
        );
    }
}
