use anyhow::{Context, Result};
use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Pulls the human-readable text out of an HTML document.
///
/// Everything a browser would render as text is kept, in document order, with
/// every run of whitespace collapsed to a single space. Script-like elements
/// and comments are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn get_dom(html: &str) -> Result<RcDom> {
        parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut std::io::Cursor::new(html))
            .context("failed to parse html document")
    }

    fn is_invisible(local: &LocalName) -> bool {
        matches!(&**local, "script" | "style" | "noscript" | "template")
    }

    /// Visible text under `root`, in document order.
    ///
    /// The walk keeps its own stack, so nesting depth is bounded by the heap
    /// rather than the thread's stack.
    pub fn walk_html(root: &Handle) -> String {
        let mut out = String::new();
        let mut stack: Vec<Handle> = vec![root.clone()];

        while let Some(handle) = stack.pop() {
            match &handle.data {
                NodeData::Text { contents } => {
                    let s = contents.borrow();
                    for word in s.split_whitespace() {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(word);
                    }
                }
                NodeData::Element { name, .. } if Self::is_invisible(&name.local) => {}
                NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
                _ => {
                    // reversed so the first child is popped first
                    for child in handle.children.borrow().iter().rev() {
                        stack.push(child.clone());
                    }
                }
            }
        }
        out
    }

    pub fn extract(&self, html: &str) -> Result<String> {
        let dom = Self::get_dom(html)?;
        Ok(Self::walk_html(&dom.document))
    }
}

/// Collapse every whitespace run to one space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
