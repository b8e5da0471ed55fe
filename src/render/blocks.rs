//! Flattening a parsed document into a sequence of text blocks.
//!
//! Both rendering modes consume the same block sequence; they differ only in
//! how blocks are formatted and joined.

use crate::dom::{ArenaDom, NodeData, NodeId};

/// One unit of rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph(String),
    ListItem {
        /// 0 for items of a top-level list.
        depth: usize,
        marker: Marker,
        text: String,
        /// First emitted item of a top-level list.
        starts_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Bullet,
    Number(u32),
}

impl Block {
    pub(crate) fn text(&self) -> &str {
        match self {
            Block::Heading { text, .. } | Block::Paragraph(text) | Block::ListItem { text, .. } => {
                text
            }
        }
    }
}

/// Elements whose text forms its own block.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "caption",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "header",
    "hr",
    "main",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
];

#[derive(Debug)]
struct ListContext {
    is_ordered: bool,
    next_number: u32,
}

/// Walks the DOM in document order and accumulates blocks.
struct BlockWalker<'a> {
    dom: &'a ArenaDom,
    blocks: Vec<Block>,
    inline: String,
    list_stack: Vec<ListContext>,
    run_pending: bool,
}

/// Collect the blocks under `root` in document order.
pub(crate) fn collect_blocks(dom: &ArenaDom, root: NodeId) -> Vec<Block> {
    let mut walker = BlockWalker {
        dom,
        blocks: Vec::new(),
        inline: String::new(),
        list_stack: Vec::new(),
        run_pending: false,
    };
    walker.walk_node(root);
    walker.flush_inline();
    walker.blocks
}

impl BlockWalker<'_> {
    fn walk_node(&mut self, id: NodeId) {
        let dom = self.dom;
        let Some(node) = dom.get(id) else {
            return;
        };

        match &node.data {
            // Source line breaks are plain whitespace; only <br> breaks a line.
            NodeData::Text(text) => self.inline.push_str(&text.replace(['\r', '\n'], " ")),
            NodeData::Document => self.walk_children(id),
            NodeData::Other => {}
            NodeData::Element { .. } => {
                let tag = dom.tag_name(id).unwrap_or_default();
                match tag {
                    "br" => self.inline.push('\n'),
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                        self.flush_inline();
                        let level = tag.as_bytes()[1] - b'0';
                        let text = collapse(&dom.text_content(id));
                        if !text.is_empty() {
                            self.blocks.push(Block::Heading { level, text });
                        }
                    }
                    "ul" | "ol" => self.walk_list(id, tag == "ol"),
                    "li" if !self.list_stack.is_empty() => self.walk_list_item(id),
                    "li" => self.walk_block(id),
                    _ if BLOCK_TAGS.contains(&tag) => self.walk_block(id),
                    _ => self.walk_children(id),
                }
            }
        }
    }

    fn walk_children(&mut self, id: NodeId) {
        let dom = self.dom;
        for child in dom.children(id) {
            self.walk_node(child);
        }
    }

    fn walk_block(&mut self, id: NodeId) {
        self.flush_inline();
        self.walk_children(id);
        self.flush_inline();
    }

    fn walk_list(&mut self, id: NodeId, is_ordered: bool) {
        self.flush_inline();
        if self.list_stack.is_empty() {
            self.run_pending = true;
        }
        let start = self
            .dom
            .attr(id, "start")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(1);
        self.list_stack.push(ListContext {
            is_ordered,
            next_number: start,
        });
        self.walk_children(id);
        self.list_stack.pop();
    }

    fn walk_list_item(&mut self, id: NodeId) {
        self.flush_inline();

        let depth = self.list_stack.len() - 1;
        let marker = match self.list_stack.last_mut() {
            Some(ctx) if ctx.is_ordered => {
                let n = ctx.next_number;
                ctx.next_number += 1;
                Marker::Number(n)
            }
            _ => Marker::Bullet,
        };

        let dom = self.dom;
        let mut text = String::new();
        let mut nested = Vec::new();
        for child in dom.children(id) {
            self.collect_item_text(child, &mut text, &mut nested);
        }

        let text = collapse(&text);
        if !text.is_empty() {
            let starts_run = std::mem::take(&mut self.run_pending);
            self.blocks.push(Block::ListItem {
                depth,
                marker,
                text,
                starts_run,
            });
        }

        for list in nested {
            self.walk_node(list);
        }
    }

    /// Text of a list item, separating block children with a space.
    ///
    /// Lists found at any depth are set aside in `nested` and rendered as
    /// sub-lists after the item.
    fn collect_item_text(&self, id: NodeId, out: &mut String, nested: &mut Vec<NodeId>) {
        if let Some(text) = self.dom.text(id) {
            out.push_str(text);
            return;
        }
        match self.dom.tag_name(id) {
            Some("ul" | "ol") => nested.push(id),
            Some(tag) if tag == "br" || BLOCK_TAGS.contains(&tag) => {
                out.push(' ');
                for child in self.dom.children(id) {
                    self.collect_item_text(child, out, nested);
                }
                out.push(' ');
            }
            _ => {
                for child in self.dom.children(id) {
                    self.collect_item_text(child, out, nested);
                }
            }
        }
    }

    fn flush_inline(&mut self) {
        if self.inline.is_empty() {
            return;
        }
        let text = self
            .inline
            .lines()
            .map(collapse)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        self.inline.clear();
        if !text.is_empty() {
            self.blocks.push(Block::Paragraph(text));
        }
    }
}

/// Collapse every whitespace run to a single space and trim.
pub(crate) fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
