//! HTML to FB2 fragment conversion.
//!
//! A single pass over the parsed HTML body rewrites blog markup into the
//! restricted FB2 vocabulary. The machinery is deliberately small:
//!
//! - an ordered rule set ([`rules`]) decides per start tag whether a
//!   semantic frame opens;
//! - an element stack tracks the currently open chain of output nodes, with
//!   a usage log pairing each pushed frame with the source tag that opened
//!   it (closing tags pop only when they match the log top);
//! - text events redistribute edge whitespace across node boundaries the
//!   way a browser would collapse it;
//! - runs of `<br>` either force a single space or, at [`MAX_BREAKS`],
//!   split the current top-level root while carrying the open inline
//!   nesting over into the next one.
//!
//! Everything the input does beyond that vocabulary (anchors, images,
//! unstyled spans) is transparent: no output node opens, but text content
//! still flows into the current frame.
//!
//! The output is a [`Fragment`]: an arena of nodes plus the ordered
//! top-level roots. A fresh converter is built per document; nothing is
//! shared between conversions.

mod rules;
mod style;
mod tree;

pub use tree::{FbNode, FbTag, Fragment, NodeId};

use html5ever::tendril::TendrilSink;
use html5ever::{Attribute, ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::Result;
use rules::RULES;
use style::StyleMap;

/// Consecutive `<br>` tags needed to force a paragraph split. A shorter run
/// becomes a single space in the following text.
const MAX_BREAKS: usize = 2;

/// Parse one HTML fragment (a blog entry body) and convert it.
pub fn convert_html(html: &str) -> Result<Fragment> {
    let dom = parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())?;
    Ok(convert_body(&dom.document))
}

/// Convert an already parsed document tree. Only content inside `<body>`
/// participates.
pub fn convert_body(document: &Handle) -> Fragment {
    let mut converter = Converter::new();
    converter.walk(document);
    converter.finish()
}

/// One usage-log entry: the source tag that opened a frame, and the output
/// kind it opened (`None` for the plain paragraph-root push of `p`/`div`/
/// `body`).
#[derive(Debug)]
struct StackUse {
    source: String,
    kind: Option<FbTag>,
}

/// Per-document conversion state.
struct Converter {
    nodes: Vec<FbNode>,
    /// Completed top-level roots, document order.
    tree: Vec<NodeId>,
    /// Open frames, root first. `stack[0]` is always `tree.last()` while
    /// non-empty, and every deeper frame is the last child of the one below.
    stack: Vec<NodeId>,
    stack_usage: Vec<StackUse>,
    break_count: usize,
    in_body: bool,
}

impl Converter {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            tree: Vec::new(),
            stack: Vec::new(),
            stack_usage: Vec::new(),
            break_count: 0,
            in_body: false,
        }
    }

    // === Event dispatch ===

    fn walk(&mut self, node: &Handle) {
        match node.data {
            NodeData::Document => {
                for child in node.children.borrow().iter() {
                    self.walk(child);
                }
            }
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                let qname: &str = &name.local;
                let styles = match get_attr(&attrs.borrow(), "style") {
                    Some(value) => StyleMap::parse(&value),
                    None => StyleMap::default(),
                };
                self.start_element(qname, &styles);
                for child in node.children.borrow().iter() {
                    self.walk(child);
                }
                self.end_element(qname);
            }
            NodeData::Text { ref contents } => {
                let borrowed = contents.borrow();
                self.characters(borrowed.as_ref());
            }
            _ => {}
        }
    }

    fn start_element(&mut self, qname: &str, styles: &StyleMap) {
        if qname == "body" {
            self.in_body = true;
        }
        if !self.in_body {
            return;
        }

        for rule in RULES {
            rule.process(self, qname, styles);
        }

        if qname == "br" {
            self.line_break();
        }
    }

    fn end_element(&mut self, qname: &str) {
        if qname == "body" {
            self.in_body = false;
        }
        if !self.in_body {
            return;
        }

        // Only a closing tag matching the log top pops; everything else is
        // transparent, exactly like its opening counterpart was.
        if !self
            .stack_usage
            .last()
            .is_some_and(|usage| usage.source == qname)
        {
            return;
        }

        let child = self
            .stack
            .pop()
            .expect("usage log entry without an open frame");
        self.stack_removed(child, self.stack.is_empty());
        self.stack_usage.pop();

        if let Some(&parent) = self.stack.last()
            && self.is_empty(child)
        {
            self.remove_child(parent, child);
        }
    }

    /// Text event. Whitespace ownership is decided here: see the module doc
    /// and the edge-splitting below.
    fn characters(&mut self, raw: &str) {
        if !self.in_body {
            return;
        }

        let element = match self.stack.last() {
            Some(&top) => top,
            // Loose text with nothing open starts a paragraph of its own.
            // This also zeroes break_count, so breaks before it vanish.
            None => self.new_root(FbTag::Paragraph),
        };

        let spaced;
        let mut content = raw;
        if self.break_count > 0 {
            if !raw.starts_with(' ') {
                spaced = format!(" {raw}");
                content = &spaced;
            }
            self.break_count = 0;
        }

        if self.no_text_yet() {
            content = content.trim_start();
        }

        // Text straight into a root has no sibling boundary to feed, so it
        // goes in verbatim.
        if self.stack.len() == 1 {
            self.append_to(element, content);
            return;
        }

        let (fore, core, back) = split_edge_whitespace(content);

        // Leading whitespace belongs to whatever came before: the previous
        // sibling at the second stack level, or the nearest open ancestor
        // that already has text.
        if !fore.is_empty() {
            match self.previous_sibling(self.stack[0], self.stack[1]) {
                Some(prev) => {
                    if !self.node(prev).tail.ends_with(' ') {
                        self.node_mut(prev).tail.push(' ');
                    }
                }
                None => {
                    let target = self.find_non_empty_parent();
                    if !self.node(target).text.ends_with(' ') {
                        self.node_mut(target).text.push(' ');
                    }
                }
            }
        }

        self.append_to(element, core);

        // Trailing whitespace stays with the current frame's tail. Cells
        // keep their boundaries clean instead.
        if !back.is_empty()
            && !self.node(element).tag.is_cell()
            && !self.node(element).tail.ends_with(' ')
        {
            self.node_mut(element).tail.push(' ');
        }
    }

    /// Count a `<br>`; on a double break outside any table, split the
    /// current root, carrying the open chain's shape into a fresh one.
    fn line_break(&mut self) {
        self.break_count += 1;
        if self.break_count < MAX_BREAKS || self.stack_find(FbTag::Table) {
            return;
        }
        self.break_count = 0;

        if self.stack.is_empty() {
            return;
        }

        let shape: Vec<FbTag> = self.stack.iter().map(|&frame| self.node(frame).tag).collect();
        let mut new_stack: Vec<NodeId> = Vec::with_capacity(shape.len());
        for tag in shape {
            let child = self.alloc(tag);
            if let Some(&parent) = new_stack.last() {
                self.node_mut(parent).children.push(child);
            }
            new_stack.push(child);
        }

        self.clear_stack();
        // A fully emptied stack means the old root itself was empty; it has
        // no business staying in the forest.
        if self.stack.is_empty() {
            self.tree.pop();
        }

        self.tree.push(new_stack[0]);
        self.stack = new_stack;
        // The usage log is untouched: closing tags after the split still
        // match the frames they opened before it.
    }

    /// Finalize: force-close anything still open, trim the root's trailing
    /// whitespace, drop a trailing empty root.
    fn finish(mut self) -> Fragment {
        if self.tree.is_empty() {
            return Fragment::default();
        }

        // More than one leftover frame happens when a single source tag
        // opened several semantic frames (its one closing tag popped one).
        if self.stack.len() > 1 {
            log::warn!(
                "closing {} frame(s) still open at end of input",
                self.stack.len() - 1
            );
        }
        while self.stack.len() > 1 {
            let Some(child) = self.stack.pop() else { break };
            self.stack_removed(child, false);
            if let Some(&parent) = self.stack.last()
                && self.is_empty(child)
            {
                self.remove_child(parent, child);
            }
        }

        if let Some(&root) = self.stack.first() {
            self.stack_removed(root, true);
        }

        if let Some(&last) = self.tree.last()
            && self.is_empty(last)
        {
            self.tree.pop();
        }

        Fragment {
            nodes: self.nodes,
            roots: self.tree,
        }
    }

    // === Stack management ===

    /// Open a frame of `tag` under the current top (or under a fresh
    /// paragraph root when nothing is open). An adjacent same-tag inline
    /// sibling with no tail yet is reused instead of creating a twin.
    fn top_stack(&mut self, tag: FbTag) {
        let parent = match self.stack.last() {
            Some(&top) => top,
            None => self.new_root(FbTag::Paragraph),
        };

        let reusable = match self.node(parent).children.last() {
            Some(&last)
                if !tag.is_block()
                    && self.node(last).tag == tag
                    && self.node(last).tail.is_empty() =>
            {
                Some(last)
            }
            _ => None,
        };

        let element = match reusable {
            Some(existing) => existing,
            None => {
                let fresh = self.alloc(tag);
                self.node_mut(parent).children.push(fresh);
                fresh
            }
        };

        self.stack.push(element);
    }

    /// Start a fresh top-level root, reusing the previous root if it is
    /// still empty and of the same tag, discarding it if empty but of a
    /// different one. Resets stack, usage log and pending breaks.
    fn new_root(&mut self, tag: FbTag) -> NodeId {
        let mut element = None;
        if let Some(&last) = self.tree.last()
            && self.is_empty(last)
        {
            if self.node(last).tag == tag {
                // Reuse is only sound while the bookkeeping still points at
                // that same root; anything else means the stack drifted.
                assert!(
                    self.stack.is_empty() || (self.stack.len() == 1 && self.stack[0] == last),
                    "empty root reuse with stale open frames"
                );
                assert!(
                    self.stack_usage.len() <= 1,
                    "empty root reuse with a deep usage log"
                );
                element = Some(last);
            } else {
                self.tree.pop();
            }
        }

        let element = match element {
            Some(reused) => reused,
            None => {
                let fresh = self.alloc(tag);
                self.tree.push(fresh);
                self.clear_stack();
                fresh
            }
        };

        self.stack.clear();
        self.stack.push(element);
        self.stack_usage.clear();
        self.break_count = 0;
        element
    }

    /// Pop empty frames off the top of the old stack and detach the
    /// outermost popped node from its parent. The stack itself is about to
    /// be rebuilt by the caller.
    fn clear_stack(&mut self) {
        let mut removed = None;
        while let Some(&top) = self.stack.last() {
            if self.is_empty(top) {
                removed = Some(top);
                self.stack.pop();
            } else {
                break;
            }
        }
        if let Some(detached) = removed
            && let Some(&parent) = self.stack.last()
        {
            self.remove_child(parent, detached);
        }
    }

    /// Whitespace hook for a frame leaving the stack: right-trim the node's
    /// trailing content (last child's tail, or own text when childless) and,
    /// unless this was the last open frame, keep at most one space on the
    /// node's own tail so surrounding words do not fuse.
    fn stack_removed(&mut self, element: NodeId, is_last: bool) {
        let had_trailing_space = if let Some(&last_child) = self.node(element).children.last() {
            let tail = &mut self.nodes[last_child.index()].tail;
            let had_space = tail.ends_with(' ');
            let trimmed = tail.trim_end().len();
            tail.truncate(trimmed);
            had_space
        } else if !self.node(element).text.is_empty() {
            let text = &mut self.nodes[element.index()].text;
            let had_space = text.ends_with(' ');
            let trimmed = text.trim_end().len();
            text.truncate(trimmed);
            had_space
        } else {
            return;
        };

        if !is_last && had_trailing_space && !self.node(element).tail.ends_with(' ') {
            self.node_mut(element).tail.push(' ');
        }
    }

    fn push_usage(&mut self, source: &str, kind: Option<FbTag>) {
        self.stack_usage.push(StackUse {
            source: source.to_string(),
            kind,
        });
    }

    /// Is a frame of `kind` open anywhere in the ancestry?
    fn stack_find(&self, kind: FbTag) -> bool {
        self.stack_usage.iter().any(|usage| usage.kind == Some(kind))
    }

    // === Text placement ===

    /// Append content to a node's trailing position: the last child's tail
    /// when children exist, the node's own text otherwise.
    fn append_to(&mut self, element: NodeId, content: &str) {
        match self.node(element).children.last() {
            Some(&last) => self.node_mut(last).tail.push_str(content),
            None => self.node_mut(element).text.push_str(content),
        }
    }

    /// True until the current root has seen any text: no frame has own
    /// text, no frame beyond the root has an earlier sibling, the top has
    /// no children. Cells only look at their own text; their boundaries do
    /// not pass whitespace.
    fn no_text_yet(&self) -> bool {
        let top = *self.stack.last().expect("text event with no open frame");
        if self.node(top).tag.is_cell() {
            return self.node(top).text.is_empty();
        }

        if !self.node(top).children.is_empty() {
            return false;
        }

        for (depth, &frame) in self.stack.iter().enumerate() {
            if !self.node(frame).text.is_empty() {
                return false;
            }
            if depth > 0
                && self
                    .previous_sibling(self.stack[depth - 1], frame)
                    .is_some()
            {
                return false;
            }
        }

        true
    }

    /// Innermost open frame that already carries text, the root as a
    /// fallback.
    fn find_non_empty_parent(&self) -> NodeId {
        for &frame in self.stack.iter().rev() {
            if !self.node(frame).text.is_empty() {
                return frame;
            }
        }
        self.stack[0]
    }

    // === Arena helpers ===

    fn alloc(&mut self, tag: FbTag) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(FbNode::new(tag));
        id
    }

    fn node(&self, id: NodeId) -> &FbNode {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut FbNode {
        &mut self.nodes[id.index()]
    }

    fn is_empty(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.text.is_empty() && node.children.is_empty()
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.retain(|&c| c != child);
    }

    fn previous_sibling(&self, parent: NodeId, child: NodeId) -> Option<NodeId> {
        let children = &self.node(parent).children;
        let position = children.iter().position(|&c| c == child)?;
        if position == 0 {
            None
        } else {
            Some(children[position - 1])
        }
    }
}

/// Split a text event into its leading whitespace run, trimmed core, and
/// trailing whitespace run. All-whitespace input lands entirely in the
/// leading part.
fn split_edge_whitespace(text: &str) -> (&str, &str, &str) {
    let after_fore = text.trim_start();
    let fore_len = text.len() - after_fore.len();
    let core = after_fore.trim_end();
    (&text[..fore_len], core, &text[fore_len + core.len()..])
}

fn get_attr(attrs: &[Attribute], name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| attr.value.to_string())
}
