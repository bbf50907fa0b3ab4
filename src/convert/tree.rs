//! Arena-backed output tree for converted fragments.
//!
//! Nodes are owned by a flat arena and addressed by [`NodeId`]; parents hold
//! ordered child id lists and no node stores a back-pointer. Each node keeps
//! the FB2 mixed-content split: `text` is content before the first child,
//! `tail` is content after the node itself, before its next sibling.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

/// Identifier of a node within one [`Fragment`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The restricted output vocabulary. Everything the converter produces is one
/// of these; unrecognized source markup never maps to a node at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FbTag {
    Paragraph,
    Strong,
    Emphasis,
    Strikethrough,
    Sub,
    Sup,
    Code,
    Table,
    TableRow,
    TableCell,
    TableHeading,
}

impl FbTag {
    /// FB2 element name for serialization.
    pub fn as_str(self) -> &'static str {
        match self {
            FbTag::Paragraph => "p",
            FbTag::Strong => "strong",
            FbTag::Emphasis => "emphasis",
            FbTag::Strikethrough => "strikethrough",
            FbTag::Sub => "sub",
            FbTag::Sup => "sup",
            FbTag::Code => "code",
            FbTag::Table => "table",
            FbTag::TableRow => "tr",
            FbTag::TableCell => "td",
            FbTag::TableHeading => "th",
        }
    }

    /// Block-level output tags never coalesce with an adjacent same-tag
    /// sibling the way inline runs do.
    pub(crate) fn is_block(self) -> bool {
        matches!(
            self,
            FbTag::TableHeading
                | FbTag::TableCell
                | FbTag::Table
                | FbTag::TableRow
                | FbTag::Paragraph
        )
    }

    /// Cell boundaries never pass whitespace to the outside.
    pub(crate) fn is_cell(self) -> bool {
        matches!(self, FbTag::TableCell | FbTag::TableHeading)
    }
}

/// One output node: tag, leading text, ordered children, trailing tail.
#[derive(Debug, Clone)]
pub struct FbNode {
    pub tag: FbTag,
    pub text: String,
    pub tail: String,
    pub children: Vec<NodeId>,
}

impl FbNode {
    pub(crate) fn new(tag: FbTag) -> Self {
        Self {
            tag,
            text: String::new(),
            tail: String::new(),
            children: Vec::new(),
        }
    }
}

/// A completed conversion result: the node arena plus the ordered top-level
/// roots (paragraphs and tables) in document order.
///
/// Detached nodes may linger in the arena after empty-node elimination; only
/// nodes reachable from [`Fragment::roots`] are part of the result.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub(crate) nodes: Vec<FbNode>,
    pub(crate) roots: Vec<NodeId>,
}

impl Fragment {
    /// Top-level output nodes in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Whether the conversion produced any output at all.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Borrow a node by id. Ids are only valid within this fragment.
    pub fn node(&self, id: NodeId) -> &FbNode {
        &self.nodes[id.index()]
    }

    /// Serialize one subtree as XML events, including the node's tail text.
    pub fn write_node<W: Write>(
        &self,
        writer: &mut Writer<W>,
        id: NodeId,
    ) -> std::io::Result<()> {
        let node = self.node(id);
        let name = node.tag.as_str();
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        if !node.text.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&node.text)))?;
        }
        for &child in &node.children {
            self.write_node(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        if !node.tail.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&node.tail)))?;
        }
        Ok(())
    }

    /// Serialize every root, one per line. Primarily a debugging and testing
    /// aid; the book writer streams roots into a larger document instead.
    pub fn to_xml(&self) -> String {
        let mut pieces = Vec::with_capacity(self.roots.len());
        for &root in &self.roots {
            let mut writer = Writer::new(Vec::new());
            // Writing to a Vec cannot fail.
            if self.write_node(&mut writer, root).is_ok() {
                pieces.push(String::from_utf8_lossy(&writer.into_inner()).into_owned());
            }
        }
        pieces.join("\n")
    }
}
