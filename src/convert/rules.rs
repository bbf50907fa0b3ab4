//! The closed set of rules mapping source tags and inline styles onto the
//! FB2 vocabulary.
//!
//! Rules are evaluated against every start tag in the fixed [`RULES`] order;
//! several may fire for one tag (a `span` styled both bold and italic opens
//! a strong frame and an emphasis frame). A rule never opens a frame when
//! one of its own kind is already open somewhere in the ancestry.

use super::Converter;
use super::style::StyleMap;
use super::tree::FbTag;

/// Rule evaluation order. Paragraph first so a block tag resets the root
/// before inline rules stack onto it, table parts last.
pub(crate) const RULES: [StyleRule; 11] = [
    StyleRule::Paragraph,
    StyleRule::Strong,
    StyleRule::Emphasis,
    StyleRule::StrikeThrough,
    StyleRule::Superscript,
    StyleRule::Subscript,
    StyleRule::Code,
    StyleRule::Table,
    StyleRule::TableRow,
    StyleRule::TableHeading,
    StyleRule::TableCell,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StyleRule {
    Paragraph,
    Strong,
    Emphasis,
    StrikeThrough,
    Superscript,
    Subscript,
    Code,
    Table,
    TableRow,
    TableHeading,
    TableCell,
}

impl StyleRule {
    /// Apply this rule to one start tag, opening a frame when it matches.
    pub(crate) fn process(self, converter: &mut Converter, qname: &str, styles: &StyleMap) {
        match self {
            StyleRule::Paragraph => {
                // p/div/body reset the top-level root, but never inside a table.
                if matches!(qname, "p" | "div" | "body")
                    && !converter.stack_find(FbTag::Table)
                {
                    converter.new_root(FbTag::Paragraph);
                    converter.push_usage(qname, None);
                }
            }
            StyleRule::Strong => open_inline(
                converter,
                qname,
                FbTag::Strong,
                ((qname == "strong" || qname == "b") && no_lighter(styles)) || heavy(styles),
            ),
            StyleRule::Emphasis => open_inline(
                converter,
                qname,
                FbTag::Emphasis,
                ((qname == "em" || qname == "i") && no_normal_font_style(styles))
                    || italics(styles),
            ),
            StyleRule::StrikeThrough => open_inline(
                converter,
                qname,
                FbTag::Strikethrough,
                ((qname == "del" || qname == "s") && no_normal_font_style(styles))
                    || struck(styles),
            ),
            StyleRule::Superscript => {
                open_inline(converter, qname, FbTag::Sup, qname == "sup");
            }
            StyleRule::Subscript => {
                open_inline(converter, qname, FbTag::Sub, qname == "sub");
            }
            StyleRule::Code => {
                open_inline(converter, qname, FbTag::Code, qname == "code" || qname == "kbd");
            }
            StyleRule::Table => {
                if qname == "table" && !converter.stack_find(FbTag::Table) {
                    converter.new_root(FbTag::Table);
                    converter.push_usage(qname, Some(FbTag::Table));
                }
            }
            StyleRule::TableRow => open_within(
                converter,
                qname,
                FbTag::TableRow,
                FbTag::Table,
                qname == "tr",
            ),
            StyleRule::TableHeading => open_within(
                converter,
                qname,
                FbTag::TableHeading,
                FbTag::TableRow,
                qname == "th",
            ),
            StyleRule::TableCell => open_within(
                converter,
                qname,
                FbTag::TableCell,
                FbTag::TableRow,
                qname == "td",
            ),
        }
    }
}

/// Push an inline frame unless one of the same kind is already open.
fn open_inline(converter: &mut Converter, qname: &str, kind: FbTag, applies: bool) {
    if applies && !converter.stack_find(kind) {
        converter.top_stack(kind);
        converter.push_usage(qname, Some(kind));
    }
}

/// Push a table-part frame, but only inside its required ancestor kind.
fn open_within(converter: &mut Converter, qname: &str, kind: FbTag, within: FbTag, applies: bool) {
    if applies && converter.stack_find(within) {
        converter.top_stack(kind);
        converter.push_usage(qname, Some(kind));
    }
}

/// `font-weight` absent, numerically at least 500, or any literal except
/// `lighter`/`normal`.
fn no_lighter(styles: &StyleMap) -> bool {
    match styles.get("font-weight") {
        None => true,
        Some(value) => match value.parse::<i64>() {
            Ok(weight) => weight >= 500,
            Err(_) => value != "lighter" && value != "normal",
        },
    }
}

/// `font-weight` explicitly heavy: numerically at least 500, or the literals
/// `bold`/`bolder`.
fn heavy(styles: &StyleMap) -> bool {
    match styles.get("font-weight") {
        None => false,
        Some(value) => match value.parse::<i64>() {
            Ok(weight) => weight >= 500,
            Err(_) => value == "bolder" || value == "bold",
        },
    }
}

/// `font-style` absent or not containing `normal`.
fn no_normal_font_style(styles: &StyleMap) -> bool {
    match styles.get("font-style") {
        None => true,
        Some(value) => !value.contains("normal"),
    }
}

fn italics(styles: &StyleMap) -> bool {
    styles
        .get("font-style")
        .is_some_and(|value| value.contains("italics"))
}

/// Strikethrough is keyed off `font-style` as well, not `text-decoration`.
/// Inherited behavior, kept as is.
fn struck(styles: &StyleMap) -> bool {
    styles
        .get("font-style")
        .is_some_and(|value| value.contains("strikethrough"))
}
