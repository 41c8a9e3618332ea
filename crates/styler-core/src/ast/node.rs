//! Node values: source ranges, comments, whitespace and formatting hints
//!
//! A [`NodeData`] is the immutable value stored in one arena slot. Children
//! are referenced by [`NodeId`]; parent links are not part of the value and
//! live in the arena layer that attached the node.

use super::kind::NodeKind;
use crate::{Result, StylerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Minimum accepted preferred line length (exclusive)
pub const MIN_PREFERRED_LINE_LENGTH: u32 = 20;

/// Index of a node slot in a tree arena.
///
/// Two nodes with the same id are the same value; ids are never reused
/// within a lineage of trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 1-based line and column
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    pub const fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Shorthand for `start_line:start_col-end_line:end_col`
    pub const fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self::new(
            SourcePosition::new(start_line, start_col),
            SourcePosition::new(end_line, end_col),
        )
    }

    pub fn contains(&self, other: &SourceRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Identity of a logical position that survives rebuilding.
///
/// Derived from kind and source range only, so the rebuilt copy of a node
/// has the same stable id as the node it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StableNodeId {
    pub kind: NodeKind,
    pub range: SourceRange,
}

impl StableNodeId {
    pub fn new(kind: NodeKind, range: SourceRange) -> Self {
        Self { kind, range }
    }
}

impl fmt::Display for StableNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind, self.range)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Line,
    Block,
    Javadoc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comment {
    pub kind: CommentKind,
    pub text: String,
}

impl Comment {
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            kind: CommentKind::Line,
            text: text.into(),
        }
    }

    pub fn block(text: impl Into<String>) -> Self {
        Self {
            kind: CommentKind::Block,
            text: text.into(),
        }
    }

    pub fn javadoc(text: impl Into<String>) -> Self {
        Self {
            kind: CommentKind::Javadoc,
            text: text.into(),
        }
    }
}

/// Whitespace surrounding a node's own tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhitespaceInfo {
    pub leading: String,
    pub trailing: String,
}

impl WhitespaceInfo {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(leading: impl Into<String>, trailing: impl Into<String>) -> Self {
        Self {
            leading: leading.into(),
            trailing: trailing.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentationStyle {
    Spaces,
    Tabs,
    Mixed,
}

/// Per-node formatting preferences coming from source annotations
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingHints {
    pub no_format: bool,
    pub preferred_line_length: Option<u32>,
    pub indent_style: Option<IndentationStyle>,
    pub custom_hints: BTreeMap<String, String>,
}

impl FormattingHints {
    pub fn defaults() -> Self {
        Self::default()
    }

    pub fn no_formatting() -> Self {
        Self {
            no_format: true,
            ..Self::default()
        }
    }

    pub fn with_line_length(line_length: u32) -> Result<Self> {
        let hints = Self {
            preferred_line_length: Some(line_length),
            ..Self::default()
        };
        hints.validate()?;
        Ok(hints)
    }

    pub fn with_indent_style(style: IndentationStyle) -> Self {
        Self {
            indent_style: Some(style),
            ..Self::default()
        }
    }

    pub fn with_custom_hint(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_hints.insert(key.into(), value.into());
        self
    }

    pub fn custom_hint(&self, key: &str) -> Option<&str> {
        self.custom_hints.get(key).map(String::as_str)
    }

    pub fn has_preferences(&self) -> bool {
        self.no_format
            || self.preferred_line_length.is_some()
            || self.indent_style.is_some()
            || !self.custom_hints.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(length) = self.preferred_line_length {
            if length <= MIN_PREFERRED_LINE_LENGTH {
                return Err(StylerError::invalid_node(format!(
                    "preferred line length must be greater than {MIN_PREFERRED_LINE_LENGTH}, got {length}"
                )));
            }
        }
        if self.custom_hints.keys().any(|key| key.trim().is_empty()) {
            return Err(StylerError::invalid_node("custom hint keys must not be blank"));
        }
        Ok(())
    }
}

/// Value of one syntax node.
///
/// Equality and hashing compare children by id. Use
/// [`SyntaxTree::structurally_eq`](super::SyntaxTree::structurally_eq) for
/// deep comparison across trees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeData {
    kind: NodeKind,
    range: SourceRange,
    text: Option<String>,
    leading_comments: Vec<Comment>,
    trailing_comments: Vec<Comment>,
    whitespace: WhitespaceInfo,
    hints: FormattingHints,
    children: Vec<NodeId>,
}

impl NodeData {
    pub fn new(kind: NodeKind, range: SourceRange) -> Self {
        Self {
            kind,
            range,
            text: None,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
            whitespace: WhitespaceInfo::none(),
            hints: FormattingHints::defaults(),
            children: Vec::new(),
        }
    }

    /// Token text: identifier name, literal value or operator
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeId>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    pub fn with_leading_comments(mut self, comments: Vec<Comment>) -> Self {
        self.leading_comments = comments;
        self
    }

    pub fn with_trailing_comments(mut self, comments: Vec<Comment>) -> Self {
        self.trailing_comments = comments;
        self
    }

    pub fn with_whitespace(mut self, whitespace: WhitespaceInfo) -> Self {
        self.whitespace = whitespace;
        self
    }

    pub fn with_hints(mut self, hints: FormattingHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn leading_comments(&self) -> &[Comment] {
        &self.leading_comments
    }

    pub fn trailing_comments(&self) -> &[Comment] {
        &self.trailing_comments
    }

    pub fn whitespace(&self) -> &WhitespaceInfo {
        &self.whitespace
    }

    pub fn hints(&self) -> &FormattingHints {
        &self.hints
    }

    pub fn stable_id(&self) -> StableNodeId {
        StableNodeId::new(self.kind, self.range)
    }

    pub fn has_comments(&self) -> bool {
        !self.leading_comments.is_empty() || !self.trailing_comments.is_empty()
    }

    /// Position of `child` among this node's children, by identity
    pub fn position_of(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|candidate| *candidate == child)
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }

    /// Same value ignoring children
    pub(crate) fn same_attributes(&self, other: &NodeData) -> bool {
        self.kind == other.kind
            && self.range == other.range
            && self.text == other.text
            && self.leading_comments == other.leading_comments
            && self.trailing_comments == other.trailing_comments
            && self.whitespace == other.whitespace
            && self.hints == other.hints
    }

    /// Check hints and child count against the kind's grammar shape
    pub fn validate(&self) -> Result<()> {
        let shape = self.kind.shape();
        if !shape.accepts(self.children.len()) {
            return Err(StylerError::ShapeViolation {
                kind: self.kind,
                expected: shape,
                actual: self.children.len(),
            });
        }
        self.hints.validate()
    }
}
