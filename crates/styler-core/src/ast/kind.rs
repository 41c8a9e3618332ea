//! Node kinds and the child shapes their grammar allows

use serde::{Deserialize, Serialize};
use std::fmt;

/// Syntax constructs known to the formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    CompilationUnit,
    PackageDeclaration,
    ImportDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    RecordDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    FieldDeclaration,
    ParameterDeclaration,
    VariableDeclaration,
    Annotation,
    AnnotationElement,
    Block,
    IfStatement,
    ForStatement,
    ExpressionStatement,
    BinaryExpression,
    Identifier,
    QualifiedName,
    Literal,
}

/// Number and arrangement of children a node kind accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildShape {
    /// No children
    Leaf,
    /// Exactly `n` children
    Fixed(usize),
    /// `required` leading children followed by up to `optional` more
    Optional { required: usize, optional: usize },
    /// Any number of children, at least `min`
    Sequence { min: usize },
}

impl ChildShape {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            ChildShape::Leaf => count == 0,
            ChildShape::Fixed(n) => count == n,
            ChildShape::Optional { required, optional } => {
                count >= required && count <= required + optional
            }
            ChildShape::Sequence { min } => count >= min,
        }
    }
}

fn children(count: usize) -> &'static str {
    if count == 1 { "child" } else { "children" }
}

impl fmt::Display for ChildShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ChildShape::Leaf => write!(f, "no children"),
            ChildShape::Fixed(n) => write!(f, "exactly {n} {}", children(n)),
            ChildShape::Optional { required, optional } => {
                let max = required + optional;
                write!(f, "{required} to {max} {}", children(max))
            }
            ChildShape::Sequence { min } => write!(f, "at least {min} {}", children(min)),
        }
    }
}

impl NodeKind {
    /// Children this kind accepts, in grammar order.
    ///
    /// Declarations start with their name; `if` holds condition, then-branch
    /// and an optional else-branch; a variable holds type, name and an
    /// optional initializer.
    pub fn shape(self) -> ChildShape {
        match self {
            NodeKind::CompilationUnit | NodeKind::Block => ChildShape::Sequence { min: 0 },
            NodeKind::PackageDeclaration
            | NodeKind::ImportDeclaration
            | NodeKind::ExpressionStatement => ChildShape::Fixed(1),
            NodeKind::ClassDeclaration
            | NodeKind::InterfaceDeclaration
            | NodeKind::EnumDeclaration
            | NodeKind::RecordDeclaration
            | NodeKind::MethodDeclaration
            | NodeKind::ConstructorDeclaration
            | NodeKind::Annotation
            | NodeKind::QualifiedName
            | NodeKind::ForStatement => ChildShape::Sequence { min: 1 },
            NodeKind::FieldDeclaration => ChildShape::Sequence { min: 2 },
            NodeKind::ParameterDeclaration
            | NodeKind::AnnotationElement
            | NodeKind::BinaryExpression => ChildShape::Fixed(2),
            NodeKind::VariableDeclaration | NodeKind::IfStatement => ChildShape::Optional {
                required: 2,
                optional: 1,
            },
            NodeKind::Identifier | NodeKind::Literal => ChildShape::Leaf,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "CompilationUnit",
            NodeKind::PackageDeclaration => "PackageDeclaration",
            NodeKind::ImportDeclaration => "ImportDeclaration",
            NodeKind::ClassDeclaration => "ClassDeclaration",
            NodeKind::InterfaceDeclaration => "InterfaceDeclaration",
            NodeKind::EnumDeclaration => "EnumDeclaration",
            NodeKind::RecordDeclaration => "RecordDeclaration",
            NodeKind::MethodDeclaration => "MethodDeclaration",
            NodeKind::ConstructorDeclaration => "ConstructorDeclaration",
            NodeKind::FieldDeclaration => "FieldDeclaration",
            NodeKind::ParameterDeclaration => "ParameterDeclaration",
            NodeKind::VariableDeclaration => "VariableDeclaration",
            NodeKind::Annotation => "Annotation",
            NodeKind::AnnotationElement => "AnnotationElement",
            NodeKind::Block => "Block",
            NodeKind::IfStatement => "IfStatement",
            NodeKind::ForStatement => "ForStatement",
            NodeKind::ExpressionStatement => "ExpressionStatement",
            NodeKind::BinaryExpression => "BinaryExpression",
            NodeKind::Identifier => "Identifier",
            NodeKind::QualifiedName => "QualifiedName",
            NodeKind::Literal => "Literal",
        }
    }

    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::ClassDeclaration
                | NodeKind::InterfaceDeclaration
                | NodeKind::EnumDeclaration
                | NodeKind::RecordDeclaration
        )
    }

    pub fn is_leaf(self) -> bool {
        self.shape() == ChildShape::Leaf
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
