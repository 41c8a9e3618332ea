//! Shared fixtures for unit tests

use crate::ast::{NodeData, NodeId, NodeKind, SourceRange, SyntaxTree, TreeBuilder};

pub(crate) fn ident(name: &str, line: u32, column: u32) -> NodeData {
    let end = column + name.len() as u32;
    NodeData::new(
        NodeKind::Identifier,
        SourceRange::from_coords(line, column, line, end),
    )
    .with_text(name)
}

/// Handles into the tree built by [`sample_tree`]
pub(crate) struct Sample {
    pub tree: SyntaxTree,
    pub class: NodeId,
    pub method: NodeId,
    pub body: NodeId,
    pub if_stmt: NodeId,
    pub condition: NodeId,
    pub x: NodeId,
    pub then_block: NodeId,
    pub statement: NodeId,
}

/// ```text
/// class Foo {
///     void run() {
///         if (x > 0) {
///             log();
///         }
///     }
/// }
/// ```
pub(crate) fn sample_tree() -> Sample {
    let mut b = TreeBuilder::new();
    let class_name = b.alloc(ident("Foo", 1, 14)).unwrap();
    let method_name = b.alloc(ident("run", 2, 17)).unwrap();
    let x = b.alloc(ident("x", 3, 13)).unwrap();
    let zero = b
        .alloc(NodeData::new(NodeKind::Literal, SourceRange::from_coords(3, 17, 3, 18)).with_text("0"))
        .unwrap();
    let condition = b
        .alloc(
            NodeData::new(NodeKind::BinaryExpression, SourceRange::from_coords(3, 13, 3, 18))
                .with_text(">")
                .with_children([x, zero]),
        )
        .unwrap();
    let log = b.alloc(ident("log", 4, 13)).unwrap();
    let statement = b
        .alloc(
            NodeData::new(NodeKind::ExpressionStatement, SourceRange::from_coords(4, 13, 4, 19))
                .with_children([log]),
        )
        .unwrap();
    let then_block = b
        .alloc(
            NodeData::new(NodeKind::Block, SourceRange::from_coords(3, 20, 7, 10))
                .with_children([statement]),
        )
        .unwrap();
    let if_stmt = b
        .alloc(
            NodeData::new(NodeKind::IfStatement, SourceRange::from_coords(3, 9, 7, 10))
                .with_children([condition, then_block]),
        )
        .unwrap();
    let body = b
        .alloc(
            NodeData::new(NodeKind::Block, SourceRange::from_coords(2, 23, 8, 6))
                .with_children([if_stmt]),
        )
        .unwrap();
    let method = b
        .alloc(
            NodeData::new(NodeKind::MethodDeclaration, SourceRange::from_coords(2, 5, 8, 6))
                .with_children([method_name, body]),
        )
        .unwrap();
    let class = b
        .alloc(
            NodeData::new(NodeKind::ClassDeclaration, SourceRange::from_coords(1, 1, 9, 2))
                .with_children([class_name, method]),
        )
        .unwrap();
    let unit = b
        .alloc(
            NodeData::new(NodeKind::CompilationUnit, SourceRange::from_coords(1, 1, 9, 2))
                .with_children([class]),
        )
        .unwrap();

    Sample {
        tree: b.finish(unit).unwrap(),
        class,
        method,
        body,
        if_stmt,
        condition,
        x,
        then_block,
        statement,
    }
}
