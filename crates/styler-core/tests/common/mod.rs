//! Trees shared by the integration tests

#![allow(dead_code)]

use styler_core::{NodeData, NodeId, NodeKind, SourceRange, SyntaxTree, TreeBuilder};

pub fn ident(name: &str, line: u32, column: u32) -> NodeData {
    let end = column + name.len() as u32;
    NodeData::new(
        NodeKind::Identifier,
        SourceRange::from_coords(line, column, line, end),
    )
    .with_text(name)
}

/// `name();` at the given line, indented by eight columns
pub fn call_statement(builder: &mut TreeBuilder, name: &str, line: u32) -> NodeId {
    let callee = builder.alloc(ident(name, line, 9)).unwrap();
    let end = 9 + name.len() as u32 + 3;
    builder
        .alloc(
            NodeData::new(
                NodeKind::ExpressionStatement,
                SourceRange::from_coords(line, 9, line, end),
            )
            .with_children([callee]),
        )
        .unwrap()
}

/// Handles into the tree built by [`two_methods`]
pub struct TwoMethods {
    pub tree: SyntaxTree,
    pub class: NodeId,
    pub first_method: NodeId,
    pub first_body: NodeId,
    pub first_statement: NodeId,
    pub second_method: NodeId,
    pub second_body: NodeId,
    pub second_statement: NodeId,
}

/// ```text
/// class Service {
///     void start() {
///         open();
///     }
///     void stop() {
///         close();
///     }
/// }
/// ```
pub fn two_methods() -> TwoMethods {
    let mut b = TreeBuilder::new();
    let class_name = b.alloc(ident("Service", 1, 7)).unwrap();

    let start = b.alloc(ident("start", 2, 10)).unwrap();
    let first_statement = call_statement(&mut b, "open", 3);
    let first_body = b
        .alloc(
            NodeData::new(NodeKind::Block, SourceRange::from_coords(2, 18, 4, 6))
                .with_children([first_statement]),
        )
        .unwrap();
    let first_method = b
        .alloc(
            NodeData::new(
                NodeKind::MethodDeclaration,
                SourceRange::from_coords(2, 5, 4, 6),
            )
            .with_children([start, first_body]),
        )
        .unwrap();

    let stop = b.alloc(ident("stop", 5, 10)).unwrap();
    let second_statement = call_statement(&mut b, "close", 6);
    let second_body = b
        .alloc(
            NodeData::new(NodeKind::Block, SourceRange::from_coords(5, 17, 7, 6))
                .with_children([second_statement]),
        )
        .unwrap();
    let second_method = b
        .alloc(
            NodeData::new(
                NodeKind::MethodDeclaration,
                SourceRange::from_coords(5, 5, 7, 6),
            )
            .with_children([stop, second_body]),
        )
        .unwrap();

    let class = b
        .alloc(
            NodeData::new(
                NodeKind::ClassDeclaration,
                SourceRange::from_coords(1, 1, 8, 2),
            )
            .with_children([class_name, first_method, second_method]),
        )
        .unwrap();
    let unit = b
        .alloc(
            NodeData::new(
                NodeKind::CompilationUnit,
                SourceRange::from_coords(1, 1, 8, 2),
            )
            .with_children([class]),
        )
        .unwrap();

    TwoMethods {
        tree: b.finish(unit).unwrap(),
        class,
        first_method,
        first_body,
        first_statement,
        second_method,
        second_body,
        second_statement,
    }
}

/// Number of nodes under `id` whose text is `text`
pub fn count_text(tree: &SyntaxTree, id: NodeId, text: &str) -> usize {
    tree.descendants(id)
        .into_iter()
        .filter(|node| tree.get(*node).and_then(NodeData::text) == Some(text))
        .count()
}
