// Dweve Tessel - Grammar-Driven Language Runtime
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! AST traversal.
//!
//! [`stream_ast`] is a pre-order iterator over a subtree. Scope
//! computation, linking and validation all walk the tree through it.

use crate::ast::{Ast, NodeId, NodeRef};

/// Pre-order iterator over a subtree, the start node included.
pub struct AstStream<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for AstStream<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.ast.node(id);
        let children = node.contents();
        self.stack.extend(children.iter().rev().map(NodeRef::id));
        Some(node)
    }
}

/// Streams `start` and all its descendants in document order.
pub fn stream_ast(ast: &Ast, start: NodeId) -> AstStream<'_> {
    AstStream {
        ast,
        stack: vec![start],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::*;
    use crate::lex::{SimpleLexer, TokenKind};
    use crate::types::{PropertyKind, TypeHierarchyBuilder};
    use crate::Parser;
    use std::sync::Arc;

    // A tiny nested language: `[a [b c] d]` builds a tree of Lists.
    fn parse(text: &str) -> Ast {
        let types = Arc::new(
            TypeHierarchyBuilder::new()
                .with_type("Item", &[], &[])
                .with_type("Atom", &["Item"], &[("name", PropertyKind::Value)])
                .with_type("List", &["Item"], &[("items", PropertyKind::Array)])
                .build()
                .unwrap(),
        );
        let mut g = GrammarBuilder::new("Lists", types);
        let list = g.declare_parser("List", Some("List")).unwrap();
        let item = g.declare_parser("Item", None).unwrap();
        let atom = g.declare_parser("Atom", Some("Atom")).unwrap();
        let id = g.declare_terminal("ID", TokenKind::Identifier, ValueKind::Id);
        g.define(
            list,
            group(vec![keyword("["), many(append("items", rule(item))), keyword("]")]),
        );
        g.define(item, alternatives(vec![rule(atom), rule(list)]));
        g.define(atom, assign("name", rule(id)));
        let grammar = Arc::new(g.build(list).unwrap());
        let lexer = SimpleLexer::new(grammar.keywords().iter().cloned());
        Parser::new(grammar).unwrap().parse_text(&lexer, text).ast
    }

    #[test]
    fn test_stream_is_preorder() {
        let ast = parse("[a [b c] d]");
        let names: Vec<_> = stream_ast(&ast, ast.root())
            .map(|n| n.string("name").unwrap_or(n.type_name()).to_string())
            .collect();
        assert_eq!(names, vec!["List", "a", "List", "b", "c", "d"]);
    }
}
