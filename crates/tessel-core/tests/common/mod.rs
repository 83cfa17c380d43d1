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

//! Shared fixture: a small calculator language.
//!
//! ```text
//! Model:          statements+=Statement*;
//! Statement:      Definition | Evaluation | Import;
//! Definition:     'def' name=ID '=' expr=Addition ';';
//! Evaluation:     expr=Addition ';';
//! Import:         'import' path=QualifiedName ';';
//! Addition:       Multiplication ({Binary.left=current} op=('+'|'-') right=Multiplication)*;
//! Multiplication: Primary ({Binary.left=current} op=('*'|'/') right=Primary)*;
//! Primary:        '(' Addition ')' | {NumberLiteral} value=NUMBER | {Ref} target=[Definition:ID];
//! QualifiedName:  ID ('.' ID)*;
//! ```

#![allow(dead_code)]

use std::sync::Arc;
use tessel_core::grammar::*;
use tessel_core::lex::SimpleLexer;
use tessel_core::{ParseResult, Parser, PropertyKind, TokenKind, TypeHierarchyBuilder};

pub struct Calc {
    pub parser: Parser,
    pub lexer: SimpleLexer,
}

impl Calc {
    pub fn parse(&self, text: &str) -> ParseResult {
        self.parser.parse_text(&self.lexer, text)
    }
}

pub fn calc() -> Calc {
    let types = Arc::new(
        TypeHierarchyBuilder::new()
            .with_type("Model", &[], &[("statements", PropertyKind::Array)])
            .with_type("Statement", &[], &[])
            .with_type(
                "Definition",
                &["Statement"],
                &[("name", PropertyKind::Value), ("expr", PropertyKind::Value)],
            )
            .with_type("Evaluation", &["Statement"], &[("expr", PropertyKind::Value)])
            .with_type("Import", &["Statement"], &[("path", PropertyKind::Value)])
            .with_type("Expression", &[], &[])
            .with_type(
                "Binary",
                &["Expression"],
                &[
                    ("left", PropertyKind::Value),
                    ("op", PropertyKind::Value),
                    ("right", PropertyKind::Value),
                ],
            )
            .with_type("NumberLiteral", &["Expression"], &[("value", PropertyKind::Value)])
            .with_type("Ref", &["Expression"], &[("target", PropertyKind::Value)])
            .build()
            .unwrap(),
    );
    let binary = types.id("Binary").unwrap();
    let number_literal = types.id("NumberLiteral").unwrap();
    let reference = types.id("Ref").unwrap();
    let definition_ty = types.id("Definition").unwrap();

    let mut g = GrammarBuilder::new("Calc", types);
    let model = g.declare_parser("Model", Some("Model")).unwrap();
    let statement = g.declare_parser("Statement", None).unwrap();
    let definition = g.declare_parser("Definition", Some("Definition")).unwrap();
    let evaluation = g.declare_parser("Evaluation", Some("Evaluation")).unwrap();
    let import = g.declare_parser("Import", Some("Import")).unwrap();
    let addition = g.declare_parser("Addition", Some("Expression")).unwrap();
    let multiplication = g.declare_parser("Multiplication", Some("Expression")).unwrap();
    let primary = g.declare_parser("Primary", Some("Expression")).unwrap();
    let qualified_name = g.declare_data_type("QualifiedName", ValueKind::Text);
    let id = g.declare_terminal("ID", TokenKind::Identifier, ValueKind::Id);
    let number = g.declare_terminal("NUMBER", TokenKind::Number, ValueKind::Number);

    g.define(model, many(append("statements", rule(statement))));
    g.define(
        statement,
        alternatives(vec![rule(definition), rule(evaluation), rule(import)]),
    );
    g.define(
        definition,
        group(vec![
            keyword("def"),
            assign("name", rule(id)),
            keyword("="),
            assign("expr", rule(addition)),
            keyword(";"),
        ]),
    );
    g.define(
        evaluation,
        group(vec![assign("expr", rule(addition)), keyword(";")]),
    );
    g.define(
        import,
        group(vec![
            keyword("import"),
            assign("path", rule(qualified_name)),
            keyword(";"),
        ]),
    );
    g.define(
        addition,
        group(vec![
            rule(multiplication),
            many(group(vec![
                tree_action(binary, "left", AssignOp::Set),
                assign("op", alternatives(vec![keyword("+"), keyword("-")])),
                assign("right", rule(multiplication)),
            ])),
        ]),
    );
    g.define(
        multiplication,
        group(vec![
            rule(primary),
            many(group(vec![
                tree_action(binary, "left", AssignOp::Set),
                assign("op", alternatives(vec![keyword("*"), keyword("/")])),
                assign("right", rule(primary)),
            ])),
        ]),
    );
    g.define(
        primary,
        alternatives(vec![
            group(vec![keyword("("), rule(addition), keyword(")")]),
            group(vec![action(number_literal), assign("value", rule(number))]),
            group(vec![
                action(reference),
                assign("target", cross_ref(definition_ty, id)),
            ]),
        ]),
    );
    g.define(
        qualified_name,
        group(vec![rule(id), many(group(vec![keyword("."), rule(id)]))]),
    );

    let grammar = Arc::new(g.build(model).unwrap());
    let lexer = SimpleLexer::new(grammar.keywords().iter().cloned());
    Calc {
        parser: Parser::new(grammar).unwrap(),
        lexer,
    }
}

/// Renders an expression tree as an s-expression.
pub fn render(node: tessel_core::NodeRef<'_>) -> String {
    match node.type_name() {
        "Binary" => format!(
            "({} {} {})",
            node.string("op").unwrap_or("?"),
            node.child("left").map(render).unwrap_or_else(|| "?".into()),
            node.child("right").map(render).unwrap_or_else(|| "?".into()),
        ),
        "NumberLiteral" => node
            .number("value")
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".into()),
        "Ref" => node
            .reference("target")
            .map(|r| r.text().to_string())
            .unwrap_or_else(|| "?".into()),
        other => other.to_string(),
    }
}
