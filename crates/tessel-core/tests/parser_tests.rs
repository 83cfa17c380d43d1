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

//! Parser integration tests on the calculator fixture.

mod common;

use common::{calc, render};
use tessel_core::{TextRange, Value};

// ==================== Assignment tests ====================

#[test]
fn test_append_three_times_keeps_order() {
    let result = calc().parse("def a = 1; def b = 2; def c = 3;");
    assert!(!result.has_errors(), "{:?}", result.parse_errors);
    let root = result.ast.node(result.ast.root());
    let names: Vec<_> = root
        .children("statements")
        .iter()
        .filter_map(|s| s.string("name"))
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    for (index, statement) in root.children("statements").iter().enumerate() {
        assert_eq!(statement.container(), Some(root));
        assert_eq!(statement.container_property(), Some("statements"));
        assert_eq!(statement.container_index(), Some(index));
    }
}

#[test]
fn test_unassigned_call_types_the_statement() {
    let result = calc().parse("def a = 1; a;");
    let root = result.ast.node(result.ast.root());
    let statements = root.children("statements");
    assert_eq!(statements[0].type_name(), "Definition");
    assert_eq!(statements[1].type_name(), "Evaluation");
    assert!(statements[1].is_a("Statement"));
}

// ==================== Action tests ====================

#[test]
fn test_binary_precedence() {
    let result = calc().parse("1 + 2 * 3;");
    assert!(!result.has_errors());
    let root = result.ast.node(result.ast.root());
    let expr = root.children("statements")[0].child("expr").unwrap();
    assert_eq!(render(expr), "(+ 1 (* 2 3))");
}

#[test]
fn test_binary_left_associative() {
    let result = calc().parse("8 - 4 - 2;");
    let root = result.ast.node(result.ast.root());
    let expr = root.children("statements")[0].child("expr").unwrap();
    assert_eq!(render(expr), "(- (- 8 4) 2)");
}

#[test]
fn test_parenthesized_expression_is_adopted() {
    let result = calc().parse("(1 + 2) * x;");
    assert!(!result.has_errors());
    let root = result.ast.node(result.ast.root());
    let expr = root.children("statements")[0].child("expr").unwrap();
    assert_eq!(render(expr), "(* (+ 1 2) x)");

    let left = expr.child("left").unwrap();
    assert_eq!(left.container(), Some(expr));
    assert_eq!(left.container_property(), Some("left"));
    assert_eq!(left.text(), "(1 + 2)");
}

#[test]
fn test_action_node_ranges() {
    let text = "def total = 10 + 20;";
    let result = calc().parse(text);
    let root = result.ast.node(result.ast.root());
    let definition = root.children("statements")[0];
    let expr = definition.child("expr").unwrap();
    assert_eq!(expr.range(), Some(TextRange::new(12, 19)));
    assert_eq!(expr.child("left").unwrap().range(), Some(TextRange::new(12, 14)));
    assert_eq!(definition.property_range("name", None), Some(TextRange::new(4, 9)));
    assert_eq!(result.ast.node_at_offset(17), expr.child("right").map(|n| n.id()));
}

// ==================== Data-type rule tests ====================

#[test]
fn test_qualified_name_data_type() {
    let result = calc().parse("import geo.shapes.circle;");
    assert!(!result.has_errors());
    let root = result.ast.node(result.ast.root());
    let import = root.children("statements")[0];
    assert_eq!(import.type_name(), "Import");
    assert_eq!(import.get("path"), Some(&Value::from("geo.shapes.circle")));
    assert_eq!(import.property_range("path", None), Some(TextRange::new(7, 24)));
}

// ==================== Reference tests ====================

#[test]
fn test_references_are_deferred() {
    let result = calc().parse("def a = 1; a + a;");
    let references: Vec<_> = result.ast.references().collect();
    assert_eq!(references.len(), 2);
    for (_, reference) in &references {
        assert_eq!(reference.text(), "a");
        assert_eq!(reference.property(), "target");
        assert!(!reference.is_linked());
        let owner = result.ast.node(reference.container().unwrap());
        assert_eq!(owner.type_name(), "Ref");
    }
    let offset = "def a = 1; a + ".len();
    assert_eq!(result.ast.reference_at(offset), Some(references[1].0));
}

// ==================== Recovery tests ====================

#[test]
fn test_missing_semicolon_recovers() {
    let result = calc().parse("def a = 1 def b = 2;");
    assert_eq!(result.parse_errors.len(), 1);
    assert_eq!(
        result.parse_errors[0].message,
        "Expecting keyword ';' but found `def`."
    );
    assert_eq!(result.parse_errors[0].rule.as_deref(), Some("Definition"));
    let root = result.ast.node(result.ast.root());
    assert_eq!(root.children("statements").len(), 2);
}

#[test]
fn test_no_viable_alternative_gives_no_value() {
    let result = calc().parse("def a = ; def b = 2;");
    assert_eq!(result.parse_errors.len(), 1);
    assert!(result.parse_errors[0].message.starts_with("Expecting one of"));
    assert_eq!(result.parse_errors[0].token.as_deref(), Some(";"));
    let root = result.ast.node(result.ast.root());
    let statements = root.children("statements");
    assert_eq!(statements.len(), 2);
    assert!(statements[0].child("expr").is_none());
    assert_eq!(statements[1].string("name"), Some("b"));
}

#[test]
fn test_garbage_after_statements_is_skipped() {
    let text = "def a = 1; ) ) def b = 2;";
    let result = calc().parse(text);
    assert_eq!(result.parse_errors.len(), 1);
    assert!(result.parse_errors[0]
        .message
        .starts_with("Expecting end of file but found `)`"));
    let root = result.ast.node(result.ast.root());
    assert_eq!(root.children("statements").len(), 2);
    assert_eq!(result.ast.cst().text(result.ast.cst().root()), text);
}

#[test]
fn test_unknown_characters_do_not_stop_parsing() {
    let result = calc().parse("def a = 1; # def b = 2;");
    assert_eq!(result.lex_errors.len(), 1);
    assert!(result.parse_errors.is_empty());
    let root = result.ast.node(result.ast.root());
    assert_eq!(root.children("statements").len(), 2);
}

#[test]
fn test_error_at_end_of_input() {
    let result = calc().parse("def a =");
    assert_eq!(result.parse_errors.len(), 1);
    let error = &result.parse_errors[0];
    assert!(error.message.ends_with("but found end of file."));
    assert_eq!(error.range, TextRange::empty(7));
    assert_eq!(error.token, None);
}

// ==================== CST tests ====================

#[test]
fn test_cst_keeps_comments_and_trailing_whitespace() {
    let text = "// totals\ndef a = 1; /* note */ a * 2;\n\n";
    let result = calc().parse(text);
    assert!(!result.has_errors());
    let cst = result.ast.cst();
    assert_eq!(cst.text(cst.root()), text);
    assert_eq!(cst.node(cst.root()).range, TextRange::new(0, text.len()));
    let hidden = cst
        .leaves(cst.root())
        .into_iter()
        .filter(|&leaf| cst.node(leaf).is_hidden())
        .count();
    assert!(hidden >= 6);
}
