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

//! Types and grammar of the domain model language.
//!
//! ```text
//! Domainmodel:        elements+=AbstractElement*;
//! AbstractElement:    PackageDeclaration | Type;
//! PackageDeclaration: 'package' name=QualifiedName '{' elements+=AbstractElement* '}';
//! Type:               DataType | Class;
//! DataType:           'datatype' name=ID;
//! Class:              'class' name=ID ('extends' superClass=[Class:QualifiedName])?
//!                     '{' members+=Property* '}';
//! Property:           many?='many'? name=ID ':' type=[Type:QualifiedName] ('=' default=Addition)?;
//! Addition:           Multiplication ({Binary.left=current} op=('+'|'-') right=Multiplication)*;
//! Multiplication:     Primary ({Binary.left=current} op=('*'|'/') right=Primary)*;
//! Primary:            '(' Addition ')' | {NumberLiteral} value=NUMBER;
//! QualifiedName:      ID ('.' ID)*;
//! ```

use std::sync::Arc;
use tessel_core::grammar::*;
use tessel_core::{PropertyKind, TesselResult, TokenKind, TypeHierarchy, TypeHierarchyBuilder};

/// Static type table of the language.
pub fn types() -> TesselResult<TypeHierarchy> {
    TypeHierarchyBuilder::new()
        .with_type("Domainmodel", &[], &[("elements", PropertyKind::Array)])
        .with_type("AbstractElement", &[], &[("name", PropertyKind::Value)])
        .with_type(
            "PackageDeclaration",
            &["AbstractElement"],
            &[("elements", PropertyKind::Array)],
        )
        .with_type("Type", &["AbstractElement"], &[])
        .with_type("DataType", &["Type"], &[])
        .with_type(
            "Class",
            &["Type"],
            &[
                ("superClass", PropertyKind::Value),
                ("members", PropertyKind::Array),
            ],
        )
        .with_type(
            "Property",
            &[],
            &[
                ("many", PropertyKind::Bool),
                ("name", PropertyKind::Value),
                ("type", PropertyKind::Value),
                ("default", PropertyKind::Value),
            ],
        )
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
        .build()
}

/// The grammar, entry rule `Domainmodel`.
pub fn grammar() -> TesselResult<Grammar> {
    let types = Arc::new(types()?);
    let mut g = GrammarBuilder::new("Domainmodel", types);
    let class_ty = g.type_id("Class")?;
    let type_ty = g.type_id("Type")?;
    let binary = g.type_id("Binary")?;
    let number_literal = g.type_id("NumberLiteral")?;

    let model = g.declare_parser("Domainmodel", Some("Domainmodel"))?;
    let element = g.declare_parser("AbstractElement", None)?;
    let package = g.declare_parser("PackageDeclaration", Some("PackageDeclaration"))?;
    let ty = g.declare_parser("Type", None)?;
    let data_type = g.declare_parser("DataType", Some("DataType"))?;
    let class = g.declare_parser("Class", Some("Class"))?;
    let property = g.declare_parser("Property", Some("Property"))?;
    let addition = g.declare_parser("Addition", Some("Expression"))?;
    let multiplication = g.declare_parser("Multiplication", Some("Expression"))?;
    let primary = g.declare_parser("Primary", Some("Expression"))?;
    let qualified_name = g.declare_data_type("QualifiedName", ValueKind::Text);
    let id = g.declare_terminal("ID", TokenKind::Identifier, ValueKind::Id);
    let number = g.declare_terminal("NUMBER", TokenKind::Number, ValueKind::Number);

    g.define(model, many(append("elements", rule(element))));
    g.define(element, alternatives(vec![rule(package), rule(ty)]));
    g.define(
        package,
        group(vec![
            keyword("package"),
            assign("name", rule(qualified_name)),
            keyword("{"),
            many(append("elements", rule(element))),
            keyword("}"),
        ]),
    );
    g.define(ty, alternatives(vec![rule(data_type), rule(class)]));
    g.define(
        data_type,
        group(vec![keyword("datatype"), assign("name", rule(id))]),
    );
    g.define(
        class,
        group(vec![
            keyword("class"),
            assign("name", rule(id)),
            optional(group(vec![
                keyword("extends"),
                assign("superClass", cross_ref(class_ty, qualified_name)),
            ])),
            keyword("{"),
            many(append("members", rule(property))),
            keyword("}"),
        ]),
    );
    g.define(
        property,
        group(vec![
            optional(flag("many", keyword("many"))),
            assign("name", rule(id)),
            keyword(":"),
            assign("type", cross_ref(type_ty, qualified_name)),
            optional(group(vec![keyword("="), assign("default", rule(addition))])),
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
        ]),
    );
    g.define(
        qualified_name,
        group(vec![rule(id), many(group(vec![keyword("."), rule(id)]))]),
    );

    g.build(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_build() {
        let types = types().unwrap();
        let class = types.id("Class").unwrap();
        let element = types.id("AbstractElement").unwrap();
        assert!(types.is_subtype(class, element));
        assert_eq!(types.subtypes_of(types.id("Type").unwrap()).len(), 3);
    }

    #[test]
    fn test_grammar_keywords() {
        let grammar = grammar().unwrap();
        for kw in ["package", "datatype", "class", "extends", "many", ":", "=", "."] {
            assert!(grammar.keywords().iter().any(|k| k == kw), "missing keyword {}", kw);
        }
        assert_eq!(grammar.name(), "Domainmodel");
    }
}
