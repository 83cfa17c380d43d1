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

//! Validation checks of the domain model language.

use std::collections::HashSet;
use std::sync::Arc;
use tessel_core::{AstNodeDescription, DocumentUri, NodeId, NodeRef, TesselResult};
use tessel_validate::checks::{ReferencesResolved, UniqueNames};
use tessel_validate::{
    DiagnosticInfo, DiagnosticTag, FnCheck, ValidationAcceptor, ValidationRegistry,
};

/// Registers every domain model check.
pub fn register(registry: &mut ValidationRegistry) -> TesselResult<()> {
    registry
        .register("Domainmodel", Arc::new(UniqueNames::new("elements")))?
        .register("PackageDeclaration", Arc::new(UniqueNames::new("elements")))?
        .register("Class", Arc::new(UniqueNames::new("members")))?
        .register_fn("Type", "capitalized-name", capitalized_name)?
        .register_fn("Class", "inheritance-cycle", inheritance_cycle)?
        .register_fn("Binary", "division-by-zero", division_by_zero)?
        .register(
            "DataType",
            Arc::new(FnCheck::new("unused-datatype", unused_datatype).slow()),
        )?
        .register_for_all(Arc::new(ReferencesResolved));
    Ok(())
}

fn capitalized_name(node: NodeRef<'_>, acceptor: &mut ValidationAcceptor) {
    let Some(name) = node.string("name") else {
        return;
    };
    if name.starts_with(|c: char| c.is_lowercase()) {
        acceptor.warning(
            "Type name should start with a capital.",
            DiagnosticInfo::new(node)
                .on_property("name")
                .with_code("capitalized-name"),
        );
    }
}

/// The node a resolved cross-reference points to, when it lives in
/// `document`, the document `from` belongs to.
fn local_target<'a>(
    from: NodeRef<'a>,
    document: &DocumentUri,
    target: &AstNodeDescription,
) -> Option<NodeRef<'a>> {
    if target.uri != *document {
        return None;
    }
    from.ast().get(target.node)
}

fn inheritance_cycle(node: NodeRef<'_>, acceptor: &mut ValidationAcceptor) {
    let document = acceptor.document().clone();
    let mut seen: HashSet<NodeId> = HashSet::new();
    seen.insert(node.id());
    let mut current = node;
    loop {
        let Some(target) = current
            .reference("superClass")
            .and_then(|r| r.target())
            .and_then(|d| local_target(current, &document, d))
        else {
            return;
        };
        if target.id() == node.id() {
            let name = node.string("name").unwrap_or_default();
            acceptor.error(
                format!("Cycle in the inheritance hierarchy of '{}'.", name),
                DiagnosticInfo::new(node)
                    .on_property("superClass")
                    .with_code("inheritance-cycle"),
            );
            return;
        }
        if !seen.insert(target.id()) {
            // A cycle further up; reported on its own members.
            return;
        }
        current = target;
    }
}

/// Constant value of an arithmetic expression.
///
/// `None` if some operand is missing or a division by zero occurs.
pub fn evaluate(expr: NodeRef<'_>) -> Option<f64> {
    match expr.type_name() {
        "NumberLiteral" => expr.number("value"),
        "Binary" => {
            let left = evaluate(expr.child("left")?)?;
            let right = evaluate(expr.child("right")?)?;
            match expr.string("op")? {
                "+" => Some(left + right),
                "-" => Some(left - right),
                "*" => Some(left * right),
                "/" if right != 0.0 => Some(left / right),
                _ => None,
            }
        }
        _ => None,
    }
}

fn division_by_zero(node: NodeRef<'_>, acceptor: &mut ValidationAcceptor) {
    if node.string("op") != Some("/") {
        return;
    }
    if node.child("right").and_then(evaluate) == Some(0.0) {
        acceptor.error(
            "Division by zero.",
            DiagnosticInfo::new(node)
                .on_property("right")
                .with_code("division-by-zero"),
        );
    }
}

fn unused_datatype(node: NodeRef<'_>, acceptor: &mut ValidationAcceptor) {
    let ast = node.ast();
    let document = acceptor.document();
    let used = ast.references().any(|(_, reference)| {
        reference
            .target()
            .and_then(|d| local_target(node, document, d))
            .is_some_and(|target| target.id() == node.id())
    });
    if !used {
        let name = node.string("name").unwrap_or_default();
        acceptor.hint(
            format!("Datatype '{}' is never used.", name),
            DiagnosticInfo::new(node)
                .on_property("name")
                .with_code("unused-datatype")
                .with_tag(DiagnosticTag::Unnecessary),
        );
    }
}
