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

//! Qualified-name scoping.
//!
//! Types inside `package a.b { ... }` are exported as `a.b.Name`. Inside the
//! document they are also visible by their simple name from within the
//! package, and by their qualified name from anywhere.

use tessel_core::scope::{describe, DefaultNameProvider};
use tessel_core::{
    Ast, AstNodeDescription, CancellationToken, Cancelled, DefaultScopeComputation, DocumentUri,
    LocalScopes, NameProvider, NodeRef, ScopeComputation,
};

#[derive(Default)]
pub struct DomainModelScopeComputation {
    local: DefaultScopeComputation,
}

/// `prefix.name`, or `name` at top level.
pub fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

impl DomainModelScopeComputation {
    fn collect(
        &self,
        element: NodeRef<'_>,
        prefix: &str,
        uri: &DocumentUri,
        out: &mut Vec<AstNodeDescription>,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        cancel.check()?;
        let names = DefaultNameProvider;
        let Some(name) = names.name(element) else {
            return Ok(());
        };
        if element.is_a("PackageDeclaration") {
            let prefix = qualify(prefix, name);
            for child in element.children("elements") {
                self.collect(child, &prefix, uri, out, cancel)?;
            }
        } else if element.is_a("Type") {
            out.extend(describe(&names, element, uri, Some(qualify(prefix, name))));
        }
        Ok(())
    }
}

impl ScopeComputation for DomainModelScopeComputation {
    fn compute_exports(
        &self,
        ast: &Ast,
        uri: &DocumentUri,
        cancel: &CancellationToken,
    ) -> Result<Vec<AstNodeDescription>, Cancelled> {
        let mut exports = Vec::new();
        for element in ast.node(ast.root()).children("elements") {
            self.collect(element, "", uri, &mut exports, cancel)?;
        }
        Ok(exports)
    }

    fn compute_local_scopes(
        &self,
        ast: &Ast,
        uri: &DocumentUri,
        cancel: &CancellationToken,
    ) -> Result<LocalScopes, Cancelled> {
        let mut scopes = self.local.compute_local_scopes(ast, uri, cancel)?;
        // Qualified names of nested types are visible from the root.
        let root = ast.root();
        for description in self.compute_exports(ast, uri, cancel)? {
            if description.name.contains('.') {
                scopes.add(root, description);
            }
        }
        Ok(scopes)
    }
}
