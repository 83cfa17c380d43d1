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

//! Cross-reference resolution.
//!
//! A reference is resolved by walking from its owning node out through the
//! containers, consulting each container's local scope. The first
//! description with the right name and a compatible type wins. When no
//! local scope matches, the global scope (exports of every document) is
//! asked; among several global candidates the one from the smallest URI
//! wins, so the outcome does not depend on document load order.
//!
//! Results are stored in the reference's resolve-once cell. Resolving an
//! already linked reference returns the stored result.

use crate::ast::Ast;
use crate::cancel::CancellationToken;
use crate::error::Cancelled;
use crate::reference::{RefId, Reference, Resolution};
use crate::scope::{AstNodeDescription, LocalScopes};
use crate::types::TypeId;
use crate::uri::DocumentUri;
use tracing::trace;

/// Exported descriptions of a whole workspace.
pub trait GlobalScope: Send + Sync {
    /// Every exported description named `name`.
    fn lookup(&self, name: &str) -> Vec<AstNodeDescription>;
}

/// A global scope with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyGlobalScope;

impl GlobalScope for EmptyGlobalScope {
    fn lookup(&self, _name: &str) -> Vec<AstNodeDescription> {
        Vec::new()
    }
}

impl GlobalScope for Vec<AstNodeDescription> {
    fn lookup(&self, name: &str) -> Vec<AstNodeDescription> {
        self.iter().filter(|d| d.name == name).cloned().collect()
    }
}

/// Everything a linker needs besides the AST.
#[derive(Clone, Copy)]
pub struct LinkContext<'a> {
    pub uri: &'a DocumentUri,
    pub local: &'a LocalScopes,
    pub global: &'a dyn GlobalScope,
}

/// Outcome counts of [`Linker::link`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub resolved: usize,
    pub unresolved: usize,
}

pub trait Linker: Send + Sync {
    /// Computes the resolution of one reference. Never fails.
    fn resolve(&self, ast: &Ast, reference: &Reference, cx: &LinkContext<'_>) -> Resolution;

    /// Resolution of `id`, computed on first access.
    fn target<'a>(&self, ast: &'a Ast, id: RefId, cx: &LinkContext<'_>) -> &'a Resolution {
        let reference = ast.reference(id);
        reference.resolve_with(|| self.resolve(ast, reference, cx))
    }

    /// Resolves every reference of the document.
    fn link(&self, ast: &Ast, cx: &LinkContext<'_>, cancel: &CancellationToken) -> Result<LinkStats, Cancelled> {
        let mut stats = LinkStats::default();
        for (id, _) in ast.references() {
            cancel.check()?;
            if self.target(ast, id, cx).is_resolved() {
                stats.resolved += 1;
            } else {
                stats.unresolved += 1;
            }
        }
        Ok(stats)
    }
}

/// Nearest local scope first, then the global scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLinker;

impl DefaultLinker {
    fn matches(ast: &Ast, description: &AstNodeDescription, name: &str, target: TypeId) -> bool {
        description.name == name && ast.types().is_subtype(description.ty, target)
    }
}

impl Linker for DefaultLinker {
    fn resolve(&self, ast: &Ast, reference: &Reference, cx: &LinkContext<'_>) -> Resolution {
        let name = reference.text();
        let target = reference.target_type();

        let mut scope = reference.container();
        while let Some(container) = scope {
            if let Some(found) = cx
                .local
                .get(container)
                .iter()
                .find(|d| Self::matches(ast, d, name, target))
            {
                trace!(name, container = %container, "resolved locally");
                return Resolution::Resolved(found.clone());
            }
            scope = ast.node(container).container().map(|c| c.id());
        }

        let global = cx
            .global
            .lookup(name)
            .into_iter()
            .filter(|d| Self::matches(ast, d, name, target))
            .min_by(|a, b| a.uri.cmp(&b.uri));
        match global {
            Some(found) => {
                trace!(name, uri = %found.uri, "resolved globally");
                Resolution::Resolved(found)
            }
            None => Resolution::Unresolved {
                message: format!(
                    "Could not resolve reference to {} named '{}'.",
                    ast.types().name(target),
                    name
                ),
            },
        }
    }
}
