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

//! Scope computation.
//!
//! Scopes are computed from a finished AST before any reference is linked,
//! and never look at references. Two things are produced per document:
//!
//! - **exports**: descriptions other documents may link to,
//! - **local scopes**: for every container, the named nodes directly below it.

use crate::ast::{Ast, NodeId, NodeRef};
use crate::cancel::CancellationToken;
use crate::error::Cancelled;
use crate::lex::TextRange;
use crate::traverse::stream_ast;
use crate::types::TypeId;
use crate::uri::DocumentUri;
use std::collections::HashMap;
use std::sync::Arc;

/// A named, linkable node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNodeDescription {
    pub name: String,
    pub ty: TypeId,
    pub uri: DocumentUri,
    pub node: NodeId,
    /// Range of the name in its document.
    pub name_range: Option<TextRange>,
}

/// Container → descriptions of its named direct children, in order.
#[derive(Debug, Clone, Default)]
pub struct LocalScopes {
    scopes: HashMap<NodeId, Vec<AstNodeDescription>>,
}

impl LocalScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, container: NodeId) -> &[AstNodeDescription] {
        self.scopes.get(&container).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add(&mut self, container: NodeId, description: AstNodeDescription) {
        self.scopes.entry(container).or_default().push(description);
    }

    /// Number of containers with at least one entry.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Supplies the name under which a node is found.
pub trait NameProvider: Send + Sync {
    fn name<'a>(&self, node: NodeRef<'a>) -> Option<&'a str>;

    fn name_range(&self, node: NodeRef<'_>) -> Option<TextRange>;
}

/// Names come from the `name` string property.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNameProvider;

impl NameProvider for DefaultNameProvider {
    fn name<'a>(&self, node: NodeRef<'a>) -> Option<&'a str> {
        node.string("name")
    }

    fn name_range(&self, node: NodeRef<'_>) -> Option<TextRange> {
        node.property_range("name", None).or_else(|| node.range())
    }
}

/// Describes `node` under `name`, or under its own name.
pub fn describe(
    names: &dyn NameProvider,
    node: NodeRef<'_>,
    uri: &DocumentUri,
    name: Option<String>,
) -> Option<AstNodeDescription> {
    let name = name.or_else(|| names.name(node).map(str::to_string))?;
    Some(AstNodeDescription {
        name,
        ty: node.ty(),
        uri: uri.clone(),
        node: node.id(),
        name_range: names.name_range(node),
    })
}

/// Per-language scope computation.
pub trait ScopeComputation: Send + Sync {
    /// Descriptions visible to other documents.
    fn compute_exports(
        &self,
        ast: &Ast,
        uri: &DocumentUri,
        cancel: &CancellationToken,
    ) -> Result<Vec<AstNodeDescription>, Cancelled>;

    /// Local scopes of every container in the document.
    fn compute_local_scopes(
        &self,
        ast: &Ast,
        uri: &DocumentUri,
        cancel: &CancellationToken,
    ) -> Result<LocalScopes, Cancelled>;
}

/// Exports the root's named children and scopes every named node in its
/// container.
#[derive(Clone)]
pub struct DefaultScopeComputation {
    names: Arc<dyn NameProvider>,
}

impl Default for DefaultScopeComputation {
    fn default() -> Self {
        Self::new(Arc::new(DefaultNameProvider))
    }
}

impl DefaultScopeComputation {
    pub fn new(names: Arc<dyn NameProvider>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &Arc<dyn NameProvider> {
        &self.names
    }
}

impl ScopeComputation for DefaultScopeComputation {
    fn compute_exports(
        &self,
        ast: &Ast,
        uri: &DocumentUri,
        cancel: &CancellationToken,
    ) -> Result<Vec<AstNodeDescription>, Cancelled> {
        cancel.check()?;
        Ok(ast
            .node(ast.root())
            .contents()
            .into_iter()
            .filter_map(|child| describe(self.names.as_ref(), child, uri, None))
            .collect())
    }

    fn compute_local_scopes(
        &self,
        ast: &Ast,
        uri: &DocumentUri,
        cancel: &CancellationToken,
    ) -> Result<LocalScopes, Cancelled> {
        let mut scopes = LocalScopes::new();
        for node in stream_ast(ast, ast.root()) {
            cancel.check()?;
            let Some(container) = node.container() else {
                continue;
            };
            if let Some(description) = describe(self.names.as_ref(), node, uri, None) {
                scopes.add(container.id(), description);
            }
        }
        Ok(scopes)
    }
}
