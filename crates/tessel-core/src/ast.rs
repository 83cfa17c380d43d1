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

//! Abstract syntax tree arena.
//!
//! An [`Ast`] owns every node, reference and CST node of one document.
//! Nodes are addressed by [`NodeId`]; parents own their children through
//! [`Value::Node`] properties and children point back through their
//! container id, which is the only non-owning edge.
//!
//! Read access goes through [`NodeRef`], a copyable handle that pairs a
//! node id with its arena.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tessel_core::grammar::*;
//! use tessel_core::lex::SimpleLexer;
//! use tessel_core::{Parser, PropertyKind, TokenKind, TokenSource, TypeHierarchyBuilder};
//!
//! let types = Arc::new(
//!     TypeHierarchyBuilder::new()
//!         .with_type("Model", &[], &[("names", PropertyKind::Array)])
//!         .build()
//!         .unwrap(),
//! );
//! let mut g = GrammarBuilder::new("Names", types);
//! let model = g.declare_parser("Model", Some("Model")).unwrap();
//! let id = g.declare_terminal("ID", TokenKind::Identifier, ValueKind::Id);
//! g.define(model, many(append("names", rule(id))));
//! let grammar = Arc::new(g.build(model).unwrap());
//!
//! let parser = Parser::new(grammar.clone()).unwrap();
//! let lexer = SimpleLexer::new(grammar.keywords().iter().cloned());
//! let result = parser.parse(lexer.tokenize("a b c"));
//!
//! let root = result.ast.node(result.ast.root());
//! assert_eq!(root.type_name(), "Model");
//! assert_eq!(root.strings("names"), vec!["a", "b", "c"]);
//! ```

use crate::cst::{Cst, CstId};
use crate::grammar::RuleId;
use crate::lex::TextRange;
use crate::reference::{RefId, Reference};
use crate::types::{TypeHierarchy, TypeId};
use crate::value::{Properties, Value};
use std::fmt;
use std::sync::Arc;

/// Index of a node in its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Storage of a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub(crate) ty: TypeId,
    pub(crate) container: Option<NodeId>,
    pub(crate) container_property: Option<String>,
    pub(crate) container_index: Option<usize>,
    pub(crate) cst: Option<CstId>,
    pub(crate) properties: Properties,
}

impl AstNode {
    pub(crate) fn new(ty: TypeId, properties: Properties) -> Self {
        Self {
            ty,
            container: None,
            container_property: None,
            container_index: None,
            cst: None,
            properties,
        }
    }
}

/// The AST of one document together with its CST and references.
#[derive(Debug, Clone)]
pub struct Ast {
    types: Arc<TypeHierarchy>,
    nodes: Vec<AstNode>,
    references: Vec<Reference>,
    cst: Cst,
    root: NodeId,
}

impl Ast {
    pub(crate) fn new(types: Arc<TypeHierarchy>, entry: RuleId) -> Self {
        Self {
            types,
            nodes: Vec::new(),
            references: Vec::new(),
            cst: Cst::new(entry),
            root: NodeId(0),
        }
    }

    pub fn types(&self) -> &Arc<TypeHierarchy> {
        &self.types
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn cst(&self) -> &Cst {
        &self.cst
    }

    /// Handle to a node. Panics on an id from another arena.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        debug_assert!(id.index() < self.nodes.len());
        NodeRef { ast: self, id }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.index() < self.nodes.len()).then_some(NodeRef { ast: self, id })
    }

    pub fn reference(&self, id: RefId) -> &Reference {
        &self.references[id.index()]
    }

    /// All references that belong to a live node, in creation order.
    pub fn references(&self) -> impl Iterator<Item = (RefId, &Reference)> {
        self.references
            .iter()
            .enumerate()
            .filter(|(_, r)| r.container.is_some())
            .map(|(i, r)| (RefId(i as u32), r))
    }

    /// Clears every stored resolution.
    ///
    /// This is the only way a linked reference goes back to unlinked.
    pub fn unlink_all(&mut self) {
        for reference in &mut self.references {
            reference.reset();
        }
    }

    /// Walks containers up to the topmost ancestor.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.nodes[current.index()].container {
            current = parent;
        }
        current
    }

    /// `true` if `id`'s type is `ty` or one of its subtypes.
    pub fn is_instance(&self, id: NodeId, ty: TypeId) -> bool {
        self.types.is_subtype(self.nodes[id.index()].ty, ty)
    }

    /// Innermost node whose text covers `offset`.
    pub fn node_at_offset(&self, offset: usize) -> Option<NodeId> {
        let leaf = self.cst.leaf_at(offset)?;
        self.cst.owning_ast_node(leaf)
    }

    /// Reference whose text covers `offset`.
    pub fn reference_at(&self, offset: usize) -> Option<RefId> {
        self.references().find_map(|(id, r)| {
            let cst = r.cst?;
            self.cst.node(cst).range.contains(offset).then_some(id)
        })
    }

    // Mutation used while parsing.

    pub(crate) fn alloc(&mut self, node: AstNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn raw(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn raw_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn push_reference(&mut self, reference: Reference) -> RefId {
        let id = RefId(self.references.len() as u32);
        self.references.push(reference);
        id
    }

    pub(crate) fn reference_mut(&mut self, id: RefId) -> &mut Reference {
        &mut self.references[id.index()]
    }

    pub(crate) fn cst_mut(&mut self) -> &mut Cst {
        &mut self.cst
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }
}

/// A borrowed view of one AST node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    ast: &'a Ast,
    id: NodeId,
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("type", &self.type_name())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.ast, other.ast) && self.id == other.id
    }
}

impl<'a> NodeRef<'a> {
    fn raw(&self) -> &'a AstNode {
        &self.ast.nodes[self.id.index()]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn ast(&self) -> &'a Ast {
        self.ast
    }

    pub fn ty(&self) -> TypeId {
        self.raw().ty
    }

    pub fn type_name(&self) -> &'a str {
        self.ast.types.name(self.raw().ty)
    }

    /// `true` if the node's type is `type_name` or a subtype of it.
    pub fn is_a(&self, type_name: &str) -> bool {
        self.ast
            .types
            .id(type_name)
            .is_some_and(|ty| self.ast.types.is_subtype(self.raw().ty, ty))
    }

    pub fn container(&self) -> Option<NodeRef<'a>> {
        self.raw().container.map(|id| self.ast.node(id))
    }

    pub fn container_property(&self) -> Option<&'a str> {
        self.raw().container_property.as_deref()
    }

    pub fn container_index(&self) -> Option<usize> {
        self.raw().container_index
    }

    pub fn cst(&self) -> Option<CstId> {
        self.raw().cst
    }

    /// Range of the node's visible text.
    pub fn range(&self) -> Option<TextRange> {
        self.cst().map(|c| self.ast.cst.node(c).range)
    }

    /// Source text of the node, hidden tokens included.
    pub fn text(&self) -> String {
        self.cst().map(|c| self.ast.cst.text(c)).unwrap_or_default()
    }

    pub fn properties(&self) -> &'a Properties {
        &self.raw().properties
    }

    pub fn get(&self, property: &str) -> Option<&'a Value> {
        self.raw().properties.get(property)
    }

    pub fn string(&self, property: &str) -> Option<&'a str> {
        self.get(property).and_then(Value::as_str)
    }

    /// String items of an array property.
    pub fn strings(&self, property: &str) -> Vec<&'a str> {
        self.get(property)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn number(&self, property: &str) -> Option<f64> {
        self.get(property).and_then(Value::as_number)
    }

    /// Boolean property; unset reads as `false`.
    pub fn bool(&self, property: &str) -> bool {
        self.get(property).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn child(&self, property: &str) -> Option<NodeRef<'a>> {
        self.get(property)
            .and_then(Value::as_node)
            .map(|id| self.ast.node(id))
    }

    /// Nodes of an array property, in order.
    pub fn children(&self, property: &str) -> Vec<NodeRef<'a>> {
        match self.get(property) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_node)
                .map(|id| self.ast.node(id))
                .collect(),
            Some(Value::Node(id)) => vec![self.ast.node(*id)],
            _ => Vec::new(),
        }
    }

    /// Every directly contained node, in property order.
    pub fn contents(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        for (_, value) in self.raw().properties.iter() {
            match value {
                Value::Node(id) => out.push(self.ast.node(*id)),
                Value::Array(items) => {
                    out.extend(items.iter().filter_map(Value::as_node).map(|id| self.ast.node(id)))
                }
                _ => {}
            }
        }
        out
    }

    pub fn reference(&self, property: &str) -> Option<&'a Reference> {
        self.get(property)
            .and_then(Value::as_reference)
            .map(|id| self.ast.reference(id))
    }

    /// References held directly by this node, in property order.
    pub fn references(&self) -> Vec<(RefId, &'a Reference)> {
        let mut out = Vec::new();
        for (_, value) in self.raw().properties.iter() {
            match value {
                Value::Reference(id) => out.push((*id, self.ast.reference(*id))),
                Value::Array(items) => out.extend(
                    items
                        .iter()
                        .filter_map(Value::as_reference)
                        .map(|id| (id, self.ast.reference(id))),
                ),
                _ => {}
            }
        }
        out
    }

    /// CST node assigned to `property` (the `index`-th one for arrays).
    pub fn find_property(&self, property: &str, index: Option<usize>) -> Option<CstId> {
        let cst = self.cst()?;
        self.ast
            .cst
            .find_for_feature(cst, property)
            .into_iter()
            .nth(index.unwrap_or(0))
    }

    pub fn property_range(&self, property: &str, index: Option<usize>) -> Option<TextRange> {
        self.find_property(property, index)
            .map(|c| self.ast.cst.node(c).range)
    }
}
