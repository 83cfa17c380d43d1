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

//! Concrete syntax tree.
//!
//! The CST is built in lock-step with the AST. Leaves hold every token of
//! the input, hidden whitespace and comments included, so concatenating the
//! leaf images of an error-free parse reproduces the source text. Composite
//! nodes group the leaves of one rule invocation and may point at the AST
//! node built from them.
//!
//! Nodes that were produced by an assignment remember the assigned feature;
//! that is how diagnostics find the text of a property.

use crate::ast::NodeId;
use crate::grammar::RuleId;
use crate::lex::{TextRange, Token, TokenKind};

/// Index of a node in its [`Cst`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CstId(u32);

impl CstId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CstKind {
    Leaf {
        token: TokenKind,
        image: String,
        hidden: bool,
    },
    Composite {
        rule: Option<RuleId>,
        children: Vec<CstId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstNode {
    pub kind: CstKind,
    pub parent: Option<CstId>,
    /// Source range. For composites this spans the visible leaves only.
    pub range: TextRange,
    /// AST node built from this composite.
    pub ast: Option<NodeId>,
    /// Feature this node was assigned to, if any.
    pub feature: Option<String>,
}

impl CstNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, CstKind::Leaf { .. })
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.kind, CstKind::Leaf { hidden: true, .. })
    }

    pub fn children(&self) -> &[CstId] {
        match &self.kind {
            CstKind::Composite { children, .. } => children,
            CstKind::Leaf { .. } => &[],
        }
    }

    pub fn image(&self) -> Option<&str> {
        match &self.kind {
            CstKind::Leaf { image, .. } => Some(image),
            CstKind::Composite { .. } => None,
        }
    }

    pub fn rule(&self) -> Option<RuleId> {
        match &self.kind {
            CstKind::Composite { rule, .. } => *rule,
            CstKind::Leaf { .. } => None,
        }
    }
}

/// Arena of CST nodes. The root composite owns everything.
#[derive(Debug, Clone)]
pub struct Cst {
    nodes: Vec<CstNode>,
    root: CstId,
}

impl Cst {
    pub(crate) fn new(entry: RuleId) -> Self {
        Self {
            nodes: vec![CstNode {
                kind: CstKind::Composite {
                    rule: Some(entry),
                    children: Vec::new(),
                },
                parent: None,
                range: TextRange::default(),
                ast: None,
                feature: None,
            }],
            root: CstId(0),
        }
    }

    pub fn root(&self) -> CstId {
        self.root
    }

    pub fn node(&self, id: CstId) -> &CstNode {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: CstId) -> &mut CstNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_child(&mut self, parent: CstId, node: CstNode) -> CstId {
        let id = CstId(self.nodes.len() as u32);
        self.nodes.push(node);
        if let CstKind::Composite { children, .. } = &mut self.nodes[parent.index()].kind {
            children.push(id);
        }
        id
    }

    pub(crate) fn add_leaf(&mut self, parent: CstId, token: &Token, feature: Option<&str>) -> CstId {
        self.push_child(
            parent,
            CstNode {
                kind: CstKind::Leaf {
                    token: token.kind,
                    image: token.image.clone(),
                    hidden: token.kind.is_hidden(),
                },
                parent: Some(parent),
                range: token.range(),
                ast: None,
                feature: feature.map(str::to_string),
            },
        )
    }

    /// Opens a composite. `offset` is where it starts if it stays empty.
    pub(crate) fn add_composite(
        &mut self,
        parent: CstId,
        rule: Option<RuleId>,
        feature: Option<&str>,
        offset: usize,
    ) -> CstId {
        self.push_child(
            parent,
            CstNode {
                kind: CstKind::Composite {
                    rule,
                    children: Vec::new(),
                },
                parent: Some(parent),
                range: TextRange::empty(offset),
                ast: None,
                feature: feature.map(str::to_string),
            },
        )
    }

    /// Moves every child of `parent` into a fresh composite that becomes
    /// `parent`'s only child. Returns `None` when `parent` has no children.
    pub(crate) fn wrap_children(&mut self, parent: CstId, feature: Option<&str>) -> Option<CstId> {
        let (rule, children) = match &mut self.nodes[parent.index()].kind {
            CstKind::Composite { rule, children } if !children.is_empty() => {
                (*rule, std::mem::take(children))
            }
            _ => return None,
        };
        let id = CstId(self.nodes.len() as u32);
        for child in &children {
            self.nodes[child.index()].parent = Some(id);
        }
        let offset = self.nodes[children[0].index()].range.start;
        self.nodes.push(CstNode {
            kind: CstKind::Composite { rule, children },
            parent: Some(parent),
            range: TextRange::empty(offset),
            ast: None,
            feature: feature.map(str::to_string),
        });
        if let CstKind::Composite { children, .. } = &mut self.nodes[parent.index()].kind {
            children.push(id);
        }
        self.close(id);
        Some(id)
    }

    /// Finishes a composite: computes its range, or detaches it when it
    /// ended up with no children. Returns `false` for a detached node.
    pub(crate) fn close(&mut self, id: CstId) -> bool {
        let node = &self.nodes[id.index()];
        if node.children().is_empty() && id != self.root {
            if let Some(parent) = node.parent {
                if let CstKind::Composite { children, .. } = &mut self.nodes[parent.index()].kind {
                    children.retain(|c| *c != id);
                }
            }
            self.nodes[id.index()].parent = None;
            return false;
        }
        let mut range: Option<TextRange> = None;
        for &child in node.children() {
            let child = &self.nodes[child.index()];
            if child.is_hidden() || (!child.is_leaf() && child.range.is_empty()) {
                continue;
            }
            range = Some(match range {
                Some(r) => r.cover(child.range),
                None => child.range,
            });
        }
        if let Some(range) = range {
            self.nodes[id.index()].range = range;
        }
        true
    }

    pub(crate) fn set_root_range(&mut self, range: TextRange) {
        let root = self.root;
        self.nodes[root.index()].range = range;
    }

    /// Leaves below `id` in source order.
    pub fn leaves(&self, id: CstId) -> Vec<CstId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.index()];
            if node.is_leaf() {
                out.push(current);
            } else {
                stack.extend(node.children().iter().rev().copied());
            }
        }
        out
    }

    /// Concatenated leaf images below `id`, hidden leaves included.
    pub fn text(&self, id: CstId) -> String {
        self.leaves(id)
            .into_iter()
            .filter_map(|leaf| self.nodes[leaf.index()].image())
            .collect()
    }

    /// The visible leaf whose range contains `offset`.
    pub fn leaf_at(&self, offset: usize) -> Option<CstId> {
        self.leaves(self.root).into_iter().find(|&leaf| {
            let node = &self.nodes[leaf.index()];
            !node.is_hidden() && node.range.start <= offset && offset < node.range.end.max(node.range.start + 1)
        })
    }

    /// Nearest composite at or above `id` that is linked to an AST node.
    pub fn owning_ast_node(&self, id: CstId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current.map(|c| &self.nodes[c.index()]) {
            if node.ast.is_some() {
                return node.ast;
            }
            current = node.parent;
        }
        None
    }

    /// CST nodes below `id` assigned to `feature`, in source order.
    ///
    /// The search stays within the AST node owning `id`: composites linked
    /// to other AST nodes are inspected but not entered.
    pub fn find_for_feature(&self, id: CstId, feature: &str) -> Vec<CstId> {
        let mut out = Vec::new();
        let mut stack: Vec<CstId> = self.nodes[id.index()].children().iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.index()];
            if node.feature.as_deref() == Some(feature) {
                out.push(current);
                continue;
            }
            if node.ast.is_none() {
                stack.extend(node.children().iter().rev().copied());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, image: &str, offset: usize) -> Token {
        Token::new(kind, image, offset)
    }

    #[test]
    fn test_close_computes_visible_range() {
        let rule = RuleId::from_index(0);
        let mut cst = Cst::new(rule);
        let root = cst.root();
        let inner = cst.add_composite(root, Some(rule), None, 0);
        cst.add_leaf(inner, &token(TokenKind::Whitespace, "  ", 0), None);
        cst.add_leaf(inner, &token(TokenKind::Keyword, "class", 2), None);
        cst.add_leaf(inner, &token(TokenKind::Identifier, "A", 8), Some("name"));
        assert!(cst.close(inner));
        assert_eq!(cst.node(inner).range, TextRange::new(2, 9));
        assert_eq!(cst.text(root), "  classA");
    }

    #[test]
    fn test_close_detaches_empty_composite() {
        let rule = RuleId::from_index(0);
        let mut cst = Cst::new(rule);
        let root = cst.root();
        let empty = cst.add_composite(root, Some(rule), None, 0);
        assert!(!cst.close(empty));
        assert!(cst.node(root).children().is_empty());
    }

    #[test]
    fn test_wrap_children() {
        let rule = RuleId::from_index(0);
        let mut cst = Cst::new(rule);
        let root = cst.root();
        let a = cst.add_leaf(root, &token(TokenKind::Number, "1", 0), None);
        let b = cst.add_leaf(root, &token(TokenKind::Keyword, "+", 1), None);
        let wrapper = cst.wrap_children(root, Some("left")).unwrap();
        assert_eq!(cst.node(root).children(), &[wrapper]);
        assert_eq!(cst.node(wrapper).children(), &[a, b]);
        assert_eq!(cst.node(a).parent, Some(wrapper));
        assert_eq!(cst.node(wrapper).range, TextRange::new(0, 2));
        assert_eq!(cst.node(wrapper).feature.as_deref(), Some("left"));
    }

    #[test]
    fn test_wrap_children_of_empty_composite() {
        let rule = RuleId::from_index(0);
        let mut cst = Cst::new(rule);
        let root = cst.root();
        assert!(cst.wrap_children(root, None).is_none());
    }

    #[test]
    fn test_find_for_feature_stops_at_other_nodes() {
        let rule = RuleId::from_index(0);
        let mut cst = Cst::new(rule);
        let root = cst.root();
        let name = cst.add_leaf(root, &token(TokenKind::Identifier, "A", 0), Some("name"));
        let child = cst.add_composite(root, None, Some("members"), 2);
        cst.add_leaf(child, &token(TokenKind::Identifier, "x", 2), Some("name"));
        cst.node_mut(child).ast = Some(NodeId::from_index(1));
        assert_eq!(cst.find_for_feature(root, "name"), vec![name]);
        assert_eq!(cst.find_for_feature(root, "members"), vec![child]);
    }

    #[test]
    fn test_leaf_at() {
        let rule = RuleId::from_index(0);
        let mut cst = Cst::new(rule);
        let root = cst.root();
        cst.add_leaf(root, &token(TokenKind::Keyword, "class", 0), None);
        cst.add_leaf(root, &token(TokenKind::Whitespace, " ", 5), None);
        let a = cst.add_leaf(root, &token(TokenKind::Identifier, "A", 6), None);
        assert_eq!(cst.leaf_at(6), Some(a));
        assert_eq!(cst.leaf_at(5), None);
    }
}
