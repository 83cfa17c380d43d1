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

//! Cross-references.
//!
//! A [`Reference`] is created by the parser for every `[Type:Rule]`
//! assignment. It stores the text as written and where it sits in the
//! tree; resolution is deferred to the [linker](crate::linker) and stored
//! exactly once. The stored outcome is only cleared through
//! [`Ast::unlink_all`](crate::Ast::unlink_all), which needs exclusive access
//! to the tree.

use crate::ast::NodeId;
use crate::cst::CstId;
use crate::scope::AstNodeDescription;
use crate::types::TypeId;
use std::sync::OnceLock;

/// Index of a reference in its [`Ast`](crate::Ast).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefId(pub(crate) u32);

impl RefId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Outcome of linking a reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(AstNodeDescription),
    Unresolved { message: String },
}

impl Resolution {
    pub fn target(&self) -> Option<&AstNodeDescription> {
        match self {
            Self::Resolved(desc) => Some(desc),
            Self::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// A textual cross-reference with a resolve-once cell.
#[derive(Debug, Clone)]
pub struct Reference {
    pub(crate) text: String,
    pub(crate) container: Option<NodeId>,
    pub(crate) property: String,
    pub(crate) index: Option<usize>,
    pub(crate) target_type: TypeId,
    pub(crate) cst: Option<CstId>,
    pub(crate) resolved: OnceLock<Resolution>,
}

impl Reference {
    pub(crate) fn new(text: String, property: &str, target_type: TypeId, cst: Option<CstId>) -> Self {
        Self {
            text,
            container: None,
            property: property.to_string(),
            index: None,
            target_type,
            cst,
            resolved: OnceLock::new(),
        }
    }

    /// The name as written in the source.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The node holding the reference. `None` only for references whose
    /// owner was discarded during error recovery.
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// The declared target type; candidates must be subtypes of it.
    pub fn target_type(&self) -> TypeId {
        self.target_type
    }

    /// CST node covering the reference text.
    pub fn cst(&self) -> Option<CstId> {
        self.cst
    }

    /// The stored outcome, if linking already happened.
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolved.get()
    }

    pub fn is_linked(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// `true` once linked to a target.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some_and(Resolution::is_resolved)
    }

    /// Shortcut for the resolved target, if any.
    pub fn target(&self) -> Option<&AstNodeDescription> {
        self.resolved.get().and_then(Resolution::target)
    }

    /// Stores the outcome of `resolve` unless one is already present.
    pub fn resolve_with(&self, resolve: impl FnOnce() -> Resolution) -> &Resolution {
        self.resolved.get_or_init(resolve)
    }

    pub(crate) fn reset(&mut self) {
        self.resolved.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_once() {
        let reference = Reference::new("A".to_string(), "superType", TypeId::from_index(0), None);
        assert!(!reference.is_linked());
        let first = reference
            .resolve_with(|| Resolution::Unresolved {
                message: "first".to_string(),
            })
            .clone();
        let second = reference.resolve_with(|| Resolution::Unresolved {
            message: "second".to_string(),
        });
        assert_eq!(&first, second);
        assert!(reference.target().is_none());
    }

    #[test]
    fn test_reset_clears_resolution() {
        let mut reference = Reference::new("A".to_string(), "type", TypeId::from_index(0), None);
        reference.resolve_with(|| Resolution::Unresolved {
            message: "x".to_string(),
        });
        reference.reset();
        assert!(reference.resolution().is_none());
    }
}
