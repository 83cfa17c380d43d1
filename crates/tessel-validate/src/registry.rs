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

//! Validation checks and their registry.
//!
//! A check is registered for a type name. Registration expands the type into
//! all of its statically known subtypes, so dispatch at run time is a single
//! lookup by the node's exact type.

use crate::acceptor::ValidationAcceptor;
use std::fmt;
use std::sync::Arc;
use tessel_core::{NodeRef, TesselError, TesselResult, TypeHierarchy, TypeId};
use tracing::debug;

/// When a check is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckCategory {
    /// Runs on every build.
    Fast,
    /// Runs only when requested, e.g. on save.
    Slow,
}

/// A validation check for nodes of one type (and its subtypes).
pub trait ValidationCheck: Send + Sync {
    /// Check identifier
    fn id(&self) -> &str;

    /// Check description
    fn description(&self) -> &str {
        ""
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Fast
    }

    /// Inspect one node and report problems through `acceptor`.
    fn check(&self, node: NodeRef<'_>, acceptor: &mut ValidationAcceptor);
}

/// Adapter turning a closure into a [`ValidationCheck`].
pub struct FnCheck<F> {
    id: String,
    category: CheckCategory,
    check: F,
}

impl<F> FnCheck<F>
where
    F: Fn(NodeRef<'_>, &mut ValidationAcceptor) + Send + Sync,
{
    pub fn new(id: impl Into<String>, check: F) -> Self {
        Self {
            id: id.into(),
            category: CheckCategory::Fast,
            check,
        }
    }

    pub fn slow(mut self) -> Self {
        self.category = CheckCategory::Slow;
        self
    }
}

impl<F> ValidationCheck for FnCheck<F>
where
    F: Fn(NodeRef<'_>, &mut ValidationAcceptor) + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> CheckCategory {
        self.category
    }

    fn check(&self, node: NodeRef<'_>, acceptor: &mut ValidationAcceptor) {
        (self.check)(node, acceptor)
    }
}

/// Type → ordered checks, expanded over subtypes.
pub struct ValidationRegistry {
    types: Arc<TypeHierarchy>,
    checks: Vec<Vec<Arc<dyn ValidationCheck>>>,
}

impl fmt::Debug for ValidationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRegistry")
            .field("types", &self.types.len())
            .field("checks", &self.len())
            .finish()
    }
}

impl ValidationRegistry {
    pub fn new(types: Arc<TypeHierarchy>) -> Self {
        let checks = vec![Vec::new(); types.len()];
        Self { types, checks }
    }

    pub fn types(&self) -> &Arc<TypeHierarchy> {
        &self.types
    }

    /// Registers `check` for `type_name` and every subtype of it.
    pub fn register(&mut self, type_name: &str, check: Arc<dyn ValidationCheck>) -> TesselResult<&mut Self> {
        let ty = self
            .types
            .id(type_name)
            .ok_or_else(|| TesselError::type_error(format!("unknown type '{}'", type_name)))?;
        let subtypes = self.types.subtypes_of(ty);
        debug!(
            check = check.id(),
            type_name,
            subtypes = subtypes.len(),
            "registered validation check"
        );
        for subtype in subtypes {
            self.checks[subtype.index()].push(check.clone());
        }
        Ok(self)
    }

    /// Registers a closure as a fast check.
    pub fn register_fn<F>(&mut self, type_name: &str, id: &str, check: F) -> TesselResult<&mut Self>
    where
        F: Fn(NodeRef<'_>, &mut ValidationAcceptor) + Send + Sync + 'static,
    {
        self.register(type_name, Arc::new(FnCheck::new(id, check)))
    }

    /// Registers `check` for every type.
    pub fn register_for_all(&mut self, check: Arc<dyn ValidationCheck>) -> &mut Self {
        for checks in &mut self.checks {
            checks.push(check.clone());
        }
        self
    }

    /// Checks to run on a node of exactly type `ty`.
    pub fn checks_for(&self, ty: TypeId) -> &[Arc<dyn ValidationCheck>] {
        self.checks.get(ty.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of (type, check) entries.
    pub fn len(&self) -> usize {
        self.checks.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_core::{PropertyKind, TypeHierarchyBuilder};

    fn types() -> Arc<TypeHierarchy> {
        Arc::new(
            TypeHierarchyBuilder::new()
                .with_type("Element", &[], &[("name", PropertyKind::Value)])
                .with_type("Type", &["Element"], &[])
                .with_type("Entity", &["Type"], &[])
                .with_type("DataType", &["Type"], &[])
                .with_type("Package", &["Element"], &[])
                .build()
                .unwrap(),
        )
    }

    fn ids(registry: &ValidationRegistry, name: &str) -> Vec<String> {
        let ty = registry.types().id(name).unwrap();
        registry
            .checks_for(ty)
            .iter()
            .map(|c| c.id().to_string())
            .collect()
    }

    #[test]
    fn test_register_expands_to_subtypes() {
        let mut registry = ValidationRegistry::new(types());
        registry.register_fn("Type", "type-check", |_, _| {}).unwrap();
        assert_eq!(ids(&registry, "Type"), vec!["type-check"]);
        assert_eq!(ids(&registry, "Entity"), vec!["type-check"]);
        assert_eq!(ids(&registry, "DataType"), vec!["type-check"]);
        assert!(ids(&registry, "Element").is_empty());
        assert!(ids(&registry, "Package").is_empty());
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut registry = ValidationRegistry::new(types());
        registry
            .register_fn("Entity", "first", |_, _| {})
            .unwrap()
            .register_fn("Element", "second", |_, _| {})
            .unwrap()
            .register_fn("Entity", "third", |_, _| {})
            .unwrap();
        assert_eq!(ids(&registry, "Entity"), vec!["first", "second", "third"]);
        assert_eq!(ids(&registry, "Package"), vec!["second"]);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut registry = ValidationRegistry::new(types());
        let err = registry.register_fn("Nope", "x", |_, _| {}).unwrap_err();
        assert!(err.message.contains("Nope"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_for_all() {
        let mut registry = ValidationRegistry::new(types());
        registry.register_for_all(Arc::new(FnCheck::new("everywhere", |_, _| {}).slow()));
        assert_eq!(registry.len(), 5);
        let ty = registry.types().id("Package").unwrap();
        assert_eq!(registry.checks_for(ty)[0].category(), CheckCategory::Slow);
    }
}
