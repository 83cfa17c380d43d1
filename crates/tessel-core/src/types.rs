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

//! Static AST type hierarchy.
//!
//! Every AST node carries a [`TypeId`] into a [`TypeHierarchy`] that is
//! built once per language. The hierarchy answers subtype questions for the
//! linker and the validation registry, and lists each type's properties so
//! the parser can apply mandatory defaults (empty arrays, `false` booleans).
//!
//! # Examples
//!
//! ```
//! use tessel_core::{PropertyKind, TypeHierarchyBuilder};
//!
//! let types = TypeHierarchyBuilder::new()
//!     .with_type("Type", &[], &[("name", PropertyKind::Value)])
//!     .with_type("Class", &["Type"], &[("members", PropertyKind::Array)])
//!     .build()
//!     .unwrap();
//!
//! let ty = types.id("Type").unwrap();
//! let class = types.id("Class").unwrap();
//! assert!(types.is_subtype(class, ty));
//! assert!(!types.is_subtype(ty, class));
//! assert_eq!(types.all_properties(class).len(), 2);
//! ```

use crate::error::{TesselError, TesselResult};
use std::collections::HashMap;
use std::fmt;

/// Index of a type in its [`TypeHierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a property is shaped, used for mandatory defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// A `+=` feature. Defaults to an empty array.
    Array,
    /// A `?=` feature. Defaults to `false`.
    Bool,
    /// Anything else. Left unset when absent.
    Value,
}

#[derive(Debug, Clone)]
struct TypeInfo {
    name: String,
    supertypes: Vec<TypeId>,
    properties: Vec<(String, PropertyKind)>,
}

/// An immutable, fully resolved type table.
#[derive(Debug, Clone)]
pub struct TypeHierarchy {
    types: Vec<TypeInfo>,
    by_name: HashMap<String, TypeId>,
    /// Transitive subtypes of each type, self included, sorted by id.
    subtypes: Vec<Vec<TypeId>>,
    /// Own and inherited properties, own first.
    all_properties: Vec<Vec<(String, PropertyKind)>>,
}

impl TypeHierarchy {
    pub fn id(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Name of a type. Unknown ids print as `"<unknown>"`.
    pub fn name(&self, id: TypeId) -> &str {
        self.types
            .get(id.index())
            .map(|info| info.name.as_str())
            .unwrap_or("<unknown>")
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len() as u32).map(TypeId)
    }

    /// Direct supertypes in declaration order.
    pub fn supertypes(&self, id: TypeId) -> &[TypeId] {
        self.types
            .get(id.index())
            .map(|info| info.supertypes.as_slice())
            .unwrap_or(&[])
    }

    /// `true` if `sub` equals `sup` or inherits from it, directly or not.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        self.subtypes
            .get(sup.index())
            .is_some_and(|subs| subs.binary_search(&sub).is_ok())
    }

    /// Every type that is a subtype of `id`, `id` included.
    pub fn subtypes_of(&self, id: TypeId) -> &[TypeId] {
        self.subtypes
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared and inherited properties of a type.
    pub fn all_properties(&self, id: TypeId) -> &[(String, PropertyKind)] {
        self.all_properties
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn property_kind(&self, id: TypeId, property: &str) -> Option<PropertyKind> {
        self.all_properties(id)
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, kind)| *kind)
    }
}

/// Builder for a [`TypeHierarchy`].
///
/// Supertypes are named and resolved in [`build`](Self::build), so types
/// may be declared in any order.
#[derive(Debug, Default)]
pub struct TypeHierarchyBuilder {
    types: Vec<(String, Vec<String>, Vec<(String, PropertyKind)>)>,
}

impl TypeHierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a type with its direct supertypes and own properties.
    pub fn with_type(
        mut self,
        name: &str,
        supertypes: &[&str],
        properties: &[(&str, PropertyKind)],
    ) -> Self {
        self.add_type(name, supertypes, properties);
        self
    }

    pub fn add_type(
        &mut self,
        name: &str,
        supertypes: &[&str],
        properties: &[(&str, PropertyKind)],
    ) -> &mut Self {
        self.types.push((
            name.to_string(),
            supertypes.iter().map(|s| s.to_string()).collect(),
            properties
                .iter()
                .map(|(p, kind)| (p.to_string(), *kind))
                .collect(),
        ));
        self
    }

    /// Resolves names, rejects unknown supertypes and inheritance cycles.
    pub fn build(self) -> TesselResult<TypeHierarchy> {
        let mut by_name = HashMap::with_capacity(self.types.len());
        for (index, (name, _, _)) in self.types.iter().enumerate() {
            if by_name.insert(name.clone(), TypeId(index as u32)).is_some() {
                return Err(TesselError::type_error(format!(
                    "type '{}' is declared twice",
                    name
                )));
            }
        }

        let mut types = Vec::with_capacity(self.types.len());
        for (name, supers, properties) in self.types {
            let mut supertypes = Vec::with_capacity(supers.len());
            for sup in &supers {
                let id = by_name.get(sup).copied().ok_or_else(|| {
                    TesselError::type_error(format!("unknown supertype '{}'", sup))
                        .with_context(format!("in type {}", name))
                })?;
                supertypes.push(id);
            }
            types.push(TypeInfo {
                name,
                supertypes,
                properties,
            });
        }

        let order = topological_order(&types)?;

        let mut subtypes: Vec<Vec<TypeId>> = vec![Vec::new(); types.len()];
        let mut all_properties: Vec<Vec<(String, PropertyKind)>> = vec![Vec::new(); types.len()];
        // Supertypes come before subtypes in `order`.
        for &id in &order {
            let info = &types[id.index()];
            let mut props = info.properties.clone();
            for sup in &info.supertypes {
                for (name, kind) in &all_properties[sup.index()] {
                    if !props.iter().any(|(p, _)| p == name) {
                        props.push((name.clone(), *kind));
                    }
                }
            }
            all_properties[id.index()] = props;
        }
        for id in (0..types.len() as u32).map(TypeId) {
            let mut stack = vec![id];
            while let Some(current) = stack.pop() {
                let entry = &mut subtypes[current.index()];
                if !entry.contains(&id) {
                    entry.push(id);
                    stack.extend(types[current.index()].supertypes.iter().copied());
                }
            }
        }
        for subs in &mut subtypes {
            subs.sort_unstable();
        }

        Ok(TypeHierarchy {
            types,
            by_name,
            subtypes,
            all_properties,
        })
    }
}

/// Orders types so that every supertype precedes its subtypes.
fn topological_order(types: &[TypeInfo]) -> TesselResult<Vec<TypeId>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; types.len()];
    let mut order = Vec::with_capacity(types.len());
    for root in 0..types.len() {
        if marks[root] != Mark::New {
            continue;
        }
        // (type, next supertype to visit)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::Active;
        while let Some(top) = stack.last_mut() {
            let (current, next) = *top;
            let supers = &types[current].supertypes;
            if next < supers.len() {
                top.1 += 1;
                let sup = supers[next].index();
                match marks[sup] {
                    Mark::New => {
                        marks[sup] = Mark::Active;
                        stack.push((sup, 0));
                    }
                    Mark::Active => {
                        return Err(TesselError::type_error(format!(
                            "inheritance cycle through type '{}'",
                            types[sup].name
                        )));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[current] = Mark::Done;
                order.push(TypeId(current as u32));
                stack.pop();
            }
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TypeHierarchy {
        TypeHierarchyBuilder::new()
            .with_type("Element", &[], &[("name", PropertyKind::Value)])
            .with_type("Type", &["Element"], &[])
            .with_type(
                "Class",
                &["Type"],
                &[
                    ("abstract", PropertyKind::Bool),
                    ("members", PropertyKind::Array),
                ],
            )
            .with_type("DataType", &["Type"], &[])
            .with_type("Package", &["Element"], &[("elements", PropertyKind::Array)])
            .build()
            .unwrap()
    }

    #[test]
    fn test_subtype_is_transitive_and_reflexive() {
        let types = sample();
        let element = types.id("Element").unwrap();
        let class = types.id("Class").unwrap();
        let package = types.id("Package").unwrap();
        assert!(types.is_subtype(class, element));
        assert!(types.is_subtype(class, class));
        assert!(!types.is_subtype(package, class));
    }

    #[test]
    fn test_subtypes_of() {
        let types = sample();
        let ty = types.id("Type").unwrap();
        let names: Vec<_> = types.subtypes_of(ty).iter().map(|&t| types.name(t)).collect();
        assert_eq!(names, vec!["Type", "Class", "DataType"]);
    }

    #[test]
    fn test_inherited_properties() {
        let types = sample();
        let class = types.id("Class").unwrap();
        let names: Vec<_> = types
            .all_properties(class)
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["abstract", "members", "name"]);
        assert_eq!(types.property_kind(class, "members"), Some(PropertyKind::Array));
        assert_eq!(types.property_kind(class, "missing"), None);
    }

    #[test]
    fn test_declaration_order_is_free() {
        let types = TypeHierarchyBuilder::new()
            .with_type("Sub", &["Base"], &[])
            .with_type("Base", &[], &[("flag", PropertyKind::Bool)])
            .build()
            .unwrap();
        let sub = types.id("Sub").unwrap();
        assert_eq!(types.property_kind(sub, "flag"), Some(PropertyKind::Bool));
    }

    #[test]
    fn test_unknown_supertype_rejected() {
        let err = TypeHierarchyBuilder::new()
            .with_type("A", &["Missing"], &[])
            .build()
            .unwrap_err();
        assert!(err.message.contains("Missing"));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = TypeHierarchyBuilder::new()
            .with_type("A", &["B"], &[])
            .with_type("B", &["A"], &[])
            .build()
            .unwrap_err();
        assert!(err.message.contains("cycle"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = TypeHierarchyBuilder::new()
            .with_type("A", &[], &[])
            .with_type("A", &[], &[])
            .build()
            .unwrap_err();
        assert!(err.message.contains("twice"));
    }
}
