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

//! Tessel Validation
//!
//! Type-dispatched validation for parsed documents.
//!
//! ## Registering checks
//!
//! ```rust
//! use std::sync::Arc;
//! use tessel_core::{PropertyKind, TypeHierarchyBuilder};
//! use tessel_validate::{DiagnosticInfo, ValidationRegistry};
//!
//! let types = Arc::new(
//!     TypeHierarchyBuilder::new()
//!         .with_type("Type", &[], &[("name", PropertyKind::Value)])
//!         .with_type("Entity", &["Type"], &[])
//!         .build()
//!         .unwrap(),
//! );
//! let mut registry = ValidationRegistry::new(types);
//! registry
//!     .register_fn("Type", "capitalized-name", |node, acceptor| {
//!         if let Some(name) = node.string("name") {
//!             if !name.starts_with(char::is_uppercase) {
//!                 acceptor.warning(
//!                     "Type names should start with a capital.",
//!                     DiagnosticInfo::new(node).on_property("name"),
//!                 );
//!             }
//!         }
//!     })
//!     .unwrap();
//!
//! // `Entity` nodes get the check too.
//! let entity = registry.types().id("Entity").unwrap();
//! assert_eq!(registry.checks_for(entity).len(), 1);
//! ```
//!
//! ## Running
//!
//! [`ValidationRunner::validate`] turns lexer and parser errors into
//! diagnostics, then runs the checks registered for each node's type.

mod acceptor;
pub mod checks;
mod diagnostic;
mod registry;
mod runner;

pub use acceptor::{DiagnosticInfo, ValidationAcceptor};
pub use diagnostic::{codes, Diagnostic, DiagnosticTag, RelatedInformation, Severity};
pub use registry::{CheckCategory, FnCheck, ValidationCheck, ValidationRegistry};
pub use runner::{CheckConfig, ValidationOptions, ValidationRunner, MAX_DIAGNOSTICS};
