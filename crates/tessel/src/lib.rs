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

//! # Tessel - Grammar-Driven Language Runtime
//!
//! Tessel turns a grammar into a pipeline that parses documents into an AST
//! with a parallel CST, resolves cross-references through scopes, and runs
//! type-dispatched validation checks.
//!
//! ## Quick Start
//!
//! ```rust
//! use tessel::domainmodel::domainmodel;
//! use tessel::{CancellationToken, DocumentUri, ValidationOptions};
//!
//! let services = domainmodel().expect("grammar is valid");
//! let uri = DocumentUri::from("file:///shop.dmodel");
//! let analysis = services
//!     .analyze(
//!         &uri,
//!         "class A {} class B extends A {}",
//!         None,
//!         &ValidationOptions::default(),
//!         &CancellationToken::new(),
//!     )
//!     .expect("not cancelled");
//!
//! assert!(analysis.diagnostics.is_empty());
//! let root = analysis.parsed.ast.node(analysis.parsed.ast.root());
//! let b = root.children("elements")[1];
//! assert!(b.reference("superClass").unwrap().is_resolved());
//! ```
//!
//! ## Modules
//!
//! - [`grammar`]: programmatic grammar construction
//! - [`lex`]: token model and the default scanner
//! - [`scope`] and [`linker`]: name resolution
//! - [`checks`]: built-in validation checks
//! - [`domainmodel`]: a reference language built on all of the above

pub mod domainmodel;
mod error_ext;
mod services;

pub use error_ext::TesselResultExt;
pub use services::{Analysis, LanguageServices, LanguageServicesBuilder};

pub use tessel_core::{
    Ast, AstNodeDescription, CancellationToken, Cancelled, DocumentUri, Limits, NodeId, NodeRef,
    ParseResult, Parser, Reference, Resolution, TesselError, TesselErrorKind, TesselResult,
    TextRange,
};
pub use tessel_validate::{
    codes, Diagnostic, DiagnosticInfo, Severity, ValidationAcceptor, ValidationOptions,
    ValidationRegistry,
};

pub mod grammar {
    //! Grammar construction
    pub use tessel_core::grammar::*;
    pub use tessel_core::{PropertyKind, TypeHierarchy, TypeHierarchyBuilder, TypeId};
}

pub mod lex {
    //! Lexical analysis
    pub use tessel_core::lex::*;
}

pub mod scope {
    //! Scope computation
    pub use tessel_core::scope::*;
}

pub mod linker {
    //! Cross-reference linking
    pub use tessel_core::linker::*;
}

pub mod checks {
    //! Built-in validation checks
    pub use tessel_validate::checks::*;
}
