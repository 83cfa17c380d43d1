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

//! The domain model language.
//!
//! ```text
//! datatype String
//!
//! package shop {
//!     class Item {
//!         name: String
//!         price: Int = 10 * 2
//!     }
//!     class Book extends Item {
//!         many authors: String
//!     }
//! }
//! ```
//!
//! Files use the `.dmodel` extension.

mod checks;
mod grammar;
mod scope;

pub use checks::evaluate;
pub use grammar::{grammar, types};
pub use scope::{qualify, DomainModelScopeComputation};

use crate::error_ext::TesselResultExt;
use crate::services::LanguageServices;
use std::sync::Arc;
use tessel_core::lex::SimpleLexer;
use tessel_core::TesselResult;
use tessel_validate::ValidationRegistry;

pub const LANGUAGE_ID: &str = "domainmodel";
pub const FILE_EXTENSION: &str = "dmodel";

/// Assembles the services of the domain model language.
pub fn domainmodel() -> TesselResult<LanguageServices> {
    let grammar = Arc::new(grammar().context("in the domain model grammar")?);
    let lexer = Arc::new(SimpleLexer::new(grammar.keywords().iter().cloned()));
    let mut registry = ValidationRegistry::new(grammar.types().clone());
    checks::register(&mut registry)?;
    LanguageServices::builder(grammar, lexer)
        .language_id(LANGUAGE_ID)
        .file_extension(FILE_EXTENSION)
        .scope_computation(Arc::new(DomainModelScopeComputation::default()))
        .validation(registry)
        .build()
}
