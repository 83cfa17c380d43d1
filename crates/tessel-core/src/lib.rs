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

//! Core engine of the Tessel language runtime.
//!
//! Given a [`Grammar`](grammar::Grammar) and a [`TokenSource`], this crate
//! turns source text into an AST with an attached CST, computes scopes and
//! links cross-references.
//!
//! # Pipeline
//!
//! - [`lex`]: token model, the [`TokenSource`] seam and a default [`SimpleLexer`](lex::SimpleLexer)
//! - [`grammar`] and [`types`]: the rule graph and the static type hierarchy
//! - [`Parser`]: one pass building [`Ast`] and [`cst::Cst`], with error recovery
//! - [`scope`]: exported and local symbol descriptions
//! - [`linker`]: lazy, memoized reference resolution
//!
//! Everything here is synchronous. The only async piece is
//! [`CancellationToken::cancelled`], used by waiting callers.

pub mod ast;
mod cancel;
pub mod convert;
pub mod cst;
mod error;
pub mod grammar;
pub mod lex;
mod limits;
pub mod linker;
pub mod lookahead;
mod parser;
pub mod reference;
pub mod scope;
pub mod traverse;
pub mod types;
mod uri;
mod value;

pub use ast::{Ast, NodeId, NodeRef};
pub use cancel::CancellationToken;
pub use error::{Cancelled, LexError, ParseError, TesselError, TesselErrorKind, TesselResult};
pub use lex::{TextRange, TokenKind, TokenSource};
pub use limits::Limits;
pub use linker::{DefaultLinker, GlobalScope, LinkContext, Linker};
pub use parser::{ParseResult, Parser};
pub use reference::{RefId, Reference, Resolution};
pub use scope::{AstNodeDescription, DefaultScopeComputation, LocalScopes, NameProvider, ScopeComputation};
pub use types::{PropertyKind, TypeHierarchy, TypeHierarchyBuilder, TypeId};
pub use uri::DocumentUri;
pub use value::{Properties, Value};
