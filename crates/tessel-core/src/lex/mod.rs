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

//! Lexical layer for Tessel.
//!
//! # Module Structure
//!
//! - [`span`] - Byte ranges and offset/line conversion
//! - [`tokens`] - The token model and the [`TokenSource`] seam
//! - [`scanner`] - [`SimpleLexer`], a keyword-driven default scanner
//!
//! # Examples
//!
//! ```
//! use tessel_core::lex::{SimpleLexer, TokenKind, TokenSource};
//!
//! let lexer = SimpleLexer::new(["class", "{", "}"]);
//! let result = lexer.tokenize("class Person {}");
//! assert!(result.errors.is_empty());
//! assert_eq!(result.tokens[0].kind, TokenKind::Keyword);
//! assert_eq!(result.tokens[2].image, "Person");
//! ```

pub mod scanner;
pub mod span;
pub mod tokens;

pub use scanner::SimpleLexer;
pub use span::TextRange;
pub use tokens::{LexResult, Token, TokenKind, TokenSource};
