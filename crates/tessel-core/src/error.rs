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

//! Error types for Tessel.
//!
//! Two families live here. [`TesselError`] is returned from construction
//! APIs (grammar building, type hierarchy building, configuration) and is a
//! real `Err`. [`LexError`] and [`ParseError`] are *data*: they are collected
//! in a parse result next to a partial tree and never abort a parse.

use crate::lex::TextRange;
use std::fmt;
use thiserror::Error;

/// The kind of error that occurred while setting up a language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TesselErrorKind {
    /// Malformed grammar (undefined rule, left recursion, bad entry rule).
    Grammar,
    /// Type hierarchy problem (unknown supertype, inheritance cycle).
    Type,
    /// Invalid configuration value.
    Config,
    /// A configured limit was exceeded.
    Limit,
    /// I/O error (file operations, transport).
    IO,
}

impl fmt::Display for TesselErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grammar => write!(f, "GrammarError"),
            Self::Type => write!(f, "TypeError"),
            Self::Config => write!(f, "ConfigError"),
            Self::Limit => write!(f, "LimitError"),
            Self::IO => write!(f, "IOError"),
        }
    }
}

/// An error raised while building or configuring a language runtime.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct TesselError {
    /// The kind of error.
    pub kind: TesselErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Byte offset in a source text, when one applies.
    pub offset: Option<usize>,
    /// Additional context (e.g., "in rule Class").
    pub context: Option<String>,
}

impl TesselError {
    /// Create a new error.
    pub fn new(kind: TesselErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offset: None,
            context: None,
        }
    }

    /// Add offset information.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Add context information.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn grammar(message: impl Into<String>) -> Self {
        Self::new(TesselErrorKind::Grammar, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(TesselErrorKind::Type, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(TesselErrorKind::Config, message)
    }

    pub fn limit(message: impl Into<String>) -> Self {
        Self::new(TesselErrorKind::Limit, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(TesselErrorKind::IO, message)
    }
}

impl From<std::io::Error> for TesselError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

/// Result type for Tessel construction APIs.
pub type TesselResult<T> = Result<T, TesselError>;

/// A lexing problem. The offending characters are skipped and lexing goes on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {range}")]
pub struct LexError {
    /// Human-readable error message.
    pub message: String,
    /// Location of the offending characters.
    pub range: TextRange,
}

impl LexError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// A recognition problem recorded by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {range}")]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Location of the token the parser stopped at.
    pub range: TextRange,
    /// Image of that token, `None` at end of input.
    pub token: Option<String>,
    /// Name of the rule being parsed.
    pub rule: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
            token: None,
            rule: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

/// The operation was cancelled through a [`CancellationToken`](crate::CancellationToken).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== TesselErrorKind Display tests ====================

    #[test]
    fn test_error_kind_display() {
        assert_eq!(TesselErrorKind::Grammar.to_string(), "GrammarError");
        assert_eq!(TesselErrorKind::Type.to_string(), "TypeError");
        assert_eq!(TesselErrorKind::Config.to_string(), "ConfigError");
        assert_eq!(TesselErrorKind::Limit.to_string(), "LimitError");
        assert_eq!(TesselErrorKind::IO.to_string(), "IOError");
    }

    // ==================== TesselError tests ====================

    #[test]
    fn test_error_display() {
        let err = TesselError::grammar("rule 'Class' is declared but never defined");
        let msg = err.to_string();
        assert!(msg.starts_with("GrammarError"));
        assert!(msg.contains("never defined"));
    }

    #[test]
    fn test_error_builders() {
        let err = TesselError::type_error("cycle")
            .with_offset(12)
            .with_context("in type Class");
        assert_eq!(err.kind, TesselErrorKind::Type);
        assert_eq!(err.offset, Some(12));
        assert_eq!(err.context.as_deref(), Some("in type Class"));
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TesselError = io.into();
        assert_eq!(err.kind, TesselErrorKind::IO);
    }

    // ==================== Collected error tests ====================

    #[test]
    fn test_parse_error_builders() {
        let err = ParseError::new("Expecting '{'", TextRange::new(3, 4))
            .with_token("}")
            .with_rule("Class");
        assert_eq!(err.token.as_deref(), Some("}"));
        assert_eq!(err.rule.as_deref(), Some("Class"));
        assert_eq!(err.to_string(), "Expecting '{' at 3..4");
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(Cancelled.to_string(), "operation cancelled");
    }
}
