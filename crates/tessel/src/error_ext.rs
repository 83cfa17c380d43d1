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

//! Error context helpers.
//!
//! ```rust
//! use tessel::{TesselError, TesselResultExt};
//!
//! fn load(path: &str) -> Result<String, TesselError> {
//!     std::fs::read_to_string(path).with_context(|| format!("while loading {}", path))
//! }
//!
//! let err = load("/definitely/not/here.dmodel").unwrap_err();
//! assert!(err.context.unwrap().contains("not/here.dmodel"));
//! ```

use crate::TesselError;
use std::fmt;

/// Adds context to results on their way up the call stack.
///
/// Context goes into the error's `context` field. A later context is
/// prepended to an earlier one: `"outer; inner"`.
pub trait TesselResultExt<T> {
    fn context<C>(self, context: C) -> Result<T, TesselError>
    where
        C: fmt::Display;

    /// Like [`context`](TesselResultExt::context), evaluated only on error.
    fn with_context<C, F>(self, f: F) -> Result<T, TesselError>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T> TesselResultExt<T> for Result<T, TesselError> {
    fn context<C>(self, context: C) -> Result<T, TesselError>
    where
        C: fmt::Display,
    {
        self.map_err(|e| add_context(e, context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, TesselError>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| add_context(e, f().to_string()))
    }
}

impl<T> TesselResultExt<T> for Result<T, std::io::Error> {
    fn context<C>(self, context: C) -> Result<T, TesselError>
    where
        C: fmt::Display,
    {
        self.map_err(|e| add_context(TesselError::from(e), context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, TesselError>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| add_context(TesselError::from(e), f().to_string()))
    }
}

fn add_context(mut error: TesselError, context: String) -> TesselError {
    if context.is_empty() {
        return error;
    }
    error.context = Some(match error.context {
        Some(existing) => format!("{}; {}", context, existing),
        None => context,
    });
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TesselErrorKind;
    use std::cell::Cell;

    // ==================== context() tests ====================

    #[test]
    fn test_context_on_error() {
        let result: Result<(), TesselError> = Err(TesselError::grammar("rule 'X' is undefined").with_offset(5));
        let err = result.context("in language Domainmodel").unwrap_err();

        assert_eq!(err.context, Some("in language Domainmodel".to_string()));
        assert_eq!(err.offset, Some(5));
        assert_eq!(err.kind, TesselErrorKind::Grammar);
        assert_eq!(err.message, "rule 'X' is undefined");
    }

    #[test]
    fn test_context_on_ok() {
        let result: Result<i32, TesselError> = Ok(42);
        assert_eq!(result.context("unused").unwrap(), 42);
    }

    #[test]
    fn test_context_chaining() {
        let result: Result<(), TesselError> = Err(TesselError::type_error("cycle"));
        let err = result
            .context("in type Class")
            .context("while building types")
            .unwrap_err();
        assert_eq!(err.context.unwrap(), "while building types; in type Class");
    }

    #[test]
    fn test_context_empty_string() {
        let result: Result<(), TesselError> = Err(TesselError::config("bad"));
        let err = result.context("").unwrap_err();
        assert!(err.context.is_none());
    }

    // ==================== with_context() tests ====================

    #[test]
    fn test_with_context_lazy_evaluation() {
        let calls = Cell::new(0);
        let result: Result<i32, TesselError> = Ok(1);
        let _ = result.with_context(|| {
            calls.set(calls.get() + 1);
            "never"
        });
        assert_eq!(calls.get(), 0);

        let result: Result<i32, TesselError> = Err(TesselError::limit("too deep"));
        let _ = result.with_context(|| {
            calls.set(calls.get() + 1);
            "once"
        });
        assert_eq!(calls.get(), 1);
    }

    // ==================== io::Error tests ====================

    #[test]
    fn test_io_context() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let err = result.context("reading model.dmodel").unwrap_err();
        assert_eq!(err.kind, TesselErrorKind::IO);
        assert_eq!(err.context, Some("reading model.dmodel".to_string()));
    }
}
