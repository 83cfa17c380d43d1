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

//! Validation diagnostic types

use tessel_core::{DocumentUri, TextRange};

/// Diagnostic codes produced by the runtime itself.
pub mod codes {
    pub const LEXING_ERROR: &str = "lexing-error";
    pub const PARSING_ERROR: &str = "parsing-error";
    pub const LINKING_ERROR: &str = "linking-error";
    pub const CHECK_FAILED: &str = "validation-check-failed";
    pub const LIMIT_EXCEEDED: &str = "diagnostic-limit-exceeded";
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Hint,
    Information,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hint => write!(f, "hint"),
            Self::Information => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Extra rendering hints for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticTag {
    Unnecessary,
    Deprecated,
}

/// A location elsewhere that explains a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInformation {
    pub uri: DocumentUri,
    pub range: TextRange,
    pub message: String,
}

/// A validation diagnostic
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    range: TextRange,
    code: Option<String>,
    tags: Vec<DiagnosticTag>,
    related: Vec<RelatedInformation>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            severity,
            message: message.into(),
            range,
            code: None,
            tags: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(Severity::Error, message, range)
    }

    pub fn warning(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(Severity::Warning, message, range)
    }

    pub fn info(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(Severity::Information, message, range)
    }

    pub fn hint(message: impl Into<String>, range: TextRange) -> Self {
        Self::new(Severity::Hint, message, range)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_tag(mut self, tag: DiagnosticTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_related(mut self, related: RelatedInformation) -> Self {
        self.related.push(related);
        self
    }

    // Public getters
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn tags(&self) -> &[DiagnosticTag] {
        &self.tags
    }

    pub fn related(&self) -> &[RelatedInformation] {
        &self.related
    }

    /// Escalate the severity to error level (used by the runner).
    pub fn escalate_to_error(&mut self) {
        self.severity = Severity::Error;
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.range, self.severity, self.message)?;
        if let Some(ref code) = self.code {
            write!(f, " [{}]", code)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Severity tests ====================

    #[test]
    fn test_severity_ordering() {
        let mut severities = vec![
            Severity::Warning,
            Severity::Hint,
            Severity::Error,
            Severity::Information,
        ];
        severities.sort();
        assert_eq!(
            severities,
            vec![
                Severity::Hint,
                Severity::Information,
                Severity::Warning,
                Severity::Error
            ]
        );
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Information.to_string(), "info");
        assert_eq!(Severity::Error.to_string(), "error");
    }

    // ==================== Diagnostic tests ====================

    #[test]
    fn test_diagnostic_builders() {
        let uri = DocumentUri::from("file:///a");
        let diag = Diagnostic::warning("unused", TextRange::new(3, 7))
            .with_code("unused-import")
            .with_tag(DiagnosticTag::Unnecessary)
            .with_related(RelatedInformation {
                uri: uri.clone(),
                range: TextRange::new(0, 1),
                message: "declared here".to_string(),
            });
        assert_eq!(diag.severity(), Severity::Warning);
        assert_eq!(diag.code(), Some("unused-import"));
        assert_eq!(diag.tags(), &[DiagnosticTag::Unnecessary]);
        assert_eq!(diag.related()[0].uri, uri);
        assert_eq!(diag.range(), TextRange::new(3, 7));
    }

    #[test]
    fn test_escalate() {
        let mut diag = Diagnostic::hint("h", TextRange::empty(0));
        diag.escalate_to_error();
        assert_eq!(diag.severity(), Severity::Error);
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::error("Dup name", TextRange::new(1, 4)).with_code("dup");
        assert_eq!(diag.to_string(), "1..4: error: Dup name [dup]");
        let plain = Diagnostic::info("note", TextRange::new(0, 0));
        assert_eq!(plain.to_string(), "0..0: info: note");
    }
}
