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

//! The sink checks report through.

use crate::diagnostic::{Diagnostic, DiagnosticTag, RelatedInformation, Severity};
use tessel_core::{DocumentUri, NodeRef, TextRange};

/// Where a check report points, plus optional decorations.
#[derive(Debug, Clone)]
pub struct DiagnosticInfo<'a> {
    pub node: NodeRef<'a>,
    pub property: Option<&'a str>,
    pub index: Option<usize>,
    pub code: Option<String>,
    pub tags: Vec<DiagnosticTag>,
    pub related: Vec<RelatedInformation>,
}

impl<'a> DiagnosticInfo<'a> {
    pub fn new(node: NodeRef<'a>) -> Self {
        Self {
            node,
            property: None,
            index: None,
            code: None,
            tags: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn on_property(mut self, property: &'a str) -> Self {
        self.property = Some(property);
        self
    }

    pub fn at_index(mut self, index: Option<usize>) -> Self {
        self.index = index;
        self
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

    /// Text range the report points at.
    ///
    /// The CST node assigned to the property if there is one, else the
    /// node's own range.
    pub fn range(&self) -> TextRange {
        self.property
            .and_then(|property| self.node.property_range(property, self.index))
            .or_else(|| self.node.range())
            .unwrap_or_default()
    }
}

/// Collects the reports of the checks run on one document.
#[derive(Debug)]
pub struct ValidationAcceptor {
    document: DocumentUri,
    diagnostics: Vec<Diagnostic>,
}

impl ValidationAcceptor {
    pub fn new(document: DocumentUri) -> Self {
        Self {
            document,
            diagnostics: Vec::new(),
        }
    }

    /// The document being validated. Resolved references whose target
    /// carries another URI point outside of the checked tree.
    pub fn document(&self) -> &DocumentUri {
        &self.document
    }

    pub fn accept(&mut self, severity: Severity, message: impl Into<String>, info: DiagnosticInfo<'_>) {
        let mut diagnostic = Diagnostic::new(severity, message, info.range());
        if let Some(code) = info.code {
            diagnostic = diagnostic.with_code(code);
        }
        for tag in info.tags {
            diagnostic = diagnostic.with_tag(tag);
        }
        for related in info.related {
            diagnostic = diagnostic.with_related(related);
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, info: DiagnosticInfo<'_>) {
        self.accept(Severity::Error, message, info);
    }

    pub fn warning(&mut self, message: impl Into<String>, info: DiagnosticInfo<'_>) {
        self.accept(Severity::Warning, message, info);
    }

    pub fn info(&mut self, message: impl Into<String>, info: DiagnosticInfo<'_>) {
        self.accept(Severity::Information, message, info);
    }

    pub fn hint(&mut self, message: impl Into<String>, info: DiagnosticInfo<'_>) {
        self.accept(Severity::Hint, message, info);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Diagnostic> {
        self.diagnostics.drain(..)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
