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

//! One workspace document and its build products.

use crate::utils::apply_change;
use ropey::Rope;
use std::collections::HashSet;
use std::fmt;
use tessel::{AstNodeDescription, Diagnostic, DocumentUri, ParseResult};
use tessel_core::LocalScopes;
use tower_lsp::lsp_types::TextDocumentContentChangeEvent;

/// Build progress of a document. States are strictly ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentState {
    Changed,
    Parsed,
    IndexedContent,
    ComputedScopes,
    Linked,
    Validated,
}

impl DocumentState {
    /// Build phases in execution order.
    pub const PHASES: [DocumentState; 5] = [
        DocumentState::Parsed,
        DocumentState::IndexedContent,
        DocumentState::ComputedScopes,
        DocumentState::Linked,
        DocumentState::Validated,
    ];

    /// The state a document must be in for this phase to run.
    pub fn previous(self) -> Option<DocumentState> {
        match self {
            DocumentState::Changed => None,
            DocumentState::Parsed => Some(DocumentState::Changed),
            DocumentState::IndexedContent => Some(DocumentState::Parsed),
            DocumentState::ComputedScopes => Some(DocumentState::IndexedContent),
            DocumentState::Linked => Some(DocumentState::ComputedScopes),
            DocumentState::Validated => Some(DocumentState::Linked),
        }
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentState::Changed => "changed",
            DocumentState::Parsed => "parsed",
            DocumentState::IndexedContent => "indexed",
            DocumentState::ComputedScopes => "scoped",
            DocumentState::Linked => "linked",
            DocumentState::Validated => "validated",
        };
        write!(f, "{}", name)
    }
}

/// A workspace document.
///
/// The build products are only meaningful for the states that produce
/// them: no parse result below `Parsed`, no exports below `IndexedContent`,
/// and so on.
#[derive(Debug)]
pub struct Document {
    uri: DocumentUri,
    version: i32,
    rope: Rope,
    state: DocumentState,
    parsed: Option<ParseResult>,
    exports: Vec<AstNodeDescription>,
    local: LocalScopes,
    diagnostics: Vec<Diagnostic>,
}

impl Document {
    pub fn new(uri: DocumentUri, version: i32, text: &str) -> Self {
        Self {
            uri,
            version,
            rope: Rope::from_str(text),
            state: DocumentState::Changed,
            parsed: None,
            exports: Vec::new(),
            local: LocalScopes::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn uri(&self) -> &DocumentUri {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn parsed(&self) -> Option<&ParseResult> {
        self.parsed.as_ref()
    }

    pub fn exports(&self) -> &[AstNodeDescription] {
        &self.exports
    }

    pub fn local_scopes(&self) -> &LocalScopes {
        &self.local
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// `true` if some linked reference failed to resolve.
    pub fn has_unresolved_references(&self) -> bool {
        self.parsed.as_ref().is_some_and(|parsed| {
            parsed
                .ast
                .references()
                .any(|(_, r)| r.is_linked() && !r.is_resolved())
        })
    }

    /// `true` if some resolved reference targets one of `uris`.
    pub fn references_into(&self, uris: &HashSet<DocumentUri>) -> bool {
        self.parsed.as_ref().is_some_and(|parsed| {
            parsed
                .ast
                .references()
                .filter_map(|(_, r)| r.target())
                .any(|target| uris.contains(&target.uri))
        })
    }

    // Mutation, driven by the document builder.

    pub(crate) fn set_text(&mut self, version: i32, text: &str) {
        self.version = version;
        self.rope = Rope::from_str(text);
        self.reset();
    }

    pub(crate) fn apply_changes(&mut self, version: i32, changes: &[TextDocumentContentChangeEvent]) {
        self.version = version;
        for change in changes {
            apply_change(&mut self.rope, change);
        }
        self.reset();
    }

    /// Drops every build product and goes back to `Changed`.
    pub(crate) fn reset(&mut self) {
        self.state = DocumentState::Changed;
        self.parsed = None;
        self.exports.clear();
        self.local = LocalScopes::new();
        self.diagnostics.clear();
    }

    /// Clears all resolutions and goes back to `ComputedScopes`.
    ///
    /// No-op for a document that has not been linked yet.
    pub(crate) fn unlink(&mut self) {
        if self.state <= DocumentState::ComputedScopes {
            return;
        }
        self.clear_links();
        self.diagnostics.clear();
        self.state = DocumentState::ComputedScopes;
    }

    /// Clears all resolutions without changing the state.
    pub(crate) fn clear_links(&mut self) {
        if let Some(parsed) = self.parsed.as_mut() {
            parsed.ast.unlink_all();
        }
    }

    pub(crate) fn set_parsed(&mut self, parsed: ParseResult) {
        self.parsed = Some(parsed);
    }

    pub(crate) fn set_exports(&mut self, exports: Vec<AstNodeDescription>) {
        self.exports = exports;
    }

    pub(crate) fn set_local_scopes(&mut self, local: LocalScopes) {
        self.local = local;
    }

    pub(crate) fn set_diagnostics(&mut self, diagnostics: Vec<Diagnostic>) {
        self.diagnostics = diagnostics;
    }

    pub(crate) fn advance(&mut self, state: DocumentState) {
        debug_assert!(state >= self.state);
        self.state = state;
    }
}
