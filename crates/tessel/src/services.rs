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

//! Per-language service bundle.
//!
//! A [`LanguageServices`] value holds everything needed to process documents
//! of one language. It is built once and shared by reference; nothing in the
//! runtime is global.

use crate::error_ext::TesselResultExt;
use std::fmt;
use std::sync::Arc;
use tessel_core::grammar::Grammar;
use tessel_core::linker::EmptyGlobalScope;
use tessel_core::{
    AstNodeDescription, CancellationToken, Cancelled, DefaultLinker, DefaultScopeComputation,
    DocumentUri, GlobalScope, Limits, LinkContext, Linker, LocalScopes, ParseResult, Parser,
    ScopeComputation, TesselResult, TokenSource,
};
use tessel_validate::{Diagnostic, ValidationOptions, ValidationRegistry, ValidationRunner};
use tracing::debug;

/// The services of one language.
#[derive(Clone)]
pub struct LanguageServices {
    language_id: String,
    file_extensions: Vec<String>,
    parser: Parser,
    lexer: Arc<dyn TokenSource>,
    scopes: Arc<dyn ScopeComputation>,
    linker: Arc<dyn Linker>,
    validator: ValidationRunner,
}

impl fmt::Debug for LanguageServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageServices")
            .field("language_id", &self.language_id)
            .field("file_extensions", &self.file_extensions)
            .field("grammar", &self.parser.grammar().name())
            .finish()
    }
}

impl LanguageServices {
    pub fn builder(grammar: Arc<Grammar>, lexer: Arc<dyn TokenSource>) -> LanguageServicesBuilder {
        LanguageServicesBuilder {
            language_id: grammar.name().to_lowercase(),
            file_extensions: Vec::new(),
            grammar,
            lexer,
            limits: Limits::default(),
            scopes: None,
            linker: None,
            registry: None,
        }
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn file_extensions(&self) -> &[String] {
        &self.file_extensions
    }

    /// Does `uri` name a file of this language?
    pub fn handles(&self, uri: &DocumentUri) -> bool {
        self.file_extensions
            .iter()
            .any(|ext| uri.as_str().ends_with(&format!(".{}", ext)))
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        self.parser.grammar()
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn lexer(&self) -> &dyn TokenSource {
        self.lexer.as_ref()
    }

    pub fn scope_computation(&self) -> &dyn ScopeComputation {
        self.scopes.as_ref()
    }

    pub fn linker(&self) -> &dyn Linker {
        self.linker.as_ref()
    }

    pub fn validator(&self) -> &ValidationRunner {
        &self.validator
    }

    /// Tokenizes and parses `text`.
    pub fn parse(&self, text: &str) -> ParseResult {
        self.parser.parse_text(self.lexer.as_ref(), text)
    }

    /// Runs the whole pipeline on a single document.
    ///
    /// References are resolved against the document's own scopes, then its
    /// own exports, then `global`.
    pub fn analyze(
        &self,
        uri: &DocumentUri,
        text: &str,
        global: Option<&dyn GlobalScope>,
        options: &ValidationOptions,
        cancel: &CancellationToken,
    ) -> Result<Analysis, Cancelled> {
        let parsed = self.parse(text);
        cancel.check()?;
        let exports = self.scopes.compute_exports(&parsed.ast, uri, cancel)?;
        let local = self.scopes.compute_local_scopes(&parsed.ast, uri, cancel)?;

        let combined = WithExports {
            exports: &exports,
            fallback: global.unwrap_or(&EmptyGlobalScope),
        };
        let cx = LinkContext {
            uri,
            local: &local,
            global: &combined,
        };
        let stats = self.linker.link(&parsed.ast, &cx, cancel)?;
        let diagnostics = self.validator.validate(&parsed, uri, options, cancel)?;
        debug!(
            %uri,
            resolved = stats.resolved,
            unresolved = stats.unresolved,
            diagnostics = diagnostics.len(),
            "analyzed document"
        );
        Ok(Analysis {
            parsed,
            exports,
            local,
            diagnostics,
        })
    }
}

/// Result of [`LanguageServices::analyze`].
#[derive(Debug)]
pub struct Analysis {
    pub parsed: ParseResult,
    pub exports: Vec<AstNodeDescription>,
    pub local: LocalScopes,
    pub diagnostics: Vec<Diagnostic>,
}

struct WithExports<'a> {
    exports: &'a [AstNodeDescription],
    fallback: &'a dyn GlobalScope,
}

impl GlobalScope for WithExports<'_> {
    fn lookup(&self, name: &str) -> Vec<AstNodeDescription> {
        let mut found: Vec<_> = self
            .exports
            .iter()
            .filter(|d| d.name == name)
            .cloned()
            .collect();
        found.extend(self.fallback.lookup(name));
        found
    }
}

/// Builder for [`LanguageServices`].
pub struct LanguageServicesBuilder {
    language_id: String,
    file_extensions: Vec<String>,
    grammar: Arc<Grammar>,
    lexer: Arc<dyn TokenSource>,
    limits: Limits,
    scopes: Option<Arc<dyn ScopeComputation>>,
    linker: Option<Arc<dyn Linker>>,
    registry: Option<ValidationRegistry>,
}

impl LanguageServicesBuilder {
    pub fn language_id(mut self, id: impl Into<String>) -> Self {
        self.language_id = id.into();
        self
    }

    /// Adds a file extension, without the dot.
    pub fn file_extension(mut self, ext: impl Into<String>) -> Self {
        self.file_extensions.push(ext.into());
        self
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn scope_computation(mut self, scopes: Arc<dyn ScopeComputation>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    pub fn linker(mut self, linker: Arc<dyn Linker>) -> Self {
        self.linker = Some(linker);
        self
    }

    pub fn validation(mut self, registry: ValidationRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Analyses the grammar and assembles the services.
    ///
    /// Missing services fall back to the defaults: [`DefaultScopeComputation`],
    /// [`DefaultLinker`] and an empty validation registry.
    pub fn build(self) -> TesselResult<LanguageServices> {
        let name = self.grammar.name().to_string();
        let parser = Parser::new(self.grammar.clone())
            .with_context(|| format!("while building language '{}'", name))?
            .with_limits(self.limits);
        let registry = self
            .registry
            .unwrap_or_else(|| ValidationRegistry::new(self.grammar.types().clone()));
        debug!(
            language = %self.language_id,
            checks = registry.len(),
            "language services ready"
        );
        Ok(LanguageServices {
            language_id: self.language_id,
            file_extensions: self.file_extensions,
            parser,
            lexer: self.lexer,
            scopes: self
                .scopes
                .unwrap_or_else(|| Arc::new(DefaultScopeComputation::default())),
            linker: self.linker.unwrap_or_else(|| Arc::new(DefaultLinker)),
            validator: ValidationRunner::new(Arc::new(registry)),
        })
    }
}
