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

//! Validation runner

use crate::acceptor::ValidationAcceptor;
use crate::diagnostic::{codes, Diagnostic, Severity};
use crate::registry::{CheckCategory, ValidationRegistry};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tessel_core::traverse::stream_ast;
use tessel_core::{CancellationToken, Cancelled, DocumentUri, ParseResult};
use tracing::{debug, error, warn};

/// Maximum number of diagnostics to collect before stopping.
///
/// Bounds memory for documents where a systemic problem makes every node
/// report.
pub const MAX_DIAGNOSTICS: usize = 10_000;

/// Per-check overrides.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub enabled: bool,
    /// Report warnings of this check as errors.
    pub error: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            error: false,
        }
    }
}

/// Configuration for one validation run
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Check categories to run (default: fast only).
    pub categories: Vec<CheckCategory>,
    /// Skip checks when the lexer reported errors.
    pub stop_after_lexing_errors: bool,
    /// Skip checks when the parser reported errors.
    pub stop_after_parsing_errors: bool,
    /// Maximum number of diagnostics to collect (default: 10,000)
    pub max_diagnostics: usize,
    /// Check configurations by check ID
    pub checks: HashMap<String, CheckConfig>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            categories: vec![CheckCategory::Fast],
            stop_after_lexing_errors: false,
            stop_after_parsing_errors: false,
            max_diagnostics: MAX_DIAGNOSTICS,
            checks: HashMap::new(),
        }
    }
}

impl ValidationOptions {
    /// Options that run fast and slow checks.
    pub fn all_categories() -> Self {
        Self {
            categories: vec![CheckCategory::Fast, CheckCategory::Slow],
            ..Self::default()
        }
    }

    pub fn includes(&self, category: CheckCategory) -> bool {
        self.categories.contains(&category)
    }

    /// Disable a specific check
    pub fn disable_check(&mut self, id: &str) {
        self.checks.insert(
            id.to_string(),
            CheckConfig {
                enabled: false,
                error: false,
            },
        );
    }

    /// Set a check to error level
    pub fn set_check_error(&mut self, id: &str) {
        self.checks.insert(
            id.to_string(),
            CheckConfig {
                enabled: true,
                error: true,
            },
        );
    }
}

/// Runs the registered checks over a parsed document.
#[derive(Debug, Clone)]
pub struct ValidationRunner {
    registry: Arc<ValidationRegistry>,
}

impl ValidationRunner {
    pub fn new(registry: Arc<ValidationRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ValidationRegistry> {
        &self.registry
    }

    /// Validates one document.
    ///
    /// Lexer and parser errors come first, then the reports of the checks in
    /// document order. A panicking check is recorded as an error diagnostic
    /// and does not stop the run. Cancellation is checked between nodes.
    pub fn validate(
        &self,
        parsed: &ParseResult,
        uri: &DocumentUri,
        options: &ValidationOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>, Cancelled> {
        let mut diagnostics = Vec::new();

        for lex_error in &parsed.lex_errors {
            diagnostics.push(
                Diagnostic::error(lex_error.message.clone(), lex_error.range).with_code(codes::LEXING_ERROR),
            );
        }
        if options.stop_after_lexing_errors && !parsed.lex_errors.is_empty() {
            return Ok(diagnostics);
        }
        for parse_error in &parsed.parse_errors {
            diagnostics.push(
                Diagnostic::error(parse_error.message.clone(), parse_error.range)
                    .with_code(codes::PARSING_ERROR),
            );
        }
        if options.stop_after_parsing_errors && !parsed.parse_errors.is_empty() {
            return Ok(diagnostics);
        }

        let ast = &parsed.ast;
        let mut acceptor = ValidationAcceptor::new(uri.clone());
        let mut limit_exceeded = false;

        'nodes: for node in stream_ast(ast, ast.root()) {
            cancel.check()?;
            for check in self.registry.checks_for(node.ty()) {
                if !options.includes(check.category()) {
                    continue;
                }
                let config = options.checks.get(check.id()).cloned().unwrap_or_default();
                if !config.enabled {
                    continue;
                }

                let outcome = catch_unwind(AssertUnwindSafe(|| check.check(node, &mut acceptor)));
                if let Err(payload) = outcome {
                    let reason = panic_message(payload.as_ref());
                    error!(check = check.id(), node = %node.id(), %reason, "validation check panicked");
                    if diagnostics.len() >= options.max_diagnostics {
                        limit_exceeded = true;
                        break 'nodes;
                    }
                    diagnostics.push(
                        Diagnostic::error(
                            format!("An error occurred during validation: {}", reason),
                            node.range().unwrap_or_default(),
                        )
                        .with_code(codes::CHECK_FAILED),
                    );
                }

                for mut diagnostic in acceptor.drain() {
                    if config.error && diagnostic.severity() == Severity::Warning {
                        diagnostic.escalate_to_error();
                    }
                    if diagnostics.len() >= options.max_diagnostics {
                        limit_exceeded = true;
                        break;
                    }
                    diagnostics.push(diagnostic);
                }
                if limit_exceeded {
                    break 'nodes;
                }
            }
        }

        if limit_exceeded {
            warn!(limit = options.max_diagnostics, "diagnostic limit exceeded");
            diagnostics.push(
                Diagnostic::warning(
                    format!(
                        "Diagnostic limit of {} exceeded. Further diagnostics have been suppressed.",
                        options.max_diagnostics
                    ),
                    ast.node(ast.root()).range().unwrap_or_default(),
                )
                .with_code(codes::LIMIT_EXCEEDED),
            );
        }

        debug!(diagnostics = diagnostics.len(), "validation finished");
        Ok(diagnostics)
    }

    /// Check if any errors were found
    pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
        diagnostics.iter().any(|d| d.severity() == Severity::Error)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
