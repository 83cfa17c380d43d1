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

//! Pull diagnostics with result ids.
//!
//! Reports are cached per document under a result id from an increasing
//! counter. A request carrying the current id gets `Unchanged`. The cache is
//! evicted through the builder's update notifications, so an entry never
//! outlives the build it was taken from.

use crate::builder::{BuildError, DocumentBuilder};
use crate::constants::DIAGNOSTIC_SOURCE;
use crate::document::{Document, DocumentState};
use crate::utils::range_to_lsp;
use dashmap::DashMap;
use ropey::Rope;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tessel::{CancellationToken, Diagnostic, DocumentUri, Severity};
use tessel_validate::DiagnosticTag;
use tower_lsp::lsp_types::{
    self, DiagnosticRelatedInformation, DiagnosticSeverity, Location, NumberOrString, Range, Url,
};
use tracing::debug;

/// Answer to a diagnostic request.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticReport {
    Full {
        result_id: String,
        items: Vec<lsp_types::Diagnostic>,
    },
    Unchanged {
        result_id: String,
    },
}

impl DiagnosticReport {
    pub fn result_id(&self) -> &str {
        match self {
            DiagnosticReport::Full { result_id, .. } | DiagnosticReport::Unchanged { result_id } => {
                result_id
            }
        }
    }
}

#[derive(Debug, Clone)]
struct CachedReport {
    result_id: String,
    items: Vec<lsp_types::Diagnostic>,
}

pub struct DiagnosticsProvider {
    builder: Arc<DocumentBuilder>,
    cache: Arc<DashMap<DocumentUri, CachedReport>>,
    next_id: AtomicU64,
}

impl DiagnosticsProvider {
    /// Creates the provider and subscribes it to `builder`'s updates.
    pub fn new(builder: Arc<DocumentBuilder>) -> Self {
        let cache: Arc<DashMap<DocumentUri, CachedReport>> = Arc::new(DashMap::new());
        let evict = Arc::clone(&cache);
        builder.on_update(Box::new(move |changed, deleted| {
            for uri in changed.iter().chain(deleted) {
                evict.remove(uri);
            }
        }));
        Self {
            builder,
            cache,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn is_cached(&self, uri: &DocumentUri) -> bool {
        self.cache.contains_key(uri)
    }

    pub async fn get_diagnostics(
        &self,
        uri: &DocumentUri,
        previous_result_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<DiagnosticReport, BuildError> {
        loop {
            let cached = self.cache.get(uri).map(|entry| entry.value().clone());
            if let Some(cached) = cached {
                if previous_result_id == Some(cached.result_id.as_str()) {
                    return Ok(DiagnosticReport::Unchanged {
                        result_id: cached.result_id,
                    });
                }
                return Ok(DiagnosticReport::Full {
                    result_id: cached.result_id,
                    items: cached.items,
                });
            }

            self.builder
                .wait_until(DocumentState::Validated, uri, cancel)
                .await?;
            let document = self
                .builder
                .documents()
                .get(uri)
                .ok_or(BuildError::DocumentNotFound)?;
            let doc = document.lock();
            if doc.state() < DocumentState::Validated {
                // Reset between the wait and the lock.
                continue;
            }
            let result_id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
            let items = document_diagnostics(&doc);
            debug!(%uri, %result_id, count = items.len(), "caching diagnostic report");
            self.cache.insert(
                uri.clone(),
                CachedReport {
                    result_id: result_id.clone(),
                    items: items.clone(),
                },
            );
            return Ok(DiagnosticReport::Full { result_id, items });
        }
    }
}

/// LSP diagnostics of a validated document.
pub fn document_diagnostics(doc: &Document) -> Vec<lsp_types::Diagnostic> {
    doc.diagnostics()
        .iter()
        .map(|d| to_lsp_diagnostic(doc.rope(), doc.uri(), d))
        .collect()
}

pub fn to_lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

/// Converts a diagnostic of the document `uri` whose text is `rope`.
///
/// Related locations in other documents keep their URI but get an empty
/// range, since their text is not at hand.
pub fn to_lsp_diagnostic(
    rope: &Rope,
    uri: &DocumentUri,
    diagnostic: &Diagnostic,
) -> lsp_types::Diagnostic {
    let related: Vec<_> = diagnostic
        .related()
        .iter()
        .filter_map(|info| {
            let target = Url::parse(info.uri.as_str()).ok()?;
            let range = if &info.uri == uri {
                range_to_lsp(rope, info.range)
            } else {
                Range::default()
            };
            Some(DiagnosticRelatedInformation {
                location: Location::new(target, range),
                message: info.message.clone(),
            })
        })
        .collect();
    let tags: Vec<_> = diagnostic
        .tags()
        .iter()
        .map(|tag| match tag {
            DiagnosticTag::Unnecessary => lsp_types::DiagnosticTag::UNNECESSARY,
            DiagnosticTag::Deprecated => lsp_types::DiagnosticTag::DEPRECATED,
        })
        .collect();

    lsp_types::Diagnostic {
        range: range_to_lsp(rope, diagnostic.range()),
        severity: Some(to_lsp_severity(diagnostic.severity())),
        code: diagnostic
            .code()
            .map(|code| NumberOrString::String(code.to_string())),
        code_description: None,
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: diagnostic.message().to_string(),
        related_information: (!related.is_empty()).then_some(related),
        tags: (!tags.is_empty()).then_some(tags),
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel::TextRange;
    use tessel_validate::RelatedInformation;
    use tower_lsp::lsp_types::Position;

    #[test]
    fn test_convert_diagnostic() {
        let rope = Rope::from_str("class A {}\ndatatype lower");
        let uri = DocumentUri::from("file:///a.dmodel");
        let diagnostic = Diagnostic::warning("lowercase", TextRange::new(20, 25))
            .with_code("capitalized-name")
            .with_tag(DiagnosticTag::Unnecessary)
            .with_related(RelatedInformation {
                uri: uri.clone(),
                range: TextRange::new(6, 7),
                message: "here".to_string(),
            });
        let converted = to_lsp_diagnostic(&rope, &uri, &diagnostic);
        assert_eq!(
            converted.range,
            Range::new(Position::new(1, 9), Position::new(1, 14))
        );
        assert_eq!(converted.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(
            converted.code,
            Some(NumberOrString::String("capitalized-name".to_string()))
        );
        assert_eq!(converted.source.as_deref(), Some(DIAGNOSTIC_SOURCE));
        assert_eq!(
            converted.tags,
            Some(vec![lsp_types::DiagnosticTag::UNNECESSARY])
        );
        let related = converted.related_information.unwrap();
        assert_eq!(
            related[0].location.range,
            Range::new(Position::new(0, 6), Position::new(0, 7))
        );
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(to_lsp_severity(Severity::Error), DiagnosticSeverity::ERROR);
        assert_eq!(to_lsp_severity(Severity::Hint), DiagnosticSeverity::HINT);
    }

    #[test]
    fn test_report_result_id() {
        let report = DiagnosticReport::Unchanged {
            result_id: "7".to_string(),
        };
        assert_eq!(report.result_id(), "7");
    }
}
