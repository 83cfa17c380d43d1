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

//! The language server.

use crate::builder::{BuildError, BuildOptions, DocumentBuilder, DocumentChange};
use crate::config::ServerConfig;
use crate::constants::{BYTES_PER_MEGABYTE, DIAGNOSTIC_PROVIDER_ID, REQUEST_CANCELLED};
use crate::diagnostics::{document_diagnostics, DiagnosticReport, DiagnosticsProvider};
use crate::document::DocumentState;
use crate::utils::{position_to_offset, range_to_lsp};
use parking_lot::RwLock;
use std::sync::Arc;
use tessel::{AstNodeDescription, DocumentUri, LanguageServices, TesselResult, TesselResultExt};
use tokio::sync::mpsc;
use tower_lsp::jsonrpc::{self, ErrorCode, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

fn to_document_uri(url: &Url) -> DocumentUri {
    DocumentUri::from(url.as_str())
}

fn to_url(uri: &DocumentUri) -> Option<Url> {
    Url::parse(uri.as_str()).ok()
}

pub struct TesselLanguageServer {
    client: Client,
    builder: Arc<DocumentBuilder>,
    diagnostics: DiagnosticsProvider,
    config: Arc<RwLock<ServerConfig>>,
}

impl TesselLanguageServer {
    pub fn new(client: Client, services: Arc<LanguageServices>) -> Self {
        let builder = Arc::new(DocumentBuilder::new(services));
        let diagnostics = DiagnosticsProvider::new(Arc::clone(&builder));
        let config = Arc::new(RwLock::new(ServerConfig::default()));

        let (tx, rx) = mpsc::unbounded_channel();
        builder.on_build_phase(Box::new(move |phase, uris| {
            if phase == DocumentState::Validated && !uris.is_empty() {
                let _ = tx.send(uris.to_vec());
            }
        }));
        tokio::spawn(publish_diagnostics(
            client.clone(),
            Arc::clone(&builder),
            Arc::clone(&config),
            rx,
        ));

        Self {
            client,
            builder,
            diagnostics,
            config,
        }
    }

    pub fn builder(&self) -> &Arc<DocumentBuilder> {
        &self.builder
    }

    pub fn config(&self) -> ServerConfig {
        self.config.read().clone()
    }

    async fn reject_too_large(&self, uri: &Url, len: usize) -> bool {
        let max_size = self.config.read().max_document_size;
        if len <= max_size {
            return false;
        }
        error!(
            "Document size limit exceeded: {} has {} bytes > {} bytes maximum",
            uri, len, max_size
        );
        self.client
            .show_message(
                MessageType::ERROR,
                format!(
                    "Document too large: {} bytes exceeds maximum of {} bytes ({} MB)",
                    len,
                    max_size,
                    max_size / BYTES_PER_MEGABYTE
                ),
            )
            .await;
        true
    }

    async fn rebuild(&self, changed: Vec<DocumentUri>, deleted: Vec<DocumentUri>) {
        if self.builder.update(changed, deleted).await.is_err() {
            debug!("Rebuild superseded or cancelled");
        }
    }

    /// The declaration a reference at `position` resolves to.
    fn target_at(&self, uri: &DocumentUri, position: Position) -> Option<AstNodeDescription> {
        let document = self.builder.documents().get(uri)?;
        let doc = document.lock();
        if doc.state() < DocumentState::Linked {
            return None;
        }
        let parsed = doc.parsed()?;
        let offset = position_to_offset(doc.rope(), position);
        let reference = parsed.ast.reference_at(offset)?;
        parsed.ast.reference(reference).target().cloned()
    }

    fn location_of(&self, target: &AstNodeDescription) -> Option<Location> {
        let url = to_url(&target.uri)?;
        let document = self.builder.documents().get(&target.uri)?;
        let doc = document.lock();
        let range = target
            .name_range
            .map(|r| range_to_lsp(doc.rope(), r))
            .unwrap_or_default();
        Some(Location::new(url, range))
    }
}

async fn read_document(url: &Url) -> TesselResult<String> {
    let path = url
        .to_file_path()
        .map_err(|_| tessel::TesselError::config(format!("not a file URI: {}", url)))?;
    tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("while reloading {}", path.display()))
}

/// Publishes the diagnostics of every document a build validated.
async fn publish_diagnostics(
    client: Client,
    builder: Arc<DocumentBuilder>,
    config: Arc<RwLock<ServerConfig>>,
    mut rx: mpsc::UnboundedReceiver<Vec<DocumentUri>>,
) {
    while let Some(uris) = rx.recv().await {
        if !config.read().push_diagnostics {
            continue;
        }
        for uri in uris {
            let Some(url) = to_url(&uri) else {
                continue;
            };
            let report = builder.documents().get(&uri).and_then(|document| {
                let doc = document.lock();
                if doc.state() != DocumentState::Validated {
                    return None;
                }
                Some((document_diagnostics(&doc), doc.version()))
            });
            if let Some((items, version)) = report {
                debug!("Publishing {} diagnostics for {}", items.len(), uri);
                client.publish_diagnostics(url, items, Some(version)).await;
            }
        }
    }
}

fn cancelled_error() -> jsonrpc::Error {
    jsonrpc::Error {
        code: ErrorCode::from(REQUEST_CANCELLED),
        message: "request cancelled".into(),
        data: None,
    }
}

fn full_report(result_id: Option<String>, items: Vec<Diagnostic>) -> DocumentDiagnosticReportResult {
    DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(
        RelatedFullDocumentDiagnosticReport {
            related_documents: None,
            full_document_diagnostic_report: FullDocumentDiagnosticReport { result_id, items },
        },
    ))
}

#[tower_lsp::async_trait]
impl LanguageServer for TesselLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Tessel Language Server initializing");
        let config = ServerConfig::from_initialization_options(params.initialization_options);
        self.builder.set_options(BuildOptions {
            validation: config.validation_options(),
        });
        debug!("Server configuration: {:?}", config);
        *self.config.write() = config;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        will_save: None,
                        will_save_wait_until: None,
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                    },
                )),
                definition_provider: Some(OneOf::Left(true)),
                diagnostic_provider: Some(DiagnosticServerCapabilities::Options(
                    DiagnosticOptions {
                        identifier: Some(DIAGNOSTIC_PROVIDER_ID.to_string()),
                        inter_file_dependencies: true,
                        workspace_diagnostics: false,
                        work_done_progress_options: Default::default(),
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "tessel-lsp".to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!(
            "Tessel Language Server initialized for '{}'",
            self.builder.services().language_id()
        );
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Tessel Language Server shutting down");
        self.builder.shutdown();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        info!("Document opened: {} ({} bytes)", item.uri, item.text.len());
        if self.reject_too_large(&item.uri, item.text.len()).await {
            return;
        }
        let uri = to_document_uri(&item.uri);
        let change = DocumentChange::Set {
            uri,
            version: item.version,
            text: item.text,
        };
        if self.builder.apply(change).is_ok() {
            // Opening rebuilds immediately.
            self.rebuild(Vec::new(), Vec::new()).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let url = &params.text_document.uri;
        debug!(
            "Document change event received for: {} ({} changes)",
            url,
            params.content_changes.len()
        );
        let change = DocumentChange::Edit {
            uri: to_document_uri(url),
            version: params.text_document.version,
            changes: params.content_changes,
        };
        match self.builder.apply(change) {
            Ok(len) => {
                let max_size = self.config.read().max_document_size;
                if len > max_size {
                    warn!("Document {} grew past the size limit ({} bytes)", url, len);
                }
                self.builder.schedule(self.config.read().debounce());
            }
            Err(e) => warn!("Ignoring change to {}: {}", url, e),
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        debug!("Document saved: {}", params.text_document.uri);
        let uri = to_document_uri(&params.text_document.uri);
        if let Some(text) = params.text {
            if self.reject_too_large(&params.text_document.uri, text.len()).await {
                return;
            }
            let version = self
                .builder
                .documents()
                .get(&uri)
                .map(|doc| doc.lock().version())
                .unwrap_or_default();
            if self
                .builder
                .apply(DocumentChange::Set { uri, version, text })
                .is_err()
            {
                return;
            }
        }
        // Saving flushes any debounced edits.
        self.rebuild(Vec::new(), Vec::new()).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);
        let uri = to_document_uri(&params.text_document.uri);
        self.rebuild(Vec::new(), vec![uri]).await;
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let services = Arc::clone(self.builder.services());
        let mut deleted = Vec::new();
        let mut reloaded = false;
        for event in params.changes {
            let uri = to_document_uri(&event.uri);
            if event.typ == FileChangeType::DELETED {
                if self.builder.documents().contains(&uri) {
                    deleted.push(uri);
                }
                continue;
            }
            if !services.handles(&uri) {
                continue;
            }
            match read_document(&event.uri).await {
                Ok(text) => {
                    if self.reject_too_large(&event.uri, text.len()).await {
                        continue;
                    }
                    let version = self
                        .builder
                        .documents()
                        .get(&uri)
                        .map(|doc| doc.lock().version())
                        .unwrap_or_default();
                    reloaded |= self
                        .builder
                        .apply(DocumentChange::Set { uri, version, text })
                        .is_ok();
                }
                Err(e) => warn!("Failed to reload {}: {}", event.uri, e),
            }
        }
        if reloaded || !deleted.is_empty() {
            info!("Watched files changed ({} deleted)", deleted.len());
            self.rebuild(Vec::new(), deleted).await;
        }
    }

    async fn diagnostic(
        &self,
        params: DocumentDiagnosticParams,
    ) -> Result<DocumentDiagnosticReportResult> {
        let uri = to_document_uri(&params.text_document.uri);
        let cancel = tessel::CancellationToken::new();
        let report = self
            .diagnostics
            .get_diagnostics(&uri, params.previous_result_id.as_deref(), &cancel)
            .await;
        match report {
            Ok(DiagnosticReport::Full { result_id, items }) => {
                Ok(full_report(Some(result_id), items))
            }
            Ok(DiagnosticReport::Unchanged { result_id }) => {
                Ok(DocumentDiagnosticReportResult::Report(
                    DocumentDiagnosticReport::Unchanged(RelatedUnchangedDocumentDiagnosticReport {
                        related_documents: None,
                        unchanged_document_diagnostic_report: UnchangedDocumentDiagnosticReport {
                            result_id,
                        },
                    }),
                ))
            }
            Err(BuildError::Cancelled) => Err(cancelled_error()),
            Err(BuildError::DocumentNotFound) => {
                debug!("Diagnostics requested for unknown document {}", uri);
                Ok(full_report(None, Vec::new()))
            }
            Err(BuildError::Interrupted) => Err(jsonrpc::Error {
                code: ErrorCode::ContentModified,
                message: "document changed during the request".into(),
                data: None,
            }),
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let url = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!(
            "Definition request for {} at {}:{}",
            url, position.line, position.character
        );
        let Some(target) = self.target_at(&to_document_uri(url), position) else {
            return Ok(None);
        };
        Ok(self
            .location_of(&target)
            .map(GotoDefinitionResponse::Scalar))
    }
}
