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

//! Tests of the language server handlers.
//!
//! The server is built through `LspService::new` and driven through
//! `service.inner()`, without a connected client.

use serde_json::json;
use std::sync::Arc;
use tessel::domainmodel::domainmodel;
use tessel_lsp::constants::REQUEST_CANCELLED;
use tessel_lsp::TesselLanguageServer;
use tower_lsp::lsp_types::*;
use tower_lsp::{LanguageServer, LspService};

macro_rules! test_server {
    () => {{
        let (service, _socket) = LspService::new(|client| {
            TesselLanguageServer::new(client, Arc::new(domainmodel().unwrap()))
        });
        service
    }};
}

fn url(name: &str) -> Url {
    Url::parse(&format!("file:///{}.dmodel", name)).unwrap()
}

async fn initialize(server: &TesselLanguageServer, options: serde_json::Value) {
    let params = InitializeParams {
        initialization_options: Some(options),
        ..Default::default()
    };
    server.initialize(params).await.unwrap();
}

async fn open(server: &TesselLanguageServer, name: &str, text: &str) {
    server
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: url(name),
                language_id: "domainmodel".to_string(),
                version: 1,
                text: text.to_string(),
            },
        })
        .await;
}

async fn pull(
    server: &TesselLanguageServer,
    name: &str,
    previous_result_id: Option<String>,
) -> tower_lsp::jsonrpc::Result<DocumentDiagnosticReportResult> {
    server
        .diagnostic(DocumentDiagnosticParams {
            text_document: TextDocumentIdentifier { uri: url(name) },
            identifier: None,
            previous_result_id,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        })
        .await
}

/// Items and result id of a full report. Panics on anything else.
fn full(result: DocumentDiagnosticReportResult) -> (Vec<Diagnostic>, Option<String>) {
    match result {
        DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(report)) => (
            report.full_document_diagnostic_report.items,
            report.full_document_diagnostic_report.result_id,
        ),
        other => panic!("expected a full report, got {:?}", other),
    }
}

// ============================================================================
// Initialize/Shutdown Tests
// ============================================================================

#[tokio::test]
async fn test_initialize_capabilities() {
    let service = test_server!();
    let server = service.inner();
    let result = server.initialize(InitializeParams::default()).await.unwrap();

    let capabilities = result.capabilities;
    assert!(capabilities.definition_provider.is_some());
    assert!(capabilities.diagnostic_provider.is_some());
    match capabilities.text_document_sync {
        Some(TextDocumentSyncCapability::Options(options)) => {
            assert_eq!(options.change, Some(TextDocumentSyncKind::INCREMENTAL));
            assert_eq!(options.open_close, Some(true));
        }
        other => panic!("unexpected sync capability: {:?}", other),
    }
    assert_eq!(result.server_info.unwrap().name, "tessel-lsp");
}

#[tokio::test]
async fn test_initialization_options_are_read() {
    let service = test_server!();
    let server = service.inner();
    initialize(
        server,
        json!({ "debounceMs": 5, "pushDiagnostics": true, "includeSlowChecks": true }),
    )
    .await;
    let config = server.config();
    assert_eq!(config.debounce_ms, 5);
    assert!(config.push_diagnostics);
    assert!(config.include_slow_checks);
}

#[tokio::test]
async fn test_shutdown_cancels_diagnostic_requests() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    open(server, "a", "class A {}").await;
    server.shutdown().await.unwrap();

    server
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: url("a"),
                version: 2,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "class B {}".to_string(),
            }],
        })
        .await;
    let err = pull(server, "a", None).await.unwrap_err();
    assert_eq!(err.code.code(), REQUEST_CANCELLED);
}

// ============================================================================
// Diagnostics Tests
// ============================================================================

#[tokio::test]
async fn test_open_and_pull_diagnostics() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    open(server, "a", "class A extends Missing {}").await;

    let (items, result_id) = full(pull(server, "a", None).await.unwrap());
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.message, "Could not resolve reference to Class named 'Missing'.");
    assert_eq!(item.severity, Some(DiagnosticSeverity::ERROR));
    assert_eq!(item.source.as_deref(), Some("tessel"));
    assert_eq!(
        item.code,
        Some(NumberOrString::String("linking-error".to_string()))
    );
    assert_eq!(
        item.range,
        Range::new(Position::new(0, 16), Position::new(0, 23))
    );

    let second = pull(server, "a", result_id.clone()).await.unwrap();
    match second {
        DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Unchanged(report)) => {
            assert_eq!(
                Some(report.unchanged_document_diagnostic_report.result_id),
                result_id
            );
        }
        other => panic!("expected an unchanged report, got {:?}", other),
    }
}

#[tokio::test]
async fn test_incremental_change_is_rebuilt() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({ "debounceMs": 10 })).await;
    open(server, "a", "class A {} class B extends C {}").await;
    let (items, first_id) = full(pull(server, "a", None).await.unwrap());
    assert_eq!(items.len(), 1);

    server
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: url("a"),
                version: 2,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: Some(Range::new(Position::new(0, 27), Position::new(0, 28))),
                range_length: Some(1),
                text: "A".to_string(),
            }],
        })
        .await;

    let (items, second_id) = full(pull(server, "a", first_id.clone()).await.unwrap());
    assert!(items.is_empty(), "{:?}", items);
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_slow_checks_follow_configuration() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({ "includeSlowChecks": true })).await;
    open(server, "a", "datatype Unused").await;
    let (items, _) = full(pull(server, "a", None).await.unwrap());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].severity, Some(DiagnosticSeverity::HINT));
    assert_eq!(items[0].tags, Some(vec![DiagnosticTag::UNNECESSARY]));
}

#[tokio::test]
async fn test_unknown_document_has_empty_report() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    let (items, result_id) = full(pull(server, "nowhere", None).await.unwrap());
    assert!(items.is_empty());
    assert!(result_id.is_none());
}

#[tokio::test]
async fn test_too_large_document_is_not_opened() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({ "maxDocumentSize": 8 })).await;
    open(server, "a", "class A {} class B {}").await;
    assert!(server.builder().documents().is_empty());
}

// ============================================================================
// Document Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_close_removes_document() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    open(server, "a", "class A {}").await;
    open(server, "b", "class B extends A {}").await;
    let (items, _) = full(pull(server, "b", None).await.unwrap());
    assert!(items.is_empty());

    server
        .did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: url("a") },
        })
        .await;
    assert!(!server.builder().documents().contains(&url("a").as_str().into()));
    let (items, _) = full(pull(server, "b", None).await.unwrap());
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_save_with_text_rebuilds() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    open(server, "a", "class a {}").await;
    let (items, _) = full(pull(server, "a", None).await.unwrap());
    assert_eq!(items.len(), 1);

    server
        .did_save(DidSaveTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: url("a") },
            text: Some("class A {}".to_string()),
        })
        .await;
    let (items, _) = full(pull(server, "a", None).await.unwrap());
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_watched_file_deletion() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    open(server, "a", "class A {}").await;
    open(server, "b", "class B extends A {}").await;

    server
        .did_change_watched_files(DidChangeWatchedFilesParams {
            changes: vec![FileEvent::new(url("a"), FileChangeType::DELETED)],
        })
        .await;
    let (items, _) = full(pull(server, "b", None).await.unwrap());
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_watched_file_is_reloaded_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lib.dmodel");
    std::fs::write(&path, "class A {}").unwrap();
    let lib = Url::from_file_path(&path).unwrap();

    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    open(server, "b", "class B extends A {}").await;
    let (items, _) = full(pull(server, "b", None).await.unwrap());
    assert_eq!(items.len(), 1);

    server
        .did_change_watched_files(DidChangeWatchedFilesParams {
            changes: vec![FileEvent::new(lib, FileChangeType::CREATED)],
        })
        .await;
    let (items, _) = full(pull(server, "b", None).await.unwrap());
    assert!(items.is_empty(), "{:?}", items);
}

#[tokio::test]
async fn test_watched_file_of_other_language_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "class A {}").unwrap();

    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    server
        .did_change_watched_files(DidChangeWatchedFilesParams {
            changes: vec![FileEvent::new(
                Url::from_file_path(&path).unwrap(),
                FileChangeType::CHANGED,
            )],
        })
        .await;
    assert!(server.builder().documents().is_empty());
}

// ============================================================================
// Definition Tests
// ============================================================================

#[tokio::test]
async fn test_goto_definition_across_documents() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    open(server, "a", "class A {}").await;
    open(server, "b", "class B extends A {}").await;

    let response = server
        .goto_definition(GotoDefinitionParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: url("b") },
                position: Position::new(0, 16),
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        })
        .await
        .unwrap();
    match response {
        Some(GotoDefinitionResponse::Scalar(location)) => {
            assert_eq!(location.uri, url("a"));
            assert_eq!(
                location.range,
                Range::new(Position::new(0, 6), Position::new(0, 7))
            );
        }
        other => panic!("unexpected definition response: {:?}", other),
    }
}

#[tokio::test]
async fn test_goto_definition_off_reference() {
    let service = test_server!();
    let server = service.inner();
    initialize(server, json!({})).await;
    open(server, "a", "class A {}").await;

    let response = server
        .goto_definition(GotoDefinitionParams {
            text_document_position_params: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: url("a") },
                position: Position::new(0, 1),
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        })
        .await
        .unwrap();
    assert!(response.is_none());
}
