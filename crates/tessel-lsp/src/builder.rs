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

//! The document builder.
//!
//! Drives every workspace document through the build phases:
//!
//! ```text
//! Changed -> Parsed -> IndexedContent -> ComputedScopes -> Linked -> Validated
//! ```
//!
//! Each phase runs for every document before the next phase starts, so
//! linking sees the exports of the whole workspace. A phase only runs for a
//! document sitting exactly in the preceding state; anything else was
//! invalidated in the meantime and is rebuilt by the next update.
//!
//! # Concurrency
//!
//! Builds are serialized by an async lock. An update cancels the build in
//! flight before invalidating documents, then waits for the lock. A phase
//! for one document runs without yielding; the builder yields between
//! documents and checks for cancellation there.

use crate::document::{Document, DocumentState};
use crate::documents::Documents;
use crate::index::IndexManager;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tessel::{CancellationToken, Cancelled, DocumentUri, LanguageServices, ValidationOptions};
use tessel_core::LinkContext;
use thiserror::Error;
use tokio::sync::Notify;
use tower_lsp::lsp_types::TextDocumentContentChangeEvent;
use tracing::{debug, info, trace};

/// Errors of builder waits and diagnostic requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("document not found")]
    DocumentNotFound,
    /// No build is pending and the document is still below the target state.
    #[error("document build was interrupted")]
    Interrupted,
}

impl From<Cancelled> for BuildError {
    fn from(_: Cancelled) -> Self {
        BuildError::Cancelled
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub validation: ValidationOptions,
}

/// A change to the text of a document.
#[derive(Debug, Clone)]
pub enum DocumentChange {
    /// Replaces the whole text, creating the document if needed.
    Set {
        uri: DocumentUri,
        version: i32,
        text: String,
    },
    /// Applies incremental edits to an existing document.
    Edit {
        uri: DocumentUri,
        version: i32,
        changes: Vec<TextDocumentContentChangeEvent>,
    },
}

impl DocumentChange {
    pub fn uri(&self) -> &DocumentUri {
        match self {
            DocumentChange::Set { uri, .. } | DocumentChange::Edit { uri, .. } => uri,
        }
    }
}

/// Called after each phase with the documents that reached it.
pub type BuildPhaseListener = Box<dyn Fn(DocumentState, &[DocumentUri]) + Send + Sync>;

/// Called on invalidation with the changed and the deleted documents.
pub type UpdateListener = Box<dyn Fn(&[DocumentUri], &[DocumentUri]) + Send + Sync>;

/// Counts a pending build for as long as it lives.
struct Pending<'a> {
    count: &'a AtomicUsize,
    notify: &'a Notify,
}

impl<'a> Pending<'a> {
    fn enter(count: &'a AtomicUsize, notify: &'a Notify) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self::adopt(count, notify)
    }

    /// Takes over a count that was already incremented.
    fn adopt(count: &'a AtomicUsize, notify: &'a Notify) -> Self {
        Self { count, notify }
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}

pub struct DocumentBuilder {
    services: Arc<LanguageServices>,
    documents: Documents,
    index: IndexManager,
    options: RwLock<BuildOptions>,
    build_lock: tokio::sync::Mutex<()>,
    current: Mutex<CancellationToken>,
    shutdown: CancellationToken,
    pending: AtomicUsize,
    ticket: AtomicU64,
    state_changed: Notify,
    phase_listeners: RwLock<Vec<BuildPhaseListener>>,
    update_listeners: RwLock<Vec<UpdateListener>>,
}

impl DocumentBuilder {
    pub fn new(services: Arc<LanguageServices>) -> Self {
        Self {
            services,
            documents: Documents::new(),
            index: IndexManager::new(),
            options: RwLock::new(BuildOptions::default()),
            build_lock: tokio::sync::Mutex::new(()),
            current: Mutex::new(CancellationToken::new()),
            shutdown: CancellationToken::new(),
            pending: AtomicUsize::new(0),
            ticket: AtomicU64::new(0),
            state_changed: Notify::new(),
            phase_listeners: RwLock::new(Vec::new()),
            update_listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn services(&self) -> &Arc<LanguageServices> {
        &self.services
    }

    pub fn documents(&self) -> &Documents {
        &self.documents
    }

    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    pub fn set_options(&self, options: BuildOptions) {
        *self.options.write() = options;
    }

    pub fn on_build_phase(&self, listener: BuildPhaseListener) {
        self.phase_listeners.write().push(listener);
    }

    pub fn on_update(&self, listener: UpdateListener) {
        self.update_listeners.write().push(listener);
    }

    /// State of `uri`, if it is in the workspace.
    pub fn state(&self, uri: &DocumentUri) -> Option<DocumentState> {
        self.documents.get(uri).map(|doc| doc.lock().state())
    }

    /// Number of scheduled or running builds.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Applies a text change and invalidates the document.
    ///
    /// Cancels the build in flight, which would otherwise keep linking
    /// against the pruned index. Returns the new length of the document in
    /// bytes. The document is not rebuilt; call [`update`](Self::update) or
    /// [`schedule`](Self::schedule).
    pub fn apply(&self, change: DocumentChange) -> Result<usize, BuildError> {
        let uri = change.uri().clone();
        if let DocumentChange::Edit { uri, .. } = &change {
            if !self.documents.contains(uri) {
                return Err(BuildError::DocumentNotFound);
            }
        }
        self.current.lock().cancel();
        let len = match change {
            DocumentChange::Set { uri, version, text } => match self.documents.get(&uri) {
                Some(doc) => {
                    let mut doc = doc.lock();
                    doc.set_text(version, &text);
                    doc.len_bytes()
                }
                None => {
                    let len = text.len();
                    self.documents.insert(Document::new(uri, version, &text));
                    len
                }
            },
            DocumentChange::Edit {
                uri,
                version,
                changes,
            } => {
                let doc = self
                    .documents
                    .get(&uri)
                    .ok_or(BuildError::DocumentNotFound)?;
                let mut doc = doc.lock();
                doc.apply_changes(version, &changes);
                doc.len_bytes()
            }
        };
        self.invalidate(&[uri], &[]);
        Ok(len)
    }

    /// Invalidates `changed`, removes `deleted`, then rebuilds the workspace.
    ///
    /// Returns `Err(Cancelled)` if a later update or shutdown interrupted
    /// the build.
    pub async fn update(
        &self,
        changed: Vec<DocumentUri>,
        deleted: Vec<DocumentUri>,
    ) -> Result<(), Cancelled> {
        let _pending = Pending::enter(&self.pending, &self.state_changed);
        self.run_update(&changed, &deleted).await
    }

    /// Rebuilds the workspace after `delay`, unless another schedule
    /// supersedes this one first.
    pub fn schedule(self: &Arc<Self>, delay: Duration) {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending.fetch_add(1, Ordering::SeqCst);
        let builder = Arc::clone(self);
        tokio::spawn(async move {
            let _pending = Pending::adopt(&builder.pending, &builder.state_changed);
            tokio::time::sleep(delay).await;
            if builder.ticket.load(Ordering::SeqCst) != ticket {
                trace!(ticket, "scheduled build superseded");
                return;
            }
            let _ = builder.run_update(&[], &[]).await;
        });
    }

    async fn run_update(
        &self,
        changed: &[DocumentUri],
        deleted: &[DocumentUri],
    ) -> Result<(), Cancelled> {
        self.shutdown.check()?;
        let cancel = {
            let mut current = self.current.lock();
            current.cancel();
            *current = CancellationToken::new();
            current.clone()
        };
        self.invalidate(changed, deleted);

        let _lock = self.build_lock.lock().await;
        let result = self.build(&cancel).await;
        if result.is_err() {
            debug!("build cancelled");
        }
        result
    }

    /// Resets changed documents, removes deleted ones and unlinks every
    /// document that may now resolve differently.
    fn invalidate(&self, changed: &[DocumentUri], deleted: &[DocumentUri]) {
        for uri in changed {
            if let Some(doc) = self.documents.get(uri) {
                doc.lock().reset();
            }
            self.index.remove(uri);
        }
        for uri in deleted {
            self.documents.remove(uri);
            self.index.remove(uri);
        }

        let touched: HashSet<DocumentUri> = changed.iter().chain(deleted).cloned().collect();
        let mut relinked = Vec::new();
        if !touched.is_empty() {
            for uri in self.documents.uris() {
                if touched.contains(&uri) {
                    continue;
                }
                let Some(doc) = self.documents.get(&uri) else {
                    continue;
                };
                let mut doc = doc.lock();
                if doc.state() > DocumentState::ComputedScopes
                    && (doc.references_into(&touched) || doc.has_unresolved_references())
                {
                    doc.unlink();
                    relinked.push(uri);
                }
            }
        }
        if !relinked.is_empty() {
            debug!(count = relinked.len(), "unlinked dependent documents");
        }

        let mut changed = changed.to_vec();
        changed.extend(relinked);
        for listener in self.update_listeners.read().iter() {
            listener(&changed, deleted);
        }
        self.state_changed.notify_waiters();
    }

    async fn build(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let uris = self.documents.uris();
        let options = self.options.read().clone();
        for phase in DocumentState::PHASES {
            let mut advanced = Vec::new();
            for uri in &uris {
                cancel.check()?;
                if let Some(doc) = self.documents.get(uri) {
                    let mut doc = doc.lock();
                    if Some(doc.state()) == phase.previous() {
                        self.run_phase(phase, &mut doc, &options, cancel)?;
                        doc.advance(phase);
                        advanced.push(uri.clone());
                    }
                }
                tokio::task::yield_now().await;
            }
            trace!(%phase, documents = advanced.len(), "phase complete");
            self.state_changed.notify_waiters();
            for listener in self.phase_listeners.read().iter() {
                listener(phase, &advanced);
            }
        }
        info!(documents = uris.len(), "build complete");
        Ok(())
    }

    fn run_phase(
        &self,
        phase: DocumentState,
        doc: &mut Document,
        options: &BuildOptions,
        cancel: &CancellationToken,
    ) -> Result<(), Cancelled> {
        let services = &self.services;
        let uri = doc.uri().clone();
        match phase {
            DocumentState::Changed => {}
            DocumentState::Parsed => {
                let parsed = services.parse(&doc.text());
                if parsed.has_errors() {
                    debug!(
                        %uri,
                        lex = parsed.lex_errors.len(),
                        parse = parsed.parse_errors.len(),
                        "document has syntax errors"
                    );
                }
                doc.set_parsed(parsed);
            }
            DocumentState::IndexedContent => {
                let exports = match doc.parsed() {
                    Some(parsed) => {
                        services
                            .scope_computation()
                            .compute_exports(&parsed.ast, &uri, cancel)?
                    }
                    None => Vec::new(),
                };
                self.index.set(uri, exports.clone());
                doc.set_exports(exports);
            }
            DocumentState::ComputedScopes => {
                if let Some(parsed) = doc.parsed() {
                    let local = services
                        .scope_computation()
                        .compute_local_scopes(&parsed.ast, &uri, cancel)?;
                    doc.set_local_scopes(local);
                }
            }
            DocumentState::Linked => {
                // An interrupted link may have left partial resolutions behind.
                doc.clear_links();
                if let Some(parsed) = doc.parsed() {
                    let cx = LinkContext {
                        uri: &uri,
                        local: doc.local_scopes(),
                        global: &self.index,
                    };
                    let stats = services.linker().link(&parsed.ast, &cx, cancel)?;
                    trace!(%uri, resolved = stats.resolved, unresolved = stats.unresolved, "linked");
                }
            }
            DocumentState::Validated => {
                let diagnostics = match doc.parsed() {
                    Some(parsed) => services
                        .validator()
                        .validate(parsed, &uri, &options.validation, cancel)?,
                    None => Vec::new(),
                };
                doc.set_diagnostics(diagnostics);
            }
        }
        Ok(())
    }

    /// Waits until `uri` reaches at least `target`.
    ///
    /// Fails with [`BuildError::Cancelled`] when `cancel` or shutdown fires
    /// first, with [`BuildError::DocumentNotFound`] when the document is not
    /// in the workspace, and with [`BuildError::Interrupted`] once no build
    /// is pending but the document is still below `target`.
    pub async fn wait_until(
        &self,
        target: DocumentState,
        uri: &DocumentUri,
        cancel: &CancellationToken,
    ) -> Result<(), BuildError> {
        loop {
            // Registered before the checks so no notification is missed.
            let notified = self.state_changed.notified();
            cancel.check()?;
            self.shutdown.check()?;
            let state = self.state(uri).ok_or(BuildError::DocumentNotFound)?;
            if state >= target {
                return Ok(());
            }
            if self.pending() == 0 {
                return Err(BuildError::Interrupted);
            }
            tokio::select! {
                _ = notified => {}
                _ = cancel.cancelled() => return Err(BuildError::Cancelled),
                _ = self.shutdown.cancelled() => return Err(BuildError::Cancelled),
            }
        }
    }

    /// Cancels the build in flight and every current and future wait.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.current.lock().cancel();
        self.state_changed.notify_waiters();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel::domainmodel::domainmodel;

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(Arc::new(domainmodel().unwrap()))
    }

    fn set(uri: &str, text: &str) -> DocumentChange {
        DocumentChange::Set {
            uri: DocumentUri::from(uri),
            version: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_apply_creates_changed_document() {
        let builder = builder();
        let len = builder.apply(set("file:///a.dmodel", "class A {}")).unwrap();
        assert_eq!(len, 10);
        let uri = DocumentUri::from("file:///a.dmodel");
        assert_eq!(builder.state(&uri), Some(DocumentState::Changed));
    }

    #[test]
    fn test_edit_of_unknown_document_fails() {
        let builder = builder();
        let err = builder
            .apply(DocumentChange::Edit {
                uri: DocumentUri::from("file:///missing.dmodel"),
                version: 2,
                changes: Vec::new(),
            })
            .unwrap_err();
        assert_eq!(err, BuildError::DocumentNotFound);
    }

    #[test]
    fn test_build_error_from_cancelled() {
        assert_eq!(BuildError::from(Cancelled), BuildError::Cancelled);
        assert_eq!(BuildError::Interrupted.to_string(), "document build was interrupted");
    }
}
