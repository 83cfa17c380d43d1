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

//! The set of workspace documents.

use crate::document::Document;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tessel::DocumentUri;

/// Documents by URI.
///
/// Each document sits behind its own `parking_lot::Mutex`. The lock is never
/// held across an `.await`.
#[derive(Debug, Default)]
pub struct Documents {
    documents: DashMap<DocumentUri, Arc<Mutex<Document>>>,
}

impl Documents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &DocumentUri) -> Option<Arc<Mutex<Document>>> {
        self.documents.get(uri).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, uri: &DocumentUri) -> bool {
        self.documents.contains_key(uri)
    }

    pub(crate) fn insert(&self, document: Document) -> Arc<Mutex<Document>> {
        let uri = document.uri().clone();
        let document = Arc::new(Mutex::new(document));
        self.documents.insert(uri, Arc::clone(&document));
        document
    }

    pub(crate) fn remove(&self, uri: &DocumentUri) -> bool {
        self.documents.remove(uri).is_some()
    }

    /// All URIs in sorted order, the order builds visit documents in.
    pub fn uris(&self) -> Vec<DocumentUri> {
        let mut uris: Vec<_> = self.documents.iter().map(|e| e.key().clone()).collect();
        uris.sort();
        uris
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
