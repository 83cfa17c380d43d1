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

//! Workspace-wide index of exported symbols.

use dashmap::DashMap;
use tessel::{AstNodeDescription, DocumentUri};
use tessel_core::GlobalScope;

/// Exported descriptions of every indexed document.
///
/// This is the global scope of cross-document linking.
#[derive(Debug, Default)]
pub struct IndexManager {
    exports: DashMap<DocumentUri, Vec<AstNodeDescription>>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, uri: DocumentUri, exports: Vec<AstNodeDescription>) {
        self.exports.insert(uri, exports);
    }

    pub fn remove(&self, uri: &DocumentUri) {
        self.exports.remove(uri);
    }

    pub fn exports_of(&self, uri: &DocumentUri) -> Vec<AstNodeDescription> {
        self.exports
            .get(uri)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    /// Number of indexed descriptions.
    pub fn len(&self) -> usize {
        self.exports.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GlobalScope for IndexManager {
    fn lookup(&self, name: &str) -> Vec<AstNodeDescription> {
        self.exports
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .filter(|d| d.name == name)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
