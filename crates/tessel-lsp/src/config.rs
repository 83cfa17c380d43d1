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

//! Server configuration.
//!
//! Read once from the `initializationOptions` of the `initialize` request:
//!
//! ```json
//! {
//!   "pushDiagnostics": true,
//!   "debounceMs": 200,
//!   "maxDocumentSize": 67108864,
//!   "includeSlowChecks": false
//! }
//! ```
//!
//! Every field is optional. Unknown fields are ignored.

use crate::constants::{DEBOUNCE_MS, DEFAULT_MAX_DOCUMENT_SIZE};
use serde::Deserialize;
use std::time::Duration;
use tessel::ValidationOptions;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Publish diagnostics after every build, in addition to pull requests.
    pub push_diagnostics: bool,
    pub debounce_ms: u64,
    /// Documents larger than this many bytes are not opened.
    pub max_document_size: usize,
    /// Run checks of the slow category too.
    pub include_slow_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            push_diagnostics: false,
            debounce_ms: DEBOUNCE_MS,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            include_slow_checks: false,
        }
    }
}

impl ServerConfig {
    /// Parses initialization options, falling back to the defaults when
    /// they are absent or malformed.
    pub fn from_initialization_options(options: Option<serde_json::Value>) -> Self {
        let Some(value) = options else {
            return Self::default();
        };
        match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring malformed initialization options: {}", e);
                Self::default()
            }
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validation_options(&self) -> ValidationOptions {
        if self.include_slow_checks {
            ValidationOptions::all_categories()
        } else {
            ValidationOptions::default()
        }
    }
}
