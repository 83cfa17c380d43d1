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

//! Tessel Language Server Protocol (LSP) Implementation
//!
//! Serves a Tessel language to LSP-compatible editors. Every open document
//! is driven through the workspace build by a [`DocumentBuilder`]; requests
//! wait for the state they need.
//!
//! # Features
//!
//! - **Diagnostics**: pull diagnostics with result ids, plus optional push
//!   after each build
//! - **Go to Definition**: through resolved cross-references, across documents
//! - **Incremental Sync**: edits are applied to a rope and rebuilt after a
//!   debounce delay
//! - **Watched Files**: deleted files leave the workspace, changed files are
//!   reloaded from disk
//!
//! # Configuration
//!
//! See [`ServerConfig`] for the `initializationOptions` the server reads.
//!
//! # Usage
//!
//! ```bash
//! tessel-lsp
//! ```
//!
//! The server speaks LSP over stdio and logs to stderr. Set `RUST_LOG` to
//! change the log level.

mod backend;
pub mod builder;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod document;
pub mod documents;
pub mod index;
pub mod utils;

pub use backend::TesselLanguageServer;
pub use builder::{BuildError, BuildOptions, DocumentBuilder, DocumentChange};
pub use config::ServerConfig;
pub use diagnostics::{DiagnosticReport, DiagnosticsProvider};
pub use document::{Document, DocumentState};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
