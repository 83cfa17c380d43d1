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

//! LSP constants and tunables.
//!
//! Constants are organized by category:
//! - **Performance Tuning**: debounce delays
//! - **Memory Limits**: document size constraints
//! - **LSP Protocol**: protocol-specific values

// ============================================================================
// Performance Tuning
// ============================================================================

/// Delay between the last edit and the rebuild it triggers (in milliseconds).
///
/// Edits arriving within the window are folded into one build.
pub const DEBOUNCE_MS: u64 = 200;

// ============================================================================
// Memory Limits
// ============================================================================

/// Bytes per megabyte.
pub const BYTES_PER_MEGABYTE: usize = 1024 * 1024;

/// Default maximum document size in bytes (64 MB).
///
/// Larger documents are not opened. The whole pipeline keeps the rope,
/// the CST and the AST of every open document in memory.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 64 * BYTES_PER_MEGABYTE;

// ============================================================================
// LSP Protocol
// ============================================================================

/// `source` field of every published diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "tessel";

/// Identifier of the pull diagnostic provider.
pub const DIAGNOSTIC_PROVIDER_ID: &str = "tessel";

/// JSON-RPC error code of a cancelled request.
pub const REQUEST_CANCELLED: i64 = -32800;

/// Zero position (line 0, character 0).
pub const POSITION_ZERO: u32 = 0;
