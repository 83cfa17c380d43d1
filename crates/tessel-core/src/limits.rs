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

//! Resource limits for parsing.

/// Configurable limits for the parser.
///
/// These bound the resources a single parse may consume, so that a
/// pathological document cannot overflow the stack or exhaust memory.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum nesting of rule invocations (default: 512).
    pub max_rule_depth: usize,
    /// Maximum number of visible tokens per document (default: 10M).
    ///
    /// Tokens beyond the limit are dropped and a single parse error is
    /// recorded at the first dropped token.
    pub max_tokens: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_rule_depth: 512,
            max_tokens: 10_000_000,
        }
    }
}

impl Limits {
    /// Create limits with no restrictions (for testing).
    pub fn unlimited() -> Self {
        Self {
            max_rule_depth: usize::MAX,
            max_tokens: usize::MAX,
        }
    }

    pub fn with_max_rule_depth(mut self, depth: usize) -> Self {
        self.max_rule_depth = depth;
        self
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }
}
