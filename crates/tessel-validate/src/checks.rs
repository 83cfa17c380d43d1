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

//! Built-in checks

use crate::acceptor::{DiagnosticInfo, ValidationAcceptor};
use crate::diagnostic::codes;
use crate::registry::ValidationCheck;
use std::collections::HashMap;
use tessel_core::{NodeRef, Resolution};

/// Check: every linked reference resolved.
///
/// Register it with `register_for_all` for languages whose references
/// must all resolve. References that were never linked are skipped.
pub struct ReferencesResolved;

impl ValidationCheck for ReferencesResolved {
    fn id(&self) -> &str {
        "references-resolved"
    }

    fn description(&self) -> &str {
        "Report references that could not be resolved"
    }

    fn check(&self, node: NodeRef<'_>, acceptor: &mut ValidationAcceptor) {
        for (_, reference) in node.references() {
            if let Some(Resolution::Unresolved { message }) = reference.resolution() {
                acceptor.error(
                    message.clone(),
                    DiagnosticInfo::new(node)
                        .on_property(reference.property())
                        .at_index(reference.index())
                        .with_code(codes::LINKING_ERROR),
                );
            }
        }
    }
}

/// Check: named children of an array property have distinct names.
pub struct UniqueNames {
    id: String,
    property: String,
}

impl UniqueNames {
    pub fn new(property: &str) -> Self {
        Self {
            id: format!("unique-names-{}", property),
            property: property.to_string(),
        }
    }
}

impl ValidationCheck for UniqueNames {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "Check that sibling declarations have distinct names"
    }

    fn check(&self, node: NodeRef<'_>, acceptor: &mut ValidationAcceptor) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for child in node.children(&self.property) {
            let Some(name) = child.string("name") else {
                continue;
            };
            *seen.entry(name).or_default() += 1;
        }
        for child in node.children(&self.property) {
            let Some(name) = child.string("name") else {
                continue;
            };
            if seen.get(name).copied().unwrap_or(0) > 1 {
                acceptor.error(
                    format!("Duplicate {} '{}'.", child.type_name(), name),
                    DiagnosticInfo::new(child)
                        .on_property("name")
                        .with_code("duplicate-name"),
                );
            }
        }
    }
}
