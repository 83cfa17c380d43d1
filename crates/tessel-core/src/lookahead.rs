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

//! One-token lookahead analysis.
//!
//! Computed once per grammar, before any document is parsed. For every rule
//! the analysis records whether it can match the empty input and which
//! tokens can start it (its FIRST set). Element-level answers are derived
//! from the rule tables on demand. The analysis also rejects left-recursive
//! rules, which a top-down parser cannot execute.
//!
//! It never sees tokens, AST nodes or CST nodes.

use crate::error::{TesselError, TesselResult};
use crate::grammar::{Cardinality, Element, Grammar, RuleId, RuleKind};
use crate::lex::{Token, TokenKind};
use std::collections::BTreeSet;
use std::fmt;

/// Tokens that can start an element: keywords by text, other tokens by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstSet {
    keywords: BTreeSet<String>,
    kinds: BTreeSet<TokenKind>,
}

impl FirstSet {
    pub fn contains(&self, token: &Token) -> bool {
        if token.kind == TokenKind::Keyword {
            self.keywords.contains(&token.image)
        } else {
            self.kinds.contains(&token.kind)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.kinds.is_empty()
    }

    /// Adds `other`, reporting whether anything was new.
    pub(crate) fn union(&mut self, other: &FirstSet) -> bool {
        let before = self.keywords.len() + self.kinds.len();
        self.keywords.extend(other.keywords.iter().cloned());
        self.kinds.extend(other.kinds.iter().copied());
        before != self.keywords.len() + self.kinds.len()
    }

    /// Human-readable alternatives for error messages.
    pub fn describe(&self) -> Vec<String> {
        self.keywords
            .iter()
            .map(|k| format!("'{}'", k))
            .chain(self.kinds.iter().map(|k| k.to_string()))
            .collect()
    }
}

impl fmt::Display for FirstSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe().join(", "))
    }
}

/// Per-rule nullability and FIRST sets.
#[derive(Debug, Clone)]
pub struct Lookahead {
    nullable: Vec<bool>,
    first: Vec<FirstSet>,
    /// Token kind of each terminal rule.
    terminals: Vec<Option<TokenKind>>,
}

impl Lookahead {
    /// Runs the fixpoint over all rules and checks for left recursion.
    pub fn compute(grammar: &Grammar) -> TesselResult<Self> {
        let count = grammar.rules().count();
        let terminals = grammar
            .rules()
            .map(|(_, r)| match r.kind {
                RuleKind::Terminal { token, .. } => Some(token),
                _ => None,
            })
            .collect();
        let mut la = Self {
            nullable: vec![false; count],
            first: vec![FirstSet::default(); count],
            terminals,
        };

        let mut changed = true;
        while changed {
            changed = false;
            for (id, rule) in grammar.rules() {
                if rule.is_terminal() {
                    continue;
                }
                let first = la.first_of(&rule.body);
                let nullable = la.nullable(&rule.body);
                if la.first[id.index()].union(&first) {
                    changed = true;
                }
                if nullable && !la.nullable[id.index()] {
                    la.nullable[id.index()] = true;
                    changed = true;
                }
            }
        }

        la.check_left_recursion(grammar)?;
        Ok(la)
    }

    pub fn rule_nullable(&self, id: RuleId) -> bool {
        self.nullable.get(id.index()).copied().unwrap_or(false)
    }

    /// `true` if `element` can match without consuming a token.
    pub fn nullable(&self, element: &Element) -> bool {
        match element {
            Element::Keyword(_) => false,
            Element::RuleCall(id) | Element::CrossRef { rule: id, .. } => {
                self.terminals.get(id.index()).copied().flatten().is_none()
                    && self.rule_nullable(*id)
            }
            Element::Assignment { value, .. } => self.nullable(value),
            Element::Action { .. } => true,
            Element::Group(items) => items.iter().all(|e| self.nullable(e)),
            Element::Alternatives(items) => items.iter().any(|e| self.nullable(e)),
            Element::Repeat {
                element,
                cardinality,
            } => match cardinality {
                Cardinality::Optional | Cardinality::ZeroOrMore => true,
                Cardinality::OneOrMore => self.nullable(element),
            },
        }
    }

    /// FIRST set of an element.
    pub fn first_of(&self, element: &Element) -> FirstSet {
        let mut set = FirstSet::default();
        self.collect_first(element, &mut set);
        set
    }

    fn collect_first(&self, element: &Element, set: &mut FirstSet) {
        match element {
            Element::Keyword(text) => {
                set.keywords.insert(text.clone());
            }
            Element::RuleCall(id) | Element::CrossRef { rule: id, .. } => {
                match self.terminals.get(id.index()).copied().flatten() {
                    Some(kind) => {
                        set.kinds.insert(kind);
                    }
                    None => {
                        if let Some(first) = self.first.get(id.index()) {
                            set.union(first);
                        }
                    }
                }
            }
            Element::Assignment { value, .. } => self.collect_first(value, set),
            Element::Action { .. } => {}
            Element::Group(items) => {
                for item in items {
                    self.collect_first(item, set);
                    if !self.nullable(item) {
                        break;
                    }
                }
            }
            Element::Alternatives(items) => {
                for item in items {
                    self.collect_first(item, set);
                }
            }
            Element::Repeat { element, .. } => self.collect_first(element, set),
        }
    }

    /// `true` if `token` can start `element`.
    pub fn predicts(&self, element: &Element, token: &Token) -> bool {
        match element {
            Element::Keyword(text) => token.is_keyword(text),
            Element::RuleCall(id) | Element::CrossRef { rule: id, .. } => {
                match self.terminals.get(id.index()).copied().flatten() {
                    Some(kind) => token.kind == kind,
                    None => self
                        .first
                        .get(id.index())
                        .is_some_and(|first| first.contains(token)),
                }
            }
            Element::Assignment { value, .. } => self.predicts(value, token),
            Element::Action { .. } => false,
            Element::Group(items) => {
                for item in items {
                    if self.predicts(item, token) {
                        return true;
                    }
                    if !self.nullable(item) {
                        return false;
                    }
                }
                false
            }
            Element::Alternatives(items) => items.iter().any(|e| self.predicts(e, token)),
            Element::Repeat { element, .. } => self.predicts(element, token),
        }
    }

    fn check_left_recursion(&self, grammar: &Grammar) -> TesselResult<()> {
        // Rules reachable in leftmost position from each rule's body.
        let left_calls: Vec<Vec<RuleId>> = grammar
            .rules()
            .map(|(_, rule)| {
                let mut calls = Vec::new();
                if !rule.is_terminal() {
                    self.leftmost_calls(&rule.body, &mut calls);
                }
                calls
            })
            .collect();

        for (start, rule) in grammar.rules() {
            let mut seen = vec![false; left_calls.len()];
            let mut stack = left_calls[start.index()].clone();
            while let Some(next) = stack.pop() {
                if next == start {
                    return Err(TesselError::grammar(format!(
                        "rule '{}' is left-recursive",
                        rule.name
                    )));
                }
                if !std::mem::replace(&mut seen[next.index()], true) {
                    stack.extend(left_calls[next.index()].iter().copied());
                }
            }
        }
        Ok(())
    }

    /// Collects calls that can run before any token is consumed.
    fn leftmost_calls(&self, element: &Element, calls: &mut Vec<RuleId>) {
        match element {
            Element::RuleCall(id) | Element::CrossRef { rule: id, .. } => {
                if self.terminals.get(id.index()).copied().flatten().is_none() {
                    calls.push(*id);
                }
            }
            Element::Assignment { value, .. } => self.leftmost_calls(value, calls),
            Element::Group(items) => {
                for item in items {
                    self.leftmost_calls(item, calls);
                    if !self.nullable(item) {
                        break;
                    }
                }
            }
            Element::Alternatives(items) => {
                for item in items {
                    self.leftmost_calls(item, calls);
                }
            }
            Element::Repeat { element, .. } => self.leftmost_calls(element, calls),
            Element::Keyword(_) | Element::Action { .. } => {}
        }
    }
}
