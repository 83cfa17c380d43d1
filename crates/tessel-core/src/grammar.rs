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

//! Grammar model.
//!
//! A [`Grammar`] is a graph of [`Rule`]s whose bodies are [`Element`]
//! trees. There are three rule kinds:
//!
//! - **Parser rules** build AST nodes. They may declare a return type,
//!   or learn it from an action or an unassigned rule call.
//! - **Terminal rules** match one token of a given [`TokenKind`] and yield
//!   its converted value.
//! - **Data-type rules** combine several tokens into one string or number
//!   (`QualifiedName: ID ('.' ID)*`).
//!
//! Rules are declared first and defined afterwards, so bodies can refer to
//! each other in any order.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tessel_core::grammar::*;
//! use tessel_core::{PropertyKind, TokenKind, TypeHierarchyBuilder};
//!
//! let types = Arc::new(
//!     TypeHierarchyBuilder::new()
//!         .with_type("Model", &[], &[("names", PropertyKind::Array)])
//!         .build()
//!         .unwrap(),
//! );
//! let mut g = GrammarBuilder::new("Names", types);
//! let model = g.declare_parser("Model", Some("Model")).unwrap();
//! let id = g.declare_terminal("ID", TokenKind::Identifier, ValueKind::Id);
//! g.define(model, many(append("names", rule(id))));
//! let grammar = g.build(model).unwrap();
//! assert_eq!(grammar.rule(grammar.entry()).name, "Model");
//! ```

use crate::error::{TesselError, TesselResult};
use crate::lex::TokenKind;
use crate::types::{TypeHierarchy, TypeId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Index of a rule in its [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

/// How token text becomes a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Identifier: a leading `^` escape is removed.
    Id,
    /// Quoted string: quotes stripped, escapes processed.
    String,
    /// Number: parsed as `f64`.
    Number,
    /// Raw token text.
    Text,
}

/// Assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`: overwrite.
    Set,
    /// `?=`: set `true`.
    BoolSet,
    /// `+=`: append to an array.
    Add,
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Set => "=",
            Self::BoolSet => "?=",
            Self::Add => "+=",
        })
    }
}

/// Repetition of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

/// A node of a rule body.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Keyword(String),
    RuleCall(RuleId),
    Assignment {
        feature: String,
        op: AssignOp,
        value: Box<Element>,
    },
    /// `[Target:Rule]`, only valid as an assignment value.
    CrossRef { target: TypeId, rule: RuleId },
    /// `{T}` when `feature` is `None`, `{T.f=current}` / `{T.f+=current}` otherwise.
    Action {
        ty: TypeId,
        feature: Option<(String, AssignOp)>,
    },
    Group(Vec<Element>),
    Alternatives(Vec<Element>),
    Repeat {
        element: Box<Element>,
        cardinality: Cardinality,
    },
}

// Construction helpers, named after the grammar notation they stand for.

pub fn keyword(text: &str) -> Element {
    Element::Keyword(text.to_string())
}

pub fn rule(id: RuleId) -> Element {
    Element::RuleCall(id)
}

/// `feature=value`
pub fn assign(feature: &str, value: Element) -> Element {
    Element::Assignment {
        feature: feature.to_string(),
        op: AssignOp::Set,
        value: Box::new(value),
    }
}

/// `feature+=value`
pub fn append(feature: &str, value: Element) -> Element {
    Element::Assignment {
        feature: feature.to_string(),
        op: AssignOp::Add,
        value: Box::new(value),
    }
}

/// `feature?=value`
pub fn flag(feature: &str, value: Element) -> Element {
    Element::Assignment {
        feature: feature.to_string(),
        op: AssignOp::BoolSet,
        value: Box::new(value),
    }
}

pub fn cross_ref(target: TypeId, rule: RuleId) -> Element {
    Element::CrossRef { target, rule }
}

pub fn action(ty: TypeId) -> Element {
    Element::Action { ty, feature: None }
}

/// `{T.feature=current}` or `{T.feature+=current}`.
pub fn tree_action(ty: TypeId, feature: &str, op: AssignOp) -> Element {
    Element::Action {
        ty,
        feature: Some((feature.to_string(), op)),
    }
}

pub fn group(elements: Vec<Element>) -> Element {
    Element::Group(elements)
}

pub fn alternatives(elements: Vec<Element>) -> Element {
    Element::Alternatives(elements)
}

pub fn optional(element: Element) -> Element {
    repeat(element, Cardinality::Optional)
}

pub fn many(element: Element) -> Element {
    repeat(element, Cardinality::ZeroOrMore)
}

pub fn at_least_one(element: Element) -> Element {
    repeat(element, Cardinality::OneOrMore)
}

fn repeat(element: Element, cardinality: Cardinality) -> Element {
    Element::Repeat {
        element: Box::new(element),
        cardinality,
    }
}

/// What a rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Parser { returns: Option<TypeId> },
    Terminal { token: TokenKind, value: ValueKind },
    DataType { value: ValueKind },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub body: Element,
}

impl Rule {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, RuleKind::Terminal { .. })
    }
}

/// A validated grammar, ready for [`Parser::new`](crate::Parser::new).
#[derive(Debug, Clone)]
pub struct Grammar {
    name: String,
    types: Arc<TypeHierarchy>,
    rules: Vec<Rule>,
    entry: RuleId,
    entry_type: TypeId,
    keywords: Vec<String>,
}

impl Grammar {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &Arc<TypeHierarchy> {
        &self.types
    }

    pub fn entry(&self) -> RuleId {
        self.entry
    }

    /// Declared type of the entry rule, the type of every document root.
    pub fn entry_type(&self) -> TypeId {
        self.entry_type
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, r)| (RuleId(i as u32), r))
    }

    pub fn rule_by_name(&self, name: &str) -> Option<RuleId> {
        self.rules
            .iter()
            .position(|r| r.name == name)
            .map(|i| RuleId(i as u32))
    }

    /// Every keyword used by the grammar, sorted.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Declares and defines the rules of a [`Grammar`].
#[derive(Debug)]
pub struct GrammarBuilder {
    name: String,
    types: Arc<TypeHierarchy>,
    rules: Vec<Rule>,
    defined: Vec<bool>,
}

impl GrammarBuilder {
    pub fn new(name: &str, types: Arc<TypeHierarchy>) -> Self {
        Self {
            name: name.to_string(),
            types,
            rules: Vec::new(),
            defined: Vec::new(),
        }
    }

    /// Looks up a type in the hierarchy the grammar is built against.
    pub fn type_id(&self, name: &str) -> TesselResult<TypeId> {
        self.types
            .id(name)
            .ok_or_else(|| TesselError::grammar(format!("unknown type '{}'", name)))
    }

    fn push(&mut self, name: &str, kind: RuleKind, defined: bool) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(Rule {
            name: name.to_string(),
            kind,
            body: Element::Group(Vec::new()),
        });
        self.defined.push(defined);
        id
    }

    /// Declares a parser rule. `returns` names its AST type, if it has one.
    pub fn declare_parser(&mut self, name: &str, returns: Option<&str>) -> TesselResult<RuleId> {
        let returns = returns.map(|ty| self.type_id(ty)).transpose()?;
        Ok(self.push(name, RuleKind::Parser { returns }, false))
    }

    /// Declares a terminal rule. Terminals have no body.
    pub fn declare_terminal(&mut self, name: &str, token: TokenKind, value: ValueKind) -> RuleId {
        self.push(name, RuleKind::Terminal { token, value }, true)
    }

    pub fn declare_data_type(&mut self, name: &str, value: ValueKind) -> RuleId {
        self.push(name, RuleKind::DataType { value }, false)
    }

    /// Sets the body of a previously declared rule.
    pub fn define(&mut self, id: RuleId, body: Element) -> &mut Self {
        if let Some(rule) = self.rules.get_mut(id.index()) {
            rule.body = body;
            self.defined[id.index()] = true;
        }
        self
    }

    /// Validates the rule graph and fixes the entry rule.
    pub fn build(self, entry: RuleId) -> TesselResult<Grammar> {
        let entry_rule = self
            .rules
            .get(entry.index())
            .ok_or_else(|| TesselError::grammar("entry rule is not part of this grammar"))?;
        let RuleKind::Parser {
            returns: Some(entry_type),
        } = entry_rule.kind
        else {
            return Err(TesselError::grammar(format!(
                "entry rule '{}' must be a parser rule with a declared type",
                entry_rule.name
            )));
        };

        let mut keywords = BTreeSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if !self.defined[index] {
                return Err(TesselError::grammar(format!(
                    "rule '{}' is declared but never defined",
                    rule.name
                )));
            }
            let check = BodyCheck {
                rules: &self.rules,
                types: &self.types,
                rule,
            };
            check.element(&rule.body, &mut keywords)?;
        }

        Ok(Grammar {
            name: self.name,
            types: self.types,
            rules: self.rules,
            entry,
            entry_type,
            keywords: keywords.into_iter().collect(),
        })
    }
}

struct BodyCheck<'a> {
    rules: &'a [Rule],
    types: &'a TypeHierarchy,
    rule: &'a Rule,
}

impl BodyCheck<'_> {
    fn fail(&self, message: impl Into<String>) -> TesselError {
        TesselError::grammar(message).with_context(format!("in rule {}", self.rule.name))
    }

    fn known_rule(&self, id: RuleId) -> TesselResult<&Rule> {
        self.rules
            .get(id.index())
            .ok_or_else(|| self.fail(format!("call to unknown rule {}", id.index())))
    }

    fn known_type(&self, id: TypeId) -> TesselResult<()> {
        if id.index() < self.types.len() {
            Ok(())
        } else {
            Err(self.fail(format!("unknown type {}", id)))
        }
    }

    fn element(&self, element: &Element, keywords: &mut BTreeSet<String>) -> TesselResult<()> {
        let in_data_type = matches!(self.rule.kind, RuleKind::DataType { .. });
        match element {
            Element::Keyword(text) => {
                if text.is_empty() {
                    return Err(self.fail("empty keyword"));
                }
                keywords.insert(text.clone());
            }
            Element::RuleCall(id) => {
                let callee = self.known_rule(*id)?;
                if in_data_type && matches!(callee.kind, RuleKind::Parser { .. }) {
                    return Err(self.fail(format!(
                        "data-type rule cannot call parser rule '{}'",
                        callee.name
                    )));
                }
            }
            Element::Assignment { value, .. } => {
                if in_data_type {
                    return Err(self.fail("data-type rules cannot contain assignments"));
                }
                self.assignable(value, keywords)?;
            }
            Element::CrossRef { .. } => {
                return Err(self.fail("cross-references are only valid inside assignments"));
            }
            Element::Action { ty, .. } => {
                if in_data_type {
                    return Err(self.fail("data-type rules cannot contain actions"));
                }
                self.known_type(*ty)?;
            }
            Element::Group(items) => {
                for item in items {
                    self.element(item, keywords)?;
                }
            }
            Element::Alternatives(items) => {
                if items.is_empty() {
                    return Err(self.fail("empty alternatives"));
                }
                for item in items {
                    self.element(item, keywords)?;
                }
            }
            Element::Repeat { element, .. } => self.element(element, keywords)?,
        }
        Ok(())
    }

    fn assignable(&self, value: &Element, keywords: &mut BTreeSet<String>) -> TesselResult<()> {
        match value {
            Element::Keyword(_) => self.element(value, keywords),
            Element::RuleCall(id) => self.known_rule(*id).map(|_| ()),
            Element::CrossRef { target, rule } => {
                self.known_type(*target)?;
                let callee = self.known_rule(*rule)?;
                if matches!(callee.kind, RuleKind::Parser { .. }) {
                    Err(self.fail(format!(
                        "cross-reference text rule '{}' must be a terminal or data-type rule",
                        callee.name
                    )))
                } else {
                    Ok(())
                }
            }
            Element::Alternatives(items) if !items.is_empty() => {
                for item in items {
                    self.assignable(item, keywords)?;
                }
                Ok(())
            }
            _ => Err(self.fail(
                "an assignment value must be a keyword, rule call, cross-reference or alternatives of those",
            )),
        }
    }
}
