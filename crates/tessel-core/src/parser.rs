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

//! Grammar-driven parser engine.
//!
//! The parser interprets a [`Grammar`] over a token stream and builds the
//! AST and the CST in one pass.
//!
//! # Frames
//!
//! Every active rule invocation owns a frame on an explicit stack. A parser
//! rule frame holds an object under construction: a type (declared by the
//! rule, or learned later from an action or an unassigned rule call) and
//! its properties. A data-type rule frame accumulates text.
//!
//! - Assignments write into the top frame: `=` overwrites, `?=` sets `true`,
//!   `+=` appends.
//! - An unassigned call to a parser rule makes the callee's node the current
//!   object. Properties already collected fill the gaps, arrays are
//!   concatenated current-first.
//! - `{T}` retags the current object, unless the frame already ran an action.
//! - `{T.f=current}` finishes the current object, wraps its CST in a new
//!   composite and starts a fresh `T` holding the old object under `f`.
//!
//! When a rule completes its object is *constructed*: mandatory defaults are
//! applied, the node is stored and the container links of its children and
//! references are set.
//!
//! # Recovery
//!
//! `parse` always produces a tree. Missing keywords are assumed present,
//! single unexpected tokens are skipped, a rule with no viable alternative
//! gives no result, and leftover input at the end is skipped until the
//! entry rule can start again. Follow-on errors are suppressed until the
//! next token matches.

use crate::ast::{Ast, AstNode, NodeId};
use crate::convert::{convert, convert_text, data_type_value};
use crate::cst::CstId;
use crate::error::{LexError, ParseError, TesselResult};
use crate::grammar::{AssignOp, Cardinality, Element, Grammar, RuleId, RuleKind};
use crate::lex::{LexResult, TextRange, Token, TokenKind, TokenSource};
use crate::limits::Limits;
use crate::lookahead::{FirstSet, Lookahead};
use crate::reference::Reference;
use crate::types::{PropertyKind, TypeId};
use crate::value::{Properties, Value};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Output of [`Parser::parse`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The document tree. Always present, possibly partial.
    pub ast: Ast,
    pub lex_errors: Vec<LexError>,
    pub parse_errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.lex_errors.is_empty() || !self.parse_errors.is_empty()
    }
}

/// A parser for one grammar. Cheap to share; parsing needs `&self` only.
#[derive(Debug, Clone)]
pub struct Parser {
    grammar: Arc<Grammar>,
    lookahead: Lookahead,
    limits: Limits,
}

impl Parser {
    /// Analyses the grammar. Fails for left-recursive grammars.
    pub fn new(grammar: Arc<Grammar>) -> TesselResult<Self> {
        let lookahead = Lookahead::compute(&grammar)?;
        debug!(
            grammar = grammar.name(),
            rules = grammar.rules().count(),
            "grammar analysed"
        );
        Ok(Self {
            grammar,
            lookahead,
            limits: Limits::default(),
        })
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    pub fn lookahead(&self) -> &Lookahead {
        &self.lookahead
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Tokenizes and parses `text`.
    pub fn parse_text(&self, lexer: &dyn TokenSource, text: &str) -> ParseResult {
        self.parse(lexer.tokenize(text))
    }

    /// Parses a token stream. Never fails: problems are collected.
    pub fn parse(&self, lexed: LexResult) -> ParseResult {
        let LexResult {
            tokens,
            errors: lex_errors,
        } = lexed;
        let mut run = Run::new(self, tokens);
        run.parse_entry();
        debug!(
            grammar = self.grammar.name(),
            errors = run.errors.len(),
            lex_errors = lex_errors.len(),
            "parse finished"
        );
        ParseResult {
            ast: run.ast,
            lex_errors,
            parse_errors: run.errors,
        }
    }
}

#[derive(Debug, Default)]
struct Object {
    ty: Option<TypeId>,
    properties: Properties,
    /// Arena slot to reuse, set when the object came from a finished node.
    slot: Option<NodeId>,
    retagged: bool,
}

impl Object {
    fn new(ty: Option<TypeId>) -> Self {
        Self {
            ty,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
enum Frame {
    Node(Object),
    DataType { text: String },
}

/// A recognition failure, caught by the enclosing rule invocation.
#[derive(Debug)]
struct NoViableAlt {
    message: String,
}

enum RuleValue {
    Node(NodeId),
    Value(Value),
}

struct Run<'p> {
    grammar: &'p Grammar,
    la: &'p Lookahead,
    limits: &'p Limits,
    tokens: Vec<Token>,
    /// Indices of visible tokens in `tokens`.
    visible: Vec<usize>,
    /// Current position in `visible`.
    pos: usize,
    /// `tokens[..emitted]` already have CST leaves.
    emitted: usize,
    text_end: usize,
    ast: Ast,
    composites: Vec<CstId>,
    frames: Vec<Frame>,
    rules: Vec<RuleId>,
    errors: Vec<ParseError>,
    recovering: bool,
}

impl<'p> Run<'p> {
    fn new(parser: &'p Parser, mut tokens: Vec<Token>) -> Self {
        let grammar = parser.grammar.as_ref();
        let text_end = tokens.last().map(Token::end).unwrap_or(0);
        let mut errors = Vec::new();

        let mut visible: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_hidden())
            .map(|(i, _)| i)
            .collect();
        if visible.len() > parser.limits.max_tokens {
            let cut = visible[parser.limits.max_tokens];
            warn!(
                limit = parser.limits.max_tokens,
                "token limit exceeded, dropping the rest of the input"
            );
            errors.push(ParseError::new(
                format!(
                    "Document exceeds the maximum of {} tokens",
                    parser.limits.max_tokens
                ),
                tokens[cut].range(),
            ));
            tokens.truncate(cut);
            visible.truncate(parser.limits.max_tokens);
        }

        Self {
            grammar,
            la: &parser.lookahead,
            limits: &parser.limits,
            tokens,
            visible,
            pos: 0,
            emitted: 0,
            text_end,
            ast: Ast::new(grammar.types().clone(), grammar.entry()),
            composites: Vec::new(),
            frames: Vec::new(),
            rules: Vec::new(),
            errors,
            recovering: false,
        }
    }

    // ==================== Token access ====================

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.visible
            .get(self.pos + ahead)
            .map(|&index| &self.tokens[index])
    }

    fn current_range(&self) -> TextRange {
        self.peek()
            .map(Token::range)
            .unwrap_or(TextRange::empty(self.text_end))
    }

    fn next_offset(&self) -> usize {
        self.peek().map(|t| t.offset).unwrap_or(self.text_end)
    }

    fn found(&self) -> String {
        self.peek()
            .map(|t| format!("`{}`", t.image))
            .unwrap_or_else(|| "end of file".to_string())
    }

    fn current_composite(&self) -> CstId {
        self.composites
            .last()
            .copied()
            .unwrap_or_else(|| self.ast.cst().root())
    }

    /// Emits hidden tokens up to the next visible one (or the end).
    fn flush_hidden(&mut self) {
        let upto = self
            .visible
            .get(self.pos)
            .copied()
            .unwrap_or(self.tokens.len());
        let parent = self.current_composite();
        while self.emitted < upto {
            self.ast
                .cst_mut()
                .add_leaf(parent, &self.tokens[self.emitted], None);
            self.emitted += 1;
        }
    }

    /// Moves past the next visible token, recording it as a leaf.
    fn consume(&mut self, feature: Option<&str>) -> Option<CstId> {
        let index = *self.visible.get(self.pos)?;
        self.flush_hidden();
        let parent = self.current_composite();
        let leaf = self
            .ast
            .cst_mut()
            .add_leaf(parent, &self.tokens[index], feature);
        self.emitted = index + 1;
        self.pos += 1;
        Some(leaf)
    }

    // ==================== Errors ====================

    fn error(&mut self, message: String) {
        if self.recovering {
            trace!(%message, "suppressed follow-on error");
            return;
        }
        self.push_error(message);
    }

    fn push_error(&mut self, message: String) {
        debug!(%message, offset = self.next_offset(), "parse error");
        let mut error = ParseError::new(message, self.current_range());
        if let Some(token) = self.peek() {
            error.token = Some(token.image.clone());
        }
        if let Some(rule) = self.rules.last() {
            error.rule = Some(self.grammar.rule(*rule).name.clone());
        }
        self.errors.push(error);
    }

    fn report(&mut self, failure: NoViableAlt) {
        self.error(failure.message);
        self.recovering = true;
    }

    // ==================== Token matching ====================

    /// Matches a keyword. `None` when it had to be assumed present.
    fn keyword(&mut self, keyword: &str, feature: Option<&str>) -> Option<CstId> {
        if self.peek().is_some_and(|t| t.is_keyword(keyword)) {
            self.recovering = false;
            return self.consume(feature);
        }
        let message = format!("Expecting keyword '{}' but found {}.", keyword, self.found());
        self.error(message);
        if self.peek_at(1).is_some_and(|t| t.is_keyword(keyword)) {
            // Single-token deletion.
            self.consume(None);
            self.recovering = false;
            return self.consume(feature);
        }
        self.recovering = true;
        None
    }

    /// Matches a token of a terminal rule, returning its image.
    fn terminal(&mut self, kind: TokenKind, rule: &str, feature: Option<&str>) -> Option<(String, CstId)> {
        if let Some(token) = self.peek().filter(|t| t.kind == kind) {
            let image = token.image.clone();
            self.recovering = false;
            return self.consume(feature).map(|leaf| (image, leaf));
        }
        let message = format!(
            "Expecting token of type '{}' but found {}.",
            rule,
            self.found()
        );
        self.error(message);
        if let Some(token) = self.peek_at(1).filter(|t| t.kind == kind) {
            let image = token.image.clone();
            self.consume(None);
            self.recovering = false;
            return self.consume(feature).map(|leaf| (image, leaf));
        }
        self.recovering = true;
        None
    }

    // ==================== Elements ====================

    fn run(&mut self, element: &'p Element) -> Result<(), NoViableAlt> {
        match element {
            Element::Keyword(text) => {
                if self.keyword(text, None).is_some() {
                    if let Some(Frame::DataType { text: acc }) = self.frames.last_mut() {
                        acc.push_str(text);
                    }
                }
                Ok(())
            }
            Element::RuleCall(id) => self.call(*id, None),
            Element::Assignment { feature, op, value } => self.assignment(feature, *op, value),
            // Rejected by the grammar builder outside assignments.
            Element::CrossRef { .. } => Ok(()),
            Element::Action { ty, feature } => {
                self.action(*ty, feature.as_ref());
                Ok(())
            }
            Element::Group(items) => {
                for item in items {
                    self.run(item)?;
                }
                Ok(())
            }
            Element::Alternatives(items) => {
                let chosen = self.choose(items)?;
                self.run(chosen)
            }
            Element::Repeat {
                element,
                cardinality,
            } => self.repeat(element, *cardinality),
        }
    }

    /// LL(1) choice: first predicting alternative, else first nullable one.
    fn choose(&self, items: &'p [Element]) -> Result<&'p Element, NoViableAlt> {
        if let Some(token) = self.peek() {
            if let Some(item) = items.iter().find(|item| self.la.predicts(item, token)) {
                return Ok(item);
            }
        }
        if let Some(item) = items.iter().find(|item| self.la.nullable(item)) {
            return Ok(item);
        }
        let mut expected = FirstSet::default();
        for item in items {
            expected.union(&self.la.first_of(item));
        }
        Err(NoViableAlt {
            message: format!("Expecting one of {} but found {}.", expected, self.found()),
        })
    }

    fn predicts(&self, element: &Element) -> bool {
        self.peek().is_some_and(|t| self.la.predicts(element, t))
    }

    fn repeat(&mut self, element: &'p Element, cardinality: Cardinality) -> Result<(), NoViableAlt> {
        match cardinality {
            Cardinality::Optional => {
                if self.predicts(element) {
                    self.run(element)?;
                }
                Ok(())
            }
            Cardinality::ZeroOrMore | Cardinality::OneOrMore => {
                if cardinality == Cardinality::OneOrMore {
                    let start = self.pos;
                    self.run(element)?;
                    if self.pos == start {
                        return Ok(());
                    }
                }
                while self.predicts(element) {
                    let start = self.pos;
                    match self.run(element) {
                        Ok(()) => {}
                        // Abandon the iteration but keep looping.
                        Err(failure) if self.pos > start => self.report(failure),
                        Err(failure) => return Err(failure),
                    }
                    if self.pos == start {
                        break;
                    }
                }
                Ok(())
            }
        }
    }

    fn assignment(&mut self, feature: &'p str, op: AssignOp, value: &'p Element) -> Result<(), NoViableAlt> {
        match value {
            Element::Keyword(text) => {
                if self.keyword(text, Some(feature)).is_some() {
                    self.assign(feature, op, Value::String(text.clone()));
                }
                Ok(())
            }
            Element::RuleCall(id) => self.call(*id, Some((feature, op))),
            Element::CrossRef { target, rule } => {
                self.cross_reference(feature, op, *target, *rule);
                Ok(())
            }
            Element::Alternatives(items) => {
                let chosen = self.choose(items)?;
                self.assignment(feature, op, chosen)
            }
            other => self.run(other),
        }
    }

    fn assign(&mut self, feature: &str, op: AssignOp, value: Value) {
        let Some(Frame::Node(object)) = self.frames.last_mut() else {
            return;
        };
        match op {
            AssignOp::Set => object.properties.set(feature, value),
            AssignOp::BoolSet => object.properties.set(feature, Value::Bool(true)),
            AssignOp::Add => object.properties.append(feature, value),
        }
    }

    fn call(&mut self, id: RuleId, assignment: Option<(&str, AssignOp)>) -> Result<(), NoViableAlt> {
        let grammar = self.grammar;
        let rule = grammar.rule(id);
        let feature = assignment.map(|(f, _)| f);

        if let RuleKind::Terminal { token, value } = rule.kind {
            if let Some((image, _)) = self.terminal(token, &rule.name, feature) {
                match assignment {
                    Some((feature, op)) => self.assign(feature, op, convert(&image, value)),
                    None => {
                        if let Some(Frame::DataType { text }) = self.frames.last_mut() {
                            text.push_str(&convert_text(&image, value));
                        }
                    }
                }
            }
            return Ok(());
        }

        let Some((result, _)) = self.invoke_rule(id, feature) else {
            return Ok(());
        };
        match (assignment, result) {
            (Some((feature, op)), RuleValue::Node(node)) => self.assign(feature, op, Value::Node(node)),
            (Some((feature, op)), RuleValue::Value(value)) => self.assign(feature, op, value),
            (None, RuleValue::Node(node)) => self.adopt(node),
            (None, RuleValue::Value(value)) => {
                if let Some(Frame::DataType { text }) = self.frames.last_mut() {
                    text.push_str(&value_text(&value));
                }
            }
        }
        Ok(())
    }

    fn cross_reference(&mut self, feature: &str, op: AssignOp, target: TypeId, id: RuleId) {
        let grammar = self.grammar;
        let rule = grammar.rule(id);
        let (text, cst) = match rule.kind {
            RuleKind::Terminal { token, value } => {
                match self.terminal(token, &rule.name, Some(feature)) {
                    Some((image, leaf)) => (convert_text(&image, value), leaf),
                    None => return,
                }
            }
            _ => match self.invoke_rule(id, Some(feature)) {
                Some((RuleValue::Value(value), composite)) => (value_text(&value), composite),
                _ => return,
            },
        };
        let reference = self
            .ast
            .push_reference(Reference::new(text, feature, target, Some(cst)));
        self.assign(feature, op, Value::Reference(reference));
    }

    /// Makes the node of an unassigned rule call the current object.
    fn adopt(&mut self, result: NodeId) {
        let Some(Frame::Node(current)) = self.frames.last_mut() else {
            return;
        };
        let raw = self.ast.raw_mut(result);
        let ty = raw.ty;
        let mut properties = std::mem::take(&mut raw.properties);
        let inner_cst = raw.cst.take();
        properties.merge_without_override(std::mem::take(&mut current.properties));
        current.properties = properties;
        current.ty = Some(ty);
        current.slot = Some(result);
        // The composite of the caller will own the node from now on.
        if let Some(cst) = inner_cst {
            self.ast.cst_mut().node_mut(cst).ast = None;
        }
    }

    fn action(&mut self, ty: TypeId, feature: Option<&(String, AssignOp)>) {
        let Some(Frame::Node(object)) = self.frames.last_mut() else {
            return;
        };
        let Some((feature, op)) = feature else {
            if object.retagged {
                trace!(ty = %ty, "retag ignored after an earlier action");
            } else {
                object.ty = Some(ty);
                object.retagged = true;
            }
            return;
        };

        let previous = std::mem::replace(
            object,
            Object {
                ty: Some(ty),
                retagged: true,
                ..Object::default()
            },
        );
        let top = self.current_composite();
        let inner = self.ast.cst_mut().wrap_children(top, Some(feature.as_str()));
        if let Some(node) = self.construct(previous, inner) {
            self.assign(feature, *op, Value::Node(node));
        }
    }

    // ==================== Rules ====================

    /// Runs a parser or data-type rule in a fresh frame and CST composite.
    fn invoke_rule(&mut self, id: RuleId, feature: Option<&str>) -> Option<(RuleValue, CstId)> {
        let grammar = self.grammar;
        let rule = grammar.rule(id);
        if self.rules.len() >= self.limits.max_rule_depth {
            self.error(format!(
                "Maximum rule nesting depth of {} exceeded",
                self.limits.max_rule_depth
            ));
            self.recovering = true;
            return None;
        }

        let parent = self.current_composite();
        let offset = self.next_offset();
        let composite = self
            .ast
            .cst_mut()
            .add_composite(parent, Some(id), feature, offset);
        self.composites.push(composite);
        self.frames.push(match rule.kind {
            RuleKind::Parser { returns } => Frame::Node(Object::new(returns)),
            _ => Frame::DataType {
                text: String::new(),
            },
        });
        self.rules.push(id);
        trace!(rule = %rule.name, depth = self.rules.len(), "enter rule");

        if let Err(failure) = self.run(&rule.body) {
            debug!(rule = %rule.name, "no viable alternative");
            self.report(failure);
        }

        self.rules.pop();
        let frame = self.frames.pop();
        let composite = self.composites.pop().unwrap_or(composite);
        if !self.ast.cst_mut().close(composite) {
            return None;
        }
        let value = match (frame, rule.kind) {
            (Some(Frame::Node(object)), _) => {
                self.construct(object, Some(composite)).map(RuleValue::Node)
            }
            (Some(Frame::DataType { text }), RuleKind::DataType { value }) => {
                Some(RuleValue::Value(data_type_value(text, value)))
            }
            _ => None,
        };
        value.map(|value| (value, composite))
    }

    fn construct(&mut self, object: Object, composite: Option<CstId>) -> Option<NodeId> {
        let Some(ty) = object.ty else {
            debug!("dropping object without a type");
            return None;
        };
        Some(self.construct_typed(ty, object.properties, object.slot, composite))
    }

    fn construct_typed(
        &mut self,
        ty: TypeId,
        mut properties: Properties,
        slot: Option<NodeId>,
        composite: Option<CstId>,
    ) -> NodeId {
        for (name, kind) in self.grammar.types().all_properties(ty) {
            if properties.contains(name) {
                continue;
            }
            match kind {
                PropertyKind::Array => properties.set(name, Value::Array(Vec::new())),
                PropertyKind::Bool => properties.set(name, Value::Bool(false)),
                PropertyKind::Value => {}
            }
        }

        let mut links = Vec::new();
        for (name, value) in properties.iter() {
            match value {
                Value::Array(items) => {
                    for (index, item) in items.iter().enumerate() {
                        links.push((item.clone(), name.to_string(), Some(index)));
                    }
                }
                other => links.push((other.clone(), name.to_string(), None)),
            }
        }

        let mut node = AstNode::new(ty, properties);
        node.cst = composite;
        let id = match slot {
            Some(slot) => {
                *self.ast.raw_mut(slot) = node;
                slot
            }
            None => self.ast.alloc(node),
        };

        for (value, property, index) in links {
            match value {
                Value::Node(child) => {
                    let raw = self.ast.raw_mut(child);
                    raw.container = Some(id);
                    raw.container_property = Some(property);
                    raw.container_index = index;
                }
                Value::Reference(reference) => {
                    let reference = self.ast.reference_mut(reference);
                    reference.container = Some(id);
                    reference.property = property;
                    reference.index = index;
                }
                _ => {}
            }
        }
        if let Some(composite) = composite {
            self.ast.cst_mut().node_mut(composite).ast = Some(id);
        }
        id
    }

    fn parse_entry(&mut self) {
        let grammar = self.grammar;
        let entry = grammar.entry();
        let rule = grammar.rule(entry);
        let root = self.ast.cst().root();
        self.composites.push(root);
        self.frames.push(Frame::Node(Object::new(Some(grammar.entry_type()))));
        self.rules.push(entry);

        loop {
            let start = self.pos;
            if let Err(failure) = self.run(&rule.body) {
                self.report(failure);
            }
            if self.peek().is_none() {
                break;
            }
            let message = format!("Expecting end of file but found {}.", self.found());
            self.push_error(message);
            // Skip until the entry rule can start again.
            let mut stalled = self.pos == start;
            while self.peek().is_some() {
                if !stalled && self.predicts(&rule.body) {
                    break;
                }
                stalled = false;
                self.consume(None);
            }
            self.recovering = false;
            if self.peek().is_none() {
                break;
            }
        }

        self.flush_hidden();
        self.ast
            .cst_mut()
            .set_root_range(TextRange::new(0, self.text_end));
        self.rules.pop();
        let object = match self.frames.pop() {
            Some(Frame::Node(object)) => object,
            _ => Object::default(),
        };
        let ty = object.ty.unwrap_or(grammar.entry_type());
        let root_node = self.construct_typed(ty, object.properties, object.slot, Some(root));
        self.ast.set_root(root_node);
    }
}

/// Text of a rule result appended to a data-type rule.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
