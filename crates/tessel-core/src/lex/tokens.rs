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

//! Token model consumed by the parser.
//!
//! The parser never looks at raw text: it sees a flat stream of [`Token`]s
//! produced by a [`TokenSource`]. Hidden tokens (whitespace and comments) are
//! part of the stream so the concrete syntax tree can reproduce the input
//! exactly; the parser skips them for recognition purposes.

use super::span::TextRange;
use crate::error::LexError;
use std::fmt;

/// The category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    /// A keyword or punctuation registered by the grammar.
    Keyword,
    /// An identifier (`^?[A-Za-z_][A-Za-z0-9_]*`).
    Identifier,
    /// A quoted string literal.
    String,
    /// A numeric literal.
    Number,
    /// Whitespace (hidden).
    Whitespace,
    /// A line or block comment (hidden).
    Comment,
}

impl TokenKind {
    /// Hidden tokens are kept in the CST but ignored by recognition.
    #[inline]
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Keyword => "keyword",
            Self::Identifier => "ID",
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Whitespace => "WS",
            Self::Comment => "COMMENT",
        };
        f.write_str(name)
    }
}

/// A single token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source text of the token.
    pub image: String,
    /// Byte offset of the first character.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, image: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            image: image.into(),
            offset,
        }
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.image.len()
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        TextRange::new(self.offset, self.end())
    }

    /// `true` if this is the keyword token `keyword`.
    #[inline]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.image == keyword
    }
}

/// Output of a [`TokenSource`].
#[derive(Debug, Clone, Default)]
pub struct LexResult {
    /// All tokens, hidden ones included, in source order.
    pub tokens: Vec<Token>,
    /// Problems found while scanning. Scanning never stops early.
    pub errors: Vec<LexError>,
}

/// A tokenizer the parser can consume.
///
/// Implementations must emit tokens in source order without overlaps.
/// Characters reported in `errors` may be left out of `tokens`.
pub trait TokenSource: Send + Sync {
    fn tokenize(&self, text: &str) -> LexResult;
}
