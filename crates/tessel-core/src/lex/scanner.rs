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

//! A general-purpose scanner for C-like languages.
//!
//! [`SimpleLexer`] recognises whitespace, `//` and `/* */` comments,
//! identifiers, numbers, single- or double-quoted strings and the keyword
//! set of a grammar. Word keywords are matched after scanning an identifier;
//! punctuation keywords are matched longest first. A leading `^` escapes an
//! identifier that collides with a keyword.

use super::span::TextRange;
use super::tokens::{LexResult, Token, TokenKind, TokenSource};
use crate::error::LexError;
use std::collections::HashSet;

/// Keyword-driven scanner.
#[derive(Debug, Clone, Default)]
pub struct SimpleLexer {
    words: HashSet<String>,
    /// Punctuation keywords, longest first.
    symbols: Vec<String>,
}

impl SimpleLexer {
    /// Creates a scanner for the given keyword set.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut words = HashSet::new();
        let mut symbols = Vec::new();
        for keyword in keywords {
            let keyword = keyword.into();
            if keyword.is_empty() {
                continue;
            }
            if keyword.chars().all(is_ident_continue) {
                words.insert(keyword);
            } else if !symbols.contains(&keyword) {
                symbols.push(keyword);
            }
        }
        symbols.sort_by(|a: &String, b: &String| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { words, symbols }
    }

    fn match_symbol(&self, rest: &str) -> Option<usize> {
        self.symbols
            .iter()
            .find(|symbol| rest.starts_with(symbol.as_str()))
            .map(|symbol| symbol.len())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl TokenSource for SimpleLexer {
    fn tokenize(&self, text: &str) -> LexResult {
        let mut result = LexResult::default();
        let bytes = text.as_bytes();
        let mut pos = 0;
        // Start of a pending run of unrecognised characters.
        let mut garbage: Option<usize> = None;

        let flush_garbage = |garbage: &mut Option<usize>, end: usize, errors: &mut Vec<LexError>| {
            if let Some(start) = garbage.take() {
                errors.push(LexError::new(
                    format!(
                        "unexpected character sequence '{}'",
                        &text[start..end]
                    ),
                    TextRange::new(start, end),
                ));
            }
        };

        while pos < text.len() {
            let rest = &text[pos..];
            let Some(c) = rest.chars().next() else {
                break;
            };

            let token = if c.is_whitespace() {
                let len = rest
                    .find(|ch: char| !ch.is_whitespace())
                    .unwrap_or(rest.len());
                Some((TokenKind::Whitespace, len))
            } else if rest.starts_with("//") {
                let len = memchr::memchr(b'\n', &bytes[pos..]).unwrap_or(rest.len());
                Some((TokenKind::Comment, len))
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(end) => Some((TokenKind::Comment, end + 4)),
                    None => {
                        flush_garbage(&mut garbage, pos, &mut result.errors);
                        result.errors.push(LexError::new(
                            "unterminated block comment",
                            TextRange::new(pos, text.len()),
                        ));
                        pos = text.len();
                        continue;
                    }
                }
            } else if is_ident_start(c) || (c == '^' && rest[1..].starts_with(is_ident_start)) {
                let skip = usize::from(c == '^');
                let len = rest[skip..]
                    .find(|ch: char| !is_ident_continue(ch))
                    .map(|n| n + skip)
                    .unwrap_or(rest.len());
                let word = &rest[..len];
                if skip == 0 && self.words.contains(word) {
                    Some((TokenKind::Keyword, len))
                } else {
                    Some((TokenKind::Identifier, len))
                }
            } else if c.is_ascii_digit() {
                let mut len = rest
                    .find(|ch: char| !ch.is_ascii_digit())
                    .unwrap_or(rest.len());
                let tail = &rest[len..];
                if tail.starts_with('.') && tail[1..].starts_with(|ch: char| ch.is_ascii_digit()) {
                    len += 1 + tail[1..]
                        .find(|ch: char| !ch.is_ascii_digit())
                        .unwrap_or(tail.len() - 1);
                }
                Some((TokenKind::Number, len))
            } else if c == '"' || c == '\'' {
                match scan_string(rest, c) {
                    Some(len) => Some((TokenKind::String, len)),
                    None => {
                        flush_garbage(&mut garbage, pos, &mut result.errors);
                        let line_end = memchr::memchr(b'\n', &bytes[pos..]).unwrap_or(rest.len());
                        result.errors.push(LexError::new(
                            "unterminated string literal",
                            TextRange::new(pos, pos + line_end),
                        ));
                        pos += line_end;
                        continue;
                    }
                }
            } else {
                self.match_symbol(rest).map(|len| (TokenKind::Keyword, len))
            };

            match token {
                Some((kind, len)) => {
                    flush_garbage(&mut garbage, pos, &mut result.errors);
                    result.tokens.push(Token::new(kind, &rest[..len], pos));
                    pos += len;
                }
                None => {
                    garbage.get_or_insert(pos);
                    pos += c.len_utf8();
                }
            }
        }
        flush_garbage(&mut garbage, pos, &mut result.errors);
        result
    }
}

/// Length of the string literal at the start of `rest`, quotes included.
fn scan_string(rest: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in rest.char_indices().skip(1) {
        match c {
            '\n' => return None,
            '\\' if !escaped => escaped = true,
            c if c == quote && !escaped => return Some(i + c.len_utf8()),
            _ => escaped = false,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexer() -> SimpleLexer {
        SimpleLexer::new(["class", "extends", "{", "}", ":", ".", "=", "+", "-", "->"])
    }

    fn kinds(result: &LexResult) -> Vec<(TokenKind, &str)> {
        result
            .tokens
            .iter()
            .filter(|t| !t.kind.is_hidden())
            .map(|t| (t.kind, t.image.as_str()))
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let result = lexer().tokenize("class Person extends Base {}");
        assert!(result.errors.is_empty());
        assert_eq!(
            kinds(&result),
            vec![
                (TokenKind::Keyword, "class"),
                (TokenKind::Identifier, "Person"),
                (TokenKind::Keyword, "extends"),
                (TokenKind::Identifier, "Base"),
                (TokenKind::Keyword, "{"),
                (TokenKind::Keyword, "}"),
            ]
        );
    }

    #[test]
    fn test_escaped_keyword_is_identifier() {
        let result = lexer().tokenize("^class");
        assert_eq!(kinds(&result), vec![(TokenKind::Identifier, "^class")]);
    }

    #[test]
    fn test_longest_symbol_wins() {
        let result = lexer().tokenize("a->b-c");
        assert_eq!(
            kinds(&result),
            vec![
                (TokenKind::Identifier, "a"),
                (TokenKind::Keyword, "->"),
                (TokenKind::Identifier, "b"),
                (TokenKind::Keyword, "-"),
                (TokenKind::Identifier, "c"),
            ]
        );
    }

    #[test]
    fn test_numbers_and_strings() {
        let result = lexer().tokenize(r#"12 3.5 4. "a\"b" 'c'"#);
        assert_eq!(
            kinds(&result),
            vec![
                (TokenKind::Number, "12"),
                (TokenKind::Number, "3.5"),
                (TokenKind::Number, "4"),
                (TokenKind::Keyword, "."),
                (TokenKind::String, r#""a\"b""#),
                (TokenKind::String, "'c'"),
            ]
        );
    }

    #[test]
    fn test_comments_are_hidden() {
        let result = lexer().tokenize("// line\nclass /* block */ A");
        let comments: Vec<_> = result
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .map(|t| t.image.as_str())
            .collect();
        assert_eq!(comments, vec!["// line", "/* block */"]);
    }

    #[test]
    fn test_unknown_characters_collapse_into_one_error() {
        let result = lexer().tokenize("class §§§ A");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("§§§"));
        assert_eq!(
            kinds(&result),
            vec![(TokenKind::Keyword, "class"), (TokenKind::Identifier, "A")]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let result = lexer().tokenize("\"abc\nclass");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].range, TextRange::new(0, 4));
        assert_eq!(kinds(&result), vec![(TokenKind::Keyword, "class")]);
    }

    #[test]
    fn test_tokens_cover_valid_input() {
        let text = "class A { x : y = 1 + 2 } // done\n";
        let result = lexer().tokenize(text);
        let joined: String = result.tokens.iter().map(|t| t.image.as_str()).collect();
        assert_eq!(joined, text);
    }
}
