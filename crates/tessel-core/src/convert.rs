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

//! Token text to property value conversion.

use crate::grammar::ValueKind;
use crate::value::Value;

/// Converts the image of a terminal into its property value.
pub fn convert(image: &str, kind: ValueKind) -> Value {
    match kind {
        ValueKind::Id => Value::String(strip_escape(image).to_string()),
        ValueKind::String => Value::String(unquote(image)),
        ValueKind::Number => number_or_text(image),
        ValueKind::Text => Value::String(image.to_string()),
    }
}

/// Text form used when a terminal is part of a data-type rule.
pub fn convert_text(image: &str, kind: ValueKind) -> String {
    match kind {
        ValueKind::Id => strip_escape(image).to_string(),
        ValueKind::String => unquote(image),
        ValueKind::Number | ValueKind::Text => image.to_string(),
    }
}

/// Final value of a data-type rule from its concatenated text.
pub fn data_type_value(text: String, kind: ValueKind) -> Value {
    match kind {
        ValueKind::Number => number_or_text(&text),
        _ => Value::String(text),
    }
}

fn number_or_text(text: &str) -> Value {
    text.parse::<f64>()
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(text.to_string()))
}

fn strip_escape(image: &str) -> &str {
    image.strip_prefix('^').unwrap_or(image)
}

/// Removes surrounding quotes and processes backslash escapes.
///
/// Unknown escapes keep the escaped character; a trailing lone backslash
/// is kept as is.
pub fn unquote(image: &str) -> String {
    let inner = match image.chars().next() {
        Some(q @ ('"' | '\'')) if image.len() >= 2 && image.ends_with(q) => &image[1..image.len() - 1],
        _ => image,
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_strips_escape() {
        assert_eq!(convert("^class", ValueKind::Id), Value::from("class"));
        assert_eq!(convert("Person", ValueKind::Id), Value::from("Person"));
    }

    #[test]
    fn test_string_unescapes() {
        assert_eq!(
            convert(r#""a\tb\n\"c\"""#, ValueKind::String),
            Value::from("a\tb\n\"c\"")
        );
        assert_eq!(convert(r"'it\'s'", ValueKind::String), Value::from("it's"));
        assert_eq!(convert(r#""back\\slash""#, ValueKind::String), Value::from("back\\slash"));
    }

    #[test]
    fn test_number() {
        assert_eq!(convert("42", ValueKind::Number), Value::Number(42.0));
        assert_eq!(convert("3.25", ValueKind::Number), Value::Number(3.25));
    }

    #[test]
    fn test_data_type_value() {
        assert_eq!(data_type_value("1.5".into(), ValueKind::Number), Value::Number(1.5));
        assert_eq!(data_type_value("a.b".into(), ValueKind::Text), Value::from("a.b"));
        assert_eq!(data_type_value("x".into(), ValueKind::Number), Value::from("x"));
    }

    #[test]
    fn test_convert_text() {
        assert_eq!(convert_text("^a", ValueKind::Id), "a");
        assert_eq!(convert_text("'.'", ValueKind::String), ".");
    }
}
