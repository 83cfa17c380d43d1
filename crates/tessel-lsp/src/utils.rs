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

//! Position conversion between byte offsets and LSP positions.
//!
//! Offsets in the runtime are byte offsets into the document text. LSP
//! positions are zero-based lines with columns in UTF-16 code units.

use ropey::Rope;
use tessel::TextRange;
use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent};

/// Number of chars on `line`, without its line break.
fn line_content_chars(rope: &Rope, line: usize) -> usize {
    let slice = rope.line(line);
    let mut len = slice.len_chars();
    if len > 0 && slice.char(len - 1) == '\n' {
        len -= 1;
        if len > 0 && slice.char(len - 1) == '\r' {
            len -= 1;
        }
    }
    len
}

/// Converts a byte offset to a position. Offsets past the end clamp to it.
pub fn offset_to_position(rope: &Rope, offset: usize) -> Position {
    let offset = offset.min(rope.len_bytes());
    let char_idx = rope.byte_to_char(offset);
    let line = rope.char_to_line(char_idx);
    let line_start = rope.line_to_char(line);
    let character = rope.char_to_utf16_cu(char_idx) - rope.char_to_utf16_cu(line_start);
    Position::new(line as u32, character as u32)
}

/// Converts a position to a byte offset.
///
/// Lines past the end clamp to the text length. Columns past the end of a
/// line clamp to the line end.
pub fn position_to_offset(rope: &Rope, position: Position) -> usize {
    rope.char_to_byte(position_to_char(rope, position))
}

fn position_to_char(rope: &Rope, position: Position) -> usize {
    let line = position.line as usize;
    if line >= rope.len_lines() {
        return rope.len_chars();
    }
    let line_start = rope.line_to_char(line);
    let line_end = line_start + line_content_chars(rope, line);
    let target = rope.char_to_utf16_cu(line_start) + position.character as usize;
    if target >= rope.char_to_utf16_cu(line_end) {
        line_end
    } else {
        rope.utf16_cu_to_char(target)
    }
}

pub fn range_to_lsp(rope: &Rope, range: TextRange) -> Range {
    Range::new(
        offset_to_position(rope, range.start),
        offset_to_position(rope, range.end),
    )
}

/// Applies one content change. A change without a range replaces the text.
pub fn apply_change(rope: &mut Rope, change: &TextDocumentContentChangeEvent) {
    match change.range {
        Some(range) => {
            let start = position_to_char(rope, range.start);
            let end = position_to_char(rope, range.end).max(start);
            rope.remove(start..end);
            rope.insert(start, &change.text);
        }
        None => *rope = Rope::from_str(&change.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(range: Option<Range>, text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range,
            range_length: None,
            text: text.to_string(),
        }
    }

    // ==================== Position tests ====================

    #[test]
    fn test_offset_to_position_ascii() {
        let rope = Rope::from_str("class A {}\nclass B {}\n");
        assert_eq!(offset_to_position(&rope, 0), Position::new(0, 0));
        assert_eq!(offset_to_position(&rope, 6), Position::new(0, 6));
        assert_eq!(offset_to_position(&rope, 11), Position::new(1, 0));
        assert_eq!(offset_to_position(&rope, 17), Position::new(1, 6));
    }

    #[test]
    fn test_offset_to_position_utf16() {
        // 'é' is two bytes and one code unit, '𝄞' four bytes and two units.
        let rope = Rope::from_str("é𝄞x");
        assert_eq!(offset_to_position(&rope, 2), Position::new(0, 1));
        assert_eq!(offset_to_position(&rope, 6), Position::new(0, 3));
        assert_eq!(position_to_offset(&rope, Position::new(0, 3)), 6);
    }

    #[test]
    fn test_offsets_clamp() {
        let rope = Rope::from_str("ab\ncd");
        assert_eq!(offset_to_position(&rope, 100), Position::new(1, 2));
        assert_eq!(position_to_offset(&rope, Position::new(0, 50)), 2);
        assert_eq!(position_to_offset(&rope, Position::new(9, 0)), 5);
    }

    #[test]
    fn test_crlf_line_end() {
        let rope = Rope::from_str("ab\r\ncd");
        assert_eq!(position_to_offset(&rope, Position::new(0, 10)), 2);
        assert_eq!(position_to_offset(&rope, Position::new(1, 1)), 5);
    }

    // ==================== Edit tests ====================

    #[test]
    fn test_apply_incremental_change() {
        let mut rope = Rope::from_str("class A {}\nclass B {}");
        let range = Range::new(Position::new(1, 6), Position::new(1, 7));
        apply_change(&mut rope, &change(Some(range), "Book"));
        assert_eq!(rope.to_string(), "class A {}\nclass Book {}");
    }

    #[test]
    fn test_apply_insertion_and_full_change() {
        let mut rope = Rope::from_str("class A {}");
        let at_end = Range::new(Position::new(0, 10), Position::new(0, 10));
        apply_change(&mut rope, &change(Some(at_end), " class B {}"));
        assert_eq!(rope.to_string(), "class A {} class B {}");

        apply_change(&mut rope, &change(None, "datatype Int"));
        assert_eq!(rope.to_string(), "datatype Int");
    }
}
