//! Fuzz target for cell buffer editing.
//!
//! Replays arbitrary sequences of edits, styling, grouping, undo, redo and
//! tentative compositions against a plain byte model and checks the text, the line
//! count and that a full undo empties the document.

#![no_main]

use arbitrary::Arbitrary;
use gapcell::{CellBuffer, CellBufferOptions, LineEndTypes};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { pos: u16, text: Vec<u8> },
    Delete { pos: u16, len: u8 },
    Style { pos: u16, len: u8, value: u8 },
    Begin,
    End,
    Undo,
    Redo,
    SavePoint,
    TentativeStart,
    TentativeUndo,
}

#[derive(Arbitrary, Debug)]
struct Input {
    unicode: bool,
    ops: Vec<Op>,
}

/// Line count computed directly from the bytes.
fn count_lines(text: &[u8], unicode: bool) -> usize {
    let mut lines = 1;
    for (i, &b) in text.iter().enumerate() {
        let ends_line = match b {
            b'\r' => text.get(i + 1) != Some(&b'\n'),
            b'\n' => true,
            0x85 if unicode => i >= 1 && text[i - 1] == 0xC2,
            0xA8 | 0xA9 if unicode => i >= 2 && text[i - 2] == 0xE2 && text[i - 1] == 0x80,
            _ => false,
        };
        if ends_line {
            lines += 1;
        }
    }
    lines
}

fuzz_target!(|input: Input| {
    let options = CellBufferOptions {
        line_end_types: if input.unicode {
            LineEndTypes::UNICODE
        } else {
            LineEndTypes::DEFAULT
        },
        ..CellBufferOptions::default()
    };
    let Ok(mut buffer) = CellBuffer::with_options(options) else {
        return;
    };
    let mut depth = 0usize;

    for op in input.ops.iter().take(256) {
        match op {
            Op::Insert { pos, text } => {
                let pos = usize::from(*pos) % (buffer.length() + 1);
                let _ = buffer.insert_string(pos, text);
            }
            Op::Delete { pos, len } => {
                let _ = buffer.delete_chars(usize::from(*pos), usize::from(*len));
            }
            Op::Style { pos, len, value } => {
                buffer.set_style_for(usize::from(*pos), usize::from(*len), *value);
            }
            Op::Begin => {
                if buffer.begin_undo_action().is_ok() {
                    depth += 1;
                }
            }
            Op::End => {
                if depth > 0 && buffer.end_undo_action().is_ok() {
                    depth -= 1;
                }
            }
            Op::Undo => {
                let _ = buffer.undo();
            }
            Op::Redo => {
                let _ = buffer.redo();
            }
            Op::SavePoint => buffer.set_save_point(),
            Op::TentativeStart => buffer.tentative_start(),
            Op::TentativeUndo => {
                let _ = buffer.tentative_undo();
            }
        }
        let text = buffer.text();
        assert_eq!(text.len(), buffer.length());
        assert_eq!(buffer.lines(), count_lines(&text, input.unicode));
    }

    for _ in 0..depth {
        let _ = buffer.end_undo_action();
    }
    while buffer.can_undo() {
        if buffer.undo().is_err() {
            return;
        }
    }
    assert_eq!(buffer.length(), 0);
    assert_eq!(buffer.lines(), 1);
});
