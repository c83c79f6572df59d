//! Undo history performance benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use gapcell::{ActionType, CellBuffer, UndoHistory};
use std::hint::black_box;

fn history_append(c: &mut Criterion) {
    c.bench_function("undo_append_typing_1k", |b| {
        b.iter(|| {
            let mut history = UndoHistory::new();
            for pos in 0..1_000 {
                history
                    .append_action(ActionType::Insert, pos, black_box(b"x"), true)
                    .unwrap();
            }
            history
        });
    });

    c.bench_function("undo_append_separate_steps_1k", |b| {
        b.iter(|| {
            let mut history = UndoHistory::new();
            for pos in 0..1_000 {
                history
                    .append_action(ActionType::Insert, pos * 2, black_box(b"word"), true)
                    .unwrap();
            }
            history
        });
    });
}

fn buffer_with_steps(steps: usize) -> CellBuffer {
    let mut buffer = CellBuffer::new();
    for i in 0..steps {
        buffer.insert_string(0, format!("edit {i} ").as_bytes()).unwrap();
    }
    buffer
}

fn undo_redo_cycle(c: &mut Criterion) {
    c.bench_function("cellbuffer_undo_all_500", |b| {
        b.iter_batched(
            || buffer_with_steps(500),
            |mut buffer| {
                while buffer.can_undo() {
                    buffer.undo().unwrap();
                }
                buffer
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("cellbuffer_undo_redo_one", |b| {
        let mut buffer = buffer_with_steps(500);
        b.iter(|| {
            buffer.undo().unwrap();
            buffer.redo().unwrap();
        });
    });
}

criterion_group!(benches, history_append, undo_redo_cycle);
criterion_main!(benches);
