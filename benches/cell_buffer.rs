//! Cell buffer performance benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use gapcell::{CellBuffer, CellBufferOptions, LineEndTypes, Partitioning, RunStyles};
use std::hint::black_box;

fn document(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("line {i}: the quick brown fox jumps over the lazy dog\n"))
        .collect()
}

fn loaded(text: &str) -> CellBuffer {
    let mut buffer = CellBuffer::new();
    let _ = buffer.insert_string(0, text.as_bytes());
    buffer
}

fn buffer_creation(c: &mut Criterion) {
    c.bench_function("cellbuffer_new", |b| {
        b.iter(|| CellBuffer::new());
    });

    let text = document(1_000);
    c.bench_function("cellbuffer_load_1k_lines", |b| {
        b.iter(|| loaded(black_box(&text)));
    });

    let options = CellBufferOptions {
        line_end_types: LineEndTypes::UNICODE,
        ..CellBufferOptions::default()
    };
    c.bench_function("cellbuffer_load_1k_lines_unicode", |b| {
        b.iter(|| {
            let mut buffer = CellBuffer::with_options(options).unwrap();
            buffer.insert_string(0, black_box(text.as_bytes())).unwrap();
            buffer
        });
    });
}

fn buffer_typing(c: &mut Criterion) {
    let text = document(1_000);

    c.bench_function("cellbuffer_type_middle_100", |b| {
        b.iter_batched(
            || loaded(&text),
            |mut buffer| {
                let mut pos = buffer.length() / 2;
                for _ in 0..100 {
                    buffer.insert_string(pos, b"x").unwrap();
                    pos += 1;
                }
                buffer
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("cellbuffer_newlines_scattered_100", |b| {
        b.iter_batched(
            || loaded(&text),
            |mut buffer| {
                for i in 0..100 {
                    let pos = (i * 613) % buffer.length();
                    buffer.insert_string(pos, b"\r\n").unwrap();
                }
                buffer
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("cellbuffer_backspace_100", |b| {
        b.iter_batched(
            || loaded(&text),
            |mut buffer| {
                let mut pos = buffer.length() / 2;
                for _ in 0..100 {
                    pos -= 1;
                    buffer.delete_chars(pos, 1).unwrap();
                }
                buffer
            },
            BatchSize::SmallInput,
        );
    });
}

fn buffer_queries(c: &mut Criterion) {
    let mut buffer = loaded(&document(10_000));
    let length = buffer.length();

    c.bench_function("cellbuffer_line_from_position", |b| {
        b.iter(|| buffer.line_from_position(black_box(length / 3)));
    });

    c.bench_function("cellbuffer_line_start", |b| {
        b.iter(|| buffer.line_start(black_box(5_000)));
    });

    c.bench_function("cellbuffer_range_pointer", |b| {
        b.iter(|| black_box(buffer.range_pointer(black_box(length / 2), 64).len()));
    });
}

fn partition_shifts(c: &mut Criterion) {
    c.bench_function("partitioning_insert_text_near_step", |b| {
        b.iter_batched(
            || {
                let mut partitions = Partitioning::new(8);
                for i in 1..=10_000 {
                    partitions.insert_text(i - 1, 10);
                    partitions.insert_partition(i, i * 10).unwrap();
                }
                partitions
            },
            |mut partitions| {
                for i in 0..100 {
                    partitions.insert_text(5_000 + i, 1);
                }
                partitions
            },
            BatchSize::SmallInput,
        );
    });
}

fn run_styles_fill(c: &mut Criterion) {
    c.bench_function("runstyles_fill_alternating", |b| {
        b.iter(|| {
            let mut runs: RunStyles<u8> = RunStyles::new();
            runs.insert_space(0, 10_000).unwrap();
            for i in 0..500 {
                runs.fill_range(i * 20, (i % 3) as u8 + 1, 10).unwrap();
            }
            runs
        });
    });
}

criterion_group!(
    benches,
    buffer_creation,
    buffer_typing,
    buffer_queries,
    partition_shifts,
    run_styles_fill
);
criterion_main!(benches);
