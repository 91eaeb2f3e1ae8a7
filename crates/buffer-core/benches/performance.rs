use buffer_core::{
    BufferFactory, ChunkBuilder, EditOperation, Position, TextBuffer,
};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 80);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (buffer-core benchmark line)\n"
        ));
    }
    // Remove the final '\n' to avoid creating an extra trailing empty line.
    out.pop();
    out
}

/// Feed text to the builder in fixed-size chunks, the way a file loader would.
///
/// The text is ASCII, so byte-boundary chunking is safe.
fn factory_from(text: &str) -> BufferFactory {
    let mut builder = ChunkBuilder::new();
    for chunk in text.as_bytes().chunks(64 * 1024) {
        builder.accept_chunk(std::str::from_utf8(chunk).unwrap());
    }
    builder.finish()
}

fn type_in_middle<B: TextBuffer>(buffer: &mut B, keystrokes: usize) {
    let mut offset = buffer.char_count() / 2;
    for _ in 0..keystrokes {
        buffer
            .apply_edits(&[EditOperation::insert_at(offset, "x")], false)
            .unwrap();
        offset += 1;
    }
}

fn bench_bulk_load(c: &mut Criterion) {
    let text = large_text(50_000);

    c.bench_function("bulk_load/piece_tree_50k_lines", |b| {
        b.iter(|| {
            let buffer = factory_from(black_box(&text)).build();
            black_box(buffer.line_count());
        })
    });

    c.bench_function("bulk_load/line_array_50k_lines", |b| {
        b.iter(|| {
            let buffer = factory_from(black_box(&text)).build_line_array();
            black_box(buffer.line_count());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(50_000);
    let factory = factory_from(&text);

    c.bench_function("typing_middle/piece_tree_100_inserts", |b| {
        b.iter_batched(
            || factory.build(),
            |mut buffer| {
                type_in_middle(&mut buffer, 100);
                black_box(buffer.char_count());
            },
            BatchSize::LargeInput,
        )
    });

    c.bench_function("typing_middle/line_array_100_inserts", |b| {
        b.iter_batched(
            || factory.build_line_array(),
            |mut buffer| {
                type_in_middle(&mut buffer, 100);
                black_box(buffer.char_count());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_line_access(c: &mut Criterion) {
    let text = large_text(50_000);
    let factory = factory_from(&text);

    // Fragment the piece tree first so descents cross real piece boundaries.
    let mut tree = factory.build();
    for i in 0..1_000 {
        let offset = (i * 37) % tree.char_count();
        tree.apply_edits(&[EditOperation::insert_at(offset, "y")], false)
            .unwrap();
    }
    let array = factory.build_line_array();

    c.bench_function("line_access/piece_tree_1k_lines", |b| {
        b.iter(|| {
            for line in (1..=50_000).step_by(50) {
                black_box(tree.line_length(line).unwrap());
            }
        })
    });

    c.bench_function("line_access/line_array_1k_lines", |b| {
        b.iter(|| {
            for line in (1..=50_000).step_by(50) {
                black_box(array.line_length(line).unwrap());
            }
        })
    });
}

fn bench_coordinate_translation(c: &mut Criterion) {
    let text = large_text(50_000);
    let factory = factory_from(&text);
    let tree = factory.build();
    let array = factory.build_line_array();
    let step = tree.char_count() / 1_000;

    c.bench_function("positions/piece_tree_1k_roundtrips", |b| {
        b.iter(|| {
            for offset in (0..tree.char_count()).step_by(step) {
                let position = tree.position_at(offset).unwrap();
                black_box(tree.offset_at(black_box(position)).unwrap());
            }
        })
    });

    c.bench_function("positions/line_array_1k_roundtrips", |b| {
        b.iter(|| {
            for offset in (0..array.char_count()).step_by(step) {
                let position = array.position_at(offset).unwrap();
                black_box(array.offset_at(black_box(position)).unwrap());
            }
        })
    });

    c.bench_function("positions/piece_tree_line_starts", |b| {
        b.iter(|| {
            for line in (1..=50_000).step_by(500) {
                black_box(tree.offset_at(Position::new(line, 1)).unwrap());
            }
        })
    });
}

criterion_group!(
    benches,
    bench_bulk_load,
    bench_typing_in_middle,
    bench_line_access,
    bench_coordinate_translation
);
criterion_main!(benches);
