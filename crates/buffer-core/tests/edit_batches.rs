//! Edit batch semantics: pre-batch coordinates, atomic rejection, versioning,
//! change events, inverse edits, and snapshot isolation.

use buffer_core::{
    BufferError, ChunkBuilder, EditOperation, PieceTreeBuffer, Position, Range, TextBuffer,
};
use std::sync::{Arc, Mutex};

#[test]
fn test_batch_uses_pre_batch_coordinates() {
    let mut buffer = PieceTreeBuffer::from_text("aaa bbb ccc");

    // All three ranges address the text as it was before the batch, listed out of order.
    let applied = buffer
        .apply_edits(
            &[
                EditOperation::replace_chars(8, 11, "three"),
                EditOperation::replace_chars(0, 3, "one"),
                EditOperation::replace_chars(4, 7, "twotwo"),
            ],
            false,
        )
        .unwrap();

    assert_eq!(buffer.get_text(), "one twotwo three");
    assert_eq!(applied.version, 1);
    assert_eq!(buffer.version(), 1);

    // Reported spans come back ascending in pre-batch coordinates.
    let starts: Vec<usize> = applied.changes.iter().map(|c| c.start).collect();
    assert_eq!(starts, vec![0, 4, 8]);
}

#[test]
fn test_equal_offset_inserts_keep_input_order() {
    let mut buffer = PieceTreeBuffer::from_text("ab");
    buffer
        .apply_edits(
            &[
                EditOperation::insert_at(1, "x"),
                EditOperation::insert_at(1, "y"),
            ],
            false,
        )
        .unwrap();
    assert_eq!(buffer.get_text(), "axyb");
}

#[test]
fn test_touching_ranges_are_allowed() {
    let mut buffer = PieceTreeBuffer::from_text("abcdef");
    buffer
        .apply_edits(
            &[
                EditOperation::replace_chars(0, 3, "X"),
                EditOperation::replace_chars(3, 5, "Y"),
            ],
            false,
        )
        .unwrap();
    assert_eq!(buffer.get_text(), "XYf");
}

#[test]
fn test_insert_at_delete_start_accepted_in_either_order() {
    // An empty range at the start offset of a delete touches it, never overlaps it;
    // acceptance must not depend on the order the caller listed the edits.
    let batch_a = [
        EditOperation::insert_at(2, "X"),
        EditOperation::delete_chars(2, 5),
    ];
    let batch_b = [
        EditOperation::delete_chars(2, 5),
        EditOperation::insert_at(2, "X"),
    ];

    for batch in [&batch_a, &batch_b] {
        let mut buffer = PieceTreeBuffer::from_text("abcdefgh");
        buffer.apply_edits(batch, false).unwrap();
        assert_eq!(buffer.get_text(), "abXfgh");
    }
}

#[test]
fn test_overlapping_batch_rejected_atomically() {
    let mut buffer = PieceTreeBuffer::from_text("abcdef");
    let events = Arc::new(Mutex::new(0usize));
    {
        let events = Arc::clone(&events);
        buffer.subscribe(Box::new(move |_| {
            *events.lock().unwrap() += 1;
        }));
    }

    let result = buffer.apply_edits(
        &[
            EditOperation::replace_chars(0, 4, "A"),
            EditOperation::replace_chars(3, 6, "B"),
        ],
        false,
    );

    assert!(matches!(
        result,
        Err(BufferError::OverlappingEdits {
            earlier_end: 4,
            later_start: 3
        })
    ));
    // Nothing happened: content, version, and subscribers are all untouched.
    assert_eq!(buffer.get_text(), "abcdef");
    assert_eq!(buffer.version(), 0);
    assert_eq!(*events.lock().unwrap(), 0);
}

#[test]
fn test_invalid_edit_in_batch_rejects_whole_batch() {
    let mut buffer = PieceTreeBuffer::from_text("abc");
    let result = buffer.apply_edits(
        &[
            EditOperation::insert_at(0, "ok"),
            EditOperation::delete_chars(2, 99),
        ],
        false,
    );
    assert!(matches!(
        result,
        Err(BufferError::OffsetOutOfRange { offset: 99, .. })
    ));
    assert_eq!(buffer.get_text(), "abc");
    assert_eq!(buffer.version(), 0);
}

#[test]
fn test_version_bumps_once_per_batch() {
    let mut buffer = PieceTreeBuffer::from_text("0123456789");
    buffer
        .apply_edits(
            &[
                EditOperation::insert_at(0, "a"),
                EditOperation::insert_at(5, "b"),
                EditOperation::insert_at(10, "c"),
            ],
            false,
        )
        .unwrap();
    assert_eq!(buffer.version(), 1);

    buffer
        .apply_edits(&[EditOperation::insert_at(0, "d")], false)
        .unwrap();
    assert_eq!(buffer.version(), 2);
}

#[test]
fn test_change_events_carry_version_and_spans() {
    let mut buffer = PieceTreeBuffer::from_text("hello world");
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        buffer.subscribe(Box::new(move |event| {
            seen.lock().unwrap().push(event.clone());
        }));
    }

    buffer
        .apply_edits(&[EditOperation::replace_chars(0, 5, "goodbye")], false)
        .unwrap();

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].version, 1);
    assert_eq!(events[0].changes.len(), 1);
    assert_eq!(events[0].changes[0].start, 0);
    assert_eq!(events[0].changes[0].deleted_chars, 5);
    assert_eq!(events[0].changes[0].inserted_chars, 7);
}

#[test]
fn test_position_and_offset_edits_mix_in_one_batch() {
    let mut buffer = PieceTreeBuffer::from_text("one\ntwo\nthree");
    buffer
        .apply_edits(
            &[
                EditOperation::insert(Position::new(2, 1), "2: "),
                EditOperation::delete(Range::new(Position::new(3, 1), Position::new(3, 3))),
                EditOperation::replace_chars(0, 3, "ONE"),
            ],
            false,
        )
        .unwrap();
    assert_eq!(buffer.get_text(), "ONE\n2: two\nree");
}

#[test]
fn test_reverse_batch_restores_content_exactly() {
    let mut buffer = PieceTreeBuffer::from_text("The quick brown fox\njumps over\nthe lazy dog\n");
    let before = buffer.get_text();

    let applied = buffer
        .apply_edits(
            &[
                EditOperation::replace_chars(4, 9, "slow"),
                EditOperation::delete_chars(10, 16),
                EditOperation::insert_at(20, "high "),
            ],
            true,
        )
        .unwrap();
    assert_ne!(buffer.get_text(), before);

    let reverse = applied.reverse.expect("reverse batch was requested");
    buffer.apply_edits(&reverse, false).unwrap();
    assert_eq!(buffer.get_text(), before);
    // Undo is itself an edit batch.
    assert_eq!(buffer.version(), 2);

    // Line-by-line reconstruction also reproduces the original (LF-only document).
    let rebuilt: Vec<String> = (1..=buffer.line_count())
        .map(|line| buffer.line_content(line).unwrap())
        .collect();
    assert_eq!(rebuilt.join("\n"), before);
}

#[test]
fn test_reverse_batches_under_random_churn() {
    let mut buffer = PieceTreeBuffer::from_text("abcdefghijklmnopqrstuvwxyz\n0123456789\n");
    let mut state = 0x2545f4914f6cdd1du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    for _ in 0..200 {
        let before = buffer.get_text();
        let len = buffer.char_count();

        // Three disjoint ranges from six sorted cut points.
        let mut cuts: Vec<usize> = (0..6).map(|_| next() as usize % (len + 1)).collect();
        cuts.sort_unstable();
        let texts = ["", "X", "你好\n", "longer insert"];
        let batch: Vec<EditOperation> = (0..3)
            .map(|i| {
                EditOperation::replace_chars(
                    cuts[i * 2],
                    cuts[i * 2 + 1],
                    texts[next() as usize % texts.len()],
                )
            })
            .collect();

        // Sorted cut points make the ranges disjoint (touching at most), so the
        // batch is always accepted.
        let applied = buffer.apply_edits(&batch, true).unwrap();

        let reverse = applied.reverse.expect("reverse batch was requested");
        buffer.apply_edits(&reverse, false).unwrap();
        assert_eq!(buffer.get_text(), before, "undo failed to restore content");

        // Redo the batch so the walk keeps making progress through new states.
        buffer.apply_edits(&batch, false).unwrap();
    }
}

#[test]
fn test_snapshot_isolated_from_later_edits() {
    let mut builder = ChunkBuilder::new();
    builder.accept_chunk("chunk one\n");
    builder.accept_chunk("chunk two\n");
    let mut buffer = builder.finish().build();

    let snapshot = buffer.create_snapshot();
    assert_eq!(snapshot.version(), 0);

    buffer
        .apply_edits(&[EditOperation::replace_chars(0, 5, "edited")], false)
        .unwrap();
    assert_eq!(buffer.get_text(), "edited one\nchunk two\n");

    // The snapshot still reads the pre-edit content, in order.
    assert_eq!(snapshot.text(), "chunk one\nchunk two\n");

    let fresh = buffer.create_snapshot();
    assert_eq!(fresh.version(), 1);
    assert_eq!(fresh.text(), "edited one\nchunk two\n");
}

#[test]
fn test_snapshot_read_streams_chunks() {
    let mut builder = ChunkBuilder::new();
    builder.accept_chunk("alpha ");
    builder.accept_chunk("beta");
    let mut buffer = builder.finish().build();
    buffer
        .apply_edits(&[EditOperation::insert_at(10, " gamma")], false)
        .unwrap();

    let mut snapshot = buffer.create_snapshot();
    let mut collected = String::new();
    while let Some(chunk) = snapshot.read() {
        assert!(!chunk.is_empty());
        collected.push_str(chunk);
    }
    assert_eq!(collected, "alpha beta gamma");
}
