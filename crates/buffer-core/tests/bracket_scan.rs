//! Bracket scan determinism: scanning from every column of every line must agree
//! with a reference list of bracket occurrences computed by direct character scan.

use buffer_core::{BracketScanner, PieceTreeBuffer, Position, Range, TextBuffer};
use buffer_core_lang::BracketPairs;

/// One bracket occurrence found by walking the text directly.
#[derive(Debug, Clone, PartialEq)]
struct Occurrence {
    line: usize,
    start_column: usize,
    end_column: usize,
    text: String,
}

/// Enumerate all single-character bracket tokens in document order by direct scan.
fn reference_occurrences(buffer: &PieceTreeBuffer, pairs: &BracketPairs) -> Vec<Occurrence> {
    let mut out = Vec::new();
    for line in 1..=buffer.line_count() {
        let content = buffer.line_content(line).unwrap();
        for (i, ch) in content.chars().enumerate() {
            let token = ch.to_string();
            if pairs.is_open(&token) || pairs.is_close(&token) {
                out.push(Occurrence {
                    line,
                    start_column: i + 1,
                    end_column: i + 2,
                    text: token,
                });
            }
        }
    }
    out
}

#[test]
fn test_scans_from_every_column_match_reference() {
    let fixture = "if (a == 3) { return (7 * (a + 5)); }";
    let buffer = PieceTreeBuffer::from_text(fixture);
    let pairs = BracketPairs::curly_family();
    let scanner = BracketScanner::new(&buffer, &pairs).unwrap();

    let reference = reference_occurrences(&buffer, &pairs);
    assert_eq!(reference.len(), 8, "fixture should contain eight brackets");

    for line in 1..=buffer.line_count() {
        let columns = buffer.line_length(line).unwrap() + 1;
        for column in 1..=columns {
            let position = Position::new(line, column);

            // Forward: the first reference occurrence at or after the position.
            let expected = reference
                .iter()
                .find(|o| o.line > line || (o.line == line && o.start_column >= column));
            let found = scanner.find_next_bracket(position).unwrap();
            match (expected, &found) {
                (Some(o), Some(f)) => {
                    assert_eq!(f.text, o.text, "next from {position:?}");
                    assert_eq!(
                        f.range,
                        Range::new(
                            Position::new(o.line, o.start_column),
                            Position::new(o.line, o.end_column)
                        ),
                        "next from {position:?}"
                    );
                }
                (None, None) => {}
                other => panic!("next from {position:?} diverged: {other:?}"),
            }

            // Backward: the last reference occurrence ending at or before the position.
            let expected = reference
                .iter()
                .filter(|o| o.line < line || (o.line == line && o.end_column <= column))
                .next_back();
            let found = scanner.find_prev_bracket(position).unwrap();
            match (expected, &found) {
                (Some(o), Some(f)) => {
                    assert_eq!(f.text, o.text, "prev from {position:?}");
                    assert_eq!(f.range.start, Position::new(o.line, o.start_column));
                }
                (None, None) => {}
                other => panic!("prev from {position:?} diverged: {other:?}"),
            }
        }
    }
}

#[test]
fn test_multi_line_fixture_matches_reference() {
    let fixture = "fn demo(xs: &[u32]) {\n    if xs.is_empty() {\n        return;\n    }\n    let y = (xs[0] + 1) * 2;\n}\n";
    let buffer = PieceTreeBuffer::from_text(fixture);
    let pairs = BracketPairs::curly_family();
    let scanner = BracketScanner::new(&buffer, &pairs).unwrap();

    let reference = reference_occurrences(&buffer, &pairs);

    // Walking forward occurrence by occurrence visits the reference list in order.
    let mut walked = Vec::new();
    let mut position = Position::document_start();
    while let Some(found) = scanner.find_next_bracket(position).unwrap() {
        walked.push(Occurrence {
            line: found.range.start.line,
            start_column: found.range.start.column,
            end_column: found.range.end.column,
            text: found.text.clone(),
        });
        position = found.range.end;
    }
    assert_eq!(walked, reference);
}
