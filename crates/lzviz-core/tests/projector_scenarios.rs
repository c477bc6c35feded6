//! Scenario tests for the step projector.
//!
//! Each scenario builds a small step log by hand, moves a cursor across it
//! and checks the projected view at every stop.

use lzviz_core::{
    ByteMarks, Candidate, CompressResponse, CursorMove, Direction, Explanation, OutputSymbol,
    PlaybackCursor, Step, StepLog, project,
};
use pretty_assertions::assert_eq;

fn literal_log(text: &[u8]) -> StepLog {
    let steps = text
        .iter()
        .enumerate()
        .map(|(i, &byte)| Step::literal(i, 0, byte))
        .collect();
    StepLog::new(text.to_vec(), steps).unwrap()
}

/// "abcdecdec": five literals, then "cdec" copied from offset 3.
fn match_log() -> StepLog {
    let original = b"abcdecdec".to_vec();
    let mut steps: Vec<Step> = (0..5).map(|i| Step::literal(i, 0, original[i])).collect();
    steps.push(Step::matched(
        5,
        0,
        2,
        4,
        vec![
            Candidate {
                start: 1,
                length: 0,
                matched_bytes: Vec::new(),
            },
            Candidate {
                start: 2,
                length: 4,
                matched_bytes: b"cdec".to_vec(),
            },
        ],
    ));
    StepLog::new(original, steps).unwrap()
}

#[test]
fn literal_scenario() {
    let log = literal_log(b"AB");
    let mut cursor = PlaybackCursor::new(log.len());

    assert!(cursor.step_by(Direction::Forward).moved());
    let view = project(&log, cursor.position());
    assert_eq!(
        view.cumulative_output,
        vec![OutputSymbol::Literal { value: 65 }]
    );
    assert_eq!(view.candidates, Some(Vec::new()));
    assert_eq!(view.explanation, Explanation::Literal { value: 65 });
    assert!(view.explanation.to_string().contains("'A'"));
    assert_eq!(view.progress.to_string(), "1/2");

    let window = view.window.unwrap();
    assert_eq!(window.window, 0..0);
    assert_eq!(window.current, 0);
    assert_eq!(window.literal, Some(0));
    assert_eq!(window.source, None);
}

#[test]
fn match_scenario() {
    let log = match_log();
    let mut cursor = PlaybackCursor::new(log.len());
    assert_eq!(cursor.seek(5), CursorMove::Moved { from: -1, to: 5 });

    let view = project(&log, cursor.position());
    let window = view.window.clone().unwrap();
    assert_eq!(window.window, 0..5);
    assert_eq!(window.source, Some(2..6));
    assert_eq!(window.copied, Some(5..9));
    assert_eq!(
        view.cumulative_output.last(),
        Some(&OutputSymbol::Match {
            offset: 3,
            length: 4
        })
    );
    assert_eq!(view.cumulative_output.len(), 6);
    assert_eq!(
        view.explanation,
        Explanation::Match {
            offset: 3,
            length: 4,
            savings: 2
        }
    );
    assert!(
        view.explanation
            .to_string()
            .contains("we store a reference (3, 4). This saves 2 bytes")
    );

    let candidates = view.candidates.clone().unwrap();
    let chosen: Vec<usize> = candidates
        .iter()
        .filter(|c| c.chosen)
        .map(|c| c.start)
        .collect();
    assert_eq!(chosen, vec![2]);

    // Byte 5 is both in the source run and the copied run.
    let marks = view.byte_marks(log.original().len());
    assert!(marks[5].contains(ByteMarks::SOURCE | ByteMarks::COPIED | ByteMarks::CURRENT));
    assert!(marks[8].contains(ByteMarks::COPIED));
    assert!(!marks[8].contains(ByteMarks::IN_WINDOW));
}

#[test]
fn action_tag_decides_candidate_listing() {
    // A literal step that still records considered candidates.
    let mut literal = Step::literal(2, 0, b'c');
    literal.candidates = vec![Candidate {
        start: 0,
        length: 1,
        matched_bytes: b"c".to_vec(),
    }];
    let log = StepLog::new(
        b"abc".to_vec(),
        vec![Step::literal(0, 0, b'a'), Step::literal(1, 0, b'b'), literal],
    )
    .unwrap();

    let view = project(&log, 2);
    assert_eq!(view.candidates, Some(Vec::new()));
    assert_eq!(view.explanation, Explanation::Literal { value: b'c' });

    // A match step with no recorded candidates is still a match.
    let log = StepLog::new(
        b"aaa".to_vec(),
        vec![Step::literal(0, 0, b'a'), Step::matched(1, 0, 0, 2, Vec::new())],
    )
    .unwrap();
    let view = project(&log, 1);
    assert_eq!(view.candidates, Some(Vec::new()));
    assert!(matches!(view.explanation, Explanation::Match { length: 2, .. }));
}

#[test]
fn jump_and_walk_agree() {
    let log = match_log();
    let mut walking = PlaybackCursor::new(log.len());
    while walking.step_by(Direction::Forward).moved() {}
    let mut jumping = PlaybackCursor::new(log.len());
    let _ = jumping.seek(5);

    assert_eq!(
        project(&log, walking.position()),
        project(&log, jumping.position())
    );
}

#[test]
fn response_json_feeds_projector() {
    let body = r#"{
        "original_data": [65, 65, 65, 65],
        "compressed_data": [
            {"type": "literal", "value": 65},
            {"type": "match", "offset": 1, "length": 3}
        ],
        "steps": [
            {"position": 0, "window_start": 0, "current_byte": 65, "matches": [],
             "action": "literal", "literal_value": 65},
            {"position": 1, "window_start": 0, "current_byte": 65,
             "matches": [{"start": 0, "length": 3, "matched_bytes": [65, 65, 65]}],
             "action": "match", "match_offset": 1, "match_length": 3,
             "best_match_start": 0}
        ],
        "compression_ratio": 0.8
    }"#;
    let response = CompressResponse::from_json_str(body).unwrap();
    let log = StepLog::from_response(&response).unwrap();
    assert_eq!(log.reconstruct().unwrap(), b"AAAA");

    let view = project(&log, 1);
    let window = view.window.unwrap();
    assert_eq!(window.source, Some(0..3));
    assert_eq!(window.copied, Some(1..4));
}

#[test]
fn view_model_exports_as_json() {
    let view = project(&match_log(), 5);
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["explanation"]["kind"], "match");
    assert_eq!(json["progress"]["completed"], 6);
    assert_eq!(json["window"]["source"]["start"], 2);
    assert_eq!(json["cumulative_output"][5]["type"], "match");
}
