//! Plain-text rendering of the view model and audible cues.
//!
//! The frame is line oriented so it works in pipes and logs as well as in an
//! interactive terminal. Byte markers under the input line:
//!
//! | marker | meaning                           |
//! |--------|-----------------------------------|
//! | `-`    | inside the look-back window       |
//! | `s`    | match source                      |
//! | `c`    | bytes produced by the match       |
//! | `*`    | both source and copy (overlap)    |
//! | `L`    | literal byte at the cursor        |

use std::io::Write;

use lzviz_audio::{Clip, ClipId, ClipPlayer, PcmSink};
use lzviz_core::{ByteMarks, OutputSymbol, StepLog, ViewModel};
use lzviz_runtime::{Controls, PresentationAdapter, SessionError};
use tracing::warn;

/// Candidate rows shown per frame.
const MAX_CANDIDATES: usize = 5;

fn glyph(byte: u8) -> char {
    if byte.is_ascii_graphic() || byte == b' ' {
        char::from(byte)
    } else {
        '\u{b7}'
    }
}

fn marker(marks: ByteMarks) -> char {
    if marks.contains(ByteMarks::LITERAL) {
        'L'
    } else if marks.contains(ByteMarks::SOURCE | ByteMarks::COPIED) {
        '*'
    } else if marks.contains(ByteMarks::COPIED) {
        'c'
    } else if marks.contains(ByteMarks::SOURCE) {
        's'
    } else if marks.contains(ByteMarks::IN_WINDOW) {
        '-'
    } else {
        ' '
    }
}

fn symbol_text(symbol: &OutputSymbol) -> String {
    match *symbol {
        OutputSymbol::Literal { value } => format!("L({})", glyph(value)),
        OutputSymbol::Match { offset, length } => format!("M({offset},{length})"),
    }
}

/// Render one frame.
#[must_use]
pub fn render_frame(input: &[u8], view: &ViewModel, controls: &Controls) -> String {
    let mut out = String::new();
    let state = if controls.playing { "playing" } else { "paused" };
    out.push_str(&format!(
        "step {}  speed {} ({} ms)  {state}\n",
        view.progress, controls.speed, controls.interval_ms
    ));

    let marks = view.byte_marks(input.len());
    let bytes: String = input.iter().map(|&b| glyph(b)).collect();
    let markers: String = marks.iter().map(|&m| marker(m)).collect();
    out.push_str(&format!("  input  |{bytes}|\n"));
    out.push_str(&format!("         {}\n", markers.trim_end()));

    if let Some(candidates) = &view.candidates {
        for candidate in candidates.iter().take(MAX_CANDIDATES) {
            let text: String = candidate.matched_bytes.iter().map(|&b| glyph(b)).collect();
            out.push_str(&format!(
                "  {} start {:>3} len {:>3} \"{text}\"\n",
                if candidate.chosen { '>' } else { ' ' },
                candidate.start,
                candidate.length
            ));
        }
        if candidates.len() > MAX_CANDIDATES {
            out.push_str(&format!(
                "    ... {} more\n",
                candidates.len() - MAX_CANDIDATES
            ));
        }
    }

    let output: Vec<String> = view.cumulative_output.iter().map(symbol_text).collect();
    out.push_str(&format!("  output {}\n", output.join(" ")));
    out.push_str(&format!("  {}\n", view.explanation));
    out
}

/// Writes frames and errors to a text stream.
#[derive(Debug)]
pub struct TerminalPresenter<W> {
    out: W,
    input: Vec<u8>,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            input: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    fn write(&mut self, text: &str) {
        if let Err(error) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            warn!(%error, "terminal write failed");
        }
    }
}

impl<W: Write> PresentationAdapter for TerminalPresenter<W> {
    fn log_replaced(&mut self, log: &StepLog) {
        self.input = log.original().to_vec();
    }

    fn render(&mut self, view: &ViewModel, controls: &Controls) {
        let frame = render_frame(&self.input, view, controls);
        self.write(&frame);
    }

    fn update_controls(&mut self, controls: &Controls) {
        let line = format!(
            "  [{}] speed {} ({} ms){}\n",
            if controls.playing { "playing" } else { "paused" },
            controls.speed,
            controls.interval_ms,
            if controls.submitting { ", compressing..." } else { "" }
        );
        self.write(&line);
    }

    fn report_error(&mut self, error: &SessionError) {
        self.write(&format!("error: {error}\n"));
    }
}

/// Announces clips as text instead of playing them.
#[derive(Debug)]
pub struct TextClipPlayer<W> {
    out: W,
}

impl<W: Write> TextClipPlayer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ClipPlayer for TextClipPlayer<W> {
    fn play_clip(&mut self, id: ClipId, clip: &Clip, volume: f32) {
        let _ = writeln!(
            self.out,
            "\u{266a} {} ({}, {} bytes, volume {volume:.1})",
            id.name(),
            clip.mime,
            clip.bytes.len()
        );
    }
}

/// Summarizes rendered tones as text.
#[derive(Debug)]
pub struct TextPcmMeter<W> {
    out: W,
}

impl<W: Write> TextPcmMeter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> PcmSink for TextPcmMeter<W> {
    fn submit(&mut self, samples: &[f32], sample_rate: u32) {
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        let millis = samples.len() as u64 * 1000 / u64::from(sample_rate.max(1));
        let _ = writeln!(self.out, "\u{266a} tone {millis} ms, peak {peak:.2}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lzviz_core::project;
    use lzviz_runtime::{CompressionTransport, LocalTransport, Session};

    fn session(input: &str) -> Session {
        let mut session = Session::default();
        session.submit_with(input, &LocalTransport::default()).unwrap();
        session
    }

    #[test]
    fn initial_frame_has_no_markers() {
        let session = session("abc");
        let frame = render_frame(b"abc", &session.view(), &session.controls());
        assert!(frame.starts_with("step 0/3"));
        assert!(frame.contains("|abc|"));
        assert!(frame.contains("Starting compression"));
    }

    #[test]
    fn match_frame_marks_source_and_copy() {
        let response = LocalTransport::default().compress("abcdecdec").unwrap();
        let log = StepLog::from_response(&response).unwrap();
        let view = project(&log, 5);
        let session = Session::default();
        let frame = render_frame(log.original(), &view, &session.controls());
        // Source 2..6 and copy 5..9 overlap at byte 5.
        assert!(frame.contains("         --sss*ccc"), "{frame}");
        assert!(frame.contains("M(3,4)"));
    }

    #[test]
    fn literal_frame_marks_cursor() {
        let mut session = session("ab");
        session.seek(1);
        let frame = render_frame(b"ab", &session.view(), &session.controls());
        assert!(frame.contains("         -L"), "{frame}");
        assert!(frame.contains("output L(a) L(b)"));
    }

    #[test]
    fn presenter_uses_replaced_log() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        let session = session("hi");
        presenter.log_replaced(session.log());
        presenter.render(&session.view(), &session.controls());
        let text = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(text.contains("|hi|"));
    }

    #[test]
    fn pcm_meter_reports_duration() {
        let mut meter = TextPcmMeter::new(Vec::new());
        meter.submit(&[0.0, 0.5, -0.25, 0.0], 4);
        assert_eq!(String::from_utf8(meter.out).unwrap(), "\u{266a} tone 1000 ms, peak 0.50\n");
    }
}
