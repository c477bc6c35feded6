#![forbid(unsafe_code)]

//! Domain types for a single encoder decision.

use serde::{Deserialize, Serialize};

/// A possible match the encoder considered before choosing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Window position the candidate copies from.
    pub start: usize,
    /// Number of bytes that agreed before the first mismatch.
    pub length: usize,
    /// The agreeing bytes themselves.
    #[serde(default)]
    pub matched_bytes: Vec<u8>,
}

/// What the encoder emitted at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// One raw byte.
    Literal { value: u8 },
    /// Copy `length` bytes starting `offset` bytes back.
    ///
    /// `match_start == position - offset`. The copy may run into the bytes it
    /// is producing (overlapping copy).
    Match {
        offset: usize,
        length: usize,
        match_start: usize,
    },
}

impl Action {
    #[inline]
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }
}

/// One output symbol: either a literal byte or a back-reference.
///
/// Serialized exactly like the endpoint's `compressed_data` entries:
/// `{"type":"literal","value":65}` or `{"type":"match","offset":3,"length":4}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputSymbol {
    Literal { value: u8 },
    Match { offset: usize, length: usize },
}

impl OutputSymbol {
    /// Number of original bytes this symbol stands for.
    #[inline]
    #[must_use]
    pub const fn emitted_len(&self) -> usize {
        match self {
            Self::Literal { .. } => 1,
            Self::Match { length, .. } => *length,
        }
    }
}

/// A single compression step, immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Index into the original byte sequence being processed.
    pub position: usize,
    /// Inclusive lower bound of the sliding window.
    pub window_start: usize,
    /// The decision taken.
    pub action: Action,
    /// Matches considered at this position, in window order.
    pub candidates: Vec<Candidate>,
}

impl Step {
    /// Literal step with no candidates.
    #[must_use]
    pub fn literal(position: usize, window_start: usize, value: u8) -> Self {
        Self {
            position,
            window_start,
            action: Action::Literal { value },
            candidates: Vec::new(),
        }
    }

    /// Match step copying from `match_start`; the offset is derived.
    #[must_use]
    pub fn matched(
        position: usize,
        window_start: usize,
        match_start: usize,
        length: usize,
        candidates: Vec<Candidate>,
    ) -> Self {
        Self {
            position,
            window_start,
            action: Action::Match {
                offset: position.saturating_sub(match_start),
                length,
                match_start,
            },
            candidates,
        }
    }

    /// The symbol this step contributes to the compressed stream.
    #[must_use]
    pub const fn symbol(&self) -> OutputSymbol {
        match self.action {
            Action::Literal { value } => OutputSymbol::Literal { value },
            Action::Match { offset, length, .. } => OutputSymbol::Match { offset, length },
        }
    }

    /// Number of input bytes consumed by this step.
    #[inline]
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.symbol().emitted_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matched_derives_offset() {
        let step = Step::matched(5, 0, 2, 4, Vec::new());
        assert_eq!(
            step.action,
            Action::Match {
                offset: 3,
                length: 4,
                match_start: 2
            }
        );
        assert_eq!(step.consumed(), 4);
    }

    #[test]
    fn literal_symbol_consumes_one_byte() {
        let step = Step::literal(0, 0, b'A');
        assert_eq!(step.symbol(), OutputSymbol::Literal { value: 65 });
        assert_eq!(step.consumed(), 1);
        assert!(!step.action.is_match());
    }

    #[test]
    fn output_symbol_serializes_with_type_tag() {
        let json = serde_json::to_string(&OutputSymbol::Match {
            offset: 3,
            length: 4,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"match","offset":3,"length":4}"#);

        let back: OutputSymbol = serde_json::from_str(r#"{"type":"literal","value":65}"#).unwrap();
        assert_eq!(back, OutputSymbol::Literal { value: 65 });
    }
}
