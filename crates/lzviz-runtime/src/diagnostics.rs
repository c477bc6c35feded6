#![forbid(unsafe_code)]

//! Bounded, deterministic event log of a playback session.
//!
//! Entries carry a sequence number rather than a timestamp so that two runs
//! of the same command script export identical JSONL.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// `[diagnostics]` section of the visualizer config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticConfig {
    pub enabled: bool,
    /// Oldest entries are evicted beyond this many.
    pub max_entries: usize,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 500,
        }
    }
}

/// One logged event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEntry {
    /// The cursor moved.
    Nav {
        seq: u64,
        action: &'static str,
        from: isize,
        to: isize,
        total: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        cue: Option<&'static str>,
    },
    /// Play state or speed changed.
    Playback {
        seq: u64,
        playing: bool,
        speed: u32,
        cursor: isize,
    },
    /// A submission finished one way or another.
    Submission {
        seq: u64,
        generation: u64,
        outcome: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        steps: Option<usize>,
    },
    /// Reset requested.
    Reset { seq: u64, from: isize },
}

impl DiagnosticEntry {
    /// One JSON object, no trailing newline.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        // Every field is a plain scalar or string, so serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Ring of [`DiagnosticEntry`] with a monotonically increasing sequence.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    config: DiagnosticConfig,
    entries: VecDeque<DiagnosticEntry>,
    seq: u64,
}

impl DiagnosticLog {
    #[must_use]
    pub fn new(config: DiagnosticConfig) -> Self {
        Self {
            config,
            entries: VecDeque::with_capacity(config.max_entries.min(1000)),
            seq: 0,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled && self.config.max_entries > 0
    }

    /// Append the entry built from the next sequence number.
    pub fn record(&mut self, build: impl FnOnce(u64) -> DiagnosticEntry) {
        if !self.is_enabled() {
            return;
        }
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        while self.entries.len() >= self.config.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(build(seq));
    }

    #[must_use]
    pub fn entries(&self) -> &VecDeque<DiagnosticEntry> {
        &self.entries
    }

    /// Newline-separated JSON objects.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        self.entries
            .iter()
            .map(DiagnosticEntry::to_jsonl)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Drop entries; the sequence keeps counting.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new(DiagnosticConfig::default())
    }
}
