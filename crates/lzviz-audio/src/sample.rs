#![forbid(unsafe_code)]

//! Clip-based backend.
//!
//! Cues map onto a fixed set of named clips. The clip bytes come from the
//! host (usually `data:audio/...;base64,` URLs) and are handed, together
//! with the clip's volume, to a [`ClipPlayer`] that knows how to play them.
//! A cue whose clip was never loaded is dropped.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use lzviz_core::{Cue, CueSink, GOOD_MATCH_THRESHOLD};
use thiserror::Error;
use tracing::{debug, trace};

/// Success cues use the celebratory clip above this compression ratio.
pub const STRONG_RATIO: f64 = 2.0;

/// Named clips the backend knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipId {
    Click,
    UiAction,
    Step,
    Match,
    Literal,
    Success,
    GoodMatch,
    Reset,
}

impl ClipId {
    pub const ALL: [Self; 8] = [
        Self::Click,
        Self::UiAction,
        Self::Step,
        Self::Match,
        Self::Literal,
        Self::Success,
        Self::GoodMatch,
        Self::Reset,
    ];

    /// Name used in asset manifests.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::UiAction => "uiAction",
            Self::Step => "step",
            Self::Match => "match",
            Self::Literal => "literal",
            Self::Success => "success",
            Self::GoodMatch => "goodMatch",
            Self::Reset => "reset",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Playback volume: UI clips are quiet, success clips loud.
    #[must_use]
    pub const fn volume(self) -> f32 {
        match self {
            Self::Click | Self::UiAction => 0.3,
            Self::Success | Self::GoodMatch => 0.5,
            Self::Step | Self::Match | Self::Literal | Self::Reset => 0.4,
        }
    }

    /// Clip announcing `cue`.
    #[must_use]
    pub fn for_cue(cue: Cue) -> Self {
        match cue {
            Cue::Step => Self::Step,
            Cue::Literal => Self::Literal,
            Cue::Match { length } if length > GOOD_MATCH_THRESHOLD => Self::GoodMatch,
            Cue::Match { .. } => Self::Match,
            Cue::Success { ratio } if ratio > STRONG_RATIO => Self::Success,
            Cue::Success { .. } => Self::UiAction,
            Cue::Reset => Self::Reset,
        }
    }
}

/// Failure decoding a clip source.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("unknown clip name {0:?}")]
    UnknownClip(String),

    #[error("clip {name}: not a base64 data URL")]
    NotDataUrl { name: String },

    #[error("clip {name}: {source}")]
    Base64 {
        name: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// Encoded audio bytes of one clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    /// MIME type from the data URL, e.g. `audio/mp3`.
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Decode `data:<mime>;base64,<payload>`.
pub fn decode_data_url(name: &str, url: &str) -> Result<Clip, ClipError> {
    let not_data_url = || ClipError::NotDataUrl {
        name: name.to_string(),
    };
    let rest = url.strip_prefix("data:").ok_or_else(not_data_url)?;
    let (header, payload) = rest.split_once(',').ok_or_else(not_data_url)?;
    let mime = header.strip_suffix(";base64").ok_or_else(not_data_url)?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|source| ClipError::Base64 {
            name: name.to_string(),
            source,
        })?;
    Ok(Clip {
        mime: mime.to_string(),
        bytes,
    })
}

/// Loaded clips, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ClipBank {
    clips: HashMap<ClipId, Clip>,
}

impl ClipBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `(name, data URL)` pairs. Stops at the first bad entry.
    pub fn from_data_urls<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ClipError> {
        let mut bank = Self::new();
        for (name, url) in entries {
            let id = ClipId::from_name(name).ok_or_else(|| ClipError::UnknownClip(name.into()))?;
            bank.insert(id, decode_data_url(name, url)?);
        }
        debug!(clips = bank.len(), "clip bank loaded");
        Ok(bank)
    }

    pub fn insert(&mut self, id: ClipId, clip: Clip) {
        self.clips.insert(id, clip);
    }

    #[must_use]
    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Host capability that actually plays a clip.
pub trait ClipPlayer {
    /// Restart `clip` from the beginning at `volume`.
    fn play_clip(&mut self, id: ClipId, clip: &Clip, volume: f32);
}

impl<P: ClipPlayer + ?Sized> ClipPlayer for Box<P> {
    fn play_clip(&mut self, id: ClipId, clip: &Clip, volume: f32) {
        (**self).play_clip(id, clip, volume);
    }
}

/// Cue sink playing pre-recorded clips.
#[derive(Debug)]
pub struct SampleBackend<P> {
    bank: ClipBank,
    player: P,
}

impl<P: ClipPlayer> SampleBackend<P> {
    pub fn new(bank: ClipBank, player: P) -> Self {
        Self { bank, player }
    }

    /// Play a clip directly, e.g. `Click` for button presses.
    pub fn play_id(&mut self, id: ClipId) {
        match self.bank.get(id) {
            Some(clip) => self.player.play_clip(id, clip, id.volume()),
            None => trace!(clip = id.name(), "clip not loaded"),
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }
}

impl<P: ClipPlayer> CueSink for SampleBackend<P> {
    fn play(&mut self, cue: Cue) {
        self.play_id(ClipId::for_cue(cue));
    }
}
