#![forbid(unsafe_code)]

//! Runtime: the playback session and everything that drives it.
//!
//! # Role in lzviz
//! `lzviz-runtime` owns mutable state. A [`Session`] holds the current step
//! log, the cursor and the [`AnimationClock`], and is the only place where
//! compression results are accepted or discarded. A [`Controller`] wraps a
//! session with a [`PresentationAdapter`], a [`CueSink`](lzviz_core::CueSink)
//! and a [`DiagnosticLog`].
//!
//! # Driving the clock
//! The clock never reads wall time. Hosts either feed elapsed durations
//! ([`Command::AdvanceTime`]) or run a [`Ticker`] thread whose epoch-stamped
//! ticks are delivered as [`Command::Tick`].

pub mod clock;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod session;
pub mod ticker;
pub mod transport;

pub use clock::{AnimationClock, Speed};
pub use config::{ConfigError, VisualizerConfig};
pub use controller::{Command, Controller, NullPresenter, PresentationAdapter};
pub use diagnostics::{DiagnosticConfig, DiagnosticEntry, DiagnosticLog};
pub use error::{Generation, Result, SessionError, TransportError};
pub use session::{Controls, Session, SessionOptions, Ticket, Update};
pub use ticker::{CancellationSource, CancellationToken, Ticker, TickerSync};
pub use transport::{CompressionTransport, LocalTransport, OfflineTransport};
