#![forbid(unsafe_code)]

//! Glue between a [`Session`], a front end and an audio sink.
//!
//! The controller turns each [`Command`] into a session operation, projects
//! a fresh [`ViewModel`] when the cursor or log changed, hands it to the
//! [`PresentationAdapter`], and plays the resulting cue. Stale compression
//! responses are dropped here without reaching the presenter.

use lzviz_core::{CompressResponse, CueSink, StepLog, ViewModel};
use tracing::debug;
use web_time::Duration;

use crate::config::VisualizerConfig;
use crate::diagnostics::{DiagnosticConfig, DiagnosticEntry, DiagnosticLog};
use crate::error::{Generation, Result, SessionError, TransportError};
use crate::session::{Controls, Session, Ticket, Update};
use crate::transport::CompressionTransport;

/// A user or host action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StepForward,
    StepBack,
    TogglePlay,
    SetSpeed(u32),
    Reset,
    Seek(isize),
    GoToStart,
    GoToEnd,
    /// Host-measured elapsed time for the deterministic clock.
    AdvanceTime(Duration),
    /// One tick from a real-time ticker thread.
    Tick { epoch: u64 },
}

impl Command {
    /// Name used in diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StepForward => "step_forward",
            Self::StepBack => "step_back",
            Self::TogglePlay => "toggle_play",
            Self::SetSpeed(_) => "set_speed",
            Self::Reset => "reset",
            Self::Seek(_) => "seek",
            Self::GoToStart => "go_to_start",
            Self::GoToEnd => "go_to_end",
            Self::AdvanceTime(_) | Self::Tick { .. } => "tick",
        }
    }
}

/// Renders session state. Implementations decide how.
pub trait PresentationAdapter {
    /// A new step log was applied; called before the first render of it.
    fn log_replaced(&mut self, _log: &StepLog) {}

    /// The cursor or log changed.
    fn render(&mut self, view: &ViewModel, controls: &Controls);

    /// Only play state, speed or button enablement changed.
    fn update_controls(&mut self, _controls: &Controls) {}

    /// A user-facing failure. Stale responses never get here.
    fn report_error(&mut self, _error: &SessionError) {}
}

impl<P: PresentationAdapter + ?Sized> PresentationAdapter for Box<P> {
    fn log_replaced(&mut self, log: &StepLog) {
        (**self).log_replaced(log);
    }

    fn render(&mut self, view: &ViewModel, controls: &Controls) {
        (**self).render(view, controls);
    }

    fn update_controls(&mut self, controls: &Controls) {
        (**self).update_controls(controls);
    }

    fn report_error(&mut self, error: &SessionError) {
        (**self).report_error(error);
    }
}

/// Presenter that ignores everything; useful for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl PresentationAdapter for NullPresenter {
    fn render(&mut self, _view: &ViewModel, _controls: &Controls) {}
}

/// Session plus its effectful surroundings.
#[derive(Debug)]
pub struct Controller<P, S> {
    session: Session,
    presenter: P,
    sink: S,
    diagnostics: DiagnosticLog,
}

impl<P: PresentationAdapter, S: CueSink> Controller<P, S> {
    #[must_use]
    pub fn new(session: Session, presenter: P, sink: S, diagnostics: DiagnosticConfig) -> Self {
        Self {
            session,
            presenter,
            sink,
            diagnostics: DiagnosticLog::new(diagnostics),
        }
    }

    #[must_use]
    pub fn from_config(config: &VisualizerConfig, presenter: P, sink: S) -> Self {
        Self::new(
            Session::new(config.session_options()),
            presenter,
            sink,
            config.diagnostics,
        )
    }

    /// Render the current state unconditionally.
    pub fn present(&mut self) {
        let view = self.session.view();
        let controls = self.session.controls();
        self.presenter.render(&view, &controls);
    }

    /// Run one command.
    pub fn handle(&mut self, command: Command) -> Result<()> {
        let from = self.session.cursor().position();
        match command {
            Command::StepForward => {
                let update = self.session.step_forward();
                self.navigated(command, from, update);
            }
            Command::StepBack => {
                let update = self.session.step_back();
                self.navigated(command, from, update);
            }
            Command::Seek(target) => {
                let update = self.session.seek(target);
                self.navigated(command, from, update);
            }
            Command::GoToStart => {
                let update = self.session.go_to_start();
                self.navigated(command, from, update);
            }
            Command::GoToEnd => {
                let update = self.session.go_to_end();
                self.navigated(command, from, update);
            }
            Command::Tick { epoch } => {
                let update = self.session.tick(epoch);
                self.navigated(command, from, update);
            }
            Command::AdvanceTime(dt) => {
                // Clock-driven moves step forward by one each.
                let mut position = from;
                for update in self.session.advance_time(dt) {
                    let before = position;
                    if update.view_changed {
                        position += 1;
                    }
                    self.navigated_to(command, before, position, update);
                }
            }
            Command::TogglePlay => {
                let update = self.session.toggle_play();
                self.playback_changed(update);
            }
            Command::SetSpeed(value) => match self.session.set_speed(value) {
                Ok(update) => self.playback_changed(update),
                Err(error) => return Err(self.fail(error)),
            },
            Command::Reset => {
                self.diagnostics
                    .record(|seq| DiagnosticEntry::Reset { seq, from });
                let update = self.session.reset();
                self.apply(update);
            }
        }
        Ok(())
    }

    /// Start a submission; the host sends `ticket.data` and later calls
    /// [`complete_submit`](Self::complete_submit).
    pub fn begin_submit(&mut self, input: &str) -> Result<Ticket> {
        match self.session.begin_submit(input) {
            Ok(ticket) => {
                let controls = self.session.controls();
                self.presenter.update_controls(&controls);
                Ok(ticket)
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Deliver a result. Stale results are recorded and dropped, returning
    /// `Ok(())`.
    pub fn complete_submit(
        &mut self,
        generation: Generation,
        result: std::result::Result<CompressResponse, TransportError>,
    ) -> Result<()> {
        match self.session.complete_submit(generation, result) {
            Ok(update) => {
                let steps = self.session.log().len();
                self.diagnostics.record(|seq| DiagnosticEntry::Submission {
                    seq,
                    generation,
                    outcome: "applied",
                    steps: Some(steps),
                });
                self.presenter.log_replaced(self.session.log());
                self.apply(update);
                Ok(())
            }
            Err(SessionError::StaleResponse { .. }) => {
                debug!(generation, "stale response dropped by controller");
                self.diagnostics.record(|seq| DiagnosticEntry::Submission {
                    seq,
                    generation,
                    outcome: "stale",
                    steps: None,
                });
                Ok(())
            }
            Err(error) => {
                self.diagnostics.record(|seq| DiagnosticEntry::Submission {
                    seq,
                    generation,
                    outcome: "failed",
                    steps: None,
                });
                let controls = self.session.controls();
                self.presenter.update_controls(&controls);
                Err(self.fail(error))
            }
        }
    }

    /// Submit through a synchronous transport.
    pub fn submit_with(&mut self, input: &str, transport: &impl CompressionTransport) -> Result<()> {
        let ticket = self.begin_submit(input)?;
        let result = transport.compress(&ticket.data);
        self.complete_submit(ticket.generation, result)
    }

    fn navigated(&mut self, command: Command, from: isize, update: Update) {
        let to = self.session.cursor().position();
        self.navigated_to(command, from, to, update);
    }

    fn navigated_to(&mut self, command: Command, from: isize, to: isize, update: Update) {
        if update.view_changed {
            let total = self.session.log().len();
            let cue = update.cue.map(|cue| cue.label());
            self.diagnostics.record(|seq| DiagnosticEntry::Nav {
                seq,
                action: command.label(),
                from,
                to,
                total,
                cue,
            });
        } else if update.controls_changed {
            self.record_playback();
        }
        self.apply(update);
    }

    fn playback_changed(&mut self, update: Update) {
        if update.controls_changed {
            self.record_playback();
        }
        self.apply(update);
    }

    fn record_playback(&mut self) {
        let playing = self.session.is_playing();
        let speed = self.session.speed().get();
        let cursor = self.session.cursor().position();
        self.diagnostics.record(|seq| DiagnosticEntry::Playback {
            seq,
            playing,
            speed,
            cursor,
        });
    }

    fn apply(&mut self, update: Update) {
        if update.view_changed {
            let view = self.session.view();
            let controls = self.session.controls();
            self.presenter.render(&view, &controls);
        } else if update.controls_changed {
            let controls = self.session.controls();
            self.presenter.update_controls(&controls);
        }
        if let Some(cue) = update.cue {
            self.sink.play(cue);
        }
    }

    fn fail(&mut self, error: SessionError) -> SessionError {
        if error.is_reportable() {
            self.presenter.report_error(&error);
        }
        error
    }

    // ── Accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Give up the controller, keeping the front end.
    pub fn into_presenter(self) -> P {
        self.presenter
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticLog {
        &mut self.diagnostics
    }
}
