//! `lzviz play`: interactive and scripted replay in the terminal.
//!
//! Interactive mode runs one controller thread fed by an mpsc channel.
//! Stdin lines, ticker ticks and finished submissions all arrive as
//! [`Msg`]s, so the session is only ever touched from one place. Each
//! submission runs on its own worker thread; the session's generation
//! tokens discard whichever answers arrive late.
//!
//! Script mode reads the same commands from a file and replaces wall-clock
//! time with `wait MS` lines, which makes the output reproducible.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::Args;
use lzviz_audio::{AudioConfig, AudioOutput, BackendKind, ClipBank};
use lzviz_core::CompressResponse;
use lzviz_runtime::{
    Command, CompressionTransport, Controller, Generation, TickerSync, TransportError,
    VisualizerConfig,
};
use tracing::{debug, info};

use crate::cli::{
    AudioChoice, EndpointArgs, InputArgs, SharedTransport, apply_overrides, read_source,
    transport_for,
};
use crate::error::{CliError, Result};
use crate::terminal::{TerminalPresenter, TextClipPlayer, TextPcmMeter};

pub const HELP: &str = "\
commands:
  n, next          step forward
  b, back          step back
  p, play          play / pause
  s, speed N       set speed (1-10)
  g, seek N        jump to step N (-1 = before the first step)
  home, end        jump to the first / last step
  r, reset         back to the start, keep the result
  c, compress TEXT compress new input
  m, mute          toggle sound
  wait MS          advance the clock (scripts only)
  h, help          this text
  q, quit          exit";

#[derive(Debug, Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Initial speed (1-10).
    #[arg(long)]
    pub speed: Option<u32>,

    /// Start playing as soon as a result arrives.
    #[arg(long)]
    pub auto_play: bool,

    /// Audio backend.
    #[arg(long, value_enum)]
    pub audio: Option<AudioChoice>,

    /// JSON object mapping clip names to `data:` URLs.
    #[arg(long)]
    pub clips: Option<PathBuf>,

    /// Run commands from a file instead of stdin.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Write the diagnostic log as JSONL on exit.
    #[arg(long)]
    pub diagnostics: Option<PathBuf>,
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayInput {
    Command(Command),
    Compress(String),
    ToggleAudio,
    Wait(Duration),
    Help,
    Quit,
}

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_input(line: &str) -> std::result::Result<Option<PlayInput>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let input = match word {
        "n" | "next" => PlayInput::Command(Command::StepForward),
        "b" | "back" => PlayInput::Command(Command::StepBack),
        "p" | "play" | "pause" => PlayInput::Command(Command::TogglePlay),
        "r" | "reset" => PlayInput::Command(Command::Reset),
        "home" => PlayInput::Command(Command::GoToStart),
        "end" => PlayInput::Command(Command::GoToEnd),
        "s" | "speed" => PlayInput::Command(Command::SetSpeed(number(word, rest)?)),
        "g" | "seek" => PlayInput::Command(Command::Seek(number(word, rest)?)),
        "wait" => PlayInput::Wait(Duration::from_millis(number(word, rest)?)),
        "c" | "compress" => PlayInput::Compress(rest.to_string()),
        "m" | "mute" => PlayInput::ToggleAudio,
        "h" | "help" | "?" => PlayInput::Help,
        "q" | "quit" | "exit" => PlayInput::Quit,
        other => return Err(format!("unknown command `{other}` (try `help`)")),
    };
    Ok(Some(input))
}

fn number<T: std::str::FromStr>(word: &str, rest: &str) -> std::result::Result<T, String> {
    rest.parse()
        .map_err(|_| format!("`{word}` needs a number, got `{rest}`"))
}

/// Whether to keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Load a `--clips` manifest: `{ "success": "data:audio/wav;base64,..." }`.
pub fn load_clips(path: &Path) -> Result<ClipBank> {
    let manifest: BTreeMap<String, String> = serde_json::from_str(&read_source(path)?)?;
    Ok(ClipBank::from_data_urls(
        manifest.iter().map(|(name, url)| (name.as_str(), url.as_str())),
    )?)
}

/// Audio output writing to stderr, the only sound device a terminal has.
pub fn terminal_audio(config: &AudioConfig, clips: ClipBank) -> AudioOutput {
    AudioOutput::from_config(
        config,
        || (clips, Box::new(TextClipPlayer::new(std::io::stderr()))),
        || Box::new(TextPcmMeter::new(std::io::stderr())),
    )
}

/// A controller wired to a terminal presenter and audio output.
pub struct Player<W: Write> {
    controller: Controller<TerminalPresenter<W>, AudioOutput>,
    transport: SharedTransport,
}

impl<W: Write> Player<W> {
    pub fn new(
        config: &VisualizerConfig,
        out: W,
        audio: AudioOutput,
        transport: SharedTransport,
    ) -> Self {
        Self {
            controller: Controller::from_config(config, TerminalPresenter::new(out), audio),
            transport,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &Controller<TerminalPresenter<W>, AudioOutput> {
        &self.controller
    }

    pub fn into_presenter_output(self) -> W {
        let Self { controller, .. } = self;
        controller.into_presenter().into_inner()
    }

    fn say(&mut self, text: &str) {
        let out = self.controller.presenter_mut().output_mut();
        let _ = writeln!(out, "{text}");
    }

    fn command(&mut self, command: Command) {
        // Failures were already shown by the presenter.
        if let Err(error) = self.controller.handle(command) {
            debug!(%error, command = command.label(), "command rejected");
        }
    }

    /// Compress in the calling thread.
    pub fn submit_now(&mut self, text: &str) {
        let transport = self.transport.as_ref();
        if let Err(error) = self.controller.submit_with(text, &transport) {
            debug!(%error, "submission failed");
        }
    }

    /// Apply a line in script mode: `wait` drives the clock directly and
    /// compression happens inline.
    pub fn script_step(&mut self, input: PlayInput) -> Flow {
        match input {
            PlayInput::Command(command) => self.command(command),
            PlayInput::Wait(dt) => self.command(Command::AdvanceTime(dt)),
            PlayInput::Compress(text) => self.submit_now(&text),
            PlayInput::ToggleAudio => self.toggle_audio(),
            PlayInput::Help => self.say(HELP),
            PlayInput::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn toggle_audio(&mut self) {
        let on = self.controller.sink_mut().toggle();
        self.say(if on { "  sound on" } else { "  sound off" });
    }

    fn deliver(
        &mut self,
        generation: Generation,
        result: std::result::Result<CompressResponse, TransportError>,
    ) {
        if let Err(error) = self.controller.complete_submit(generation, result) {
            debug!(%error, generation, "submission failed");
        }
    }

    pub fn write_diagnostics(&self, path: &Path) -> Result<()> {
        let mut text = self.controller.diagnostics().to_jsonl();
        if !text.is_empty() {
            text.push('\n');
        }
        std::fs::write(path, text)?;
        info!(
            path = %path.display(),
            entries = self.controller.diagnostics().entries().len(),
            "diagnostics written"
        );
        Ok(())
    }
}

/// Run a script to completion. Parse errors stop the run.
pub fn run_script<W: Write>(player: &mut Player<W>, script: &str) -> Result<()> {
    for (index, line) in script.lines().enumerate() {
        let input = parse_input(line).map_err(|message| {
            CliError::invalid(format!("script line {}: {message}", index + 1))
        })?;
        if let Some(input) = input {
            if player.script_step(input) == Flow::Quit {
                break;
            }
        }
    }
    Ok(())
}

/// Messages for the interactive controller thread.
enum Msg {
    Input(String),
    InputClosed,
    Tick { epoch: u64 },
    Compressed {
        generation: Generation,
        result: std::result::Result<CompressResponse, TransportError>,
    },
}

fn spawn_stdin_reader(sender: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(Msg::Input(line)).is_err() {
                return;
            }
        }
        let _ = sender.send(Msg::InputClosed);
    });
}

fn spawn_submission(player: &mut Player<impl Write>, text: &str, sender: &mpsc::Sender<Msg>) {
    let Ok(ticket) = player.controller.begin_submit(text) else {
        return;
    };
    let transport = SharedTransport::clone(&player.transport);
    let sender = sender.clone();
    thread::spawn(move || {
        let result = CompressionTransport::compress(&*transport, &ticket.data);
        let _ = sender.send(Msg::Compressed {
            generation: ticket.generation,
            result,
        });
    });
}

fn run_interactive<W: Write>(player: &mut Player<W>, initial: Option<String>) {
    let (sender, receiver) = mpsc::channel();
    let mut ticker = TickerSync::new(sender.clone(), |epoch| Msg::Tick { epoch });
    spawn_stdin_reader(sender.clone());
    player.say("type `help` for commands");
    if let Some(text) = initial {
        spawn_submission(player, &text, &sender);
    }

    while let Ok(msg) = receiver.recv() {
        match msg {
            Msg::Input(line) => match parse_input(&line) {
                Ok(Some(PlayInput::Quit)) => break,
                Ok(Some(PlayInput::Compress(text))) => spawn_submission(player, &text, &sender),
                Ok(Some(PlayInput::Wait(_))) => player.say("  `wait` only applies to scripts"),
                Ok(Some(input)) => {
                    player.script_step(input);
                }
                Ok(None) => {}
                Err(message) => player.say(&format!("  {message}")),
            },
            Msg::InputClosed => break,
            Msg::Tick { epoch } => player.command(Command::Tick { epoch }),
            Msg::Compressed { generation, result } => player.deliver(generation, result),
        }
        ticker.sync(player.controller.session().clock());
    }
    ticker.shutdown();
}

/// Entry point for `lzviz play`.
pub fn run_play(args: PlayArgs, mut config: VisualizerConfig) -> Result<()> {
    apply_overrides(
        &mut config,
        &args.endpoint,
        args.speed,
        args.auto_play,
        args.audio,
    )?;
    let clips = match &args.clips {
        Some(path) => load_clips(path)?,
        None => ClipBank::new(),
    };
    if args.clips.is_none() && config.audio.backend == BackendKind::Sample {
        info!("sample audio selected without --clips; cues will be silent");
    }
    let audio = terminal_audio(&config.audio, clips);
    let transport = transport_for(&config)?;
    let initial = args.input.read()?;
    let mut player = Player::new(&config, std::io::stdout(), audio, transport);

    match &args.script {
        Some(path) => {
            let script = read_source(path)?;
            if let Some(text) = &initial {
                player.submit_now(text);
            }
            run_script(&mut player, &script)?;
        }
        None => run_interactive(&mut player, initial),
    }

    if let Some(path) = &args.diagnostics {
        player.write_diagnostics(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use lzviz_runtime::LocalTransport;
    use pretty_assertions::assert_eq;

    fn player(config: &VisualizerConfig) -> Player<Vec<u8>> {
        Player::new(
            config,
            Vec::new(),
            AudioOutput::muted(),
            Arc::new(LocalTransport::default()),
        )
    }

    #[test]
    fn parses_navigation_words() {
        assert_eq!(
            parse_input("n").unwrap(),
            Some(PlayInput::Command(Command::StepForward))
        );
        assert_eq!(
            parse_input("  seek -1 ").unwrap(),
            Some(PlayInput::Command(Command::Seek(-1)))
        );
        assert_eq!(
            parse_input("speed 7").unwrap(),
            Some(PlayInput::Command(Command::SetSpeed(7)))
        );
        assert_eq!(
            parse_input("wait 250").unwrap(),
            Some(PlayInput::Wait(Duration::from_millis(250)))
        );
    }

    #[test]
    fn compress_keeps_inner_spaces() {
        assert_eq!(
            parse_input("c to be or not").unwrap(),
            Some(PlayInput::Compress("to be or not".into()))
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_input("   ").unwrap(), None);
        assert_eq!(parse_input("# setup").unwrap(), None);
    }

    #[test]
    fn bad_lines_explain_themselves() {
        assert!(parse_input("speed fast").unwrap_err().contains("needs a number"));
        assert!(parse_input("jump").unwrap_err().contains("unknown command"));
    }

    #[test]
    fn script_steps_through_a_log() {
        let config = VisualizerConfig::default();
        let mut player = player(&config);
        run_script(&mut player, "c abcabcabc\nn\nend\n").unwrap();
        assert_eq!(player.controller().session().cursor().position(), 3);
        let text = String::from_utf8(player.into_presenter_output()).unwrap();
        assert!(text.contains("step 4/4"), "{text}");
    }

    #[test]
    fn script_wait_drives_playback() {
        let config = VisualizerConfig::default();
        let mut player = player(&config);
        // Speed 10 is one step every 200 ms.
        run_script(&mut player, "c hello\nspeed 10\nplay\nwait 400\n").unwrap();
        assert_eq!(player.controller().session().cursor().position(), 1);
    }

    #[test]
    fn longest_wait_plays_to_the_end() {
        let config = VisualizerConfig::default();
        let mut player = player(&config);
        run_script(&mut player, "c hello\nplay\nwait 18446744073709551615\n").unwrap();
        let session = player.controller().session();
        assert_eq!(session.cursor().position(), 4);
        assert!(!session.is_playing());
    }

    #[test]
    fn quit_stops_the_script() {
        let config = VisualizerConfig::default();
        let mut player = player(&config);
        run_script(&mut player, "c hello\nq\nend\n").unwrap();
        assert_eq!(player.controller().session().cursor().position(), -1);
    }

    #[test]
    fn script_errors_name_the_line() {
        let config = VisualizerConfig::default();
        let mut player = player(&config);
        let error = run_script(&mut player, "c hi\nbogus\n").unwrap_err();
        assert_eq!(error.exit_code(), 2);
        assert!(error.to_string().contains("script line 2"));
    }

    #[test]
    fn blank_submission_is_reported_not_fatal() {
        let config = VisualizerConfig::default();
        let mut player = player(&config);
        run_script(&mut player, "c   \n").unwrap();
        let text = String::from_utf8(player.into_presenter_output()).unwrap();
        assert!(text.contains("error: please enter some data to compress"));
    }

    #[test]
    fn mute_toggle_on_muted_output_stays_off() {
        let config = VisualizerConfig::default();
        let mut player = player(&config);
        run_script(&mut player, "m\n").unwrap();
        let text = String::from_utf8(player.into_presenter_output()).unwrap();
        assert!(text.contains("sound off"));
    }

    #[test]
    fn diagnostics_are_written_as_jsonl() {
        let config = VisualizerConfig::default();
        let mut player = player(&config);
        run_script(&mut player, "c aaaa\nn\nn\n").unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        player.write_diagnostics(file.path()).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"event\":\"submission\""));
        assert!(lines[2].contains("\"to\":1"));
    }
}
