//! `lzviz` command-line front end.
//!
//! Subcommands:
//!
//! - `compress`: run the encoder (built-in or a remote endpoint) and print
//!   the `/compress` response JSON.
//! - `decompress`: expand the symbols of a response or request file.
//! - `validate`: check a response against the step-log invariants.
//! - `play`: replay the steps in the terminal, interactively or from a
//!   script, with text stand-ins for the audio cues.

pub mod cli;
pub mod error;
pub mod http;
pub mod logging;
pub mod play;
pub mod terminal;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{CliError, Result};
pub use http::HttpTransport;
pub use play::{Player, PlayInput, parse_input, run_script};
pub use terminal::{TerminalPresenter, render_frame};
