use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lzviz_audio::BackendKind;
use lzviz_core::{CompressResponse, DecompressRequest, StepLog};
use lzviz_encoder::{compress_response, decompress_response};
use lzviz_runtime::{CompressionTransport, LocalTransport, Speed, VisualizerConfig};
use serde::Serialize;
use tracing::info;

use crate::error::{CliError, Result};
use crate::http::HttpTransport;
use crate::play::{PlayArgs, run_play};

#[derive(Debug, Parser)]
#[command(
    name = "lzviz",
    about = "Step through LZ4-style compression one encoder decision at a time",
    version
)]
pub struct Cli {
    /// Config file (TOML, or JSON by extension).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compress text and print the endpoint response JSON.
    Compress(CompressArgs),

    /// Expand the symbols of a response (or a `/decompress` request) file.
    Decompress(DecompressArgs),

    /// Check a response file against every step-log invariant.
    Validate(ValidateArgs),

    /// Replay compression interactively in the terminal.
    Play(PlayArgs),
}

/// Where the text to compress comes from.
#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    /// Text to compress.
    pub text: Option<String>,

    /// Read the text from a file (`-` for stdin).
    #[arg(long, short = 'f', conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    pub fn read(&self) -> Result<Option<String>> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(Some(text.clone())),
            (None, Some(path)) => read_source(path).map(Some),
            (None, None) => Ok(None),
        }
    }
}

/// Selects a remote endpoint instead of the built-in encoder.
#[derive(Debug, Clone, Default, Args)]
pub struct EndpointArgs {
    /// Base URL of a compression service, e.g. `http://localhost:5000`.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use the built-in encoder even if the config names an endpoint.
    #[arg(long, conflicts_with = "endpoint")]
    pub local: bool,
}

#[derive(Debug, Args)]
pub struct CompressArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Pretty-print the JSON.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Args)]
pub struct DecompressArgs {
    /// Response or request JSON file (`-` for stdin).
    pub path: PathBuf,

    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Print `{"decompressed_data": [...]}` instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Response JSON file (`-` for stdin).
    pub path: PathBuf,
}

/// `--audio` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioChoice {
    Sample,
    Synth,
    Muted,
}

impl From<AudioChoice> for BackendKind {
    fn from(choice: AudioChoice) -> Self {
        match choice {
            AudioChoice::Sample => Self::Sample,
            AudioChoice::Synth => Self::Synth,
            AudioChoice::Muted => Self::Muted,
        }
    }
}

/// Read a file, or stdin for `-`.
pub fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Config file (if any) with defaults for everything else.
pub fn load_config(path: Option<&Path>) -> Result<VisualizerConfig> {
    match path {
        Some(path) => Ok(VisualizerConfig::load(path)?),
        None => Ok(VisualizerConfig::default()),
    }
}

/// Apply command-line overrides on top of the file config.
pub fn apply_overrides(
    config: &mut VisualizerConfig,
    endpoint: &EndpointArgs,
    speed: Option<u32>,
    auto_play: bool,
    audio: Option<AudioChoice>,
) -> Result<()> {
    if endpoint.local {
        config.endpoint = None;
    } else if let Some(url) = &endpoint.endpoint {
        config.endpoint = Some(url.clone());
    }
    if let Some(value) = speed {
        config.speed = Speed::new(value).ok_or_else(|| {
            CliError::invalid(format!(
                "--speed must be between {} and {}, got {value}",
                Speed::MIN,
                Speed::MAX
            ))
        })?;
    }
    config.auto_play |= auto_play;
    if let Some(choice) = audio {
        config.audio.backend = choice.into();
    }
    let problems = config.validate();
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CliError::invalid(problems.join("; ")))
    }
}

/// Transport shared between the controller and submission threads.
pub type SharedTransport = Arc<dyn CompressionTransport + Send + Sync>;

/// Transport the config asks for.
pub fn transport_for(config: &VisualizerConfig) -> Result<SharedTransport> {
    match &config.endpoint {
        Some(url) => {
            info!(endpoint = %url, "using remote compression endpoint");
            Ok(Arc::new(HttpTransport::new(url)?))
        }
        None => Ok(Arc::new(LocalTransport::new(config.encoder)?)),
    }
}

fn write_json(out: &mut impl Write, value: &impl Serialize, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn run_compress(
    args: CompressArgs,
    config: &VisualizerConfig,
    out: &mut impl Write,
) -> Result<()> {
    let text = args
        .input
        .read()?
        .ok_or_else(|| CliError::invalid("nothing to compress: pass TEXT or --file"))?;
    if text.trim().is_empty() {
        return Err(CliError::invalid("please enter some data to compress"));
    }
    let mut config = config.clone();
    apply_overrides(&mut config, &args.endpoint, None, false, None)?;
    let response = match &config.endpoint {
        Some(_) => transport_for(&config)?.compress(&text)?,
        None => {
            let encoder = lzviz_encoder::Encoder::new(config.encoder)
                .map_err(|e| CliError::invalid(e.to_string()))?;
            compress_response(&encoder, text.as_bytes())
        }
    };
    write_json(out, &response, args.pretty)
}

/// Symbols from either a full response or a bare request body.
fn parse_symbols(text: &str) -> Result<DecompressRequest> {
    if let Ok(response) = CompressResponse::from_json_str(text) {
        return Ok(DecompressRequest {
            compressed_data: response.compressed_data,
        });
    }
    Ok(serde_json::from_str::<DecompressRequest>(text)?)
}

pub fn run_decompress(
    args: DecompressArgs,
    config: &VisualizerConfig,
    out: &mut impl Write,
) -> Result<()> {
    let request = parse_symbols(&read_source(&args.path)?)?;
    let mut config = config.clone();
    apply_overrides(&mut config, &args.endpoint, None, false, None)?;
    let response = match &config.endpoint {
        Some(_) => transport_for(&config)?.decompress(&request.compressed_data)?,
        None => decompress_response(&request)?,
    };
    if args.json {
        write_json(out, &response, false)
    } else {
        out.write_all(&response.decompressed_data)?;
        writeln!(out)?;
        Ok(())
    }
}

/// Summary printed by `validate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub steps: usize,
    pub input_bytes: usize,
    pub literals: usize,
    pub matches: usize,
    pub compression_ratio: f64,
}

pub fn validate_response(response: &CompressResponse) -> Result<ValidationReport> {
    let log = StepLog::from_response(response)?;
    let matches = log.steps().iter().filter(|s| s.action.is_match()).count();
    Ok(ValidationReport {
        steps: log.len(),
        input_bytes: log.original().len(),
        literals: log.len() - matches,
        matches,
        compression_ratio: response.compression_ratio,
    })
}

pub fn run_validate(args: ValidateArgs, out: &mut impl Write) -> Result<()> {
    let text = read_source(&args.path)?;
    let response = CompressResponse::from_json_str(&text)?;
    let report = validate_response(&response)?;
    writeln!(
        out,
        "ok: {} steps ({} literals, {} matches) over {} bytes, ratio {:.2}",
        report.steps, report.literals, report.matches, report.input_bytes, report.compression_ratio
    )?;
    Ok(())
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.log_json);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Compress(args) => run_compress(args, &config, &mut out),
        Commands::Decompress(args) => run_decompress(args, &config, &mut out),
        Commands::Validate(args) => run_validate(args, &mut out),
        Commands::Play(args) => {
            drop(out);
            run_play(args, config)
        }
    }
}
