// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use mantra_tts::app_config::{self, Config, ProxyMode, SegmentationStrategy};
use mantra_tts::converter::{BarProgress, ConversionOutcome, ConversionReport, Converter, FolderReport};
use mantra_tts::errors::AppError;
use mantra_tts::pdf_to_docx;
use mantra_tts::synthesis::CancelFlag;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for SegmentationStrategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliStrategy {
    /// Classify runs by font into title/body roles
    FontRole,
    /// Split blocks on the marker glyph and gate on script ratio
    MarkerRatio,
}

impl From<CliStrategy> for SegmentationStrategy {
    fn from(cli_strategy: CliStrategy) -> Self {
        match cli_strategy {
            CliStrategy::FontRole => SegmentationStrategy::FontRole,
            CliStrategy::MarkerRatio => SegmentationStrategy::MarkerRatio,
        }
    }
}

/// Proxy override: `auto`, `off` or `host:port`
#[derive(Debug, Clone, PartialEq)]
enum ProxyOverride {
    Auto,
    Off,
    Manual { host: String, port: u16 },
}

fn parse_proxy(value: &str) -> Result<ProxyOverride, String> {
    match value.trim().to_lowercase().as_str() {
        "auto" => return Ok(ProxyOverride::Auto),
        "off" | "none" => return Ok(ProxyOverride::Off),
        _ => {}
    }

    let (host, port) = value
        .trim()
        .rsplit_once(':')
        .ok_or_else(|| format!("expected 'auto', 'off' or 'host:port', got '{}'", value))?;
    let port = port
        .parse::<u16>()
        .map_err(|e| format!("invalid proxy port '{}': {}", port, e))?;
    if host.is_empty() || port == 0 {
        return Err(format!("invalid proxy address '{}'", value));
    }
    Ok(ProxyOverride::Manual {
        host: host.to_string(),
        port,
    })
}

/// Options shared by every command that loads the configuration
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// TTS language tag (e.g. 'ro', 'hi', 'en')
    #[arg(short = 'L', long)]
    language: Option<String>,

    /// Segmentation strategy
    #[arg(short, long, value_enum)]
    strategy: Option<CliStrategy>,

    /// Attempts per passage before giving up
    #[arg(short, long)]
    max_attempts: Option<u32>,

    /// Proxy for TTS requests: 'auto', 'off' or 'host:port'
    #[arg(long, value_parser = parse_proxy)]
    proxy: Option<ProxyOverride>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input document (.docx/.pdf) or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output root; one sub-directory per document is created inside it
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct SpeakArgs {
    /// Text to synthesize
    #[arg(short, long)]
    text: String,

    /// MP3 file to write
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct PdfToDocxArgs {
    /// PDF document to convert
    #[arg(value_name = "INPUT_PDF")]
    input_path: PathBuf,

    /// .docx file to write (defaults to the input path with a .docx extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert documents into one MP3 per passage (default command)
    #[command(alias = "run")]
    Convert(ConvertArgs),

    /// Synthesize a single text to an MP3 file
    Speak(SpeakArgs),

    /// Convert a PDF into a .docx, filtering runs by font and size
    PdfToDocx(PdfToDocxArgs),

    /// Generate shell completions for mantra-tts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// mantra-tts - document to per-passage speech audio
///
/// Reads mantra collections from .docx or PDF files, splits them into
/// titled passages and synthesizes one MP3 per passage.
#[derive(Parser, Debug)]
#[command(name = "mantra-tts")]
#[command(version)]
#[command(about = "Turn mantra documents into per-passage MP3 files")]
#[command(long_about = "mantra-tts reads .docx and PDF documents, segments them into titled passages and synthesizes each passage with a TTS service.

EXAMPLES:
    mantra-tts mantras.docx                         # Convert next to the input file
    mantra-tts -o out/ mantras.pdf                  # Write into out/mantras/
    mantra-tts -s marker-ratio mantras.pdf          # Use the marker/ratio strategy
    mantra-tts --proxy 127.0.0.1:7890 folder/       # Convert a whole folder through a proxy
    mantra-tts speak -t 'oṃ āḥ hūṃ' -o om.mp3 -L hi # Synthesize a single text
    mantra-tts pdf-to-docx mantras.pdf              # Write mantras.docx
    mantra-tts completions bash > mantra-tts.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

OUTPUT:
    Every document gets <output>/<document name>/ holding one MP3 per passage
    and audio_record.txt, an append-only log of each text sent to the service.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input document (.docx/.pdf) or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output root; one sub-directory per document is created inside it
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for a level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger admits everything; the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "mantra-tts", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Convert(args)) => run_convert(args).await,
        Some(Commands::Speak(args)) => run_speak(args).await,
        Some(Commands::PdfToDocx(args)) => run_pdf_to_docx(args),
        None => {
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;
            run_convert(ConvertArgs {
                input_path,
                output: cli.output,
                common: cli.common,
            })
            .await
        }
    }
}

/// Load or create the configuration, apply CLI overrides and validate
fn load_config(options: &CommonArgs) -> Result<Config> {
    if let Some(level) = &options.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    let config_path = Path::new(&options.config_path);
    let mut config = if config_path.exists() {
        Config::load_from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", options.config_path);
        let config = Config::default();
        config.save_to_file(config_path)?;
        config
    };

    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    }
    if let Some(language) = &options.language {
        config.synthesis.language = language.clone();
    }
    if let Some(strategy) = &options.strategy {
        config.segmentation.strategy = strategy.clone().into();
    }
    if let Some(max_attempts) = options.max_attempts {
        config.synthesis.max_attempts = max_attempts;
    }
    match &options.proxy {
        Some(ProxyOverride::Auto) => config.proxy.mode = ProxyMode::Auto,
        Some(ProxyOverride::Off) => config.proxy.mode = ProxyMode::Off,
        Some(ProxyOverride::Manual { host, port }) => {
            config.proxy.mode = ProxyMode::Manual;
            config.proxy.host = host.clone();
            config.proxy.port = *port;
        }
        None => {}
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(level_filter(&config.log_level));
    Ok(config)
}

/// Cancel flag that trips on Ctrl-C
fn install_cancel_handler() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current passage…");
            flag.cancel();
        }
    });
    cancel
}

async fn run_convert(options: ConvertArgs) -> Result<()> {
    let config = load_config(&options.common)?;
    let cancel = install_cancel_handler();
    let converter = Converter::with_config(config, cancel)?;
    let progress = BarProgress::new();
    let start_time = std::time::Instant::now();

    let input = &options.input_path;
    let result = if input.is_dir() {
        let output_root = options.output.clone().unwrap_or_else(|| input.clone());
        converter
            .convert_folder(input, &output_root, &progress)
            .await
            .map(|folder| report_folder(&folder))
    } else if input.is_file() {
        let output_root = options
            .output
            .clone()
            .unwrap_or_else(|| input.parent().map(Path::to_path_buf).unwrap_or_default());
        converter
            .convert(input, &output_root, &progress)
            .await
            .map(|report| report_document(&report))
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input));
    };
    progress.clear();

    match result {
        Ok(true) => {
            info!("Done in {:.1}s", start_time.elapsed().as_secs_f64());
            Ok(())
        }
        Ok(false) => Err(anyhow!("No passage could be synthesized")),
        Err(AppError::Cancelled) => Err(anyhow!("Cancelled")),
        Err(e) => Err(e.into()),
    }
}

/// Log a document outcome; false when every passage failed
fn report_document(report: &ConversionReport) -> bool {
    match report.outcome() {
        ConversionOutcome::NothingFound => {
            warn!("No passages recognized in {:?}; nothing to synthesize", report.document);
            true
        }
        ConversionOutcome::AllFailed => {
            error!(
                "All {} passage(s) of {:?} failed to synthesize",
                report.failures.len(),
                report.document
            );
            false
        }
        ConversionOutcome::Completed { succeeded, failed } => {
            if failed > 0 {
                warn!("{} passage(s) failed; see the log above", failed);
            }
            info!("Success: {} audio file(s) in {:?}", succeeded, report.output_dir);
            true
        }
    }
}

/// Log a folder outcome; false when documents or passages failed and nothing was produced
fn report_folder(folder: &FolderReport) -> bool {
    let mut any_failure = !folder.failed_documents.is_empty();
    for report in &folder.reports {
        any_failure |= !report_document(report);
    }
    info!(
        "Processed {} document(s), {} failed, {} audio file(s) written",
        folder.reports.len() + folder.failed_documents.len(),
        folder.failed_documents.len(),
        folder.total_artifacts()
    );
    !(any_failure && folder.total_artifacts() == 0)
}

async fn run_speak(options: SpeakArgs) -> Result<()> {
    let config = load_config(&options.common)?;
    let cancel = install_cancel_handler();
    let converter = Converter::with_config(config, cancel)?;

    let result = converter
        .speak(&options.text, &options.output, options.common.language.as_deref())
        .await?;
    info!(
        "Success: {:?} ({} bytes, {} attempt(s))",
        result.artifact_path, result.byte_size, result.attempts_used
    );
    Ok(())
}

fn run_pdf_to_docx(options: PdfToDocxArgs) -> Result<()> {
    let config = load_config(&options.common)?;
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| pdf_to_docx::default_output_path(&options.input_path));

    let progress = BarProgress::new();
    let result = pdf_to_docx::convert_pdf_to_docx(&options.input_path, &output, &config.pdf_to_docx, &progress);
    progress.clear();

    let report = result?;
    info!(
        "Success: {:?} ({} run(s) kept, {} dropped, {} paragraph(s))",
        report.output, report.kept_runs, report.dropped_runs, report.paragraphs
    );
    Ok(())
}
