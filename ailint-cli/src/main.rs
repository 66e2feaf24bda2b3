mod replay;

use ailint_core::config::{AilintConfig, OracleConfig, CONFIG_FILE_NAME};
use ailint_core::oracle::{
    fingerprint_from_config, metadata_from_config, FINGERPRINT_URL_ENV, METADATA_URL_ENV,
};
use ailint_core::{AnalysisNote, AnalysisResult, Analyzer, DocumentId, DocumentSnapshot};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ailint", author, version, about = "Estimate whether code edits were AI-assisted", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and default configuration
    Init,
    /// Show the effective configuration
    Status,
    /// Replay a change log and analyze a file
    Analyze {
        /// Path to the file to analyze
        file: PathBuf,
        /// JSON Lines change log recorded by the editor
        #[arg(short, long)]
        events: Option<PathBuf>,
        /// Document identity used in the change log (default: the file path as given)
        #[arg(short, long)]
        document: Option<String>,
        /// Language identifier (default: from the file extension)
        #[arg(short, long)]
        language: Option<String>,
        /// Workspace root passed to the metadata oracle (default: current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Note,
}

fn ailint_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("AILINT_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".ailint"))
}

fn load_config() -> Result<AilintConfig> {
    let dir = ailint_dir()?;
    AilintConfig::load_or_default(&dir)
}

fn cmd_init() -> Result<()> {
    let dir = ailint_dir()?;
    let config_path = dir.join(CONFIG_FILE_NAME);
    let existed = config_path.exists();

    let config = AilintConfig::load_or_default(&dir)?;
    if existed {
        println!("ailint already initialized at {:?}", config.data_dir);
    } else {
        println!("ailint initialized successfully");
        println!("  Config: {:?}", config_path);
    }
    Ok(())
}

fn describe_endpoint(configured: &Option<String>, env_var: &str) -> String {
    match configured {
        Some(url) => url.clone(),
        None => match std::env::var(env_var) {
            Ok(url) => format!("{url} (from {env_var})"),
            Err(_) => "not configured".to_string(),
        },
    }
}

fn print_oracles(oracles: &OracleConfig) {
    println!(
        "Fingerprint oracle: {}",
        describe_endpoint(&oracles.fingerprint_url, FINGERPRINT_URL_ENV)
    );
    println!(
        "Metadata oracle:    {}",
        describe_endpoint(&oracles.metadata_url, METADATA_URL_ENV)
    );
    println!("Oracle timeout:     {}s", oracles.timeout_secs);
}

fn cmd_status() -> Result<()> {
    let config = load_config()?;

    println!("=== ailint Status ===");
    println!();
    println!("Data directory: {:?}", config.data_dir);
    println!("Config file:    {:?}", config.data_dir.join(CONFIG_FILE_NAME));

    println!();
    println!("=== Weights ===");
    let w = &config.fusion.weights;
    println!("Typing:      {:.2}", w.typing);
    println!("Paste:       {:.2}", w.paste);
    println!("Fingerprint: {:.2}", w.fingerprint);
    println!("Metadata:    {:.2}", w.metadata);
    println!("Reason threshold: {:.2}", config.fusion.reason_threshold);
    println!(
        "Metadata reasons: {}",
        if config.fusion.explain_metadata { "on" } else { "off" }
    );

    println!();
    println!("=== Monitors ===");
    println!(
        "Typing window: {} ms, suspicious above {:.0} chars/sec, saturates at {}",
        config.typing.window_ms, config.typing.suspicious_velocity, config.typing.saturation_count
    );
    println!(
        "Pastes: captured above {} lines, suspicious above {} lines, saturates at {:.0}% of file",
        config.paste.min_paste_lines,
        config.paste.suspicious_paste_lines,
        config.paste.target_ratio * 100.0
    );

    println!();
    println!("=== Oracles ===");
    print_oracles(&config.oracles);
    Ok(())
}

struct AnalyzeArgs {
    file: PathBuf,
    events: Option<PathBuf>,
    document: Option<String>,
    language: Option<String>,
    workspace: Option<PathBuf>,
    format: OutputFormat,
}

async fn cmd_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = load_config()?;
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read file: {:?}", args.file))?;

    let id = DocumentId::new(
        args.document
            .unwrap_or_else(|| args.file.to_string_lossy().to_string()),
    );
    let language = args
        .language
        .unwrap_or_else(|| replay::language_for_path(&args.file).to_string());
    let workspace = match args.workspace {
        Some(dir) => Some(dir),
        None => std::env::current_dir().ok(),
    };

    let mut analyzer = Analyzer::new(
        &config,
        fingerprint_from_config(&config.oracles),
        metadata_from_config(&config.oracles),
    );
    analyzer.open_document(&id);

    let events = match args.events {
        Some(ref path) => replay::load_events(path)?,
        None => Vec::new(),
    };
    for event in &events {
        analyzer.record(event);
    }
    let own_events = events.iter().filter(|e| e.document == id).count();
    log::info!("Replayed {} events ({} for {})", events.len(), own_events, id);

    let mut snapshot = DocumentSnapshot::new(id.clone(), language, text);
    snapshot.workspace_root = workspace;
    let result = analyzer.analyze(&snapshot).await;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Note => {
            println!("{}", AnalysisNote::from(&result).to_json()?);
        }
        OutputFormat::Text => {
            print_report(&analyzer, &snapshot, &result, events.len(), own_events);
        }
    }
    Ok(())
}

fn print_report(
    analyzer: &Analyzer,
    snapshot: &DocumentSnapshot,
    result: &AnalysisResult,
    replayed: usize,
    own_events: usize,
) {
    let name = Path::new(snapshot.id.as_str())
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| snapshot.id.to_string());

    println!("=== ailint Analysis: {} ===", name);
    println!("Document: {}", snapshot.id);
    println!("Language: {}", snapshot.language);
    println!("Lines:    {}", snapshot.line_count());
    println!("Events:   {} replayed ({} for this document)", replayed, own_events);
    println!();

    let c = &result.components;
    println!("Components:");
    println!("  Typing anomaly:       {:.2}", c.typing_anomaly);
    println!("  Paste pattern:        {:.2}", c.paste_pattern);
    println!("  Code fingerprint:     {:.2}", c.code_fingerprint);
    println!("  Metadata correlation: {:.2}", c.metadata_correlation);
    println!();

    let summary = analyzer.velocity_summary(&snapshot.id);
    if summary.event_count > 0 {
        println!(
            "Typing: {} insertions, {} anomalous, mean {:.0} chars/sec, peak {:.0} chars/sec",
            summary.event_count, summary.suspicious_count, summary.mean_velocity, summary.peak_velocity
        );
    }
    let pastes = analyzer.paste_events(&snapshot.id);
    if !pastes.is_empty() {
        println!("Pastes:");
        for paste in pastes {
            println!(
                "  {} lines at {} ms ({})",
                paste.line_count, paste.timestamp_ms, paste.source
            );
        }
    }
    if summary.event_count > 0 || !pastes.is_empty() {
        println!();
    }

    println!(
        "Confidence: {}% ({})",
        result.percentage(),
        result.likelihood
    );
    println!("{}", result.explanation);
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            cmd_init()?;
        }
        Commands::Status => {
            cmd_status()?;
        }
        Commands::Analyze {
            file,
            events,
            document,
            language,
            workspace,
            format,
        } => {
            cmd_analyze(AnalyzeArgs {
                file,
                events,
                document,
                language,
                workspace,
                format,
            })
            .await?;
        }
    }

    Ok(())
}
