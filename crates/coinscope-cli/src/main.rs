//! Coinscope CLI
//!
//! Command-line interface for identifying coins from photos and tracking
//! their estimated market value.

use anyhow::{Context, anyhow, bail};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use coinscope_analysis::{ImageRecord, Orchestrator};
use coinscope_chart::{PriceChart, svg};
use coinscope_core::coin::CoinAnalysis;
use coinscope_egress::gemini::{GeminiConfig, GeminiConnector};
use coinscope_history::{HistoryStore, JsonHistoryStore, SavedResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "coinscope")]
#[command(about = "Coinscope - AI coin identification and valuation", long_about = None)]
struct Cli {
    /// Data directory for persisted history (default: ~/.coinscope)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze coin images and print identification and market value
    Analyze {
        /// Image files (png, jpeg, or webp)
        images: Vec<PathBuf>,

        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Model identifier
        #[arg(long, default_value = "gemini-2.5-flash")]
        model: String,
    },
    /// Inspect past analysis sessions
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Export a stored coin's 12-month price trend as an SVG chart
    Chart {
        /// Session id (see `history list`)
        session_id: String,

        /// Image index within the session
        #[arg(long, default_value = "0")]
        image: usize,

        /// Coin index within the image
        #[arg(long, default_value = "0")]
        coin: usize,

        /// Output SVG file
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List saved sessions, newest first
    List,
    /// Show one session's results
    Show { id: String },
    /// Delete all saved sessions
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);

    match cli.command {
        Commands::Analyze {
            images,
            api_key,
            model,
        } => analyze(&data_dir, &images, api_key, model).await,
        Commands::History { command } => history(&data_dir, command).await,
        Commands::Chart {
            session_id,
            image,
            coin,
            out,
        } => chart(&data_dir, &session_id, image, coin, &out).await,
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".coinscope")
}

async fn analyze(
    data_dir: &Path,
    images: &[PathBuf],
    api_key: String,
    model: String,
) -> anyhow::Result<()> {
    let mut selected = Vec::with_capacity(images.len());
    for path in images {
        let mime_type = mime_for_path(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        selected.push((Bytes::from(bytes), mime_type.to_string()));
    }

    let connector = GeminiConnector::new(GeminiConfig::new(api_key).with_model(model))?;
    let store = JsonHistoryStore::in_dir(data_dir);
    let mut orchestrator = Orchestrator::new(Arc::new(connector), Arc::new(store));

    orchestrator.select_images(selected);
    let records = orchestrator.analyze().await?;

    for (index, record) in records.iter().enumerate() {
        print_record(index, images.get(index), record);
    }
    Ok(())
}

async fn history(data_dir: &Path, command: HistoryCommands) -> anyhow::Result<()> {
    let store = JsonHistoryStore::in_dir(data_dir);

    match command {
        HistoryCommands::List => {
            let sessions = store.list_sessions().await;
            if sessions.is_empty() {
                println!("No analysis history.");
                return Ok(());
            }
            for session in &sessions {
                let coins: usize = session
                    .results
                    .iter()
                    .filter_map(|r| r.analyses.as_ref())
                    .map(|a| a.len())
                    .sum();
                println!(
                    "{}  {}  {} image(s), {} coin(s)",
                    session.id,
                    format_date(session.date),
                    session.results.len(),
                    coins
                );
            }
        }
        HistoryCommands::Show { id } => {
            let sessions = store.list_sessions().await;
            let session = sessions
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(|| anyhow!("No session with id {id}"))?;

            println!("Session {} ({})", session.id, format_date(session.date));
            for (index, result) in session.results.iter().enumerate() {
                print_saved_result(index, result);
            }
        }
        HistoryCommands::Clear => {
            store.clear_history().await?;
            println!("History cleared.");
        }
    }
    Ok(())
}

async fn chart(
    data_dir: &Path,
    session_id: &str,
    image: usize,
    coin: usize,
    out: &Path,
) -> anyhow::Result<()> {
    let store = JsonHistoryStore::in_dir(data_dir);
    let sessions = store.list_sessions().await;
    let session = sessions
        .iter()
        .find(|s| s.id == session_id)
        .ok_or_else(|| anyhow!("No session with id {session_id}"))?;

    let result = session
        .results
        .get(image)
        .ok_or_else(|| anyhow!("Session has no image at index {image}"))?;
    let analyses = result.analyses.as_ref().ok_or_else(|| {
        anyhow!(
            "Image {image} has no analyses{}",
            result
                .error
                .as_ref()
                .map(|e| format!(" ({e})"))
                .unwrap_or_default()
        )
    })?;
    let analysis = analyses
        .get(coin)
        .ok_or_else(|| anyhow!("Image {image} has no coin at index {coin}"))?;

    let chart = PriceChart::build(&analysis.historical_values);
    if matches!(chart, PriceChart::InsufficientData) {
        println!("Note: {}", svg::INSUFFICIENT_DATA_MESSAGE);
    }

    tokio::fs::write(out, svg::render(&chart))
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!("Wrote price trend for {} to {}", analysis.coin_type, out.display());
    Ok(())
}

fn mime_for_path(path: &Path) -> anyhow::Result<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        _ => bail!(
            "Unsupported image type for {}: expected png, jpeg, or webp",
            path.display()
        ),
    }
}

fn format_date(epoch_millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(epoch_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_millis.to_string())
}

fn print_record(index: usize, path: Option<&PathBuf>, record: &ImageRecord) {
    match path {
        Some(path) => println!("\nImage {} ({}):", index + 1, path.display()),
        None => println!("\nImage {}:", index + 1),
    }
    print_outcome(record.analyses.as_deref(), record.error.as_deref());
}

fn print_saved_result(index: usize, result: &SavedResult) {
    println!("\nImage {}:", index + 1);
    print_outcome(result.analyses.as_deref(), result.error.as_deref());
}

fn print_outcome(analyses: Option<&[CoinAnalysis]>, error: Option<&str>) {
    if let Some(error) = error {
        println!("  Error: {error}");
        return;
    }

    let analyses = analyses.unwrap_or(&[]);
    if analyses.is_empty() {
        println!("  No coins detected.");
        return;
    }

    for analysis in analyses {
        print_analysis(analysis);
    }
}

fn print_analysis(analysis: &CoinAnalysis) {
    println!(
        "  {} ({}), mint mark {}, condition {}",
        analysis.coin_type, analysis.year, analysis.mint_mark, analysis.condition
    );
    if let Some(score) = analysis.confidence_score {
        println!("  Identification confidence: {:.0}%", score * 100.0);
    }
    println!("  {}", analysis.description);

    for market_value in &analysis.market_values {
        let confidence = market_value
            .value_confidence
            .map(|c| format!(", confidence {:.0}%", c * 100.0))
            .unwrap_or_default();
        println!(
            "    {}: {}{} <{}>",
            market_value.marketplace, market_value.value, confidence, market_value.url
        );
    }
    println!(
        "    {} month(s) of price history available",
        analysis.historical_values.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_supported_extensions() {
        assert_eq!(mime_for_path(Path::new("coin.png")).unwrap(), "image/png");
        assert_eq!(mime_for_path(Path::new("coin.JPG")).unwrap(), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("coin.jpeg")).unwrap(), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("coin.webp")).unwrap(), "image/webp");
    }

    #[test]
    fn test_mime_rejects_other_extensions() {
        assert!(mime_for_path(Path::new("coin.gif")).is_err());
        assert!(mime_for_path(Path::new("coin")).is_err());
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0), "1970-01-01 00:00:00");
    }
}
