use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use rss_gallery::config::Config;
use rss_gallery::feed::FallbackOrchestrator;
use rss_gallery::gallery::Gallery;
use rss_gallery::images::ImageResolver;

/// Default config file path (~/.config/rss-gallery/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("rss-gallery")
        .join("config.toml"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Parser, Debug)]
#[command(
    name = "rss-gallery",
    about = "Fetch an RSS/Atom feed (with fallbacks) and print its articles as an image gallery"
)]
struct Args {
    /// Config file (defaults to ~/.config/rss-gallery/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Primary feed URL, overrides the config file
    #[arg(long, value_name = "URL")]
    primary: Option<String>,

    /// Fallback feed URL; repeat for several. Replaces the configured list
    #[arg(long = "fallback", value_name = "URL")]
    fallbacks: Vec<String>,

    /// Maximum number of articles
    #[arg(long, value_name = "N")]
    max_items: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

impl Args {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(primary) = &self.primary {
            config.primary_url = primary.clone();
        }
        if !self.fallbacks.is_empty() {
            config.fallback_urls = self.fallbacks.clone();
        }
        if let Some(max_items) = self.max_items {
            config.max_items = max_items;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for the gallery output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    let images = ImageResolver::new(config.image_base().context("Invalid image base URL")?);
    let orchestrator =
        FallbackOrchestrator::from_config(&config).context("Failed to build HTTP client")?;

    let (primary, fallbacks) = config.sources();
    let loaded = orchestrator.load(&primary, &fallbacks).await;
    let gallery = Gallery::build(loaded, &images, config.max_items);

    match args.format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&gallery).context("Failed to serialize gallery")?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{}", gallery.text(config.description_max_width)),
    }

    if gallery.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rss_gallery::article::DEFAULT_MAX_ITEMS;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "rss-gallery",
            "--primary",
            "https://example.com/feed.xml",
            "--fallback",
            "https://a.example/rss",
            "--fallback",
            "https://b.example/rss",
            "--max-items",
            "5",
            "--format",
            "text",
        ]);
        let mut config = Config::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.primary_url, "https://example.com/feed.xml");
        assert_eq!(config.fallback_urls, vec!["https://a.example/rss", "https://b.example/rss"]);
        assert_eq!(config.max_items, 5);
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["rss-gallery"]);
        let mut config = Config::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.fallback_urls.len(), 3);
        assert_eq!(config.max_items, DEFAULT_MAX_ITEMS);
        assert_eq!(args.format, OutputFormat::Json);
    }
}
