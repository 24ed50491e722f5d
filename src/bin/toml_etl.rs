use anyhow::Context;
use clap::Parser;
use twse_etl::core::export;
use twse_etl::core::ConfigProvider;
use twse_etl::utils::{logger, validation::Validate};
use twse_etl::{EtlEngine, LocalStorage, TomlConfig, TwsePipeline};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "twse-etl driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "twse-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Rows to preview after the run
    #[arg(long, default_value = "5")]
    head: usize,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    let verbose = args.verbose || config.verbose();
    if config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("📁 Loaded configuration from: {}", args.config);

    config.validate().context("Configuration validation failed")?;

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        return Ok(());
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = TwsePipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    let outcome = engine.run().await.context("ETL process failed")?;

    print!("{}", export::preview(&outcome.table, args.head));
    println!("📁 Output saved to: {}", outcome.output_path);

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    println!("📋 Configuration Summary:");
    println!("  Source: {}{}", config.base_url(), config.endpoint());
    if let Some(timeout) = config.timeout_seconds() {
        println!("  Timeout: {}s", timeout);
    }
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));

    let options = config.normalize_options();
    println!(
        "  Parse: dates={} numbers={} categories={} raw={} ({:?} dates)",
        options.parse_dates,
        options.parse_numbers,
        options.parse_categories,
        options.raw,
        options.date_convention
    );

    let mut forced: Vec<_> = config.column_types().into_iter().collect();
    forced.sort_by(|a, b| a.0.cmp(&b.0));
    for (column, column_type) in forced {
        println!("  Force: {} -> {}", column, column_type);
    }

    println!();
}
