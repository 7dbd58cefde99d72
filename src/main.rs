use anyhow::Context;
use asset_analyzer::analyzer::{self, BatchOptions};
use asset_analyzer::{cli::Cli, config::Config, models::ModelServices, scanner};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // 1. 画像スキャン
    let images = scanner::scan_folder(&cli.directory)?;
    if images.is_empty() {
        println!("No images found in the specified directory.");
        return Ok(());
    }
    eprintln!("Found {} images. Analyzing in parallel...", images.len());

    // 2. 設定とモデル（一度だけ読み込む）
    let mut config = Config::load().context("failed to load configuration")?;
    cli.apply_to(&mut config);
    let services = ModelServices::load(&config).context("failed to load models")?;

    // 3. 並列解析
    let options = BatchOptions {
        max_workers: config.max_workers,
        show_progress: !cli.no_progress,
    };
    let results = analyzer::run_batch(&images, &services, &options)?;

    // 4. 出力
    analyzer::write_results(&results, cli.output_path())?;
    Ok(())
}

/// RUST_LOG があれば優先。ログは標準エラーへ（標準出力はJSON専用）
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,asset_analyzer=debug"
    } else {
        "warn,asset_analyzer=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}
