use bot_middlewares::middleware::builtin::{ConsoleLoggingMiddleware, StoreLoggingMiddleware};
use bot_middlewares::{create_default_pipeline, replay, Config, MemorySink, MiddlewarePipeline};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::io::{self, AsyncBufRead, BufReader};

const USAGE: &str = "usage: bot-log-replay [--dry-run] [capture.jsonl]";

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut dry_run = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ if path.is_none() => path = Some(arg),
            _ => {
                eprintln!("{}", USAGE);
                std::process::exit(2);
            }
        }
    }

    let config = Config::from_env();
    log::info!(
        "Replaying as app {} on host {}{}",
        config.app_name,
        config.host,
        if dry_run { " (dry run)" } else { "" }
    );

    let dry_sink = Arc::new(MemorySink::new());
    let pipeline = if dry_run {
        let pipeline = MiddlewarePipeline::new();
        pipeline.register(Arc::new(StoreLoggingMiddleware::new(
            config.app_name.clone(),
            config.host.clone(),
            dry_sink.clone(),
        )));
        if config.console_logging {
            pipeline.register(Arc::new(ConsoleLoggingMiddleware::new(
                config.app_name.clone(),
                config.host.clone(),
            )));
        }
        pipeline
    } else {
        match create_default_pipeline(&config) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                log::error!("Failed to initialize log store: {}", e);
                std::process::exit(1);
            }
        }
    };
    log::info!("Registered {} middlewares", pipeline.middleware_count());

    let reader: Box<dyn AsyncBufRead + Unpin> = match &path {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let summary = match replay::replay(reader, &pipeline).await {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Replay aborted: {}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Replayed {} records ({} rejected): {} entries written, {} dropped",
        summary.records,
        summary.rejected,
        summary.written,
        summary.failures
    );
    if dry_run {
        for entry in dry_sink.entries() {
            println!(
                "{}\t{}\t{}\t{}",
                entry.host, entry.direction, entry.class_name, entry.data
            );
        }
    }
    for (id, stats) in pipeline.get_all_stats() {
        log::debug!("{}: {:?}", id, stats);
    }

    Ok(())
}
