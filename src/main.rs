use anyhow::Context;
use clap::Parser;
use hsn_validator::app::serve;
use hsn_validator::config::{CliConfig, Command, LogFormat};
use hsn_validator::utils::logger;
use hsn_validator::{TableStore, ValidationService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(),
    }

    tracing::info!("Starting hsn-validator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(
                "Configuration failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };

    // 載入 HSN 主檔；失敗時以空表啟動
    let source = config.table_source()?;
    let store = TableStore::from_source(&source);
    if store.is_empty() {
        eprintln!(
            "⚠️ No HSN codes loaded from '{}'; every request will report DATASTORE_UNAVAILABLE",
            source.path.display()
        );
    }

    let service = Arc::new(
        ValidationService::new(store, config.guardrail_chain()).with_audit(config.service.audit),
    );

    match &cli.command {
        Command::Check { codes } => {
            let results = service.validate_codes(codes);
            let rendered =
                serde_json::to_string_pretty(&results).context("failed to encode results")?;
            println!("{}", rendered);
        }
        Command::Serve { .. } => {
            let reload = config.reload_interval().map(|every| {
                tracing::info!("Reloading master data every {:?}", every);
                serve::spawn_reload_task(Arc::clone(&service), source.clone(), every)
            });

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let served = serve::run(&service, stdin, tokio::io::stdout())
                .await
                .context("serve loop failed")?;
            tracing::info!("Served {} requests", served);

            if let Some(handle) = reload {
                handle.abort();
            }
        }
    }

    Ok(())
}
