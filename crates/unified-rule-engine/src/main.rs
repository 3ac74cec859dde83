//! 规则引擎命令行入口
//!
//! 加载配置、初始化日志后执行子命令。结果输出到标准输出，日志输出到标准错误。

use anyhow::{bail, Result};
use clap::Parser;
use rule_engine::cli::{load_data, load_rule_sources, run_check, run_eval, Cli, Commands};
use rule_engine_shared::config::AppConfig;
use rule_engine_shared::observability;
use tracing::info;

const SERVICE_NAME: &str = "rule-engine";

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 配置加载失败时使用默认值继续
    let loaded = match &cli.config {
        Some(dir) => AppConfig::load_from(SERVICE_NAME, dir),
        None => AppConfig::load(SERVICE_NAME),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig {
            service_name: SERVICE_NAME.to_string(),
            ..AppConfig::default()
        }
    });

    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    observability::init(&config.service_name, &config.observability)?;

    let options = cli.evaluator_options(&config);
    let sources = load_rule_sources(&cli.rule_paths(&config))?;

    match &cli.command {
        Commands::Eval { data, compact, .. } => {
            let data = load_data(data)?;
            let events = run_eval(&sources, &data, options)?;
            info!(rules = sources.len(), matched = events.len(), "Evaluation complete");

            let output = if *compact {
                serde_json::to_string(&events)?
            } else {
                serde_json::to_string_pretty(&events)?
            };
            println!("{}", output);
        }
        Commands::Check { .. } => {
            let failures = run_check(&sources);
            for (origin, reason) in &failures {
                println!("{}: {}", origin, reason);
            }
            if !failures.is_empty() {
                bail!("{} of {} rules are malformed", failures.len(), sources.len());
            }
            println!("{} rules OK", sources.len());
        }
    }

    Ok(())
}
