//! 命令行接口
//!
//! 使用 clap derive 宏定义命令，规则文件加载和命令执行也放在这里以便测试。

use crate::engine::RuleEngine;
use crate::executor::EvaluatorOptions;
use crate::facts::Data;
use crate::models::{parse_rule, Event};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rule_engine_shared::AppConfig;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 规则引擎命令行工具
///
/// 规则文件为 JSON：单条规则对象，或规则对象数组。
#[derive(Parser, Debug)]
#[command(name = "rule-engine")]
#[command(version, about = "基于事实的规则评估工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// 配置目录，默认读取 CONFIG_DIR 或 ./config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 事实不存在时以 false 代替，而不是报错
    #[arg(long, global = true)]
    pub allow_undefined_vars: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 对数据快照评估规则，输出命中的事件（JSON 数组）
    Eval {
        /// 规则文件或目录（目录下所有 *.json 按文件名排序加载），可重复
        #[arg(short, long = "rules")]
        rules: Vec<PathBuf>,

        /// 数据快照 JSON 文件，"-" 表示标准输入
        #[arg(short, long)]
        data: PathBuf,

        /// 紧凑输出
        #[arg(long)]
        compact: bool,
    },

    /// 只解析规则，报告格式错误的规则
    Check {
        /// 规则文件或目录，可重复
        #[arg(short, long = "rules")]
        rules: Vec<PathBuf>,
    },
}

impl Cli {
    /// 合并配置文件与命令行参数得到评估选项
    pub fn evaluator_options(&self, config: &AppConfig) -> EvaluatorOptions {
        EvaluatorOptions::new()
            .allow_undefined_vars(self.allow_undefined_vars || config.evaluator.allow_undefined_vars)
    }

    /// 命令行未指定规则路径时使用配置中的路径
    pub fn rule_paths(&self, config: &AppConfig) -> Vec<PathBuf> {
        let paths = match &self.command {
            Commands::Eval { rules, .. } | Commands::Check { rules } => rules,
        };
        if paths.is_empty() {
            config.rules.paths.clone()
        } else {
            paths.clone()
        }
    }
}

/// 一条规则定义原文及其来源
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSource {
    pub origin: String,
    pub text: String,
}

/// 从文件或目录加载规则定义原文
///
/// 目录只加载一层下的 `*.json` 文件，按文件名排序。
/// 文件内容为数组时每个元素作为一条规则。
pub fn load_rule_sources(paths: &[PathBuf]) -> Result<Vec<RuleSource>> {
    if paths.is_empty() {
        bail!("未指定规则文件或目录");
    }

    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut files = Vec::new();
            for entry in fs::read_dir(path)
                .with_context(|| format!("读取规则目录失败: {}", path.display()))?
            {
                let file = entry?.path();
                if file.is_file() && file.extension().is_some_and(|ext| ext == "json") {
                    files.push(file);
                }
            }
            files.sort();
            for file in files {
                load_rule_file(&file, &mut sources)?;
            }
        } else {
            load_rule_file(path, &mut sources)?;
        }
    }

    info!(count = sources.len(), "规则定义已加载");
    Ok(sources)
}

fn load_rule_file(path: &Path, sources: &mut Vec<RuleSource>) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("读取规则文件失败: {}", path.display()))?;
    let origin = path.display().to_string();

    // 顶层是数组时逐条拆分；其余内容（包括无法解析的）原样交给规则解析报告
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(items)) => {
            for (i, item) in items.into_iter().enumerate() {
                sources.push(RuleSource {
                    origin: format!("{}[{}]", origin, i),
                    text: item.to_string(),
                });
            }
        }
        _ => sources.push(RuleSource { origin, text }),
    }

    Ok(())
}

/// 读取数据快照，"-" 表示标准输入
pub fn load_data(path: &Path) -> Result<Data> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("读取标准输入失败")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("读取数据文件失败: {}", path.display()))?
    };

    Data::from_json(&text).with_context(|| format!("数据快照无效: {}", path.display()))
}

/// 评估规则并返回命中的事件
pub fn run_eval(sources: &[RuleSource], data: &Data, options: EvaluatorOptions) -> Result<Vec<Event>> {
    let engine = RuleEngine::new(options);
    engine.add_rules(sources.iter().map(|s| s.text.clone()));

    engine.evaluate_rules(data).context("规则评估失败")
}

/// 检查规则格式，返回格式错误的规则来源和原因
pub fn run_check(sources: &[RuleSource]) -> Vec<(String, String)> {
    sources
        .iter()
        .filter_map(|source| match parse_rule(&source.text) {
            Ok(_) => None,
            Err(e) => {
                warn!(origin = %source.origin, error = %e, "规则格式错误");
                Some((source.origin.clone(), e.to_string()))
            }
        })
        .collect()
}
