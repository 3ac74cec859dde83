//! 规则引擎门面
//!
//! 保存规则定义原文，每次调用时逐条解析并评估，收集命中规则的事件。
//! 每次 [`RuleEngine::evaluate_rules`] 只返回本次命中的事件，不累积历史结果。

use crate::error::Result;
use crate::executor::{evaluate_rule, EvaluatorOptions};
use crate::facts::Data;
use crate::models::{parse_rule, Event, Rule};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 规则引擎
///
/// 克隆后共享同一份规则列表，可在多个线程间使用。评估时不持有锁。
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    options: EvaluatorOptions,
    rules: Arc<RwLock<Vec<String>>>,
}

impl RuleEngine {
    pub fn new(options: EvaluatorOptions) -> Self {
        Self {
            options,
            rules: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// 评估选项
    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    /// 追加一条规则定义（JSON 文本）
    pub fn add_rule(&self, rule: impl Into<String>) -> &Self {
        self.rules.write().push(rule.into());
        self
    }

    /// 批量追加规则定义
    pub fn add_rules<I, S>(&self, rules: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.write().extend(rules.into_iter().map(Into::into));
        self
    }

    /// 当前保存的规则数量
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// 规则定义原文（按添加顺序）
    pub fn rules(&self) -> Vec<String> {
        self.rules.read().clone()
    }

    /// 清空所有规则
    pub fn clear(&self) {
        let mut rules = self.rules.write();
        let count = rules.len();
        rules.clear();
        info!("已清空 {} 条规则", count);
    }

    /// 使用引擎的选项评估一条已解析的规则
    pub fn evaluate_rule_struct(&self, rule: &Rule, data: &Data) -> Result<bool> {
        evaluate_rule(rule, data, &self.options)
    }

    /// 按添加顺序解析并评估所有规则，返回命中规则的事件
    ///
    /// 任一规则解析或评估失败时立即返回该错误，不返回部分结果。
    #[instrument(skip_all, fields(allow_undefined_vars = self.options.allow_undefined_vars))]
    pub fn evaluate_rules(&self, data: &Data) -> Result<Vec<Event>> {
        let rules = self.rules();
        let mut events = Vec::new();

        for (index, text) in rules.iter().enumerate() {
            let rule = parse_rule(text).inspect_err(|e| {
                warn!(index, error = %e, "规则解析失败");
            })?;

            let matched = self.evaluate_rule_struct(&rule, data).inspect_err(|e| {
                warn!(index, event_type = %rule.event.event_type, error = %e, "规则评估失败");
            })?;

            debug!(index, event_type = %rule.event.event_type, matched, "规则评估完成");

            if matched {
                events.push(rule.event);
            }
        }

        debug!(total = rules.len(), matched = events.len(), "规则批量评估完成");
        Ok(events)
    }
}
