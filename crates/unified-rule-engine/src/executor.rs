//! 条件执行器
//!
//! 按 AND（`all`）/ OR（`any`）语义组合条件并给出规则的最终结论。
//! 两种组合都是短路求值；任一条件出错时整条规则的评估立即失败。

use crate::error::{Result, RuleError};
use crate::evaluator::OperatorEvaluator;
use crate::facts::Data;
use crate::models::{Conditional, Rule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, trace};

/// 评估选项
///
/// 作为参数显式传给每个评估入口，不存放在共享状态中。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorOptions {
    /// 事实不存在时以 `false` 代替，而不是返回 [`RuleError::UndefinedFact`]
    #[serde(default)]
    pub allow_undefined_vars: bool,
}

impl EvaluatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_undefined_vars(mut self, allow: bool) -> Self {
        self.allow_undefined_vars = allow;
        self
    }
}

/// 组合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// 全部满足
    All,
    /// 任一满足
    Any,
}

/// 取条件对应的事实值
///
/// 路径不存在时按选项决定：报错，或以 `false` 代替。
pub fn fact_value<'a>(
    conditional: &Conditional,
    data: &'a Data,
    options: &EvaluatorOptions,
) -> Result<Cow<'a, Value>> {
    match data.resolve(&conditional.fact) {
        Some(value) => Ok(value),
        None if options.allow_undefined_vars => {
            debug!(fact = %conditional.fact, "事实未定义，使用 false 代替");
            Ok(Cow::Owned(Value::Bool(false)))
        }
        None => Err(RuleError::UndefinedFact {
            fact: conditional.fact.clone(),
        }),
    }
}

/// 评估单个条件
pub fn evaluate_conditional(
    conditional: &Conditional,
    data: &Data,
    options: &EvaluatorOptions,
) -> Result<bool> {
    let fact = fact_value(conditional, data, options)?;
    let matched = OperatorEvaluator::evaluate(&fact, &conditional.value, &conditional.operator)?;

    trace!(
        fact = %conditional.fact,
        operator = %conditional.operator,
        expected = %conditional.value,
        actual = %fact,
        matched,
        "条件评估完成"
    );

    Ok(matched)
}

/// AND：遇到 false 立即返回
pub fn evaluate_all(
    conditionals: &[Conditional],
    data: &Data,
    options: &EvaluatorOptions,
) -> Result<bool> {
    for (i, conditional) in conditionals.iter().enumerate() {
        if !evaluate_conditional(conditional, data, options)? {
            debug!(index = i, fact = %conditional.fact, "AND 短路");
            return Ok(false);
        }
    }

    Ok(true)
}

/// OR：遇到 true 立即返回
pub fn evaluate_any(
    conditionals: &[Conditional],
    data: &Data,
    options: &EvaluatorOptions,
) -> Result<bool> {
    for (i, conditional) in conditionals.iter().enumerate() {
        if evaluate_conditional(conditional, data, options)? {
            debug!(index = i, fact = %conditional.fact, "OR 短路");
            return Ok(true);
        }
    }

    Ok(false)
}

/// 按组合方式评估一组条件
pub fn evaluate_condition(
    conditionals: &[Conditional],
    kind: ConditionKind,
    data: &Data,
    options: &EvaluatorOptions,
) -> Result<bool> {
    match kind {
        ConditionKind::All => evaluate_all(conditionals, data, options),
        ConditionKind::Any => evaluate_any(conditionals, data, options),
    }
}

/// 评估整条规则
///
/// 结论为 `any` 与 `all` 的逻辑与；缺失或为空的分组视为满足。先评估 `any`。
pub fn evaluate_rule(rule: &Rule, data: &Data, options: &EvaluatorOptions) -> Result<bool> {
    if rule.condition.is_unconstrained() {
        trace!(event_type = %rule.event.event_type, "规则无约束，直接命中");
        return Ok(true);
    }

    let any = match rule.condition.any.as_deref() {
        None | Some([]) => true,
        Some(conditionals) => evaluate_condition(conditionals, ConditionKind::Any, data, options)?,
    };

    let all = match rule.condition.all.as_deref() {
        None | Some([]) => true,
        Some(conditionals) => evaluate_condition(conditionals, ConditionKind::All, data, options)?,
    };

    Ok(any && all)
}
