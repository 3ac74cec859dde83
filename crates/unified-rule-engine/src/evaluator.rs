//! 操作符评估器
//!
//! 比较事实值和规则中的字面量。排序比较只接受数值；相等比较先尝试数值归一化，
//! 失败时退回到严格的值相等。

use crate::error::{Result, RuleError};
use crate::operators::Operator;
use serde_json::Value;

/// 操作符评估器
pub struct OperatorEvaluator;

impl OperatorEvaluator {
    /// 按操作符名称评估
    ///
    /// # Arguments
    /// * `fact` - 从数据快照中解析出的事实值
    /// * `expected` - 规则中定义的期望值
    /// * `operator` - 操作符名称，两种写法均可（如 `>=` / `gte`）
    pub fn evaluate(fact: &Value, expected: &Value, operator: &str) -> Result<bool> {
        let operator: Operator = operator.parse()?;
        Self::apply(fact, expected, operator)
    }

    /// 按已解析的操作符评估
    pub fn apply(fact: &Value, expected: &Value, operator: Operator) -> Result<bool> {
        match operator {
            Operator::Eq => Ok(Self::loose_eq(fact, expected)),
            Operator::Neq => Ok(!Self::loose_eq(fact, expected)),
            Operator::Gt => Self::compare(fact, expected, |a, b| a > b),
            Operator::Gte => Self::compare(fact, expected, |a, b| a >= b),
            Operator::Lt => Self::compare(fact, expected, |a, b| a < b),
            Operator::Lte => Self::compare(fact, expected, |a, b| a <= b),
        }
    }

    /// 相等比较
    ///
    /// 1. 两边都能转成 f64 时按数值比较（100 == 100.0）
    /// 2. 否则按原始类型严格比较（"100" != 100）
    pub fn loose_eq(fact: &Value, expected: &Value) -> bool {
        if let (Some(a), Some(b)) = (Self::as_f64(fact), Self::as_f64(expected)) {
            return a == b;
        }

        fact == expected
    }

    /// 数值比较
    fn compare<F>(fact: &Value, expected: &Value, cmp: F) -> Result<bool>
    where
        F: Fn(f64, f64) -> bool,
    {
        let a = Self::require_number(fact)?;
        let b = Self::require_number(expected)?;

        Ok(cmp(a, b))
    }

    fn require_number(value: &Value) -> Result<f64> {
        Self::as_f64(value).ok_or_else(|| RuleError::NotANumber {
            value: value.to_string(),
        })
    }

    /// 尝试将 Value 转换为 f64
    ///
    /// 只接受 JSON 数值（整数或浮点），字符串和布尔值都不算数值。
    pub fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

/// 评估单个操作符，参见 [`OperatorEvaluator::evaluate`]
pub fn evaluate_operator(fact: &Value, expected: &Value, operator: &str) -> Result<bool> {
    OperatorEvaluator::evaluate(fact, expected, operator)
}
