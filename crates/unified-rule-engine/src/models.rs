//! 规则引擎领域模型
//!
//! 规则 JSON 形如：
//!
//! ```json
//! {
//!   "condition": {
//!     "any": [{ "identifier": "user.level", "operator": "eq", "value": "gold" }],
//!     "all": [{ "identifier": "order.amount", "operator": "gte", "value": 500 }]
//!   },
//!   "event": { "type": "big_spender", "payload": { "badge": 42 } }
//! }
//! ```

use crate::error::{Result, RuleError};
use crate::operators::Operator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 规则定义
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub event: Event,
}

impl Rule {
    pub fn new(condition: Condition, event: Event) -> Self {
        Self { condition, event }
    }

    /// 从 JSON 字符串解析规则
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(RuleError::MalformedRule)
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(RuleError::MalformedRule)
    }
}

/// 解析一条规则定义
///
/// 字段缺失按默认值处理，多余字段忽略；`identifier` 或 `operator`
/// 不是字符串时返回 [`RuleError::MalformedRule`]。操作符是否合法要到评估时才检查。
pub fn parse_rule(text: &str) -> Result<Rule> {
    Rule::from_json(text)
}

/// 条件分组
///
/// `any` 为 OR 组合，`all` 为 AND 组合。缺失、`null` 或空列表都视为自动满足。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<Conditional>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<Conditional>>,
}

impl Condition {
    /// 只有 AND 组
    pub fn all(conditionals: Vec<Conditional>) -> Self {
        Self {
            any: None,
            all: Some(conditionals),
        }
    }

    /// 只有 OR 组
    pub fn any(conditionals: Vec<Conditional>) -> Self {
        Self {
            any: Some(conditionals),
            all: None,
        }
    }

    pub fn with_all(mut self, conditionals: Vec<Conditional>) -> Self {
        self.all = Some(conditionals);
        self
    }

    pub fn with_any(mut self, conditionals: Vec<Conditional>) -> Self {
        self.any = Some(conditionals);
        self
    }

    /// 两个分组都没有约束
    pub fn is_unconstrained(&self) -> bool {
        self.any.as_deref().is_none_or(<[Conditional]>::is_empty)
            && self.all.as_deref().is_none_or(<[Conditional]>::is_empty)
    }
}

/// 单个比较条件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    /// 点号分隔的事实路径，如 "transaction.user.age"
    #[serde(rename = "identifier", default)]
    pub fact: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

impl Conditional {
    pub fn new(fact: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            fact: fact.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// 使用类型化的操作符构建
    pub fn with_operator(fact: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::new(fact, operator.to_string(), value)
    }
}

/// 规则命中时触发的事件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }
}
