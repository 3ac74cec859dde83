//! 统一规则引擎
//!
//! 提供可嵌入的规则评估能力：
//! - JSON 规则定义和解析
//! - 点号路径事实解析（JSON 对象和结构化记录）
//! - 数值归一化的操作符比较
//! - any / all 短路求值
//!
//! ```
//! use rule_engine::{evaluate_rule, parse_rule, Data, EvaluatorOptions};
//! use serde_json::json;
//!
//! let rule = parse_rule(r#"{
//!     "condition": {"all": [{"identifier": "order.amount", "operator": ">=", "value": 500}]},
//!     "event": {"type": "big_order"}
//! }"#)?;
//! let data = Data::from_value(json!({"order": {"amount": 800}}))?;
//!
//! assert!(evaluate_rule(&rule, &data, &EvaluatorOptions::default())?);
//! # Ok::<(), rule_engine::RuleError>(())
//! ```

pub mod cli;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod facts;
pub mod models;
pub mod operators;
pub mod resolver;

pub use engine::RuleEngine;
pub use error::{Result, RuleError};
pub use evaluator::{evaluate_operator, OperatorEvaluator};
pub use executor::{
    evaluate_all, evaluate_any, evaluate_condition, evaluate_conditional, evaluate_rule,
    fact_value, ConditionKind, EvaluatorOptions,
};
pub use facts::{Data, Fact, FieldAccess, ToFact};
pub use models::{parse_rule, Condition, Conditional, Event, Rule};
pub use operators::Operator;
pub use resolver::resolve_fact;
