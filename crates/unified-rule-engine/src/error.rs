//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则格式错误: {0}")]
    MalformedRule(#[source] serde_json::Error),

    #[error("事实未定义: {fact}")]
    UndefinedFact { fact: String },

    #[error("不是数值: {value}")]
    NotANumber { value: String },

    #[error("不支持的操作符: {0}")]
    UnsupportedOperator(String),

    #[error("无效的数据快照: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, RuleError>;
