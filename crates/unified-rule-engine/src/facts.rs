//! 数据快照
//!
//! 事实值可以是任意 JSON 值，也可以是实现了 [`FieldAccess`] 的结构化记录。
//! 结构化记录的字段查找在编译期由各类型实现，不依赖运行时反射。

use crate::error::{Result, RuleError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// 可按字段名访问的结构化记录
pub trait FieldAccess: fmt::Debug + Send + Sync {
    /// 记录的全部字段名，用于大小写不敏感查找和转换为 JSON
    fn field_names(&self) -> &'static [&'static str];

    /// 按精确字段名取值
    fn get_field(&self, name: &str) -> Option<Fact>;

    /// 先精确匹配，再大小写不敏感匹配
    fn lookup(&self, name: &str) -> Option<Fact> {
        if let Some(fact) = self.get_field(name) {
            return Some(fact);
        }

        let lowered = name.to_lowercase();
        self.field_names()
            .iter()
            .find(|field| field.to_lowercase() == lowered)
            .and_then(|field| self.get_field(field))
    }

    /// 转换为 JSON 对象
    fn to_value(&self) -> Value {
        let mut map = Map::new();
        for name in self.field_names() {
            if let Some(fact) = self.get_field(name) {
                map.insert((*name).to_string(), fact.into_value());
            }
        }
        Value::Object(map)
    }
}

/// 事实值
#[derive(Debug, Clone)]
pub enum Fact {
    /// JSON 值（标量、对象、数组）
    Value(Value),
    /// 结构化记录
    Record(Arc<dyn FieldAccess>),
}

impl Fact {
    /// 包装一个结构化记录
    pub fn record<T: FieldAccess + 'static>(record: T) -> Self {
        Self::Record(Arc::new(record))
    }

    /// 是否为空引用（JSON null）
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    /// 转换为 JSON 值，结构化记录会展开为对象
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Record(record) => record.to_value(),
        }
    }
}

impl From<Value> for Fact {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Arc<dyn FieldAccess>> for Fact {
    fn from(record: Arc<dyn FieldAccess>) -> Self {
        Self::Record(record)
    }
}

/// 可转换为事实值的字段类型
///
/// `Option::None` 转换为 null，在路径解析时视为不存在。
pub trait ToFact {
    fn to_fact(&self) -> Fact;
}

macro_rules! impl_to_fact_via_json {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToFact for $ty {
                fn to_fact(&self) -> Fact {
                    Fact::Value(Value::from(self.clone()))
                }
            }
        )*
    };
}

impl_to_fact_via_json!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, String, Value
);

/// 非有限浮点数（NaN、±inf）无法用 JSON 数值表示，转换为 "NaN" / "inf" / "-inf" 字符串，
/// 以免被当作 null 而视为不存在。相等比较按字符串进行，排序比较返回 `NotANumber`。
fn float_fact(value: f64) -> Fact {
    match serde_json::Number::from_f64(value) {
        Some(number) => Fact::Value(Value::Number(number)),
        None => Fact::Value(Value::String(value.to_string())),
    }
}

impl ToFact for f64 {
    fn to_fact(&self) -> Fact {
        float_fact(*self)
    }
}

impl ToFact for f32 {
    fn to_fact(&self) -> Fact {
        float_fact(f64::from(*self))
    }
}

impl ToFact for char {
    fn to_fact(&self) -> Fact {
        Fact::Value(Value::String(self.to_string()))
    }
}

impl ToFact for str {
    fn to_fact(&self) -> Fact {
        Fact::Value(Value::from(self))
    }
}

impl ToFact for Fact {
    fn to_fact(&self) -> Fact {
        self.clone()
    }
}

impl<T: ToFact + ?Sized> ToFact for &T {
    fn to_fact(&self) -> Fact {
        (**self).to_fact()
    }
}

impl<T: ToFact> ToFact for Option<T> {
    fn to_fact(&self) -> Fact {
        match self {
            Some(inner) => inner.to_fact(),
            None => Fact::Value(Value::Null),
        }
    }
}

impl<T: ToFact + ?Sized> ToFact for Box<T> {
    fn to_fact(&self) -> Fact {
        (**self).to_fact()
    }
}

impl<T: FieldAccess + 'static> ToFact for Arc<T> {
    fn to_fact(&self) -> Fact {
        Fact::Record(self.clone())
    }
}

impl<T: ToFact> ToFact for Vec<T> {
    fn to_fact(&self) -> Fact {
        Fact::Value(Value::Array(
            self.iter().map(|item| item.to_fact().into_value()).collect(),
        ))
    }
}

impl<T: ToFact, S> ToFact for HashMap<String, T, S> {
    fn to_fact(&self) -> Fact {
        Fact::Value(Value::Object(
            self.iter()
                .map(|(key, item)| (key.clone(), item.to_fact().into_value()))
                .collect(),
        ))
    }
}

impl<T: ToFact> ToFact for BTreeMap<String, T> {
    fn to_fact(&self) -> Fact {
        Fact::Value(Value::Object(
            self.iter()
                .map(|(key, item)| (key.clone(), item.to_fact().into_value()))
                .collect(),
        ))
    }
}

/// 宏内部使用：去掉原始标识符的 `r#` 前缀，`r#type` 的字段名为 `type`
#[doc(hidden)]
pub const fn field_name(ident: &'static str) -> &'static str {
    let bytes = ident.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'r' && bytes[1] == b'#' {
        let (_, rest) = bytes.split_at(2);
        match std::str::from_utf8(rest) {
            Ok(name) => name,
            Err(_) => ident,
        }
    } else {
        ident
    }
}

/// 为普通结构体实现 [`FieldAccess`] 和 [`ToFact`]
///
/// 字段名即 Rust 字段名（原始标识符去掉 `r#`），嵌套的记录类型同样需要通过本宏实现。
/// 目标类型必须实现 `Clone`。
///
/// ```
/// use rule_engine::{impl_field_access, Data, Fact};
///
/// #[derive(Debug, Clone)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// impl_field_access!(User { name, age });
///
/// let data = Data::new().with_fact("user", Fact::record(User { name: "Ann".into(), age: 30 }));
/// assert_eq!(*data.resolve("user.Age").unwrap(), serde_json::json!(30));
/// ```
#[macro_export]
macro_rules! impl_field_access {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::FieldAccess for $ty {
            fn field_names(&self) -> &'static [&'static str] {
                const NAMES: &[&str] = &[$($crate::facts::field_name(stringify!($field))),*];
                NAMES
            }

            fn get_field(&self, name: &str) -> Option<$crate::Fact> {
                $(
                    if name == $crate::facts::field_name(stringify!($field)) {
                        return Some($crate::ToFact::to_fact(&self.$field));
                    }
                )*
                None
            }
        }

        impl $crate::ToFact for $ty {
            fn to_fact(&self) -> $crate::Fact {
                $crate::Fact::record(::std::clone::Clone::clone(self))
            }
        }
    };
}

/// 数据快照：顶层事实名到事实值的映射
///
/// 评估期间只读。
#[derive(Debug, Clone, Default)]
pub struct Data {
    facts: BTreeMap<String, Fact>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个顶层事实
    pub fn insert(&mut self, name: impl Into<String>, fact: impl Into<Fact>) -> Option<Fact> {
        self.facts.insert(name.into(), fact.into())
    }

    /// 链式添加顶层事实
    pub fn with_fact(mut self, name: impl Into<String>, fact: impl Into<Fact>) -> Self {
        self.insert(name, fact);
        self
    }

    /// 添加一个结构化记录
    pub fn with_record<T: FieldAccess + 'static>(self, name: impl Into<String>, record: T) -> Self {
        self.with_fact(name, Fact::record(record))
    }

    /// 按顶层事实名精确查找
    pub fn get(&self, name: &str) -> Option<&Fact> {
        self.facts.get(name)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// 从 JSON 对象创建
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(RuleError::InvalidData(format!(
                "数据快照必须是 JSON 对象，实际为 {}",
                type_name(&other)
            ))),
        }
    }

    /// 从 JSON 字符串创建
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| RuleError::InvalidData(e.to_string()))?;
        Self::from_value(value)
    }

    /// 从任意可序列化的结构体创建，字段名取序列化后的名称
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value =
            serde_json::to_value(value).map_err(|e| RuleError::InvalidData(e.to_string()))?;
        Self::from_value(value)
    }
}

impl FromIterator<(String, Value)> for Data {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            facts: iter
                .into_iter()
                .map(|(name, value)| (name, Fact::Value(value)))
                .collect(),
        }
    }
}

impl FromIterator<(String, Fact)> for Data {
    fn from_iter<I: IntoIterator<Item = (String, Fact)>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

impl TryFrom<Value> for Data {
    type Error = RuleError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

/// 获取值的类型名称
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
