//! 事实解析
//!
//! 按点号分隔的路径（如 "transaction.user.age"）在数据快照中逐段查找。
//! JSON 对象按键查找，结构化记录按字段名查找（先精确、后大小写不敏感）。
//! 任何一段不存在、为 null 或不可再下钻时返回 `None`，不会报错。

use crate::facts::{Data, Fact, FieldAccess};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// 路径遍历中的当前节点
enum Cursor<'a> {
    Json(Cow<'a, Value>),
    Record(Arc<dyn FieldAccess>),
}

impl<'a> Cursor<'a> {
    fn from_fact(fact: &'a Fact) -> Option<Self> {
        match fact {
            Fact::Value(Value::Null) => None,
            Fact::Value(value) => Some(Self::Json(Cow::Borrowed(value))),
            Fact::Record(record) => Some(Self::Record(Arc::clone(record))),
        }
    }

    fn from_owned(fact: Fact) -> Option<Self> {
        match fact {
            Fact::Value(Value::Null) => None,
            Fact::Value(value) => Some(Self::Json(Cow::Owned(value))),
            Fact::Record(record) => Some(Self::Record(record)),
        }
    }

    /// 下钻一段
    fn step(self, segment: &str) -> Option<Self> {
        match self {
            Self::Json(Cow::Borrowed(value)) => match value.as_object()?.get(segment)? {
                Value::Null => None,
                child => Some(Self::Json(Cow::Borrowed(child))),
            },
            Self::Json(Cow::Owned(value)) => match value {
                Value::Object(mut map) => match map.remove(segment)? {
                    Value::Null => None,
                    child => Some(Self::Json(Cow::Owned(child))),
                },
                _ => None,
            },
            Self::Record(record) => Self::from_owned(record.lookup(segment)?),
        }
    }

    fn into_value(self) -> Cow<'a, Value> {
        match self {
            Self::Json(value) => value,
            Self::Record(record) => Cow::Owned(record.to_value()),
        }
    }
}

/// 解析事实路径
///
/// 不含点号的路径直接作为顶层键查找；否则逐段下钻。
pub fn resolve_fact<'a>(data: &'a Data, path: &str) -> Option<Cow<'a, Value>> {
    let mut segments = path.split('.');
    // split 至少产生一段
    let head = segments.next()?;
    let mut cursor = Cursor::from_fact(data.get(head)?)?;

    for segment in segments {
        cursor = cursor.step(segment)?;
    }

    Some(cursor.into_value())
}

impl Data {
    /// 解析事实路径，参见 [`resolve_fact`]
    pub fn resolve(&self, path: &str) -> Option<Cow<'_, Value>> {
        resolve_fact(self, path)
    }
}
