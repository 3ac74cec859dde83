//! 规则引擎集成测试
//!
//! 测试完整的规则解析、事实解析、评估和事件收集工作流。

use rule_engine::{
    evaluate_all, evaluate_any, evaluate_rule, impl_field_access, parse_rule, Condition,
    Conditional, Data, EvaluatorOptions, Event, Fact, Rule, RuleEngine, RuleError,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// 创建测试数据：模拟一笔交易
fn create_transaction_data() -> Data {
    Data::from_value(json!({
        "transaction": {
            "id": "txn-12345",
            "amount": 1500,
            "currency": "USD",
            "channel": "mobile_app",
            "user": {
                "id": "user-67890",
                "age": 34,
                "level": "gold",
                "is_vip": true
            }
        },
        "risk_score": 0.42
    }))
    .unwrap()
}

fn strict() -> EvaluatorOptions {
    EvaluatorOptions::default()
}

// ==================== 完整工作流测试 ====================

#[test]
fn test_full_workflow_with_engine() {
    let engine = RuleEngine::default();

    engine.add_rules([
        r#"
        {
            "condition": {
                "all": [
                    {"identifier": "transaction.amount", "operator": "gte", "value": 1000},
                    {"identifier": "transaction.user.is_vip", "operator": "eq", "value": true}
                ]
            },
            "event": {"type": "vip_large_purchase", "payload": {"badge_id": 101}}
        }
        "#,
        r#"
        {
            "condition": {
                "any": [
                    {"identifier": "risk_score", "operator": ">", "value": 0.8},
                    {"identifier": "transaction.channel", "operator": "=", "value": "unknown"}
                ]
            },
            "event": {"type": "manual_review"}
        }
        "#,
        r#"{"event": {"type": "always"}}"#,
    ]);
    assert_eq!(engine.len(), 3);

    let events = engine.evaluate_rules(&create_transaction_data()).unwrap();

    assert_eq!(
        events,
        vec![
            Event::new("vip_large_purchase").with_payload(json!({"badge_id": 101})),
            Event::new("always"),
        ]
    );
}

#[test]
fn test_low_amount_rule_end_to_end() {
    let rule = parse_rule(
        r#"
        {
            "condition": {
                "all": [
                    {"identifier": "transaction.amount", "operator": "lt", "value": 1000},
                    {"identifier": "transaction.currency", "operator": "eq", "value": "USD"}
                ]
            },
            "event": {"type": "low_amount"}
        }
        "#,
    )
    .unwrap();

    let usd = Data::from_value(json!({"transaction": {"amount": 500, "currency": "USD"}})).unwrap();
    assert!(evaluate_rule(&rule, &usd, &strict()).unwrap());

    let eur = Data::from_value(json!({"transaction": {"amount": 500, "currency": "EUR"}})).unwrap();
    assert!(!evaluate_rule(&rule, &eur, &strict()).unwrap());
}

// ==================== 数值语义测试 ====================

#[test]
fn test_integer_and_float_are_equal() {
    let data = Data::from_value(json!({"price": 100})).unwrap();
    let rule = parse_rule(
        r#"{"condition": {"all": [{"identifier": "price", "operator": "eq", "value": 100.0}]}}"#,
    )
    .unwrap();
    assert!(evaluate_rule(&rule, &data, &strict()).unwrap());
}

#[test]
fn test_numeric_string_is_not_a_number() {
    let data = Data::from_value(json!({"price": "100"})).unwrap();

    let eq = parse_rule(
        r#"{"condition": {"all": [{"identifier": "price", "operator": "eq", "value": 100}]}}"#,
    )
    .unwrap();
    assert!(!evaluate_rule(&eq, &data, &strict()).unwrap());

    let gt = parse_rule(
        r#"{"condition": {"all": [{"identifier": "price", "operator": "gt", "value": 1}]}}"#,
    )
    .unwrap();
    assert!(matches!(
        evaluate_rule(&gt, &data, &strict()),
        Err(RuleError::NotANumber { .. })
    ));
}

#[test]
fn test_ordering_on_string_fails() {
    let data = Data::from_value(json!({"name": "Ann"})).unwrap();
    let rule = parse_rule(
        r#"{"condition": {"all": [{"identifier": "name", "operator": "lt", "value": 5}]}}"#,
    )
    .unwrap();

    let err = evaluate_rule(&rule, &data, &strict()).unwrap_err();
    assert!(matches!(err, RuleError::NotANumber { .. }));
}

// ==================== 短路求值测试 ====================

#[test]
fn test_short_circuit_skips_failing_conditionals() {
    let data = create_transaction_data();
    let failing = Conditional::new("transaction.missing", "bogus", 1);

    let all = vec![Conditional::new("transaction.currency", "eq", "EUR"), failing.clone()];
    assert!(!evaluate_all(&all, &data, &strict()).unwrap());

    let any = vec![Conditional::new("transaction.currency", "eq", "USD"), failing.clone()];
    assert!(evaluate_any(&any, &data, &strict()).unwrap());

    let reversed = vec![failing, Conditional::new("transaction.currency", "eq", "USD")];
    assert!(matches!(
        evaluate_any(&reversed, &data, &strict()),
        Err(RuleError::UndefinedFact { .. })
    ));
}

// ==================== 未定义事实测试 ====================

#[test]
fn test_undefined_fact_policy() {
    let data = create_transaction_data();
    let rule = Rule::new(
        Condition::all(vec![Conditional::new("transaction.coupon", "neq", "FREE")]),
        Event::new("no_coupon"),
    );

    let err = evaluate_rule(&rule, &data, &strict()).unwrap_err();
    assert!(matches!(err, RuleError::UndefinedFact { ref fact } if fact == "transaction.coupon"));

    let lenient = EvaluatorOptions::new().allow_undefined_vars(true);
    assert!(evaluate_rule(&rule, &data, &lenient).unwrap());
}

#[test]
fn test_unsupported_operator_detected_at_evaluation() {
    let rule = parse_rule(
        r#"{"condition": {"any": [{"identifier": "risk_score", "operator": "between", "value": [0, 1]}]}}"#,
    )
    .unwrap();

    let err = evaluate_rule(&rule, &create_transaction_data(), &strict()).unwrap_err();
    assert!(matches!(err, RuleError::UnsupportedOperator(ref op) if op == "between"));
}

// ==================== 结构化记录测试 ====================

#[derive(Debug, Clone)]
struct Account {
    holder: String,
    balance: f64,
    limits: Limits,
    parent: Option<Arc<Account>>,
}

#[derive(Debug, Clone)]
struct Limits {
    daily: i64,
}

impl_field_access!(Account { holder, balance, limits, parent });
impl_field_access!(Limits { daily });

#[test]
fn test_rules_over_struct_records() {
    let account = Account {
        holder: "Jane".to_string(),
        balance: 250.75,
        limits: Limits { daily: 1000 },
        parent: None,
    };
    let data = Data::new()
        .with_record("account", account)
        .with_fact("request", json!({"amount": 300}));

    let rule = parse_rule(
        r#"
        {
            "condition": {
                "all": [
                    {"identifier": "account.Holder", "operator": "eq", "value": "Jane"},
                    {"identifier": "account.Limits.Daily", "operator": ">=", "value": 300},
                    {"identifier": "request.amount", "operator": ">", "value": 250.75}
                ]
            },
            "event": {"type": "needs_topup"}
        }
        "#,
    )
    .unwrap();
    assert!(evaluate_rule(&rule, &data, &strict()).unwrap());

    let parent_rule = Rule::new(
        Condition::all(vec![Conditional::new("account.parent.holder", "eq", "Joe")]),
        Event::new("family"),
    );
    assert!(matches!(
        evaluate_rule(&parent_rule, &data, &strict()),
        Err(RuleError::UndefinedFact { .. })
    ));
}

#[test]
fn test_struct_reference_is_followed() {
    let parent = Arc::new(Account {
        holder: "Joe".to_string(),
        balance: 10.0,
        limits: Limits { daily: 50 },
        parent: None,
    });
    let child = Account {
        holder: "Jane".to_string(),
        balance: 1.0,
        limits: Limits { daily: 5 },
        parent: Some(parent),
    };
    let data = Data::new().with_fact("account", Fact::record(child));

    let rule = Rule::new(
        Condition::all(vec![
            Conditional::new("account.parent.holder", "eq", "Joe"),
            Conditional::new("account.parent.limits.daily", "gt", 10),
        ]),
        Event::new("family"),
    );
    assert!(evaluate_rule(&rule, &data, &strict()).unwrap());
}

#[test]
fn test_serializable_struct_snapshot() {
    #[derive(Serialize)]
    struct Snapshot {
        transaction: Payment,
    }

    #[derive(Serialize)]
    struct Payment {
        amount: u32,
        currency: String,
    }

    let data = Data::from_serializable(&Snapshot {
        transaction: Payment {
            amount: 999,
            currency: "USD".to_string(),
        },
    })
    .unwrap();

    let engine = RuleEngine::default();
    engine.add_rule(
        r#"{"condition": {"all": [
            {"identifier": "transaction.amount", "operator": "<=", "value": 999.0},
            {"identifier": "transaction.currency", "operator": "!=", "value": "EUR"}
        ]}, "event": {"type": "ok"}}"#,
    );

    let events = engine.evaluate_rules(&data).unwrap();
    assert_eq!(events, vec![Event::new("ok")]);
}

#[derive(Debug, Clone)]
struct Txn {
    r#type: String,
    score: f64,
    items: usize,
}

impl_field_access!(Txn { r#type, score, items });

#[test]
fn test_keyword_field_and_non_finite_score() {
    let data = Data::new().with_record(
        "txn",
        Txn {
            r#type: "refund".to_string(),
            score: f64::NAN,
            items: 2,
        },
    );

    let rule = Rule::new(
        Condition::all(vec![
            Conditional::new("txn.type", "eq", "refund"),
            Conditional::new("txn.score", "neq", 1),
            Conditional::new("txn.items", "gte", 2),
        ]),
        Event::new("refund_review"),
    );
    assert!(evaluate_rule(&rule, &data, &strict()).unwrap());

    let ordered = Rule::new(
        Condition::all(vec![Conditional::new("txn.score", "gt", 0)]),
        Event::new("scored"),
    );
    assert!(matches!(
        evaluate_rule(&ordered, &data, &strict()),
        Err(RuleError::NotANumber { .. })
    ));
}

// ==================== 并发测试 ====================

#[test]
fn test_concurrent_evaluations_with_different_options() {
    let rule = Arc::new(Rule::new(
        Condition::all(vec![Conditional::new("flag", "eq", false)]),
        Event::new("flag_off"),
    ));
    let data = Arc::new(Data::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let rule = Arc::clone(&rule);
            let data = Arc::clone(&data);
            std::thread::spawn(move || {
                let options = EvaluatorOptions::new().allow_undefined_vars(i % 2 == 0);
                (i, evaluate_rule(&rule, &data, &options))
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.join().unwrap();
        if i % 2 == 0 {
            assert!(result.unwrap());
        } else {
            assert!(matches!(result, Err(RuleError::UndefinedFact { .. })));
        }
    }
}
