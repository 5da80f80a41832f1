//! Declarative expectations checked against Slurm job records.
//!
//! An [`ExpectationSet`] maps field names to expected values. [`verify`]
//! applies one comparison rule per field, chosen by the shape of the
//! recorded value and of the expectation, and returns every discrepancy
//! found rather than stopping at the first.

mod discrepancy;
mod expectation;

pub use discrepancy::{Discrepancy, DiscrepancyKind};
pub use expectation::{Expectation, ExpectationSet, TaggedExpectation};

use serde_json::Value;
use slurm_rest::{FieldValue, JobRecord, TaggedValue};

/// CPU count field in a job record.
pub const CPUS_FIELD: &str = "cpus";

/// Wall-clock limit field in a job record.
pub const TIME_LIMIT_FIELD: &str = "time_limit";

/// Delimiter for multi-valued string fields such as `features`.
const TOKEN_DELIMITER: char = ',';

/// Check every expectation against a record.
///
/// The result is empty when the record satisfies the whole set.
pub fn verify(expected: &ExpectationSet, actual: &JobRecord) -> Vec<Discrepancy> {
    expected
        .iter()
        .flat_map(|(field, expectation)| check_field(field, expectation, actual))
        .collect()
}

/// Post-condition every accepted job must meet: CPU count and time limit
/// are both configured and bounded.
pub fn common_checks() -> ExpectationSet {
    ExpectationSet::new()
        .field(CPUS_FIELD, TaggedExpectation::configured())
        .field(TIME_LIMIT_FIELD, TaggedExpectation::configured())
}

/// Check a single field.
pub fn check_field(field: &str, expectation: &Expectation, record: &JobRecord) -> Vec<Discrepancy> {
    let value = match record.field(field) {
        Some(value) => value,
        None => return vec![Discrepancy::new(field, DiscrepancyKind::MissingField)],
    };

    match (expectation, value) {
        (Expectation::Tagged(expected), FieldValue::Tagged(actual)) => check_tagged(field, expected, &actual),
        (Expectation::Tagged(_), FieldValue::Text(_)) => shape_mismatch(field, "tagged value", "string"),
        (Expectation::Tagged(_), FieldValue::Other(actual)) => {
            shape_mismatch(field, "tagged value", shape_name(actual))
        }
        (Expectation::Tokens(tokens), FieldValue::Text(text)) => check_tokens(field, tokens, text),
        (Expectation::Tokens(_), FieldValue::Tagged(_)) => {
            shape_mismatch(field, "delimited string", "tagged value")
        }
        (Expectation::Tokens(_), FieldValue::Other(actual)) => {
            shape_mismatch(field, "delimited string", shape_name(actual))
        }
        // A tagged value is compared by its number alone.
        (Expectation::Equals(expected), FieldValue::Tagged(actual)) => check_equals(field, expected, &actual.number),
        (Expectation::Equals(expected), FieldValue::Text(text)) => {
            check_equals(field, expected, &Value::String(text.to_string()))
        }
        (Expectation::Equals(expected), FieldValue::Other(actual)) => check_equals(field, expected, actual),
    }
}

fn check_equals(field: &str, expected: &Value, actual: &Value) -> Vec<Discrepancy> {
    if values_equal(expected, actual) {
        return Vec::new();
    }
    vec![Discrepancy::new(
        field,
        DiscrepancyKind::ValueMismatch {
            expected: expected.clone(),
            actual: actual.clone(),
        },
    )]
}

fn shape_mismatch(field: &str, expected: &str, actual: &str) -> Vec<Discrepancy> {
    vec![Discrepancy::new(
        field,
        DiscrepancyKind::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        },
    )]
}

fn check_tagged(field: &str, expected: &TaggedExpectation, actual: &TaggedValue) -> Vec<Discrepancy> {
    let mut found = Vec::new();

    if let Some(set) = expected.set {
        if set != actual.set {
            found.push(Discrepancy::new(
                field,
                DiscrepancyKind::FlagMismatch {
                    flag: "set".to_string(),
                    expected: set,
                    actual: actual.set,
                },
            ));
        }
    }

    if let Some(infinite) = expected.infinite {
        if infinite != actual.infinite {
            found.push(Discrepancy::new(
                field,
                DiscrepancyKind::FlagMismatch {
                    flag: "infinite".to_string(),
                    expected: infinite,
                    actual: actual.infinite,
                },
            ));
        }
    }

    if let Some(ref number) = expected.number {
        if !values_equal(number, &actual.number) {
            found.push(Discrepancy::new(
                field,
                DiscrepancyKind::ValueMismatch {
                    expected: number.clone(),
                    actual: actual.number.clone(),
                },
            ));
        }
    }

    if let Some(minimum) = expected.at_least {
        let meets = actual.number_f64().map_or(false, |n| n >= minimum);
        if !meets {
            found.push(Discrepancy::new(
                field,
                DiscrepancyKind::BelowMinimum {
                    minimum,
                    actual: actual.number.clone(),
                },
            ));
        }
    }

    found
}

/// Multi-value rule: the split count must match, and each expected token
/// must occur somewhere in the delimited text. Containment is substring
/// based, so "gpu" is satisfied by "gpu80".
fn check_tokens(field: &str, tokens: &[String], text: &str) -> Vec<Discrepancy> {
    let mut found = Vec::new();
    let count = text.split(TOKEN_DELIMITER).count();
    if count != tokens.len() {
        found.push(Discrepancy::new(
            field,
            DiscrepancyKind::TokenCountMismatch {
                expected: tokens.len(),
                actual: count,
            },
        ));
    }

    for token in tokens {
        if !text.contains(token.as_str()) {
            found.push(Discrepancy::new(
                field,
                DiscrepancyKind::MissingToken {
                    token: token.clone(),
                    actual: text.to_string(),
                },
            ));
        }
    }

    found
}

/// Equality with numbers compared by value, so `4` matches `4.0`.
fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
                return x == y;
            }
            a.as_f64() == b.as_f64()
        }
        _ => expected == actual,
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> JobRecord {
        JobRecord::from_value(value).unwrap()
    }

    fn cpus_record() -> JobRecord {
        record(json!({"cpus": {"set": true, "infinite": false, "number": 4}}))
    }

    #[test]
    fn test_tagged_number_matches() {
        let expected = ExpectationSet::new().field("cpus", 4);
        assert!(verify(&expected, &cpus_record()).is_empty());
    }

    #[test]
    fn test_tagged_number_mismatch() {
        let expected = ExpectationSet::new().field("cpus", 5);
        let found = verify(&expected, &cpus_record());
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].kind,
            DiscrepancyKind::ValueMismatch {
                expected: json!(5),
                actual: json!(4)
            }
        );
    }

    #[test]
    fn test_tagged_flags_checked_independently_of_number() {
        let expected = ExpectationSet::new().field(
            "cpus",
            TaggedExpectation {
                set: Some(true),
                infinite: Some(false),
                ..Default::default()
            },
        );
        assert!(verify(&expected, &cpus_record()).is_empty());
    }

    #[test]
    fn test_tagged_flag_mismatch_reports_each_flag() {
        let rec = record(json!({"time_limit": {"set": false, "infinite": true, "number": 0}}));
        let found = verify(&common_checks(), &rec);
        // cpus missing, plus both time_limit flags
        assert_eq!(found.len(), 3);
        assert!(found.iter().any(|d| d.field == "cpus" && d.kind == DiscrepancyKind::MissingField));
        assert_eq!(
            found.iter().filter(|d| d.field == "time_limit").count(),
            2
        );
    }

    #[test]
    fn test_tagged_at_least() {
        let expected = ExpectationSet::new().field("cpus", TaggedExpectation::configured().at_least(1.0));
        assert!(verify(&expected, &cpus_record()).is_empty());

        let zero = record(json!({"cpus": {"set": true, "infinite": false, "number": 0}}));
        let found = verify(&expected, &zero);
        assert_eq!(found.len(), 1);
        assert!(matches!(found[0].kind, DiscrepancyKind::BelowMinimum { .. }));
    }

    #[test]
    fn test_token_count_mismatch_fails_even_when_tokens_present() {
        let rec = record(json!({"features": "gpu,highmem,fast"}));
        let expected = ExpectationSet::new().field("features", Expectation::tokens(["gpu", "fast"]));
        let found = verify(&expected, &rec);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].kind,
            DiscrepancyKind::TokenCountMismatch { expected: 2, actual: 3 }
        );
    }

    #[test]
    fn test_tokens_pass() {
        let rec = record(json!({"features": "gpu,fast"}));
        let expected = ExpectationSet::new().field("features", Expectation::tokens(["gpu", "fast"]));
        assert!(verify(&expected, &rec).is_empty());
    }

    #[test]
    fn test_tokens_report_every_missing_token() {
        let rec = record(json!({"partition": "a,b"}));
        let expected = ExpectationSet::new().field("partition", Expectation::tokens(["x", "y"]));
        let found = verify(&expected, &rec);
        let missing: Vec<_> = found
            .iter()
            .filter_map(|d| match &d.kind {
                DiscrepancyKind::MissingToken { token, .. } => Some(token.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(missing, vec!["x", "y"]);
    }

    #[test]
    fn test_tokens_substring_containment() {
        let rec = record(json!({"features": "gpu80,fast"}));
        let expected = ExpectationSet::new().field("features", Expectation::tokens(["gpu", "fast"]));
        assert!(verify(&expected, &rec).is_empty());
    }

    #[test]
    fn test_tokens_against_non_string() {
        let rec = record(json!({"features": 3}));
        let expected = ExpectationSet::new().field("features", Expectation::tokens(["gpu"]));
        let found = verify(&expected, &rec);
        assert!(matches!(found[0].kind, DiscrepancyKind::ShapeMismatch { .. }));
    }

    #[test]
    fn test_tagged_expectation_against_plain_string() {
        let rec = record(json!({"cpus": "4"}));
        let expected = ExpectationSet::new().field("cpus", TaggedExpectation::configured());
        let found = verify(&expected, &rec);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].kind,
            DiscrepancyKind::ShapeMismatch {
                expected: "tagged value".to_string(),
                actual: "string".to_string()
            }
        );
    }

    #[test]
    fn test_tokens_against_tagged_value() {
        let found = verify(
            &ExpectationSet::new().field("cpus", Expectation::tokens(["4"])),
            &cpus_record(),
        );
        assert_eq!(
            found[0].kind,
            DiscrepancyKind::ShapeMismatch {
                expected: "delimited string".to_string(),
                actual: "tagged value".to_string()
            }
        );
    }

    #[test]
    fn test_tokens_against_array_names_shape() {
        let rec = record(json!({"features": ["gpu"]}));
        let found = verify(&ExpectationSet::new().field("features", Expectation::tokens(["gpu"])), &rec);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].kind,
            DiscrepancyKind::ShapeMismatch {
                expected: "delimited string".to_string(),
                actual: "array".to_string()
            }
        );
    }

    #[test]
    fn test_missing_field_always_reported() {
        let rec = record(json!({}));
        let expected = ExpectationSet::new()
            .field("partition", "general")
            .field("features", Expectation::tokens(["gpu"]))
            .field("cpus", TaggedExpectation::configured());
        let found = verify(&expected, &rec);
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|d| d.kind == DiscrepancyKind::MissingField));
    }

    #[test]
    fn test_exact_equality() {
        let rec = record(json!({"partition": "general", "nice": 0, "requeue": false}));
        let expected = ExpectationSet::new()
            .field("partition", "general")
            .field("nice", 0)
            .field("requeue", false);
        assert!(verify(&expected, &rec).is_empty());

        let wrong = ExpectationSet::new().field("partition", "debug");
        assert_eq!(verify(&wrong, &rec).len(), 1);
    }

    #[test]
    fn test_numeric_equality_across_representations() {
        assert!(values_equal(&json!(4), &json!(4.0)));
        assert!(!values_equal(&json!(4), &json!("4")));
    }

    #[test]
    fn test_all_fields_checked_before_reporting() {
        let rec = record(json!({"partition": "debug", "qos": "low"}));
        let expected = ExpectationSet::new()
            .field("partition", "general")
            .field("qos", "normal");
        assert_eq!(verify(&expected, &rec).len(), 2);
    }
}
