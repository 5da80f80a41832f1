//! Expectation types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What a single field is expected to hold.
///
/// When decoded from TOML or JSON the shape picks the variant: an array of
/// strings is a token list, a table of `set`/`infinite`/`number`/`at_least`
/// is a tagged expectation, anything else is compared exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expectation {
    /// Comma-delimited field containing exactly these tokens.
    Tokens(Vec<String>),
    /// Checks on a `{set, infinite, number}` field.
    Tagged(TaggedExpectation),
    /// Exact value. Against a tagged field this is compared to `number`.
    Equals(Value),
}

impl Expectation {
    pub fn equals(value: impl Into<Value>) -> Self {
        Expectation::Equals(value.into())
    }

    pub fn tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expectation::Tokens(tokens.into_iter().map(Into::into).collect())
    }
}

/// Component checks on a tagged value. Unset components are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaggedExpectation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infinite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_least: Option<f64>,
}

impl TaggedExpectation {
    /// `set == true` and `infinite == false`.
    pub fn configured() -> Self {
        Self {
            set: Some(true),
            infinite: Some(false),
            ..Default::default()
        }
    }

    pub fn number(mut self, number: impl Into<Value>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn at_least(mut self, minimum: f64) -> Self {
        self.at_least = Some(minimum);
        self
    }
}

impl From<TaggedExpectation> for Expectation {
    fn from(t: TaggedExpectation) -> Self {
        Expectation::Tagged(t)
    }
}

impl From<Value> for Expectation {
    fn from(v: Value) -> Self {
        Expectation::Equals(v)
    }
}

impl From<&str> for Expectation {
    fn from(s: &str) -> Self {
        Expectation::Equals(Value::String(s.to_string()))
    }
}

impl From<String> for Expectation {
    fn from(s: String) -> Self {
        Expectation::Equals(Value::String(s))
    }
}

impl From<bool> for Expectation {
    fn from(b: bool) -> Self {
        Expectation::Equals(Value::Bool(b))
    }
}

impl From<i32> for Expectation {
    fn from(n: i32) -> Self {
        Expectation::Equals(Value::from(n))
    }
}

impl From<i64> for Expectation {
    fn from(n: i64) -> Self {
        Expectation::Equals(Value::from(n))
    }
}

impl From<u64> for Expectation {
    fn from(n: u64) -> Self {
        Expectation::Equals(Value::from(n))
    }
}

impl From<f64> for Expectation {
    fn from(n: f64) -> Self {
        Expectation::Equals(Value::from(n))
    }
}

/// Field name → expectation. Iteration is in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectationSet {
    fields: BTreeMap<String, Expectation>,
}

impl ExpectationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn field(mut self, name: impl Into<String>, expectation: impl Into<Expectation>) -> Self {
        self.insert(name, expectation);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, expectation: impl Into<Expectation>) {
        self.fields.insert(name.into(), expectation.into());
    }

    pub fn get(&self, name: &str) -> Option<&Expectation> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expectation)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Expectation)> for ExpectationSet {
    fn from_iter<T: IntoIterator<Item = (K, Expectation)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
