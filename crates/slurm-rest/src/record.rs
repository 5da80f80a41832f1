//! Job records and tagged numeric fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A numeric limit with "is it configured" and "is it unbounded" flags.
///
/// slurmrestd renders fields such as `cpus` and `time_limit` as
/// `{"set": true, "infinite": false, "number": 4}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedValue {
    #[serde(default)]
    pub set: bool,
    #[serde(default)]
    pub infinite: bool,
    pub number: Value,
}

impl TaggedValue {
    /// Recognise a tagged value: any object carrying a `number` member.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let number = map.get("number")?.clone();
        Some(Self {
            set: map.get("set").and_then(Value::as_bool).unwrap_or(false),
            infinite: map.get("infinite").and_then(Value::as_bool).unwrap_or(false),
            number,
        })
    }

    /// The magnitude as a float, when it is numeric.
    pub fn number_f64(&self) -> Option<f64> {
        self.number.as_f64()
    }
}

/// Borrowed view of a single record field, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    /// `{set, infinite, number}` object.
    Tagged(TaggedValue),
    /// Plain string, possibly a comma-delimited list.
    Text(&'a str),
    /// Number, bool, null, array, or an object without `number`.
    Other(&'a Value),
}

/// The scheduler's canonical description of one job.
///
/// Immutable once decoded; the field set is whatever the API returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobRecord {
    fields: Map<String, Value>,
}

impl JobRecord {
    /// Wrap a JSON object; `None` for any other JSON shape.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Classify a field by shape.
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = self.fields.get(name)?;
        if let Some(tagged) = TaggedValue::from_value(value) {
            return Some(FieldValue::Tagged(tagged));
        }
        Some(match value {
            Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Other(other),
        })
    }

    /// The `job_id` reported by the scheduler.
    pub fn job_id(&self) -> Option<u64> {
        self.fields.get("job_id").and_then(Value::as_u64)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> JobRecord {
        JobRecord::from_value(json!({
            "job_id": 101,
            "partition": "general",
            "features": "gpu,fast",
            "cpus": {"set": true, "infinite": false, "number": 4},
            "time_limit": {"set": true, "infinite": false, "number": 60},
            "nice": 0,
            "flags": ["EXACT_TASK_COUNT_REQUESTED"]
        }))
        .unwrap()
    }

    #[test]
    fn test_tagged_field_classified() {
        let record = sample();
        match record.field("cpus") {
            Some(FieldValue::Tagged(t)) => {
                assert!(t.set);
                assert!(!t.infinite);
                assert_eq!(t.number_f64(), Some(4.0));
            }
            other => panic!("expected tagged value, got {:?}", other),
        }
    }

    #[test]
    fn test_text_and_other_fields() {
        let record = sample();
        assert_eq!(record.field("partition"), Some(FieldValue::Text("general")));
        assert!(matches!(record.field("nice"), Some(FieldValue::Other(_))));
        assert!(matches!(record.field("flags"), Some(FieldValue::Other(_))));
        assert!(record.field("missing").is_none());
    }

    #[test]
    fn test_object_without_number_is_not_tagged() {
        let record = JobRecord::from_value(json!({"power": {"flags": []}})).unwrap();
        assert!(matches!(record.field("power"), Some(FieldValue::Other(_))));
    }

    #[test]
    fn test_missing_flags_default_false() {
        let tagged = TaggedValue::from_value(&json!({"number": 2})).unwrap();
        assert!(!tagged.set);
        assert!(!tagged.infinite);
    }

    #[test]
    fn test_job_id_and_non_object() {
        assert_eq!(sample().job_id(), Some(101));
        assert!(JobRecord::from_value(json!([1, 2])).is_none());
    }

    #[test]
    fn test_transparent_serialization() {
        let record = sample();
        let text = serde_json::to_string(&record).unwrap();
        let back: JobRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back.get("partition"), Some(&json!("general")));
        assert_eq!(back.len(), record.len());
    }
}
