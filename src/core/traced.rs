use crate::money::{Cents, Ratio};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable key of one traced value, e.g. `scheduleD.line16` or `form8949.A.gainLoss`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a leaf value was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    /// A field of a source document (W-2 box, 1099 box, brokerage lot)
    Document,
    /// An amount or election typed in by the user
    UserEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    Leaf {
        kind: LeafKind,
        /// Human-readable pointer to the document field or entry
        reference: String,
    },
    Computed {
        node: NodeId,
        /// Every node read while deriving this value, in first-read order
        inputs: Vec<NodeId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Money(Cents),
    Ratio(Ratio),
    /// People or items counted from the return, e.g. dependents
    Count(i64),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Money(_) => "money",
            Value::Ratio(_) => "ratio",
            Value::Count(_) => "count",
        }
    }
}

impl From<Cents> for Value {
    fn from(cents: Cents) -> Self {
        Value::Money(cents)
    }
}

impl From<Ratio> for Value {
    fn from(ratio: Ratio) -> Self {
        Value::Ratio(ratio)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Money(cents) => write!(f, "{cents}"),
            Value::Ratio(ratio) => write!(f, "{ratio}"),
            Value::Count(n) => write!(f, "{n}"),
        }
    }
}

/// An entered or computed value together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TracedValue {
    value: Value,
    source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    citation: Option<String>,
}

impl TracedValue {
    pub fn document(amount: Cents, reference: impl Into<String>) -> Self {
        TracedValue {
            value: Value::Money(amount),
            source: Source::Leaf {
                kind: LeafKind::Document,
                reference: reference.into(),
            },
            citation: None,
        }
    }

    pub fn user_entry(amount: Cents, reference: impl Into<String>) -> Self {
        TracedValue {
            value: Value::Money(amount),
            source: Source::Leaf {
                kind: LeafKind::UserEntry,
                reference: reference.into(),
            },
            citation: None,
        }
    }

    /// A count the user entered, such as the number of dependents
    pub fn user_count(count: i64, reference: impl Into<String>) -> Self {
        TracedValue {
            value: Value::Count(count),
            source: Source::Leaf {
                kind: LeafKind::UserEntry,
                reference: reference.into(),
            },
            citation: None,
        }
    }

    pub fn computed(
        node: NodeId,
        value: Value,
        inputs: Vec<NodeId>,
        citation: Option<String>,
    ) -> Self {
        TracedValue {
            value,
            source: Source::Computed { node, inputs },
            citation,
        }
    }

    pub fn value(&self) -> Value {
        self.value
    }

    pub fn cents(&self) -> Option<Cents> {
        match self.value {
            Value::Money(cents) => Some(cents),
            _ => None,
        }
    }

    pub fn ratio(&self) -> Option<Ratio> {
        match self.value {
            Value::Ratio(ratio) => Some(ratio),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<i64> {
        match self.value {
            Value::Count(n) => Some(n),
            _ => None,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn citation(&self) -> Option<&str> {
        self.citation.as_deref()
    }

    /// Upstream nodes; empty for leaves and constants
    pub fn inputs(&self) -> &[NodeId] {
        match &self.source {
            Source::Computed { inputs, .. } => inputs,
            Source::Leaf { .. } => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.source, Source::Leaf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_have_no_inputs() {
        let w2 = TracedValue::document(Cents::dollars(50_000), "W-2 w2-1 box 1");
        assert!(w2.is_leaf());
        assert!(w2.inputs().is_empty());
        assert_eq!(w2.cents(), Some(Cents::dollars(50_000)));
        assert_eq!(w2.ratio(), None);
    }

    #[test]
    fn computed_keeps_inputs_in_order() {
        let value = TracedValue::computed(
            NodeId::from("scheduleD.line16"),
            Value::Money(Cents::dollars(2_000)),
            vec!["scheduleD.line7".into(), "scheduleD.line15".into()],
            None,
        );
        assert!(!value.is_leaf());
        assert_eq!(
            value.inputs(),
            &[NodeId::from("scheduleD.line7"), NodeId::from("scheduleD.line15")]
        );
    }

    #[test]
    fn serializes_with_tagged_source() {
        let value = TracedValue::user_entry(Cents(150), "estimated payments");
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "value": { "money": 150 },
                "source": { "type": "leaf", "kind": "user_entry", "reference": "estimated payments" }
            })
        );
    }
}
