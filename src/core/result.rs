use super::error::ComputeError;
use super::ledger::{Ledger, ModuleResult};
use super::traced::{NodeId, TracedValue};
use crate::money::{Cents, Ratio};
use crate::tax::wash_sale::WashSaleOutcome;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Output of one compute run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResult {
    pub tax_year: i32,
    /// One entry per rule module, in execution order
    pub modules: Vec<ModuleResult>,
    pub nodes: BTreeMap<NodeId, TracedValue>,
    pub wash_sales: WashSaleOutcome,
}

impl ComputeResult {
    pub fn new(tax_year: i32, ledger: Ledger, wash_sales: WashSaleOutcome) -> Self {
        let (nodes, modules) = ledger.into_parts();
        ComputeResult {
            tax_year,
            modules,
            nodes,
            wash_sales,
        }
    }

    pub fn get(&self, id: &str) -> Option<&TracedValue> {
        self.nodes.get(id)
    }

    pub fn cents(&self, id: &str) -> Option<Cents> {
        self.get(id).and_then(TracedValue::cents)
    }

    pub fn ratio(&self, id: &str) -> Option<Ratio> {
        self.get(id).and_then(TracedValue::ratio)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleResult> {
        self.modules.iter().find(|m| m.module == name)
    }

    /// Every computed node's inputs must be present in the same result
    pub fn verify_closure(&self) -> Result<(), ComputeError> {
        for (id, value) in &self.nodes {
            if let Some(missing) = value
                .inputs()
                .iter()
                .find(|input| !self.nodes.contains_key(input.as_str()))
            {
                return Err(ComputeError::BrokenClosure {
                    node: id.to_string(),
                    input: missing.to_string(),
                });
            }
        }
        Ok(())
    }

    /// SHA-256 of the canonical JSON encoding, hex encoded
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traced::Value;

    fn result_with(nodes: Vec<(&str, TracedValue)>) -> ComputeResult {
        ComputeResult {
            tax_year: 2025,
            modules: Vec::new(),
            nodes: nodes
                .into_iter()
                .map(|(id, v)| (NodeId::from(id), v))
                .collect(),
            wash_sales: WashSaleOutcome::default(),
        }
    }

    #[test]
    fn closure_holds_when_inputs_exist() {
        let result = result_with(vec![
            ("a", TracedValue::document(Cents(1), "doc")),
            (
                "b",
                TracedValue::computed("b".into(), Value::Money(Cents(1)), vec!["a".into()], None),
            ),
        ]);
        assert_eq!(result.verify_closure(), Ok(()));
    }

    #[test]
    fn closure_violation_names_node_and_input() {
        let result = result_with(vec![(
            "b",
            TracedValue::computed("b".into(), Value::Money(Cents(1)), vec!["a".into()], None),
        )]);
        assert_eq!(
            result.verify_closure(),
            Err(ComputeError::BrokenClosure {
                node: "b".to_string(),
                input: "a".to_string(),
            })
        );
    }

    #[test]
    fn digest_is_stable_and_sensitive() {
        let a = result_with(vec![("a", TracedValue::document(Cents(1), "doc"))]);
        let b = result_with(vec![("a", TracedValue::document(Cents(2), "doc"))]);
        assert_eq!(a.digest().unwrap(), a.clone().digest().unwrap());
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
        assert_eq!(a.digest().unwrap().len(), 64);
    }
}
