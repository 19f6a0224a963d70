use super::error::ComputeError;
use super::traced::{NodeId, TracedValue, Value};
use crate::money::{Cents, Ratio};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The nodes one rule module contributed to a run, in write order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub module: String,
    pub nodes: Vec<NodeId>,
}

/// Write-once node map that rule modules build a run into.
///
/// Values are derived through [`Ledger::derive`], which hands the rule an [`Inputs`]
/// reader. Whatever the rule reads through it becomes the derived value's input list.
#[derive(Debug, Default)]
pub struct Ledger {
    nodes: BTreeMap<NodeId, TracedValue>,
    modules: Vec<ModuleResult>,
    namespace: Option<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Start attributing writes to `module`
    pub fn begin_module(&mut self, module: &str) {
        log::debug!("begin module {}", module);
        self.modules.push(ModuleResult {
            module: module.to_string(),
            nodes: Vec::new(),
        });
        self.namespace = None;
    }

    /// Start a module that may only write nodes whose id starts with `namespace`
    pub fn begin_scoped_module(&mut self, module: &str, namespace: &str) {
        self.begin_module(module);
        self.namespace = Some(namespace.to_string());
    }

    pub fn current_module(&self) -> &str {
        self.modules
            .last()
            .map(|m| m.module.as_str())
            .unwrap_or("<none>")
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Result<&TracedValue, ComputeError> {
        self.nodes.get(id).ok_or_else(|| ComputeError::MissingNode {
            node: id.to_string(),
            module: self.current_module().to_string(),
        })
    }

    /// Record a source document field
    pub fn document(
        &mut self,
        id: impl Into<NodeId>,
        amount: Cents,
        reference: impl Into<String>,
    ) -> Result<NodeId, ComputeError> {
        let id = id.into();
        self.insert(id.clone(), TracedValue::document(amount, reference))?;
        Ok(id)
    }

    /// Record an amount the user typed in
    pub fn user_entry(
        &mut self,
        id: impl Into<NodeId>,
        amount: Cents,
        reference: impl Into<String>,
    ) -> Result<NodeId, ComputeError> {
        let id = id.into();
        self.insert(id.clone(), TracedValue::user_entry(amount, reference))?;
        Ok(id)
    }

    /// Record a count taken from the return, such as qualifying children
    pub fn user_count(
        &mut self,
        id: impl Into<NodeId>,
        count: i64,
        reference: impl Into<String>,
    ) -> Result<NodeId, ComputeError> {
        let id = id.into();
        self.insert(id.clone(), TracedValue::user_count(count, reference))?;
        Ok(id)
    }

    /// A computed amount with no upstream nodes, e.g. a statutory constant
    pub fn constant(
        &mut self,
        id: impl Into<NodeId>,
        amount: Cents,
        citation: impl Into<String>,
    ) -> Result<Cents, ComputeError> {
        let citation = citation.into();
        self.derive(id, |inputs| {
            inputs.cite(citation);
            Ok(amount)
        })
    }

    /// Derive a monetary node from the nodes `rule` reads
    pub fn derive<F>(&mut self, id: impl Into<NodeId>, rule: F) -> Result<Cents, ComputeError>
    where
        F: FnOnce(&mut Inputs<'_>) -> Result<Cents, ComputeError>,
    {
        self.record(id.into(), rule)
    }

    /// Derive a dimensionless node from the nodes `rule` reads
    pub fn derive_ratio<F>(&mut self, id: impl Into<NodeId>, rule: F) -> Result<Ratio, ComputeError>
    where
        F: FnOnce(&mut Inputs<'_>) -> Result<Ratio, ComputeError>,
    {
        self.record(id.into(), rule)
    }

    fn record<T, F>(&mut self, id: NodeId, rule: F) -> Result<T, ComputeError>
    where
        T: Copy + Into<Value>,
        F: FnOnce(&mut Inputs<'_>) -> Result<T, ComputeError>,
    {
        let (value, read, citation) = {
            let mut inputs = Inputs::new(self);
            let value = rule(&mut inputs)?;
            (value, inputs.read, inputs.citation)
        };
        let recorded: Value = value.into();
        log::debug!("{} = {} (from {} inputs)", id, recorded, read.len());
        self.insert(
            id.clone(),
            TracedValue::computed(id, recorded, read, citation),
        )?;
        Ok(value)
    }

    fn insert(&mut self, id: NodeId, value: TracedValue) -> Result<(), ComputeError> {
        if let Some(namespace) = &self.namespace {
            if !id.as_str().starts_with(namespace.as_str()) {
                return Err(ComputeError::NamespaceViolation {
                    node: id.to_string(),
                    module: self.current_module().to_string(),
                    namespace: namespace.clone(),
                });
            }
        }
        if self.nodes.contains_key(id.as_str()) {
            return Err(ComputeError::DuplicateNode {
                node: id.to_string(),
                module: self.current_module().to_string(),
            });
        }
        if let Some(module) = self.modules.last_mut() {
            module.nodes.push(id.clone());
        }
        self.nodes.insert(id, value);
        Ok(())
    }

    pub fn into_parts(self) -> (BTreeMap<NodeId, TracedValue>, Vec<ModuleResult>) {
        (self.nodes, self.modules)
    }
}

/// Read access handed to a rule while it derives one node.
pub struct Inputs<'a> {
    ledger: &'a Ledger,
    read: Vec<NodeId>,
    citation: Option<String>,
}

impl<'a> Inputs<'a> {
    fn new(ledger: &'a Ledger) -> Self {
        Inputs {
            ledger,
            read: Vec::new(),
            citation: None,
        }
    }

    fn note_read(&mut self, id: &str) -> Result<&'a TracedValue, ComputeError> {
        let ledger: &'a Ledger = self.ledger;
        let value = ledger.get(id)?;
        if !self.read.iter().any(|r| r.as_str() == id) {
            self.read.push(NodeId::from(id));
        }
        Ok(value)
    }

    pub fn cents(&mut self, id: &str) -> Result<Cents, ComputeError> {
        let value = self.note_read(id)?;
        value.cents().ok_or_else(|| ComputeError::ValueKind {
            node: id.to_string(),
            module: self.ledger.current_module().to_string(),
            expected: "money",
            found: value.value().kind(),
        })
    }

    pub fn ratio(&mut self, id: &str) -> Result<Ratio, ComputeError> {
        let value = self.note_read(id)?;
        value.ratio().ok_or_else(|| ComputeError::ValueKind {
            node: id.to_string(),
            module: self.ledger.current_module().to_string(),
            expected: "ratio",
            found: value.value().kind(),
        })
    }

    pub fn count(&mut self, id: &str) -> Result<i64, ComputeError> {
        let value = self.note_read(id)?;
        value.count().ok_or_else(|| ComputeError::ValueKind {
            node: id.to_string(),
            module: self.ledger.current_module().to_string(),
            expected: "count",
            found: value.value().kind(),
        })
    }

    pub fn sum<I, S>(&mut self, ids: I) -> Result<Cents, ComputeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut total = Cents::ZERO;
        for id in ids {
            total += self.cents(id.as_ref())?;
        }
        Ok(total)
    }

    /// Attach a note explaining the rule or constant behind the value
    pub fn cite(&mut self, note: impl Into<String>) {
        self.citation = Some(note.into());
    }

    /// Floor at zero, citing `note` when the floor applies
    pub fn floor_zero(&mut self, amount: Cents, note: &str) -> Cents {
        if amount.is_negative() {
            self.cite(format!("{note} (computed {amount}, clamped to $0.00)"));
            Cents::ZERO
        } else {
            amount
        }
    }
}
