//! Explain a computed value by walking its inputs back to the source documents.

use crate::core::{ComputeResult, LeafKind, NodeId, Source, TracedValue};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TraceError {
    #[error("no node named {0} in the result")]
    UnknownNode(String),
    #[error("{node} lists input {input} which is not in the result")]
    MissingInput { node: String, input: String },
    #[error("cycle through {}", .0.join(" -> "))]
    Cycle(Vec<String>),
}

/// A node, its provenance and the traces of everything it was derived from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeTrace {
    pub node_id: NodeId,
    pub label: String,
    pub output: TracedValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<ComputeTrace>,
}

impl ComputeTrace {
    /// Distinct document and user-entry leaves reached, in first-visit order
    pub fn leaves(&self) -> Vec<&ComputeTrace> {
        let mut leaves: Vec<&ComputeTrace> = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a ComputeTrace>) {
        if self.output.is_leaf() {
            if !leaves.iter().any(|l| l.node_id == self.node_id) {
                leaves.push(self);
            }
            return;
        }
        for input in &self.inputs {
            input.collect_leaves(leaves);
        }
    }

    /// Number of nodes in the tree, counting shared inputs each time they appear
    pub fn size(&self) -> usize {
        1 + self.inputs.iter().map(ComputeTrace::size).sum::<usize>()
    }
}

pub fn build_trace(result: &ComputeResult, node: &str) -> Result<ComputeTrace, TraceError> {
    if result.get(node).is_none() {
        return Err(TraceError::UnknownNode(node.to_string()));
    }
    let mut path = Vec::new();
    trace_node(result, node, &mut path)
}

fn trace_node(
    result: &ComputeResult,
    node: &str,
    path: &mut Vec<String>,
) -> Result<ComputeTrace, TraceError> {
    if path.iter().any(|p| p == node) {
        let mut cycle = path.clone();
        cycle.push(node.to_string());
        return Err(TraceError::Cycle(cycle));
    }
    let value = match result.get(node) {
        Some(value) => value,
        None => {
            return Err(match path.last() {
                Some(parent) => TraceError::MissingInput {
                    node: parent.clone(),
                    input: node.to_string(),
                },
                None => TraceError::UnknownNode(node.to_string()),
            })
        }
    };

    path.push(node.to_string());
    let inputs = value
        .inputs()
        .iter()
        .map(|input| trace_node(result, input.as_str(), path))
        .collect::<Result<Vec<_>, _>>()?;
    path.pop();

    Ok(ComputeTrace {
        node_id: NodeId::from(node),
        label: label(node),
        output: value.clone(),
        citation: value.citation().map(str::to_string),
        inputs,
    })
}

/// Indented text rendering of a trace, one node per line.
///
/// A computed node that was already expanded higher up is printed once more without its
/// inputs and marked `(see above)`.
pub fn render_trace(result: &ComputeResult, node: &str) -> Result<String, TraceError> {
    let trace = build_trace(result, node)?;
    let mut out = String::new();
    let mut expanded = BTreeSet::new();
    render(&trace, 0, &mut expanded, &mut out);
    Ok(out)
}

fn render<'a>(
    trace: &'a ComputeTrace,
    depth: usize,
    expanded: &mut BTreeSet<&'a NodeId>,
    out: &mut String,
) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!(
        "{indent}{} [{}] = {}",
        trace.label,
        trace.node_id,
        trace.output.value()
    ));
    if let Source::Leaf { kind, reference } = trace.output.source() {
        let kind = match kind {
            LeafKind::Document => "document",
            LeafKind::UserEntry => "entered",
        };
        out.push_str(&format!("  <- {kind}: {reference}"));
    }
    if !trace.inputs.is_empty() && !expanded.insert(&trace.node_id) {
        out.push_str("  (see above)\n");
        return;
    }
    out.push('\n');
    if let Some(citation) = &trace.citation {
        out.push_str(&format!("{indent}    ({citation})\n"));
    }
    for input in &trace.inputs {
        render(input, depth + 1, expanded, out);
    }
}

const LABELS: &[(&str, &str)] = &[
    ("scheduleD.line1b", "Schedule D line 1b: short-term, box A"),
    ("scheduleD.line2", "Schedule D line 2: short-term, box B"),
    ("scheduleD.line6", "Schedule D line 6: short-term loss carryover"),
    ("scheduleD.line7", "Schedule D line 7: net short-term gain or loss"),
    ("scheduleD.line8b", "Schedule D line 8b: long-term, box D"),
    ("scheduleD.line9", "Schedule D line 9: long-term, box E"),
    ("scheduleD.line13", "Schedule D line 13: capital gain distributions"),
    ("scheduleD.line14", "Schedule D line 14: long-term loss carryover"),
    ("scheduleD.line15", "Schedule D line 15: net long-term gain or loss"),
    ("scheduleD.line16", "Schedule D line 16: net capital gain or loss"),
    ("scheduleD.line21", "Schedule D line 21: allowed capital loss"),
    ("scheduleD.carryforward", "Capital loss carryforward"),
    ("scheduleB.line2", "Schedule B line 2: interest"),
    ("scheduleB.line4", "Schedule B line 4: taxable interest"),
    ("scheduleB.line6", "Schedule B line 6: ordinary dividends"),
    ("schedule1.line3", "Schedule 1 line 3: business income or loss"),
    ("schedule1.line10", "Schedule 1 line 10: additional income"),
    ("schedule1.line26", "Schedule 1 line 26: adjustments to income"),
    ("form1040.line1z", "Form 1040 line 1z: wages"),
    ("form1040.line2a", "Form 1040 line 2a: tax-exempt interest"),
    ("form1040.line2b", "Form 1040 line 2b: taxable interest"),
    ("form1040.line3a", "Form 1040 line 3a: qualified dividends"),
    ("form1040.line3b", "Form 1040 line 3b: ordinary dividends"),
    ("form1040.line4a", "Form 1040 line 4a: IRA distributions"),
    ("form1040.line4b", "Form 1040 line 4b: taxable IRA distributions"),
    ("form1040.line5a", "Form 1040 line 5a: pensions and annuities"),
    ("form1040.line5b", "Form 1040 line 5b: taxable pensions and annuities"),
    ("form1040.line7", "Form 1040 line 7: capital gain or loss"),
    ("form1040.line8", "Form 1040 line 8: additional income"),
    ("form1040.line9", "Form 1040 line 9: total income"),
    ("form1040.line10", "Form 1040 line 10: adjustments to income"),
    ("form1040.line11", "Form 1040 line 11: adjusted gross income"),
    ("form1040.line12", "Form 1040 line 12: standard or itemized deduction"),
    ("form1040.line13", "Form 1040 line 13: qualified business income deduction"),
    ("form1040.line14", "Form 1040 line 14: total deductions"),
    ("form1040.line15", "Form 1040 line 15: taxable income"),
    ("form1040.qdcg.preferentialIncome", "Qualified dividends and net capital gain"),
    ("form1040.line16", "Form 1040 line 16: tax"),
    ("form1040.line18", "Form 1040 line 18: tax before credits"),
    ("form1040.line19", "Form 1040 line 19: child tax credit"),
    ("form1040.line22", "Form 1040 line 22: tax after credits"),
    ("form1040.line24", "Form 1040 line 24: total tax"),
    ("form1040.line25a", "Form 1040 line 25a: W-2 withholding"),
    ("form1040.line25b", "Form 1040 line 25b: 1099 withholding"),
    ("form1040.line25d", "Form 1040 line 25d: total withholding"),
    ("form1040.line26", "Form 1040 line 26: estimated payments"),
    ("form1040.line33", "Form 1040 line 33: total payments"),
    ("form1040.line34", "Form 1040 line 34: overpaid"),
    ("form1040.line37", "Form 1040 line 37: amount you owe"),
    ("qbi.taxableIncome", "QBI: taxable income before the deduction"),
    ("qbi.threshold", "QBI: threshold"),
    ("qbi.upperThreshold", "QBI: end of phase-in range"),
    ("qbi.phaseInFactor", "QBI: phase-in percentage"),
    ("qbi.combined", "QBI: combined qualified business income amount"),
    ("qbi.incomeLimit", "QBI: 20% of taxable income"),
    ("qbi.deduction", "QBI deduction"),
    ("dependents.qualifyingChildren", "Qualifying children"),
    ("dependents.other", "Other dependents"),
    ("credits.ctc.initial", "Child tax credit before phase-out"),
    ("credits.ctc.threshold", "Child tax credit phase-out threshold"),
    ("credits.ctc.phaseOut", "Child tax credit phase-out"),
    ("credits.ctc.allowed", "Child tax credit after phase-out"),
    ("credits.total", "Nonrefundable credits"),
    ("elections.capitalLossCarryover.shortTerm", "Short-term loss carryover entered"),
    ("elections.capitalLossCarryover.longTerm", "Long-term loss carryover entered"),
    ("elections.adjustmentsToIncome", "Adjustments to income entered"),
    ("elections.itemizedDeduction", "Itemized deductions entered"),
    ("elections.estimatedPayments", "Estimated payments entered"),
];

const STATE_LABELS: &[(&str, &str)] = &[
    ("apportionmentRatio", "apportionment ratio"),
    ("sourceIncome", "state-source income"),
    ("refund", "refund"),
    ("amountOwed", "amount owed"),
    ("scheduleNR.baseIncome", "Schedule NR base income"),
    ("scheduleNR.exemption", "Schedule NR exemption allowance"),
    ("exemptionCount", "exemptions claimed"),
];

/// Human-readable name for a node id
pub fn label(id: &str) -> String {
    if let Some((_, label)) = LABELS.iter().find(|(node, _)| *node == id) {
        return label.to_string();
    }
    let parts: Vec<&str> = id.split('.').collect();
    match parts.as_slice() {
        ["w2", doc, field] => format!("W-2 {doc} {}", field.replace("box", "box ")),
        ["1099int", doc, field] => format!("1099-INT {doc} {}", field.replace("box", "box ")),
        ["1099div", doc, field] => format!("1099-DIV {doc} {}", field.replace("box", "box ")),
        ["1099r", doc, field] => format!("1099-R {doc} {}", field.replace("box", "box ")),
        ["1099b", lot, field] => format!("1099-B lot {lot} {}", words(field)),
        ["business", id, field] => format!("Business {id} {}", words(field)),
        ["washSale", lot, "disallowed"] => format!("Wash sale loss disallowed on {lot}"),
        ["form8949", "tx", lot, field] => format!("Form 8949 lot {lot} {}", words(field)),
        ["form8949", category, field] => format!("Form 8949 box {category} {}", words(field)),
        ["qbi", activity, field] => format!("QBI {activity} {}", words(field)),
        [state, "w2", doc, field] => format!("{state} W-2 {doc} {}", words(field)),
        [state, rest @ ..] if is_state_code(state) => {
            let suffix = rest.join(".");
            match STATE_LABELS.iter().find(|(s, _)| *s == suffix) {
                Some((_, label)) => format!("{state} {label}"),
                None => format!("{state} {}", words(&suffix).replace("line", "line ")),
            }
        }
        _ => id.to_string(),
    }
}

fn is_state_code(s: &str) -> bool {
    s.len() == 2 && s.chars().all(|c| c.is_ascii_uppercase())
}

/// `costBasis` -> `cost basis`
fn words(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for c in camel.chars() {
        if c.is_ascii_uppercase() {
            out.push(' ');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
