//! Library-level runs over the fixtures in tests/data

use std::fs::File;
use std::io::BufReader;
use taxtrace::{build_trace, compute, read_tax_return, Cents, TaxReturn};

fn load(name: &str) -> TaxReturn {
    let file = File::open(format!("tests/data/{name}")).expect("fixture exists");
    read_tax_return(BufReader::new(file)).expect("fixture parses")
}

#[test]
fn long_term_gain_flows_to_schedule_d() {
    let result = compute(&load("single_long_term_gain.json")).unwrap();
    let gain = Cents::dollars(2_000);
    assert_eq!(result.cents("form8949.D.gainLoss"), Some(gain));
    assert_eq!(result.cents("scheduleD.line15"), Some(gain));
    assert_eq!(result.cents("scheduleD.line16"), Some(gain));
    assert_eq!(result.cents("scheduleD.line21"), Some(gain));
    assert_eq!(result.cents("scheduleD.carryforward"), Some(Cents::ZERO));
    assert_eq!(result.cents("form1040.line7"), Some(gain));
    // below the standard deduction
    assert_eq!(result.cents("form1040.line15"), Some(Cents::ZERO));
}

#[test]
fn reruns_are_identical() {
    let tax_return = load("wash_sale_illinois.json");
    let first = compute(&tax_return).unwrap();
    let second = compute(&tax_return).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.digest().unwrap(), second.digest().unwrap());
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn input_is_not_modified() {
    let tax_return = load("wash_sale_illinois.json");
    let before = tax_return.clone();
    compute(&tax_return).unwrap();
    assert_eq!(tax_return, before);
}

#[test]
fn every_input_resolves() {
    let result = compute(&load("wash_sale_illinois.json")).unwrap();
    assert!(result.verify_closure().is_ok());
    for (id, value) in &result.nodes {
        for input in value.inputs() {
            assert!(result.nodes.contains_key(input), "{id} -> {input}");
        }
    }
}

#[test]
fn wash_sale_moves_loss_into_replacement_basis() {
    let result = compute(&load("wash_sale_illinois.json")).unwrap();
    assert_eq!(result.wash_sales.matches.len(), 1);
    let m = &result.wash_sales.matches[0];
    assert_eq!((m.loss_sale_id.as_str(), m.replacement_id.as_str()), ("sell1", "buy2"));

    assert_eq!(result.cents("washSale.sell1.disallowed"), Some(Cents::dollars(1_000)));
    assert_eq!(result.cents("form8949.tx.sell1.gainLoss"), Some(Cents::ZERO));
    assert_eq!(result.cents("form8949.tx.buy2.adjustedBasis"), Some(Cents::dollars(5_500)));
    assert_eq!(result.cents("form8949.tx.buy2.gainLoss"), Some(Cents::dollars(500)));
    assert_eq!(result.cents("form8949.A.gainLoss"), Some(Cents::dollars(500)));
    assert_eq!(result.cents("form8949.A.adjustment"), Some(Cents::dollars(1_000)));
    assert!(result.get("washSale.xyz.disallowed").is_none());
}

#[test]
fn schedule_d_agrees_with_form_8949() {
    let result = compute(&load("wash_sale_illinois.json")).unwrap();
    let cents = |id: &str| result.cents(id).unwrap();
    assert_eq!(
        cents("scheduleD.line7"),
        cents("form8949.A.gainLoss") + cents("form8949.B.gainLoss") + cents("scheduleD.line6")
    );
    assert_eq!(
        cents("scheduleD.line16"),
        cents("scheduleD.line7") + cents("scheduleD.line15")
    );
    assert_eq!(cents("scheduleD.line15"), Cents::dollars(-200));
    assert_eq!(cents("scheduleD.line16"), Cents::dollars(300));
}

#[test]
fn federal_and_state_totals() {
    let result = compute(&load("wash_sale_illinois.json")).unwrap();
    let cents = |id: &str| result.cents(id).unwrap();
    // 80,000 wages + 300 interest + 300 net capital gain
    assert_eq!(cents("form1040.line11"), Cents::dollars(80_600));
    assert_eq!(cents("form1040.line12"), Cents::dollars(15_750));
    assert_eq!(cents("form1040.line15"), Cents::dollars(64_850));
    assert_eq!(cents("form1040.line25a"), Cents::dollars(9_000));
    assert_eq!(
        cents("form1040.line34") - cents("form1040.line37"),
        cents("form1040.line33") - cents("form1040.line24")
    );

    // (80,600 - 2,850) * 4.95% = 3,848.625
    assert_eq!(cents("IL.line11"), Cents::dollars(77_750));
    assert_eq!(cents("IL.line12"), Cents(384_863));
    assert_eq!(cents("IL.amountOwed"), Cents(34_863));
}

#[test]
fn trace_reaches_the_brokerage_lots() {
    let result = compute(&load("wash_sale_illinois.json")).unwrap();
    let trace = build_trace(&result, "scheduleD.line16").unwrap();
    let leaves: Vec<_> = trace.leaves().iter().map(|l| l.node_id.to_string()).collect();
    for lot in ["sell1", "buy2", "xyz"] {
        assert!(leaves.contains(&format!("1099b.{lot}.proceeds")), "{leaves:?}");
        assert!(leaves.contains(&format!("1099b.{lot}.costBasis")), "{leaves:?}");
    }
    assert!(leaves.contains(&"elections.capitalLossCarryover.longTerm".to_string()));
    assert!(!leaves.iter().any(|l| l.starts_with("w2.")));

    let tax = build_trace(&result, "IL.line12").unwrap();
    assert!(tax
        .leaves()
        .iter()
        .any(|l| l.node_id.as_str() == "w2.acme.box1"));
    assert!(tax
        .leaves()
        .iter()
        .any(|l| l.node_id.as_str() == "IL.exemptionCount"));
}

#[test]
fn node_ids_follow_module_order() {
    let result = compute(&load("wash_sale_illinois.json")).unwrap();
    let modules: Vec<_> = result.modules.iter().map(|m| m.module.as_str()).collect();
    assert_eq!(modules.first(), Some(&"capitalTransactions"));
    assert_eq!(modules.last(), Some(&"IL"));
    let il = result.module("IL").unwrap();
    assert!(il.nodes.iter().all(|n| n.as_str().starts_with("IL.")));
}
