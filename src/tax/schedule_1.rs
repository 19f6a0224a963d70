use crate::core::{ComputeError, Ledger, TaxReturn};

/// Schedule 1: business income and adjustments to income.
pub fn run(ledger: &mut Ledger, tax_return: &TaxReturn) -> Result<(), ComputeError> {
    ledger.begin_module("schedule1");

    for business in &tax_return.business_activities {
        let id = &business.id;
        let name = &business.name;
        ledger.document(
            format!("business.{id}.netProfit"),
            business.net_profit,
            format!("Schedule C {id} ({name}) line 31"),
        )?;
        ledger.document(
            format!("business.{id}.w2Wages"),
            business.w2_wages,
            format!("{name} W-2 wages paid"),
        )?;
        ledger.document(
            format!("business.{id}.ubia"),
            business.ubia,
            format!("{name} UBIA of qualified property"),
        )?;
    }
    ledger.user_entry(
        "elections.adjustmentsToIncome",
        tax_return.elections.adjustments_to_income,
        "adjustments to income entered by the taxpayer",
    )?;

    let profits: Vec<String> = tax_return
        .business_activities
        .iter()
        .map(|b| format!("business.{}.netProfit", b.id))
        .collect();
    ledger.derive("schedule1.line3", |i| i.sum(&profits))?;
    ledger.derive("schedule1.line10", |i| {
        i.cite("lines 1-9; only business income is modelled");
        i.cents("schedule1.line3")
    })?;
    ledger.derive("schedule1.line26", |i| i.cents("elections.adjustmentsToIncome"))?;
    Ok(())
}
