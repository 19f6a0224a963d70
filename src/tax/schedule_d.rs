use super::year::TaxYear;
use crate::core::{ComputeError, Ledger, TaxReturn};

/// Schedule D: net short- and long-term gain, loss limitation and carryforward.
pub fn run(ledger: &mut Ledger, tax_return: &TaxReturn, year: TaxYear) -> Result<(), ComputeError> {
    ledger.begin_module("scheduleD");
    let carryover = tax_return.elections.capital_loss_carryover;
    ledger.user_entry(
        "elections.capitalLossCarryover.shortTerm",
        carryover.short_term.abs(),
        "prior-year short-term capital loss carryover worksheet line 8",
    )?;
    ledger.user_entry(
        "elections.capitalLossCarryover.longTerm",
        carryover.long_term.abs(),
        "prior-year long-term capital loss carryover worksheet line 13",
    )?;
    for div in &tax_return.dividends {
        ledger.document(
            format!("1099div.{}.box2a", div.id),
            div.capital_gain_distributions,
            format!("1099-DIV {} ({}) box 2a", div.id, div.payer),
        )?;
    }

    ledger.derive("scheduleD.line1b", |i| i.cents("form8949.A.gainLoss"))?;
    ledger.derive("scheduleD.line2", |i| i.cents("form8949.B.gainLoss"))?;
    ledger.derive("scheduleD.line6", |i| {
        i.cite("carryover entered as a loss");
        Ok(-i.cents("elections.capitalLossCarryover.shortTerm")?)
    })?;
    ledger.derive("scheduleD.line7", |i| {
        i.sum(["scheduleD.line1b", "scheduleD.line2", "scheduleD.line6"])
    })?;

    ledger.derive("scheduleD.line8b", |i| i.cents("form8949.D.gainLoss"))?;
    ledger.derive("scheduleD.line9", |i| i.cents("form8949.E.gainLoss"))?;
    let distributions: Vec<String> = tax_return
        .dividends
        .iter()
        .map(|div| format!("1099div.{}.box2a", div.id))
        .collect();
    ledger.derive("scheduleD.line13", |i| i.sum(&distributions))?;
    ledger.derive("scheduleD.line14", |i| {
        i.cite("carryover entered as a loss");
        Ok(-i.cents("elections.capitalLossCarryover.longTerm")?)
    })?;
    ledger.derive("scheduleD.line15", |i| {
        i.sum([
            "scheduleD.line8b",
            "scheduleD.line9",
            "scheduleD.line13",
            "scheduleD.line14",
        ])
    })?;

    let net = ledger.derive("scheduleD.line16", |i| {
        i.sum(["scheduleD.line7", "scheduleD.line15"])
    })?;

    let limit = year.capital_loss_limit(tax_return.filing_status);
    let allowed = ledger.derive("scheduleD.line21", |i| {
        let net = i.cents("scheduleD.line16")?;
        if !net.is_negative() {
            return Ok(net);
        }
        if net < -limit {
            i.cite(format!(
                "IRC 1211(b): loss limited to {limit} ({})",
                tax_return.filing_status
            ));
            Ok(-limit)
        } else {
            Ok(net)
        }
    })?;
    let carryforward = ledger.derive("scheduleD.carryforward", |i| {
        let net = i.cents("scheduleD.line16")?;
        let allowed = i.cents("scheduleD.line21")?;
        i.cite("IRC 1212(b): loss in excess of the line 21 limit");
        Ok(allowed - net)
    })?;
    log::debug!(
        "Schedule D: net {} allowed {} carryforward {}",
        net,
        allowed,
        carryforward
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CapitalLossCarryover, FilingStatus, NodeId, TaxReturn};
    use crate::money::Cents;
    use crate::tax::{form8949, wash_sale};
    use serde_json::json;

    fn tax_return(status: &str, lots: serde_json::Value) -> TaxReturn {
        serde_json::from_value(json!({
            "tax_year": 2025,
            "filing_status": status,
            "taxpayer": { "name": "Pat" },
            "capital_transactions": lots
        }))
        .unwrap()
    }

    fn long_term_sale(proceeds: i64, basis: i64) -> serde_json::Value {
        json!([{
            "id": "t1", "description": "ACME", "acquired": "2020-01-02", "disposed": "2025-03-01",
            "proceeds": proceeds, "reported_basis": basis, "category": "long_term_basis_reported"
        }])
    }

    fn schedule(tr: &TaxReturn) -> Ledger {
        let year = TaxYear::new(tr.tax_year).unwrap();
        let mut ledger = Ledger::new();
        wash_sale::record_transactions(&mut ledger, tr).unwrap();
        let outcome = wash_sale::run(&mut ledger, tr).unwrap();
        form8949::run(&mut ledger, &outcome).unwrap();
        run(&mut ledger, tr, year).unwrap();
        ledger
    }

    fn cents(ledger: &Ledger, id: &str) -> Cents {
        ledger.get(id).unwrap().cents().unwrap()
    }

    fn limited(net_loss: i64) -> (Cents, Cents) {
        let tr = tax_return("single", long_term_sale(0, net_loss));
        let ledger = schedule(&tr);
        (
            cents(&ledger, "scheduleD.line21"),
            cents(&ledger, "scheduleD.carryforward"),
        )
    }

    #[test]
    fn long_term_gain() {
        let ledger = schedule(&tax_return("single", long_term_sale(700_000, 500_000)));
        assert_eq!(cents(&ledger, "scheduleD.line15"), Cents::dollars(2_000));
        assert_eq!(cents(&ledger, "scheduleD.line16"), Cents::dollars(2_000));
        assert_eq!(cents(&ledger, "scheduleD.line21"), Cents::dollars(2_000));
        assert_eq!(cents(&ledger, "scheduleD.carryforward"), Cents::ZERO);
        assert_eq!(cents(&ledger, "scheduleD.line7"), Cents::ZERO);
    }

    #[test]
    fn loss_at_limit_has_no_carryforward() {
        assert_eq!(limited(300_000), (Cents::dollars(-3_000), Cents::ZERO));
    }

    #[test]
    fn loss_one_cent_over_limit_carries_one_cent() {
        assert_eq!(limited(300_001), (Cents::dollars(-3_000), Cents(1)));
    }

    #[test]
    fn large_loss_carries_the_excess() {
        assert_eq!(
            limited(500_000),
            (Cents::dollars(-3_000), Cents::dollars(2_000))
        );
        let citation = {
            let tr = tax_return("single", long_term_sale(0, 500_000));
            let ledger = schedule(&tr);
            ledger.get("scheduleD.line21").unwrap().citation().map(str::to_string)
        };
        assert!(citation.unwrap().contains("1211(b)"));
    }

    #[test]
    fn married_separate_limit_is_lower() {
        let ledger = schedule(&tax_return("married_separate", long_term_sale(0, 500_000)));
        assert_eq!(cents(&ledger, "scheduleD.line21"), Cents::dollars(-1_500));
        assert_eq!(cents(&ledger, "scheduleD.carryforward"), Cents::dollars(3_500));
    }

    #[test]
    fn short_term_line_is_sum_of_boxes_and_carryover() {
        let mut tr = tax_return(
            "single",
            json!([
                { "id": "a", "description": "A", "acquired": "2025-01-02", "disposed": "2025-02-01",
                  "proceeds": 50000, "reported_basis": 20000, "category": "short_term_basis_reported" },
                { "id": "b", "description": "B", "acquired": "2025-01-02", "disposed": "2025-02-01",
                  "proceeds": 10000, "reported_basis": 30000, "category": "short_term_basis_not_reported" },
                { "id": "d", "description": "D", "acquired": "2020-01-02", "disposed": "2025-02-01",
                  "proceeds": 90000, "reported_basis": 10000, "category": "long_term_basis_reported" }
            ]),
        );
        tr.elections.capital_loss_carryover = CapitalLossCarryover {
            short_term: Cents::dollars(50),
            long_term: Cents::dollars(25),
        };
        assert_eq!(tr.filing_status, FilingStatus::Single);
        let ledger = schedule(&tr);

        let line7 = cents(&ledger, "scheduleD.line7");
        let boxes = cents(&ledger, "form8949.A.gainLoss") + cents(&ledger, "form8949.B.gainLoss");
        assert_eq!(line7, boxes + cents(&ledger, "scheduleD.line6"));
        assert_eq!(line7, Cents::dollars(50));
        assert_eq!(cents(&ledger, "scheduleD.line15"), Cents::dollars(775));
        assert_eq!(
            cents(&ledger, "scheduleD.line16"),
            line7 + cents(&ledger, "scheduleD.line15")
        );
        assert_eq!(
            ledger.get("scheduleD.line7").unwrap().inputs(),
            &[
                NodeId::from("scheduleD.line1b"),
                NodeId::from("scheduleD.line2"),
                NodeId::from("scheduleD.line6")
            ]
        );
    }
}
