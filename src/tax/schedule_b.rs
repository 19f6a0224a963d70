use crate::core::{ComputeError, Ledger, TaxReturn};

/// Schedule B: interest and ordinary dividends. Also records the remaining
/// 1099-INT and 1099-DIV boxes that Form 1040 reads.
pub fn run(ledger: &mut Ledger, tax_return: &TaxReturn) -> Result<(), ComputeError> {
    ledger.begin_module("scheduleB");

    for int in &tax_return.interest {
        let id = &int.id;
        let payer = &int.payer;
        ledger.document(
            format!("1099int.{id}.box1"),
            int.interest,
            format!("1099-INT {id} ({payer}) box 1"),
        )?;
        ledger.document(
            format!("1099int.{id}.box4"),
            int.federal_withholding,
            format!("1099-INT {id} ({payer}) box 4"),
        )?;
        ledger.document(
            format!("1099int.{id}.box8"),
            int.tax_exempt_interest,
            format!("1099-INT {id} ({payer}) box 8"),
        )?;
    }
    for div in &tax_return.dividends {
        let id = &div.id;
        let payer = &div.payer;
        ledger.document(
            format!("1099div.{id}.box1a"),
            div.ordinary_dividends,
            format!("1099-DIV {id} ({payer}) box 1a"),
        )?;
        ledger.document(
            format!("1099div.{id}.box1b"),
            div.qualified_dividends,
            format!("1099-DIV {id} ({payer}) box 1b"),
        )?;
        ledger.document(
            format!("1099div.{id}.box4"),
            div.federal_withholding,
            format!("1099-DIV {id} ({payer}) box 4"),
        )?;
    }

    let interest: Vec<String> = tax_return
        .interest
        .iter()
        .map(|int| format!("1099int.{}.box1", int.id))
        .collect();
    ledger.derive("scheduleB.line2", |i| i.sum(&interest))?;
    ledger.derive("scheduleB.line4", |i| {
        i.cite("no excludable savings bond interest (line 3)");
        i.cents("scheduleB.line2")
    })?;

    let dividends: Vec<String> = tax_return
        .dividends
        .iter()
        .map(|div| format!("1099div.{}.box1a", div.id))
        .collect();
    ledger.derive("scheduleB.line6", |i| i.sum(&dividends))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Cents;
    use serde_json::json;

    #[test]
    fn totals_interest_and_dividends() {
        let tr: TaxReturn = serde_json::from_value(json!({
            "tax_year": 2025,
            "filing_status": "single",
            "taxpayer": { "name": "Pat" },
            "interest": [
                { "id": "bank", "payer": "First Bank", "interest": 12345 },
                { "id": "cd", "payer": "Credit Union", "interest": 655, "tax_exempt_interest": 100 }
            ],
            "dividends": [
                { "id": "fund", "payer": "Index Fund", "ordinary_dividends": 50000, "qualified_dividends": 40000 }
            ]
        }))
        .unwrap();
        let mut ledger = Ledger::new();
        run(&mut ledger, &tr).unwrap();

        let line4 = ledger.get("scheduleB.line4").unwrap();
        assert_eq!(line4.cents(), Some(Cents(13_000)));
        assert_eq!(line4.inputs().len(), 1);
        assert_eq!(
            ledger.get("scheduleB.line6").unwrap().cents(),
            Some(Cents::dollars(500))
        );
        assert_eq!(
            ledger.get("scheduleB.line2").unwrap().inputs().len(),
            2
        );
    }

    #[test]
    fn no_statements_gives_zero() {
        let tr: TaxReturn = serde_json::from_value(json!({
            "tax_year": 2024,
            "filing_status": "single",
            "taxpayer": { "name": "Pat" }
        }))
        .unwrap();
        let mut ledger = Ledger::new();
        run(&mut ledger, &tr).unwrap();
        assert_eq!(ledger.get("scheduleB.line6").unwrap().cents(), Some(Cents::ZERO));
    }
}
