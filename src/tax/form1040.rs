use super::year::TaxYear;
use crate::core::{
    ComputeError, DeductionMethod, FilingStatus, Ledger, RetirementDistribution, TaxReturn,
};
use crate::money::Cents;
use rust_decimal_macros::dec;

/// Form 1040 lines 1z through 12: income, AGI and the deduction.
pub fn compute_income(
    ledger: &mut Ledger,
    tax_return: &TaxReturn,
    year: TaxYear,
) -> Result<(), ComputeError> {
    ledger.begin_module("form1040");

    for w2 in &tax_return.wages {
        let id = &w2.id;
        ledger.document(
            format!("w2.{id}.box1"),
            w2.wages,
            format!("W-2 {id} ({}) box 1", w2.employer),
        )?;
        ledger.document(
            format!("w2.{id}.box2"),
            w2.federal_withholding,
            format!("W-2 {id} ({}) box 2", w2.employer),
        )?;
    }
    for r in &tax_return.retirement_distributions {
        let id = &r.id;
        ledger.document(
            format!("1099r.{id}.box1"),
            r.gross_distribution,
            format!("1099-R {id} ({}) box 1", r.payer),
        )?;
        ledger.document(
            format!("1099r.{id}.box2a"),
            r.taxable_amount,
            format!("1099-R {id} ({}) box 2a", r.payer),
        )?;
        ledger.document(
            format!("1099r.{id}.box4"),
            r.federal_withholding,
            format!("1099-R {id} ({}) box 4", r.payer),
        )?;
    }

    let wages: Vec<String> = tax_return
        .wages
        .iter()
        .map(|w2| format!("w2.{}.box1", w2.id))
        .collect();
    ledger.derive("form1040.line1z", |i| i.sum(&wages))?;

    let tax_exempt: Vec<String> = tax_return
        .interest
        .iter()
        .map(|int| format!("1099int.{}.box8", int.id))
        .collect();
    ledger.derive("form1040.line2a", |i| i.sum(&tax_exempt))?;
    ledger.derive("form1040.line2b", |i| i.cents("scheduleB.line4"))?;

    let qualified: Vec<String> = tax_return
        .dividends
        .iter()
        .map(|div| format!("1099div.{}.box1b", div.id))
        .collect();
    ledger.derive("form1040.line3a", |i| i.sum(&qualified))?;
    ledger.derive("form1040.line3b", |i| i.cents("scheduleB.line6"))?;

    let (ira, pensions): (Vec<_>, Vec<_>) = tax_return
        .retirement_distributions
        .iter()
        .partition(|r| r.ira);
    let (ira_gross, ira_taxable) = (box_ids(&ira, "box1"), box_ids(&ira, "box2a"));
    let (pension_gross, pension_taxable) =
        (box_ids(&pensions, "box1"), box_ids(&pensions, "box2a"));
    ledger.derive("form1040.line4a", |i| i.sum(&ira_gross))?;
    ledger.derive("form1040.line4b", |i| i.sum(&ira_taxable))?;
    ledger.derive("form1040.line5a", |i| i.sum(&pension_gross))?;
    ledger.derive("form1040.line5b", |i| i.sum(&pension_taxable))?;

    ledger.derive("form1040.line7", |i| i.cents("scheduleD.line21"))?;
    ledger.derive("form1040.line8", |i| i.cents("schedule1.line10"))?;
    let total = ledger.derive("form1040.line9", |i| {
        i.sum([
            "form1040.line1z",
            "form1040.line2b",
            "form1040.line3b",
            "form1040.line4b",
            "form1040.line5b",
            "form1040.line7",
            "form1040.line8",
        ])
    })?;
    ledger.derive("form1040.line10", |i| i.cents("schedule1.line26"))?;
    let agi = ledger.derive("form1040.line11", |i| {
        Ok(i.cents("form1040.line9")? - i.cents("form1040.line10")?)
    })?;

    let status = tax_return.filing_status;
    match tax_return.elections.deduction {
        DeductionMethod::Standard => {
            ledger.constant(
                "form1040.line12",
                year.standard_deduction(status),
                format!("standard deduction, {status}, {year}"),
            )?;
        }
        DeductionMethod::Itemized { amount } => {
            ledger.user_entry(
                "elections.itemizedDeduction",
                amount,
                "Schedule A line 17",
            )?;
            ledger.derive("form1040.line12", |i| {
                i.cite("itemized deductions (Schedule A)");
                i.cents("elections.itemizedDeduction")
            })?;
        }
    }
    log::debug!("Form 1040: total income {} AGI {}", total, agi);
    Ok(())
}

fn box_ids(distributions: &[&RetirementDistribution], field: &str) -> Vec<String> {
    distributions
        .iter()
        .map(|r| format!("1099r.{}.{field}", r.id))
        .collect()
}

/// Form 1040 lines 13 through 18: taxable income and tax.
pub fn compute_tax(
    ledger: &mut Ledger,
    tax_return: &TaxReturn,
    year: TaxYear,
) -> Result<(), ComputeError> {
    ledger.begin_module("form1040Tax");
    let status = tax_return.filing_status;

    ledger.derive("form1040.line13", |i| i.cents("qbi.deduction"))?;
    ledger.derive("form1040.line14", |i| {
        i.sum(["form1040.line12", "form1040.line13"])
    })?;
    ledger.derive("form1040.line15", |i| {
        let agi = i.cents("form1040.line11")?;
        let deductions = i.cents("form1040.line14")?;
        Ok(i.floor_zero(agi - deductions, "taxable income cannot be negative"))
    })?;
    ledger.derive("form1040.qdcg.preferentialIncome", |i| {
        let qualified = i.cents("form1040.line3a")?;
        let long_term = i.cents("scheduleD.line15")?;
        let net = i.cents("scheduleD.line16")?;
        let gain = long_term.min(net).max(Cents::ZERO);
        i.cite("Qualified Dividends and Capital Gain Tax Worksheet lines 2-4");
        Ok(qualified + gain)
    })?;
    let tax = ledger.derive("form1040.line16", |i| {
        let taxable = i.cents("form1040.line15")?;
        let preferential = i.cents("form1040.qdcg.preferentialIncome")?;
        if preferential.is_positive() {
            i.cite(format!(
                "Qualified Dividends and Capital Gain Tax Worksheet, {status}, {year}"
            ));
            Ok(qualified_dividends_tax(year, status, taxable, preferential))
        } else {
            i.cite(format!("tax rate schedule, {status}, {year}"));
            Ok(year.ordinary_tax(status, taxable))
        }
    })?;
    ledger.derive("form1040.line18", |i| {
        i.cite("line 16 plus Schedule 2 line 3 (none)");
        i.cents("form1040.line16")
    })?;
    log::debug!("Form 1040: tax {}", tax);
    Ok(())
}

/// Qualified Dividends and Capital Gain Tax Worksheet (Form 1040 instructions, line 16)
pub fn qualified_dividends_tax(
    year: TaxYear,
    status: FilingStatus,
    taxable: Cents,
    preferential: Cents,
) -> Cents {
    let taxable = taxable.max(Cents::ZERO);
    let preferential = preferential.max(Cents::ZERO);
    let (zero_top, fifteen_top) = year.capital_gain_breakpoints(status);

    let ordinary = (taxable - preferential).max(Cents::ZERO); // line 5
    let zero_band = taxable.min(zero_top); // line 7
    let at_zero = zero_band - ordinary.min(zero_band); // line 9
    let gains = taxable.min(preferential); // line 10
    let remaining = gains - at_zero; // line 12
    let fifteen_band = taxable.min(fifteen_top); // line 14
    let fifteen_room = (fifteen_band - (ordinary + at_zero)).max(Cents::ZERO); // line 16
    let at_fifteen = remaining.min(fifteen_room); // line 17
    let at_twenty = gains - (at_zero + at_fifteen); // line 20

    let tax = at_fifteen.percent(dec!(0.15))
        + at_twenty.percent(dec!(0.20))
        + year.ordinary_tax(status, ordinary);
    tax.min(year.ordinary_tax(status, taxable))
}

/// Form 1040 lines 19 through 37: credits, payments and the balance.
pub fn compute_payments(ledger: &mut Ledger, tax_return: &TaxReturn) -> Result<(), ComputeError> {
    ledger.begin_module("form1040Payments");
    ledger.user_entry(
        "elections.estimatedPayments",
        tax_return.elections.estimated_payments,
        "estimated tax payments and amount applied from prior year",
    )?;

    ledger.derive("form1040.line19", |i| i.cents("credits.total"))?;
    ledger.derive("form1040.line22", |i| {
        let tax = i.cents("form1040.line18")?;
        let credits = i.cents("form1040.line19")?;
        Ok(i.floor_zero(tax - credits, "credits cannot exceed tax"))
    })?;
    ledger.derive("form1040.line24", |i| {
        i.cite("line 22 plus other taxes (none)");
        i.cents("form1040.line22")
    })?;

    let w2: Vec<String> = tax_return
        .wages
        .iter()
        .map(|w| format!("w2.{}.box2", w.id))
        .collect();
    ledger.derive("form1040.line25a", |i| i.sum(&w2))?;
    let forms_1099: Vec<String> = tax_return
        .interest
        .iter()
        .map(|s| format!("1099int.{}.box4", s.id))
        .chain(
            tax_return
                .dividends
                .iter()
                .map(|s| format!("1099div.{}.box4", s.id)),
        )
        .chain(
            tax_return
                .retirement_distributions
                .iter()
                .map(|s| format!("1099r.{}.box4", s.id)),
        )
        .collect();
    ledger.derive("form1040.line25b", |i| i.sum(&forms_1099))?;
    ledger.derive("form1040.line25d", |i| {
        i.sum(["form1040.line25a", "form1040.line25b"])
    })?;
    ledger.derive("form1040.line26", |i| i.cents("elections.estimatedPayments"))?;
    ledger.derive("form1040.line33", |i| {
        i.sum(["form1040.line25d", "form1040.line26"])
    })?;

    let refund = ledger.derive("form1040.line34", |i| {
        let paid = i.cents("form1040.line33")?;
        let tax = i.cents("form1040.line24")?;
        Ok((paid - tax).max(Cents::ZERO))
    })?;
    let owed = ledger.derive("form1040.line37", |i| {
        let tax = i.cents("form1040.line24")?;
        let paid = i.cents("form1040.line33")?;
        Ok((tax - paid).max(Cents::ZERO))
    })?;
    log::info!("Form 1040: overpaid {} owed {}", refund, owed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn y2025() -> TaxYear {
        TaxYear::new(2025).unwrap()
    }

    #[test]
    fn worksheet_without_preferential_income_is_ordinary_tax() {
        let y = y2025();
        let taxable = Cents::dollars(80_000);
        assert_eq!(
            qualified_dividends_tax(y, FilingStatus::Single, taxable, Cents::ZERO),
            y.ordinary_tax(FilingStatus::Single, taxable)
        );
    }

    #[test]
    fn gains_inside_zero_band_are_untaxed() {
        let y = y2025();
        // 30,000 taxable of which 10,000 is a long-term gain: all below 48,350
        let tax = qualified_dividends_tax(
            y,
            FilingStatus::Single,
            Cents::dollars(30_000),
            Cents::dollars(10_000),
        );
        assert_eq!(tax, y.ordinary_tax(FilingStatus::Single, Cents::dollars(20_000)));
    }

    #[test]
    fn gains_straddling_the_zero_band() {
        let y = y2025();
        // ordinary 40,000; gains 20,000 -> 8,350 at 0%, 11,650 at 15%
        let tax = qualified_dividends_tax(
            y,
            FilingStatus::Single,
            Cents::dollars(60_000),
            Cents::dollars(20_000),
        );
        let expected =
            y.ordinary_tax(FilingStatus::Single, Cents::dollars(40_000)) + Cents(174_750);
        assert_eq!(tax, expected);
    }

    #[test]
    fn gains_above_fifteen_band_pay_twenty_percent() {
        let y = y2025();
        // ordinary 600,000 is already past 533,400: the whole 100,000 gain is at 20%
        let tax = qualified_dividends_tax(
            y,
            FilingStatus::Single,
            Cents::dollars(700_000),
            Cents::dollars(100_000),
        );
        let expected =
            y.ordinary_tax(FilingStatus::Single, Cents::dollars(600_000)) + Cents::dollars(20_000);
        assert_eq!(tax, expected);
    }

    #[test]
    fn preferential_income_is_capped_by_taxable_income() {
        let y = y2025();
        let tax = qualified_dividends_tax(
            y,
            FilingStatus::Single,
            Cents::dollars(5_000),
            Cents::dollars(9_000),
        );
        assert_eq!(tax, Cents::ZERO);
    }
}
