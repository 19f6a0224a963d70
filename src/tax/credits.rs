use super::year::TaxYear;
use crate::core::{ComputeError, Ledger, TaxReturn};
use crate::money::Cents;

/// Child tax credit and credit for other dependents, limited to tax.
pub fn run(ledger: &mut Ledger, tax_return: &TaxReturn, year: TaxYear) -> Result<(), ComputeError> {
    ledger.begin_module("credits");
    let status = tax_return.filing_status;

    let children = tax_return
        .dependents
        .iter()
        .filter(|d| d.qualifying_child)
        .count() as i64;
    let others = tax_return.dependents.len() as i64 - children;
    ledger.user_count(
        "dependents.qualifyingChildren",
        children,
        "dependents marked as qualifying children",
    )?;
    ledger.user_count(
        "dependents.other",
        others,
        "dependents not marked as qualifying children",
    )?;
    let per_child = year.child_tax_credit();
    let per_other = year.other_dependent_credit();
    ledger.derive("credits.ctc.initial", |i| {
        let children = i.count("dependents.qualifyingChildren")?;
        let others = i.count("dependents.other")?;
        i.cite(format!(
            "{children} qualifying children x {per_child} + {others} other dependents x {per_other}"
        ));
        Ok(Cents(per_child.0 * children + per_other.0 * others))
    })?;
    ledger.constant(
        "credits.ctc.threshold",
        year.child_credit_phase_out(status),
        format!("IRC 24(b)(2) threshold, {status}"),
    )?;
    ledger.derive("credits.ctc.phaseOut", |i| {
        let agi = i.cents("form1040.line11")?;
        let threshold = i.cents("credits.ctc.threshold")?;
        i.cite("$50 for each $1,000 (or fraction) of modified AGI over the threshold");
        Ok(phase_out(agi, threshold))
    })?;
    ledger.derive("credits.ctc.allowed", |i| {
        let initial = i.cents("credits.ctc.initial")?;
        let phase_out = i.cents("credits.ctc.phaseOut")?;
        Ok(i.floor_zero(initial - phase_out, "credit fully phased out"))
    })?;
    let total = ledger.derive("credits.total", |i| {
        let allowed = i.cents("credits.ctc.allowed")?;
        let tax = i.cents("form1040.line18")?;
        if allowed > tax {
            i.cite("Credit Limit Worksheet A: limited to tax on line 18");
            Ok(tax)
        } else {
            Ok(allowed)
        }
    })?;
    log::debug!("Credits: {}", total);
    Ok(())
}

fn phase_out(agi: Cents, threshold: Cents) -> Cents {
    let excess = agi - threshold;
    if !excess.is_positive() {
        return Cents::ZERO;
    }
    let step = Cents::dollars(1_000).0;
    let steps = (excess.0 + step - 1) / step;
    Cents(steps * Cents::dollars(50).0)
}
