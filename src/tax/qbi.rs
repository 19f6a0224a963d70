//! Qualified business income deduction (IRC 199A).
//!
//! Below the threshold every activity gets 20% of its net profit. From the threshold up,
//! the W-2 wage and UBIA limitation phases in linearly across the phase-in range, and a
//! specified service activity's income and wages phase out over the same range.

use super::year::TaxYear;
use crate::core::{BusinessActivity, ComputeError, Ledger, TaxReturn};
use crate::money::Ratio;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub fn run(ledger: &mut Ledger, tax_return: &TaxReturn, year: TaxYear) -> Result<(), ComputeError> {
    ledger.begin_module("qbi");
    let status = tax_return.filing_status;
    let rate = year.qbi_rate();

    let taxable = ledger.derive("qbi.taxableIncome", |i| {
        let agi = i.cents("form1040.line11")?;
        let deduction = i.cents("form1040.line12")?;
        Ok(i.floor_zero(agi - deduction, "taxable income before the QBI deduction"))
    })?;
    let threshold = ledger.constant(
        "qbi.threshold",
        year.qbi_threshold(status),
        format!("IRC 199A(e)(2) threshold, {status}, {year}"),
    )?;
    ledger.constant(
        "qbi.upperThreshold",
        threshold + year.qbi_phase_in_range(status),
        format!("threshold plus IRC 199A(b)(3)(B) phase-in range, {status}"),
    )?;

    let activities = &tax_return.business_activities;
    let parts = if taxable < threshold {
        log::debug!("QBI: taxable income {} below threshold {}", taxable, threshold);
        activities
            .iter()
            .map(|b| simplified(ledger, b, rate))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        let factor = ledger.derive_ratio("qbi.phaseInFactor", |i| {
            let taxable = i.cents("qbi.taxableIncome")?;
            let lower = i.cents("qbi.threshold")?;
            let upper = i.cents("qbi.upperThreshold")?;
            i.cite("(taxable income - threshold) / phase-in range, limited to 1");
            Ok(Ratio::unit_interval((taxable - lower).0, (upper - lower).0))
        })?;
        log::debug!("QBI: phase-in factor {}", factor);
        activities
            .iter()
            .map(|b| limited(ledger, b, rate))
            .collect::<Result<Vec<_>, _>>()?
    };

    ledger.derive("qbi.combined", |i| {
        let taxable = i.cents("qbi.taxableIncome")?;
        let threshold = i.cents("qbi.threshold")?;
        if taxable < threshold {
            i.cite("taxable income below threshold: 20% of each activity, no wage limitation");
        } else {
            i.cite("taxable income at or above threshold: W-2 wage and UBIA limitation applies");
        }
        let total = i.sum(&parts)?;
        Ok(i.floor_zero(total, "IRC 199A(c)(2): net qualified business loss carries forward"))
    })?;
    ledger.derive("qbi.incomeLimit", |i| {
        i.cite("IRC 199A(a)(1)(B): 20% of taxable income");
        Ok(i.cents("qbi.taxableIncome")?.percent(rate))
    })?;
    let deduction = ledger.derive("qbi.deduction", |i| {
        let combined = i.cents("qbi.combined")?;
        let limit = i.cents("qbi.incomeLimit")?;
        Ok(combined.min(limit))
    })?;
    log::debug!("QBI deduction {}", deduction);
    Ok(())
}

fn simplified(
    ledger: &mut Ledger,
    business: &BusinessActivity,
    rate: Decimal,
) -> Result<String, ComputeError> {
    let id = &business.id;
    let node = format!("qbi.{id}.tentative");
    ledger.derive(node.as_str(), |i| {
        i.cite("IRC 199A(b)(2)(A): 20% of qualified business income");
        Ok(i.cents(&format!("business.{id}.netProfit"))?.percent(rate))
    })?;
    Ok(node)
}

fn limited(
    ledger: &mut Ledger,
    business: &BusinessActivity,
    rate: Decimal,
) -> Result<String, ComputeError> {
    let id = &business.id;
    let profit = format!("business.{id}.netProfit");
    let deductible = format!("qbi.{id}.deductible");

    if business.net_profit.is_negative() {
        ledger.derive(deductible.as_str(), |i| {
            i.cite("qualified business loss: no wage limitation");
            Ok(i.cents(&profit)?.percent(rate))
        })?;
        return Ok(deductible);
    }

    let (income, wages) = if business.specified_service {
        let applicable = format!("qbi.{id}.applicablePercentage");
        ledger.derive_ratio(applicable.as_str(), |i| {
            i.cite("IRC 199A(d)(3)(B): 100% less the phase-in percentage");
            Ok(i.ratio("qbi.phaseInFactor")?.complement())
        })?;
        let income = format!("qbi.{id}.qualifiedIncome");
        ledger.derive(income.as_str(), |i| {
            let pct = i.ratio(&applicable)?;
            Ok(pct.apply(i.cents(&profit)?))
        })?;
        let wages = format!("qbi.{id}.wages");
        ledger.derive(wages.as_str(), |i| {
            let pct = i.ratio(&applicable)?;
            Ok(pct.apply(i.cents(&format!("business.{id}.w2Wages"))?))
        })?;
        (income, wages)
    } else {
        (profit, format!("business.{id}.w2Wages"))
    };

    let wage_limit = format!("qbi.{id}.wageLimit");
    ledger.derive(wage_limit.as_str(), |i| {
        let wages = i.cents(&wages)?;
        let ubia = i.cents(&format!("business.{id}.ubia"))?;
        i.cite("IRC 199A(b)(2)(B): greater of 50% of wages or 25% of wages plus 2.5% of UBIA");
        Ok(wages
            .percent(dec!(0.50))
            .max(wages.percent(dec!(0.25)) + ubia.percent(dec!(0.025))))
    })?;
    let tentative = format!("qbi.{id}.tentative");
    ledger.derive(tentative.as_str(), |i| Ok(i.cents(&income)?.percent(rate)))?;
    let excess = format!("qbi.{id}.excess");
    ledger.derive(excess.as_str(), |i| {
        let tentative = i.cents(&tentative)?;
        let limit = i.cents(&wage_limit)?;
        Ok(i.floor_zero(tentative - limit, "wage limitation not binding"))
    })?;
    let reduction = format!("qbi.{id}.reduction");
    ledger.derive(reduction.as_str(), |i| {
        let factor = i.ratio("qbi.phaseInFactor")?;
        i.cite("IRC 199A(b)(3)(B): excess times the phase-in percentage");
        Ok(factor.apply(i.cents(&excess)?))
    })?;
    ledger.derive(deductible.as_str(), |i| {
        Ok(i.cents(&tentative)? - i.cents(&reduction)?)
    })?;
    Ok(deductible)
}
