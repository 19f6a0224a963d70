use super::{StateContext, StateModule};
use crate::core::{Category8949, ComputeError};
use crate::money::Cents;
use rust_decimal_macros::dec;

/// Pennsylvania PA-40.
///
/// Income is taxed by class. A loss in one class cannot offset income in another, so
/// each class is floored at zero before the classes are added.
pub struct Pennsylvania;

impl StateModule for Pennsylvania {
    fn code(&self) -> &'static str {
        "PA"
    }

    fn name(&self) -> &'static str {
        "Pennsylvania"
    }

    fn compute(&self, ctx: &mut StateContext<'_>) -> Result<(), ComputeError> {
        let tax_return = ctx.tax_return;
        let mut compensation = Vec::new();
        let mut withholding = Vec::new();
        for w2 in &tax_return.wages {
            let id = &w2.id;
            let wages = format!("PA.w2.{id}.wages");
            match w2.state_line(self.code()) {
                Some(line) => {
                    ctx.ledger.document(
                        wages.as_str(),
                        line.wages,
                        format!("W-2 {id} ({}) box 16, PA", w2.employer),
                    )?;
                    let withheld = ctx.ledger.document(
                        format!("PA.w2.{id}.withholding"),
                        line.withholding,
                        format!("W-2 {id} ({}) box 17, PA", w2.employer),
                    )?;
                    withholding.push(withheld);
                }
                None => {
                    ctx.ledger.derive(wages.as_str(), |i| {
                        i.cite("no PA wages reported; federal box 1 used");
                        i.cents(&format!("w2.{id}.box1"))
                    })?;
                }
            }
            compensation.push(wages);
        }

        ctx.ledger.derive("PA.line1a", |i| i.sum(&compensation))?;
        ctx.ledger.derive("PA.line2", |i| {
            i.cite("taxable interest");
            i.cents("form1040.line2b")
        })?;
        ctx.ledger.derive("PA.line3", |i| {
            i.cite("dividends and capital gain distributions");
            i.sum(["form1040.line3b", "scheduleD.line13"])
        })?;
        ctx.ledger.derive("PA.line4", |i| {
            let business = i.cents("schedule1.line3")?;
            Ok(i.floor_zero(business, "net business loss does not offset other classes"))
        })?;
        let gains: Vec<String> = Category8949::ALL
            .iter()
            .map(|c| format!("form8949.{}.gainLoss", c.code()))
            .collect();
        ctx.ledger.derive("PA.line5", |i| {
            let net = i.sum(&gains)?;
            Ok(i.floor_zero(net, "net loss from the sale of property does not offset other classes"))
        })?;
        ctx.ledger.derive("PA.line9", |i| {
            i.sum(["PA.line1a", "PA.line2", "PA.line3", "PA.line4", "PA.line5"])
        })?;

        let ratio = ctx.apportionment_ratio()?;
        ctx.ledger.derive("PA.line11", |i| {
            let r = i.ratio("PA.apportionmentRatio")?;
            Ok(r.apply(i.cents("PA.line9")?))
        })?;
        let tax = ctx.ledger.derive("PA.line12", |i| {
            i.cite("3.07% flat rate (72 P.S. 7302)");
            Ok(i.cents("PA.line11")?.percent(dec!(0.0307)))
        })?;

        ctx.ledger.derive("PA.line13", |i| i.sum(&withholding))?;
        ctx.ledger.derive("PA.refund", |i| {
            let paid = i.cents("PA.line13")?;
            let tax = i.cents("PA.line12")?;
            Ok((paid - tax).max(Cents::ZERO))
        })?;
        ctx.ledger.derive("PA.amountOwed", |i| {
            let tax = i.cents("PA.line12")?;
            let paid = i.cents("PA.line13")?;
            Ok((tax - paid).max(Cents::ZERO))
        })?;
        log::debug!("PA: ratio {} tax {}", ratio, tax);
        Ok(())
    }
}
