use super::{StateContext, StateModule};
use crate::core::{ComputeError, FilingStatus, Residency};
use crate::money::Cents;
use rust_decimal_macros::dec;

/// Illinois Form IL-1040 with Schedule NR
pub struct Illinois;

impl Illinois {
    fn exemption_amount(year: i32) -> Cents {
        match year {
            2024 => Cents::dollars(2_775),
            _ => Cents::dollars(2_850),
        }
    }

    /// Federal AGI above which no exemption allowance is available
    fn exemption_cutoff(status: FilingStatus) -> Cents {
        match status {
            FilingStatus::MarriedJoint => Cents::dollars(500_000),
            _ => Cents::dollars(250_000),
        }
    }
}

impl StateModule for Illinois {
    fn code(&self) -> &'static str {
        "IL"
    }

    fn name(&self) -> &'static str {
        "Illinois"
    }

    fn compute(&self, ctx: &mut StateContext<'_>) -> Result<(), ComputeError> {
        let tax_return = ctx.tax_return;
        let withholding: Vec<String> = tax_return
            .wages
            .iter()
            .filter_map(|w2| w2.state_line(self.code()).map(|line| (w2, line)))
            .map(|(w2, line)| {
                let id = &w2.id;
                ctx.ledger.document(
                    format!("IL.w2.{id}.wages"),
                    line.wages,
                    format!("W-2 {id} ({}) box 16, IL", w2.employer),
                )?;
                ctx.ledger.document(
                    format!("IL.w2.{id}.withholding"),
                    line.withholding,
                    format!("W-2 {id} ({}) box 17, IL", w2.employer),
                )?;
                Ok(format!("IL.w2.{id}.withholding"))
            })
            .collect::<Result<_, ComputeError>>()?;

        ctx.ledger.derive("IL.line1", |i| {
            i.cite("federal adjusted gross income");
            i.cents("form1040.line11")
        })?;
        ctx.ledger.derive("IL.line5", |i| {
            i.cite("retirement income included in federal AGI");
            i.sum(["form1040.line4b", "form1040.line5b"])
        })?;
        ctx.ledger.derive("IL.line9", |i| {
            Ok(i.cents("IL.line1")? - i.cents("IL.line5")?)
        })?;

        ctx.ledger.user_count(
            "IL.exemptionCount",
            tax_return.exemption_count(),
            format!(
                "taxpayer, {} dependents{}",
                tax_return.dependents.len(),
                match tax_return.filing_status {
                    FilingStatus::MarriedJoint => " and spouse",
                    _ => "",
                }
            ),
        )?;
        let per_exemption = Self::exemption_amount(ctx.year.year());
        let cutoff = Self::exemption_cutoff(tax_return.filing_status);
        ctx.ledger.derive("IL.line10", |i| {
            let agi = i.cents("IL.line1")?;
            if agi > cutoff {
                i.cite(format!(
                    "no exemption allowance: federal AGI over {cutoff}"
                ));
                Ok(Cents::ZERO)
            } else {
                let count = i.count("IL.exemptionCount")?;
                i.cite(format!("{count} exemptions x {per_exemption}"));
                Ok(Cents(per_exemption.0 * count))
            }
        })?;

        let ratio = ctx.apportionment_ratio()?;
        let (base, exemption) = match ctx.config.residency {
            Residency::Resident => ("IL.line9", "IL.line10"),
            Residency::PartYear { .. } | Residency::Nonresident { .. } => {
                ctx.ledger.derive("IL.scheduleNR.baseIncome", |i| {
                    let r = i.ratio("IL.apportionmentRatio")?;
                    i.cite("Schedule NR: base income allocated to Illinois");
                    Ok(r.apply(i.cents("IL.line9")?))
                })?;
                ctx.ledger.derive("IL.scheduleNR.exemption", |i| {
                    let r = i.ratio("IL.apportionmentRatio")?;
                    i.cite("Schedule NR: exemption prorated by the Illinois share");
                    Ok(r.apply(i.cents("IL.line10")?))
                })?;
                ("IL.scheduleNR.baseIncome", "IL.scheduleNR.exemption")
            }
        };
        ctx.ledger.derive("IL.line11", |i| {
            let base = i.cents(base)?;
            let exemption = i.cents(exemption)?;
            Ok(i.floor_zero(base - exemption, "net income cannot be negative"))
        })?;
        let tax = ctx.ledger.derive("IL.line12", |i| {
            i.cite("4.95% flat rate (35 ILCS 5/201(b))");
            Ok(i.cents("IL.line11")?.percent(dec!(0.0495)))
        })?;

        ctx.ledger.derive("IL.line25", |i| i.sum(&withholding))?;
        ctx.ledger.derive("IL.refund", |i| {
            let paid = i.cents("IL.line25")?;
            let tax = i.cents("IL.line12")?;
            Ok((paid - tax).max(Cents::ZERO))
        })?;
        ctx.ledger.derive("IL.amountOwed", |i| {
            let tax = i.cents("IL.line12")?;
            let paid = i.cents("IL.line25")?;
            Ok((tax - paid).max(Cents::ZERO))
        })?;
        log::debug!("IL: ratio {} tax {}", ratio, tax);
        Ok(())
    }
}
