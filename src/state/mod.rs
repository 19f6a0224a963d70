//! State income tax modules.
//!
//! Each state implements [`StateModule`] and is registered by postal code. A state module
//! runs after the federal return is complete, reads federal nodes through the ledger and
//! may only write nodes under its own `<CODE>.` prefix.

pub mod illinois;
pub mod pennsylvania;

use crate::core::{ComputeError, Ledger, Residency, StateReturn, TaxReturn};
use crate::money::Ratio;
use crate::tax::TaxYear;

pub trait StateModule: Sync {
    /// Postal code, also the node prefix
    fn code(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn compute(&self, ctx: &mut StateContext<'_>) -> Result<(), ComputeError>;
}

/// What a state module sees while it runs
pub struct StateContext<'a> {
    pub ledger: &'a mut Ledger,
    pub tax_return: &'a TaxReturn,
    pub config: &'a StateReturn,
    pub year: TaxYear,
}

impl StateContext<'_> {
    pub fn code(&self) -> String {
        self.config.normalized_code()
    }

    /// `<CODE>.<suffix>`
    pub fn node(&self, suffix: &str) -> String {
        format!("{}.{suffix}", self.code())
    }

    /// Share of federal AGI taxable by the state, as `<CODE>.apportionmentRatio`.
    ///
    /// Residents apportion everything. Part-year residents and nonresidents divide the
    /// state-source income they entered by federal AGI, limited to [0, 1].
    pub fn apportionment_ratio(&mut self) -> Result<Ratio, ComputeError> {
        let code = self.code();
        let ratio = self.node("apportionmentRatio");
        let source_income = match self.config.residency {
            Residency::Resident => {
                return self.ledger.derive_ratio(ratio, |i| {
                    i.cite("full-year resident: all income allocated to the state");
                    Ok(Ratio::ONE)
                });
            }
            Residency::PartYear { state_source_income }
            | Residency::Nonresident { state_source_income } => state_source_income,
        };
        let source_node = self.node("sourceIncome");
        let source = self.ledger.user_entry(
            source_node,
            source_income,
            format!("{code} income while resident plus {code}-source income as nonresident"),
        )?;
        self.ledger.derive_ratio(ratio, |i| {
            let source = i.cents(source.as_str())?;
            let agi = i.cents("form1040.line11")?;
            if source.is_negative() || source > agi || !agi.is_positive() {
                log::warn!(
                    "{code}: state-source income {} outside 0..={} (federal AGI); ratio clamped",
                    source,
                    agi
                );
                i.cite(format!(
                    "{code} source income / federal AGI, clamped to [0, 1]"
                ));
            } else {
                i.cite(format!("{code} source income / federal AGI"));
            }
            Ok(Ratio::unit_interval(source.0, agi.0))
        })
    }
}

static REGISTRY: &[&dyn StateModule] = &[&illinois::Illinois, &pennsylvania::Pennsylvania];

/// Find the module for a jurisdiction code (case-insensitive)
pub fn lookup(code: &str) -> Result<&'static dyn StateModule, ComputeError> {
    let code = code.trim();
    REGISTRY
        .iter()
        .copied()
        .find(|module| module.code().eq_ignore_ascii_case(code))
        .ok_or_else(|| ComputeError::UnsupportedJurisdiction(code.to_string()))
}

pub fn supported() -> impl Iterator<Item = (&'static str, &'static str)> {
    REGISTRY.iter().map(|module| (module.code(), module.name()))
}

/// Run one requested state return
pub fn compute_state(
    ledger: &mut Ledger,
    tax_return: &TaxReturn,
    config: &StateReturn,
    year: TaxYear,
) -> Result<(), ComputeError> {
    let module = lookup(&config.code)?;
    let code = module.code();
    ledger.begin_scoped_module(code, &format!("{code}."));
    log::debug!("{} ({}) return, {:?}", module.name(), code, config.residency);
    let mut ctx = StateContext {
        ledger,
        tax_return,
        config,
        year,
    };
    module.compute(&mut ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Cents;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("il").unwrap().code(), "IL");
        assert_eq!(lookup(" PA ").unwrap().name(), "Pennsylvania");
    }

    #[test]
    fn unknown_jurisdiction_is_an_error() {
        assert_eq!(
            lookup("ZZ").err(),
            Some(ComputeError::UnsupportedJurisdiction("ZZ".to_string()))
        );
    }

    #[test]
    fn registry_codes_are_unique() {
        let mut codes: Vec<_> = supported().map(|(code, _)| code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), REGISTRY.len());
    }

    fn ratio_for(residency: Residency, agi: Cents) -> (Ratio, Ledger) {
        let tax_return: TaxReturn = serde_json::from_value(serde_json::json!({
            "tax_year": 2025,
            "filing_status": "single",
            "taxpayer": { "name": "Pat" }
        }))
        .unwrap();
        let config = StateReturn {
            code: "IL".to_string(),
            residency,
        };
        let mut ledger = Ledger::new();
        ledger.begin_module("form1040");
        ledger.document("form1040.line11", agi, "test").unwrap();
        ledger.begin_scoped_module("IL", "IL.");
        let mut ctx = StateContext {
            ledger: &mut ledger,
            tax_return: &tax_return,
            config: &config,
            year: TaxYear::new(2025).unwrap(),
        };
        let ratio = ctx.apportionment_ratio().unwrap();
        (ratio, ledger)
    }

    #[test]
    fn resident_ratio_is_one_with_citation() {
        let (ratio, ledger) = ratio_for(Residency::Resident, Cents::dollars(50_000));
        assert_eq!(ratio, Ratio::ONE);
        let node = ledger.get("IL.apportionmentRatio").unwrap();
        assert!(node.inputs().is_empty());
        assert!(node.citation().is_some());
    }

    #[test]
    fn part_year_ratio_divides_by_agi() {
        let (ratio, ledger) = ratio_for(
            Residency::PartYear {
                state_source_income: Cents::dollars(25_000),
            },
            Cents::dollars(100_000),
        );
        assert_eq!(ratio, Ratio::unit_interval(1, 4));
        assert_eq!(
            ledger.get("IL.apportionmentRatio").unwrap().inputs().len(),
            2
        );
    }

    #[test]
    fn ratio_is_clamped() {
        let residency = Residency::Nonresident {
            state_source_income: Cents::dollars(150_000),
        };
        let (ratio, _) = ratio_for(residency, Cents::dollars(100_000));
        assert_eq!(ratio, Ratio::ONE);

        let (ratio, _) = ratio_for(residency, Cents::dollars(-5_000));
        assert_eq!(ratio, Ratio::ONE);

        let residency = Residency::Nonresident {
            state_source_income: Cents::ZERO,
        };
        let (ratio, _) = ratio_for(residency, Cents::ZERO);
        assert_eq!(ratio, Ratio::ZERO);
    }
}
