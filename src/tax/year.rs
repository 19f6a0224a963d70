use crate::core::{ComputeError, FilingStatus};
use crate::money::Cents;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;

/// Marginal rates of the ordinary income brackets, lowest first
const BRACKET_RATES: [Decimal; 7] = [
    dec!(0.10),
    dec!(0.12),
    dec!(0.22),
    dec!(0.24),
    dec!(0.32),
    dec!(0.35),
    dec!(0.37),
];

/// Upper edges (dollars) of the first six brackets; the 37% bracket is open-ended
type BracketTops = [i64; 6];

/// Federal tax year (calendar year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxYear(i32);

impl TaxYear {
    pub fn new(year: i32) -> Result<Self, ComputeError> {
        match year {
            2024 | 2025 => Ok(TaxYear(year)),
            other => Err(ComputeError::UnsupportedTaxYear(other)),
        }
    }

    pub fn year(&self) -> i32 {
        self.0
    }

    pub fn standard_deduction(&self, status: FilingStatus) -> Cents {
        use FilingStatus::*;
        let dollars = match (self.0, status) {
            (2024, Single | MarriedSeparate) => 14_600,
            (2024, MarriedJoint | QualifyingSurvivor) => 29_200,
            (2024, HeadOfHousehold) => 21_900,
            // 2025 amounts as increased by P.L. 119-21
            (_, Single | MarriedSeparate) => 15_750,
            (_, MarriedJoint | QualifyingSurvivor) => 31_500,
            (_, HeadOfHousehold) => 23_625,
        };
        Cents::dollars(dollars)
    }

    fn bracket_tops(&self, status: FilingStatus) -> BracketTops {
        use FilingStatus::*;
        match (self.0, status) {
            (2024, Single) => [11_600, 47_150, 100_525, 191_950, 243_725, 609_350],
            (2024, MarriedJoint | QualifyingSurvivor) => {
                [23_200, 94_300, 201_050, 383_900, 487_450, 731_200]
            }
            (2024, MarriedSeparate) => [11_600, 47_150, 100_525, 191_950, 243_725, 365_600],
            (2024, HeadOfHousehold) => [16_550, 63_100, 100_500, 191_950, 243_700, 609_350],
            (_, Single) => [11_925, 48_475, 103_350, 197_300, 250_525, 626_350],
            (_, MarriedJoint | QualifyingSurvivor) => {
                [23_850, 96_950, 206_700, 394_600, 501_050, 751_600]
            }
            (_, MarriedSeparate) => [11_925, 48_475, 103_350, 197_300, 250_525, 375_800],
            (_, HeadOfHousehold) => [17_000, 64_850, 103_350, 197_300, 250_500, 626_350],
        }
    }

    /// Tax on `income` using the rate schedules, rounded once to the cent
    pub fn ordinary_tax(&self, status: FilingStatus, income: Cents) -> Cents {
        if !income.is_positive() {
            return Cents::ZERO;
        }
        let tops = self.bracket_tops(status);
        let mut tax = Decimal::ZERO;
        let mut lower = Cents::ZERO;
        for (i, rate) in BRACKET_RATES.iter().enumerate() {
            let top = tops.get(i).map(|d| Cents::dollars(*d));
            let upper = top.map_or(income, |t| t.min(income));
            if upper > lower {
                tax += Decimal::from((upper - lower).0) * *rate;
            }
            match top {
                Some(t) if income > t => lower = t,
                _ => break,
            }
        }
        Cents::round_from(tax)
    }

    /// Top of the 0% and 15% capital gain rate bands
    pub fn capital_gain_breakpoints(&self, status: FilingStatus) -> (Cents, Cents) {
        use FilingStatus::*;
        let (zero, fifteen) = match (self.0, status) {
            (2024, Single) => (47_025, 518_900),
            (2024, MarriedSeparate) => (47_025, 291_850),
            (2024, MarriedJoint | QualifyingSurvivor) => (94_050, 583_750),
            (2024, HeadOfHousehold) => (63_000, 551_350),
            (_, Single) => (48_350, 533_400),
            (_, MarriedSeparate) => (48_350, 300_000),
            (_, MarriedJoint | QualifyingSurvivor) => (96_700, 600_050),
            (_, HeadOfHousehold) => (64_750, 566_700),
        };
        (Cents::dollars(zero), Cents::dollars(fifteen))
    }

    /// Net capital loss deductible against other income (IRC 1211(b))
    pub fn capital_loss_limit(&self, status: FilingStatus) -> Cents {
        match status {
            FilingStatus::MarriedSeparate => Cents::dollars(1_500),
            _ => Cents::dollars(3_000),
        }
    }

    /// Taxable income where the QBI wage limitation starts phasing in
    pub fn qbi_threshold(&self, status: FilingStatus) -> Cents {
        let joint = matches!(status, FilingStatus::MarriedJoint);
        let dollars = match (self.0, joint) {
            (2024, true) => 383_900,
            (2024, false) => 191_950,
            (_, true) => 394_600,
            (_, false) => 197_300,
        };
        Cents::dollars(dollars)
    }

    pub fn qbi_phase_in_range(&self, status: FilingStatus) -> Cents {
        match status {
            FilingStatus::MarriedJoint => Cents::dollars(100_000),
            _ => Cents::dollars(50_000),
        }
    }

    pub fn qbi_rate(&self) -> Decimal {
        dec!(0.20)
    }

    pub fn child_tax_credit(&self) -> Cents {
        match self.0 {
            2024 => Cents::dollars(2_000),
            _ => Cents::dollars(2_200),
        }
    }

    pub fn other_dependent_credit(&self) -> Cents {
        Cents::dollars(500)
    }

    /// Modified AGI above which the child tax credit is reduced
    pub fn child_credit_phase_out(&self, status: FilingStatus) -> Cents {
        match status {
            FilingStatus::MarriedJoint => Cents::dollars(400_000),
            _ => Cents::dollars(200_000),
        }
    }
}

impl fmt::Display for TaxYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
