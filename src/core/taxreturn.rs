use super::error::InputError;
use super::transaction::CapitalTransaction;
use crate::money::Cents;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedJoint,
    MarriedSeparate,
    HeadOfHousehold,
    QualifyingSurvivor,
}

impl FilingStatus {
    pub fn display(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedJoint => "married filing jointly",
            FilingStatus::MarriedSeparate => "married filing separately",
            FilingStatus::HeadOfHousehold => "head of household",
            FilingStatus::QualifyingSurvivor => "qualifying surviving spouse",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Person {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Dependent {
    pub name: String,
    /// Under 17 at year end and otherwise qualifying for the child tax credit
    #[serde(default)]
    pub qualifying_child: bool,
}

/// W-2 state/local boxes 15-17
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StateWageLine {
    pub state: String,
    #[serde(default)]
    pub wages: Cents,
    #[serde(default)]
    pub withholding: Cents,
}

/// W-2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WageStatement {
    pub id: String,
    pub employer: String,
    /// Box 1
    pub wages: Cents,
    /// Box 2
    #[serde(default)]
    pub federal_withholding: Cents,
    #[serde(default)]
    pub state: Vec<StateWageLine>,
}

impl WageStatement {
    pub fn state_line(&self, code: &str) -> Option<&StateWageLine> {
        self.state
            .iter()
            .find(|line| line.state.trim().eq_ignore_ascii_case(code))
    }
}

/// 1099-INT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InterestStatement {
    pub id: String,
    pub payer: String,
    /// Box 1
    pub interest: Cents,
    /// Box 8
    #[serde(default)]
    pub tax_exempt_interest: Cents,
    /// Box 4
    #[serde(default)]
    pub federal_withholding: Cents,
}

/// 1099-DIV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DividendStatement {
    pub id: String,
    pub payer: String,
    /// Box 1a
    #[serde(default)]
    pub ordinary_dividends: Cents,
    /// Box 1b
    #[serde(default)]
    pub qualified_dividends: Cents,
    /// Box 2a
    #[serde(default)]
    pub capital_gain_distributions: Cents,
    /// Box 4
    #[serde(default)]
    pub federal_withholding: Cents,
}

/// 1099-R
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RetirementDistribution {
    pub id: String,
    pub payer: String,
    /// Box 1
    pub gross_distribution: Cents,
    /// Box 2a
    pub taxable_amount: Cents,
    /// Box 4
    #[serde(default)]
    pub federal_withholding: Cents,
    /// IRA/SEP/SIMPLE box checked; reported on line 4 rather than line 5
    #[serde(default)]
    pub ira: bool,
}

/// Schedule C or K-1 summary of one trade or business
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BusinessActivity {
    pub id: String,
    pub name: String,
    /// Qualified business income; negative for a loss
    pub net_profit: Cents,
    /// W-2 wages paid by the business
    #[serde(default)]
    pub w2_wages: Cents,
    /// Unadjusted basis immediately after acquisition of qualified property
    #[serde(default)]
    pub ubia: Cents,
    /// Specified service trade or business
    #[serde(default)]
    pub specified_service: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DeductionMethod {
    #[default]
    Standard,
    Itemized {
        amount: Cents,
    },
}

/// Prior-year capital loss carried in, as positive magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CapitalLossCarryover {
    #[serde(default)]
    pub short_term: Cents,
    #[serde(default)]
    pub long_term: Cents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Residency {
    #[default]
    Resident,
    PartYear {
        state_source_income: Cents,
    },
    Nonresident {
        state_source_income: Cents,
    },
}

/// A requested state return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StateReturn {
    /// Postal code, e.g. "IL"
    pub code: String,
    #[serde(default)]
    pub residency: Residency,
}

impl StateReturn {
    pub fn normalized_code(&self) -> String {
        self.code.trim().to_ascii_uppercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Elections {
    #[serde(default)]
    pub deduction: DeductionMethod,
    #[serde(default)]
    pub adjustments_to_income: Cents,
    #[serde(default)]
    pub estimated_payments: Cents,
    #[serde(default)]
    pub capital_loss_carryover: CapitalLossCarryover,
    #[serde(default = "default_true")]
    pub detect_wash_sales: bool,
    #[serde(default)]
    pub states: Vec<StateReturn>,
}

impl Default for Elections {
    fn default() -> Self {
        Elections {
            deduction: DeductionMethod::default(),
            adjustments_to_income: Cents::ZERO,
            estimated_payments: Cents::ZERO,
            capital_loss_carryover: CapitalLossCarryover::default(),
            detect_wash_sales: true,
            states: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Everything the engine needs to compute one return. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxReturn {
    pub tax_year: i32,
    pub filing_status: FilingStatus,
    pub taxpayer: Person,
    #[serde(default)]
    pub spouse: Option<Person>,
    #[serde(default)]
    pub dependents: Vec<Dependent>,
    #[serde(default)]
    pub wages: Vec<WageStatement>,
    #[serde(default)]
    pub interest: Vec<InterestStatement>,
    #[serde(default)]
    pub dividends: Vec<DividendStatement>,
    #[serde(default)]
    pub capital_transactions: Vec<CapitalTransaction>,
    #[serde(default)]
    pub retirement_distributions: Vec<RetirementDistribution>,
    #[serde(default)]
    pub business_activities: Vec<BusinessActivity>,
    #[serde(default)]
    pub elections: Elections,
}

impl TaxReturn {
    /// Taxpayer, spouse on a joint return, and dependents
    pub fn exemption_count(&self) -> i64 {
        let spouse = i64::from(self.filing_status == FilingStatus::MarriedJoint);
        1 + spouse + self.dependents.len() as i64
    }
}

/// Read a JSON tax return
pub fn read_tax_return<R: Read>(reader: R) -> Result<TaxReturn, InputError> {
    let tax_return: TaxReturn = serde_json::from_reader(reader)?;
    log::debug!(
        "read {} return for {}: {} W-2s, {} capital transactions, {} states",
        tax_return.tax_year,
        tax_return.filing_status,
        tax_return.wages.len(),
        tax_return.capital_transactions.len(),
        tax_return.elections.states.len()
    );
    Ok(tax_return)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "tax_year": 2025,
        "filing_status": "single",
        "taxpayer": { "name": "Pat" }
    }"#;

    #[test]
    fn minimal_return_uses_defaults() {
        let tr = read_tax_return(MINIMAL.as_bytes()).unwrap();
        assert_eq!(tr.filing_status, FilingStatus::Single);
        assert!(tr.elections.detect_wash_sales);
        assert_eq!(tr.elections.deduction, DeductionMethod::Standard);
        assert!(tr.capital_transactions.is_empty());
        assert_eq!(tr.exemption_count(), 1);
    }

    #[test]
    fn unknown_filing_status_is_rejected() {
        let json = MINIMAL.replace("\"single\"", "\"domestic_partner\"");
        let err = read_tax_return(json.as_bytes()).unwrap_err();
        assert!(matches!(err, InputError::Json(_)));
    }

    #[test]
    fn elections_parse() {
        let json = r#"{
            "tax_year": 2025,
            "filing_status": "married_joint",
            "taxpayer": { "name": "Pat" },
            "spouse": { "name": "Sam" },
            "dependents": [{ "name": "Kim", "qualifying_child": true }],
            "elections": {
                "deduction": { "method": "itemized", "amount": 3500000 },
                "states": [{ "code": "il", "residency": { "type": "part_year", "state_source_income": 100 } }]
            }
        }"#;
        let tr = read_tax_return(json.as_bytes()).unwrap();
        assert_eq!(
            tr.elections.deduction,
            DeductionMethod::Itemized {
                amount: Cents::dollars(35_000)
            }
        );
        assert_eq!(tr.elections.states[0].normalized_code(), "IL");
        assert_eq!(
            tr.elections.states[0].residency,
            Residency::PartYear {
                state_source_income: Cents(100)
            }
        );
        assert_eq!(tr.exemption_count(), 3);
    }
}
