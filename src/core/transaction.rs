use crate::money::Cents;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Form 8949 box a lot is reported in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Category8949 {
    /// Box A: short-term, basis reported to the IRS
    ShortTermBasisReported,
    /// Box B: short-term, basis not reported
    ShortTermBasisNotReported,
    /// Box D: long-term, basis reported to the IRS
    LongTermBasisReported,
    /// Box E: long-term, basis not reported
    LongTermBasisNotReported,
}

impl Category8949 {
    pub const ALL: [Category8949; 4] = [
        Category8949::ShortTermBasisReported,
        Category8949::ShortTermBasisNotReported,
        Category8949::LongTermBasisReported,
        Category8949::LongTermBasisNotReported,
    ];

    /// Box letter, also used in node ids (`form8949.A.gainLoss`)
    pub fn code(self) -> &'static str {
        match self {
            Category8949::ShortTermBasisReported => "A",
            Category8949::ShortTermBasisNotReported => "B",
            Category8949::LongTermBasisReported => "D",
            Category8949::LongTermBasisNotReported => "E",
        }
    }

    pub fn is_short_term(self) -> bool {
        matches!(
            self,
            Category8949::ShortTermBasisReported | Category8949::ShortTermBasisNotReported
        )
    }
}

/// Form 8949 column (f) adjustment code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AdjustmentCode {
    WashSale,
    BasisCorrection,
}

impl AdjustmentCode {
    pub fn letter(self) -> &'static str {
        match self {
            AdjustmentCode::WashSale => "W",
            AdjustmentCode::BasisCorrection => "B",
        }
    }
}

/// A disposed security lot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CapitalTransaction {
    pub id: String,
    /// Security description as printed on the statement (e.g. "100 sh ACME CORP")
    pub description: String,
    #[serde(default)]
    pub cusip: Option<String>,
    /// Acquisition date; `"various"` or absent when unknown
    #[serde(default, deserialize_with = "deserialize_acquired")]
    #[schemars(with = "Option<String>")]
    pub acquired: Option<NaiveDate>,
    #[schemars(with = "String")]
    pub disposed: NaiveDate,
    pub proceeds: Cents,
    pub reported_basis: Cents,
    /// Basis after adjustments; the reported basis when absent
    #[serde(default)]
    pub adjusted_basis: Option<Cents>,
    #[serde(default)]
    pub adjustment_code: Option<AdjustmentCode>,
    /// Form 8949 column (g)
    #[serde(default)]
    pub adjustment: Cents,
    pub category: Category8949,
    /// Set on a lot whose basis absorbed the disallowed loss of the named sale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_of: Option<String>,
}

impl CapitalTransaction {
    pub fn basis(&self) -> Cents {
        self.adjusted_basis.unwrap_or(self.reported_basis)
    }

    /// Form 8949 column (h): proceeds - basis + adjustment
    pub fn gain_loss(&self) -> Cents {
        self.proceeds - self.basis() + self.adjustment
    }

    pub fn is_short_term(&self) -> bool {
        self.category.is_short_term()
    }

    pub fn is_wash_sale(&self) -> bool {
        self.adjustment_code == Some(AdjustmentCode::WashSale)
    }
}

fn deserialize_acquired<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("various") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
