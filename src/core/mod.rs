pub mod error;
pub mod ledger;
pub mod result;
pub mod taxreturn;
pub mod traced;
pub mod transaction;

// Flat public surface for domain types.
pub use error::{ComputeError, InputError};
pub use ledger::{Inputs, Ledger, ModuleResult};
pub use result::ComputeResult;
pub use taxreturn::{
    read_tax_return, BusinessActivity, CapitalLossCarryover, DeductionMethod, Dependent,
    DividendStatement, Elections, FilingStatus, InterestStatement, Person, Residency,
    RetirementDistribution, StateReturn, StateWageLine, TaxReturn, WageStatement,
};
pub use traced::{LeafKind, NodeId, Source, TracedValue, Value};
pub use transaction::{AdjustmentCode, CapitalTransaction, Category8949};
