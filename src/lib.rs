//! US individual income tax computation where every figure carries its provenance.
//!
//! [`compute`] runs the federal forms and any requested state returns over a
//! [`TaxReturn`] and returns a [`ComputeResult`] of traced values keyed by node id.
//! [`build_trace`] walks any of those values back to the documents it came from.

pub mod compute;
pub mod core;
pub mod money;
pub mod state;
pub mod tax;
pub mod trace;

pub use crate::compute::compute;
pub use crate::core::{
    read_tax_return, CapitalTransaction, ComputeError, ComputeResult, InputError, NodeId,
    TaxReturn, TracedValue, Value,
};
pub use crate::money::{Cents, Ratio};
pub use crate::tax::{match_wash_sales, TaxYear, WashSaleMatch, WashSaleOutcome};
pub use crate::trace::{build_trace, render_trace, ComputeTrace, TraceError};
