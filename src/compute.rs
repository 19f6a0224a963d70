use crate::core::{ComputeError, ComputeResult, Ledger, TaxReturn};
use crate::state;
use crate::tax::{self, TaxYear};

/// Compute a complete return: federal modules in form order, then each requested state.
///
/// The input is never modified and nothing outside the returned value is touched, so two
/// calls with equal input produce equal results.
pub fn compute(tax_return: &TaxReturn) -> Result<ComputeResult, ComputeError> {
    let year = TaxYear::new(tax_return.tax_year)?;
    log::info!(
        "Computing {} return ({}), {} state(s)",
        year,
        tax_return.filing_status,
        tax_return.elections.states.len()
    );

    let mut ledger = Ledger::new();
    let wash_sales = tax::compute_federal(&mut ledger, tax_return, year)?;
    for config in &tax_return.elections.states {
        state::compute_state(&mut ledger, tax_return, config, year)?;
    }

    let result = ComputeResult::new(year.year(), ledger, wash_sales);
    result.verify_closure()?;
    log::info!(
        "Computed {} nodes across {} modules",
        result.nodes.len(),
        result.modules.len()
    );
    Ok(result)
}
