pub mod credits;
pub mod form1040;
pub mod form8949;
pub mod qbi;
pub mod schedule_1;
pub mod schedule_b;
pub mod schedule_d;
pub mod wash_sale;
pub mod year;

pub use wash_sale::{match_wash_sales, WashSaleMatch, WashSaleOutcome};
pub use year::TaxYear;

use crate::core::{ComputeError, Ledger, TaxReturn};

/// Run the federal modules in form order
pub fn compute_federal(
    ledger: &mut Ledger,
    tax_return: &TaxReturn,
    year: TaxYear,
) -> Result<WashSaleOutcome, ComputeError> {
    wash_sale::record_transactions(ledger, tax_return)?;
    let wash_sales = wash_sale::run(ledger, tax_return)?;
    form8949::run(ledger, &wash_sales)?;
    schedule_d::run(ledger, tax_return, year)?;
    schedule_b::run(ledger, tax_return)?;
    schedule_1::run(ledger, tax_return)?;
    form1040::compute_income(ledger, tax_return, year)?;
    qbi::run(ledger, tax_return, year)?;
    form1040::compute_tax(ledger, tax_return, year)?;
    credits::run(ledger, tax_return, year)?;
    form1040::compute_payments(ledger, tax_return)?;
    Ok(wash_sales)
}
