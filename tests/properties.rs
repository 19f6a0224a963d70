//! Randomized checks of the invariants every run must satisfy

use chrono::{Days, NaiveDate};
use proptest::collection::vec;
use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
use serde_json::json;
use taxtrace::core::Category8949;
use taxtrace::{compute, match_wash_sales, CapitalTransaction, Cents, Ratio, TaxReturn};

const SYMBOLS: [&str; 3] = ["ACME CORP", "Beta Fund", "GAMMA"];

fn base_return(wages: i64, business: Option<i64>) -> TaxReturn {
    let mut input = json!({
        "tax_year": 2025,
        "filing_status": "single",
        "taxpayer": { "name": "Pat" },
        "wages": [{ "id": "w", "employer": "Acme", "wages": wages }]
    });
    if let Some(profit) = business {
        input["business_activities"] = json!([
            { "id": "shop", "name": "Shop", "net_profit": profit }
        ]);
    }
    serde_json::from_value(input).unwrap()
}

/// (symbol, acquired offset or unknown, days held, proceeds, basis, category)
type LotSeed = (usize, Option<u64>, u64, i64, i64, usize);

fn lots(seeds: &[LotSeed]) -> Vec<CapitalTransaction> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    seeds
        .iter()
        .enumerate()
        .map(|(n, &(symbol, offset, held, proceeds, basis, category))| {
            let acquired = offset.map(|days| start + Days::new(days));
            let disposed = start + Days::new(offset.unwrap_or(0) + held);
            CapitalTransaction {
                id: format!("lot{n}"),
                description: SYMBOLS[symbol].to_string(),
                cusip: None,
                acquired,
                disposed,
                proceeds: Cents(proceeds),
                reported_basis: Cents(basis),
                adjusted_basis: None,
                adjustment_code: None,
                adjustment: Cents::ZERO,
                category: Category8949::ALL[category],
                replacement_of: None,
            }
        })
        .collect()
}

fn at_most(a: Ratio, b: Ratio) -> bool {
    i128::from(a.numerator()) * i128::from(b.denominator())
        <= i128::from(b.numerator()) * i128::from(a.denominator())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn prop_wash_sale_matching_is_idempotent(
        seeds in vec((0usize..3, proptest::option::of(0u64..120), 0u64..90,
                      0i64..1_000_000, 0i64..1_000_000, 0usize..4), 0..12)
    ) {
        let lots = lots(&seeds);
        let once = match_wash_sales(&lots);
        let twice = match_wash_sales(&once.transactions);
        prop_assert!(twice.matches.is_empty());
        prop_assert_eq!(&twice.transactions, &once.transactions);
    }

    #[test]
    fn prop_no_loss_left_with_an_open_replacement(
        seeds in vec((0usize..3, proptest::option::of(0u64..120), 0u64..90,
                      0i64..1_000_000, 0i64..1_000_000, 0usize..4), 0..12)
    ) {
        let outcome = match_wash_sales(&lots(&seeds));
        let lots = &outcome.transactions;
        for sale in lots.iter().filter(|l| !l.is_wash_sale() && l.gain_loss().is_negative()) {
            let open = lots.iter().find(|r| {
                r.id != sale.id
                    && r.replacement_of.is_none()
                    && r.description == sale.description
                    && r.acquired.map_or(false, |acquired| {
                        acquired.signed_duration_since(sale.disposed).num_days().abs() <= 30
                    })
            });
            prop_assert!(open.is_none(), "loss {} could still be replaced by {:?}", sale.id, open.map(|r| &r.id));
        }
    }

    #[test]
    fn prop_wash_sales_only_move_losses_between_lots(
        seeds in vec((0usize..3, proptest::option::of(0u64..120), 0u64..90,
                      0i64..1_000_000, 0i64..1_000_000, 0usize..4), 0..12)
    ) {
        let lots = lots(&seeds);
        let outcome = match_wash_sales(&lots);
        let before: Cents = lots.iter().map(CapitalTransaction::gain_loss).sum();
        let after: Cents = outcome.transactions.iter().map(CapitalTransaction::gain_loss).sum();
        prop_assert_eq!(before, after);
        prop_assert_eq!(outcome.transactions.len(), lots.len());
        for m in &outcome.matches {
            prop_assert!(m.disallowed.is_positive());
            prop_assert!(m.loss_sale_id != m.replacement_id);
        }
    }

    #[test]
    fn prop_compute_is_deterministic_and_closed(
        wages in 0i64..30_000_000,
        profit in -5_000_000i64..10_000_000,
        seeds in vec((0usize..3, proptest::option::of(0u64..120), 0u64..90,
                      0i64..1_000_000, 0i64..1_000_000, 0usize..4), 0..8)
    ) {
        let mut tax_return = base_return(wages, Some(profit));
        tax_return.capital_transactions = lots(&seeds);
        let first = compute(&tax_return).unwrap();
        let second = compute(&tax_return).unwrap();
        prop_assert_eq!(first.digest().unwrap(), second.digest().unwrap());
        prop_assert!(first.verify_closure().is_ok());
        prop_assert!(!first.cents("form1040.line15").unwrap().is_negative());
        prop_assert!(!first.cents("qbi.deduction").unwrap().is_negative());
    }

    #[test]
    fn prop_phase_in_factor_grows_with_income(
        low in 15_000_000i64..35_000_000,
        extra in 0i64..10_000_000
    ) {
        let a = compute(&base_return(low, Some(5_000_000))).unwrap();
        let b = compute(&base_return(low + extra, Some(5_000_000))).unwrap();
        if let (Some(fa), Some(fb)) = (a.ratio("qbi.phaseInFactor"), b.ratio("qbi.phaseInFactor")) {
            prop_assert!(at_most(fa, fb));
        }
        // no W-2 wages in the business, so more income can only phase out more of the deduction
        prop_assert!(b.cents("qbi.deduction").unwrap() <= a.cents("qbi.deduction").unwrap());
    }
}
