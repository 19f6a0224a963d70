use crate::core::{AdjustmentCode, CapitalTransaction, ComputeError, Ledger, TaxReturn};
use crate::money::Cents;
use serde::{Deserialize, Serialize};

/// Replacement lots acquired within this many days either side of the loss sale match
const WINDOW_DAYS: i64 = 30;

/// One disallowed loss and the lot that absorbed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WashSaleMatch {
    pub loss_sale_id: String,
    pub replacement_id: String,
    pub disallowed: Cents,
    /// CUSIP, or the description when the lot has none
    pub symbol: String,
}

/// Matches found plus the adjusted copy of every input lot, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WashSaleOutcome {
    pub matches: Vec<WashSaleMatch>,
    pub transactions: Vec<CapitalTransaction>,
}

impl WashSaleOutcome {
    /// No matching performed; lots pass through unchanged
    pub fn unmatched(transactions: &[CapitalTransaction]) -> Self {
        WashSaleOutcome {
            matches: Vec::new(),
            transactions: transactions.to_vec(),
        }
    }

    pub fn total_disallowed(&self) -> Cents {
        self.matches.iter().map(|m| m.disallowed).sum()
    }

    /// The match in which `id` absorbed another lot's loss
    pub fn absorbed_by(&self, id: &str) -> Option<&WashSaleMatch> {
        self.matches.iter().find(|m| m.replacement_id == id)
    }

    /// The match in which `id` was the loss sale
    pub fn disallowed_on(&self, id: &str) -> Option<&WashSaleMatch> {
        self.matches.iter().find(|m| m.loss_sale_id == id)
    }
}

/// Apply the wash-sale rule (IRC 1091) to a set of disposed lots.
///
/// Loss lots are visited earliest disposal first. Each is paired with at most one
/// replacement lot of the same security acquired within 30 days of the sale; the loss is
/// disallowed on the sale and added to the replacement's basis. A replacement whose gain
/// turns negative as a result is visited in turn. A lot whose own loss was disallowed can
/// still absorb a later sale's loss. The input is not modified.
pub fn match_wash_sales(transactions: &[CapitalTransaction]) -> WashSaleOutcome {
    let mut lots = transactions.to_vec();
    let mut attempted = vec![false; lots.len()];
    let mut matches = Vec::new();

    while let Some(loss) = next_loss(&lots, &attempted) {
        attempted[loss] = true;

        let Some(replacement) = find_replacement(&lots, loss) else {
            log::debug!(
                "No replacement for loss sale {} ({}) on {}",
                lots[loss].id,
                lots[loss].description,
                lots[loss].disposed
            );
            continue;
        };

        let disallowed = lots[loss].gain_loss().abs();
        let loss_id = lots[loss].id.clone();
        let symbol = symbol_of(&lots[loss]);

        let sale = &mut lots[loss];
        sale.adjustment_code = Some(AdjustmentCode::WashSale);
        sale.adjustment += disallowed;

        let lot = &mut lots[replacement];
        lot.adjusted_basis = Some(lot.basis() + disallowed);
        lot.replacement_of = Some(loss_id.clone());

        log::debug!(
            "Wash sale: {} loss {} on {} disallowed, added to basis of {}",
            symbol,
            disallowed,
            loss_id,
            lot.id
        );
        matches.push(WashSaleMatch {
            loss_sale_id: loss_id,
            replacement_id: lot.id.clone(),
            disallowed,
            symbol,
        });
    }

    WashSaleOutcome {
        matches,
        transactions: lots,
    }
}

/// Earliest-disposed loss lot not yet visited
fn next_loss(lots: &[CapitalTransaction], attempted: &[bool]) -> Option<usize> {
    lots.iter()
        .enumerate()
        .filter(|(i, lot)| !attempted[*i] && !lot.is_wash_sale() && lot.gain_loss().is_negative())
        .min_by(|(_, a), (_, b)| (a.disposed, &a.id).cmp(&(b.disposed, &b.id)))
        .map(|(i, _)| i)
}

fn find_replacement(lots: &[CapitalTransaction], loss: usize) -> Option<usize> {
    let sale = &lots[loss];
    lots.iter()
        .enumerate()
        .filter(|(i, _)| *i != loss)
        .filter(|(_, lot)| lot.replacement_of.is_none())
        .filter(|(_, lot)| same_security(sale, lot))
        .filter_map(|(i, lot)| {
            let acquired = lot.acquired?;
            let days = acquired.signed_duration_since(sale.disposed).num_days();
            (days.abs() <= WINDOW_DAYS).then_some((i, acquired))
        })
        .min_by(|(a, a_acq), (b, b_acq)| (a_acq, &lots[*a].id).cmp(&(b_acq, &lots[*b].id)))
        .map(|(i, _)| i)
}

/// CUSIPs decide when both lots have one, otherwise the descriptions
fn same_security(a: &CapitalTransaction, b: &CapitalTransaction) -> bool {
    match (cusip(a), cusip(b)) {
        (Some(x), Some(y)) => x == y,
        _ => normalize(&a.description) == normalize(&b.description),
    }
}

fn cusip(lot: &CapitalTransaction) -> Option<String> {
    lot.cusip
        .as_deref()
        .map(normalize)
        .filter(|c| !c.is_empty())
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn symbol_of(lot: &CapitalTransaction) -> String {
    cusip(lot)
        .map(|c| c.to_uppercase())
        .unwrap_or_else(|| lot.description.trim().to_string())
}

/// Record the brokerage lots as document leaves
pub fn record_transactions(ledger: &mut Ledger, tax_return: &TaxReturn) -> Result<(), ComputeError> {
    ledger.begin_module("capitalTransactions");
    for lot in &tax_return.capital_transactions {
        let id = &lot.id;
        ledger.document(
            format!("1099b.{id}.proceeds"),
            lot.proceeds,
            format!("1099-B {id} box 1d ({})", lot.description),
        )?;
        ledger.document(
            format!("1099b.{id}.costBasis"),
            lot.basis(),
            format!("1099-B {id} box 1e"),
        )?;
        ledger.document(
            format!("1099b.{id}.adjustment"),
            lot.adjustment,
            format!("1099-B {id} box 1g"),
        )?;
    }
    Ok(())
}

/// Run the matcher and trace each disallowed loss back to the lots it came from
pub fn run(ledger: &mut Ledger, tax_return: &TaxReturn) -> Result<WashSaleOutcome, ComputeError> {
    ledger.begin_module("washSale");
    let lots = &tax_return.capital_transactions;
    if !tax_return.elections.detect_wash_sales {
        log::info!("Wash-sale detection disabled; {} lots unchanged", lots.len());
        return Ok(WashSaleOutcome::unmatched(lots));
    }

    let outcome = match_wash_sales(lots);
    for (n, m) in outcome.matches.iter().enumerate() {
        let id = &m.loss_sale_id;
        // basis this lot absorbed before its own loss was matched
        let absorbed = outcome.matches[..n]
            .iter()
            .find(|prior| prior.replacement_id == *id)
            .map(|prior| format!("washSale.{}.disallowed", prior.loss_sale_id));
        ledger.derive(format!("washSale.{id}.disallowed"), |i| {
            let proceeds = i.cents(&format!("1099b.{id}.proceeds"))?;
            let basis = i.cents(&format!("1099b.{id}.costBasis"))?;
            let adjustment = i.cents(&format!("1099b.{id}.adjustment"))?;
            let carried = match &absorbed {
                Some(node) => i.cents(node)?,
                None => Cents::ZERO,
            };
            i.cite(format!(
                "IRC 1091(a): {} repurchased as lot {} within {WINDOW_DAYS} days",
                m.symbol, m.replacement_id
            ));
            Ok(-(proceeds - basis - carried + adjustment))
        })?;
    }
    log::info!(
        "Wash sales: {} matches, {} disallowed",
        outcome.matches.len(),
        outcome.total_disallowed()
    );
    Ok(outcome)
}
