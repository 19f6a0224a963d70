use super::wash_sale::WashSaleOutcome;
use crate::core::{Category8949, ComputeError, Ledger};

/// Form 8949: per-lot adjusted basis and gain, totalled by box.
///
/// Only matches made in this run adjust basis here; a lot that arrives already adjusted
/// carries that basis in its `1099b.<id>.costBasis` leaf.
pub fn run(ledger: &mut Ledger, wash_sales: &WashSaleOutcome) -> Result<(), ComputeError> {
    ledger.begin_module("form8949");

    for lot in &wash_sales.transactions {
        let id = &lot.id;
        let basis_node = match wash_sales.absorbed_by(id).map(|m| &m.loss_sale_id) {
            Some(loss_id) => {
                let node = format!("form8949.tx.{id}.adjustedBasis");
                ledger.derive(node.as_str(), |i| {
                    let basis = i.cents(&format!("1099b.{id}.costBasis"))?;
                    let carried = i.cents(&format!("washSale.{loss_id}.disallowed"))?;
                    i.cite(format!(
                        "IRC 1091(d): basis includes loss disallowed on {loss_id}"
                    ));
                    Ok(basis + carried)
                })?;
                node
            }
            None => format!("1099b.{id}.costBasis"),
        };
        let disallowed = wash_sales
            .disallowed_on(id)
            .map(|_| format!("washSale.{id}.disallowed"));

        let gain = ledger.derive(format!("form8949.tx.{id}.gainLoss"), |i| {
            let proceeds = i.cents(&format!("1099b.{id}.proceeds"))?;
            let basis = i.cents(&basis_node)?;
            let mut adjustment = i.cents(&format!("1099b.{id}.adjustment"))?;
            if let Some(node) = &disallowed {
                adjustment += i.cents(node)?;
                i.cite("Form 8949 column (f) code W");
            }
            Ok(proceeds - basis + adjustment)
        })?;
        log::debug!("8949 {} lot {}: {}", lot.category.code(), id, gain);
    }

    for category in Category8949::ALL {
        let code = category.code();
        let lots: Vec<_> = wash_sales
            .transactions
            .iter()
            .filter(|lot| lot.category == category)
            .collect();

        let proceeds: Vec<String> = lots
            .iter()
            .map(|lot| format!("1099b.{}.proceeds", lot.id))
            .collect();
        let bases: Vec<String> = lots
            .iter()
            .map(|lot| match wash_sales.absorbed_by(&lot.id) {
                Some(_) => format!("form8949.tx.{}.adjustedBasis", lot.id),
                None => format!("1099b.{}.costBasis", lot.id),
            })
            .collect();
        let adjustments: Vec<String> = lots
            .iter()
            .flat_map(|lot| {
                let reported = format!("1099b.{}.adjustment", lot.id);
                let disallowed = wash_sales
                    .disallowed_on(&lot.id)
                    .map(|_| format!("washSale.{}.disallowed", lot.id));
                std::iter::once(reported).chain(disallowed)
            })
            .collect();
        let gains: Vec<String> = lots
            .iter()
            .map(|lot| format!("form8949.tx.{}.gainLoss", lot.id))
            .collect();

        ledger.derive(format!("form8949.{code}.proceeds"), |i| i.sum(&proceeds))?;
        ledger.derive(format!("form8949.{code}.costBasis"), |i| i.sum(&bases))?;
        ledger.derive(format!("form8949.{code}.adjustment"), |i| i.sum(&adjustments))?;
        ledger.derive(format!("form8949.{code}.gainLoss"), |i| {
            i.cite(format!("Form 8949 box {code} column (h) total"));
            i.sum(&gains)
        })?;
    }
    Ok(())
}
