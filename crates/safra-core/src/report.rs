//! # Report Module
//!
//! Read-only summaries over the ledger: total revenue, total costs, and the
//! resulting profit or loss, plus a plain-text rendering suitable for
//! export. Reports are computed on demand and never stored.

use crate::money::Money;
use crate::types::{Cost, Sale};

// =============================================================================
// Ledger Summary
// =============================================================================

/// Aggregated totals over all recorded sales and costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSummary {
    /// Sum of all sale totals.
    pub total_sales: Money,

    /// Sum of all cost amounts.
    pub total_costs: Money,
}

impl LedgerSummary {
    /// Net result: sales minus costs. Negative means a loss.
    #[inline]
    pub fn net(&self) -> Money {
        self.total_sales - self.total_costs
    }
}

/// Computes the ledger summary from the in-memory collections.
pub fn summarize(sales: &[Sale], costs: &[Cost]) -> LedgerSummary {
    let total_sales = sales.iter().fold(Money::zero(), |acc, s| acc + s.total);
    let total_costs = costs.iter().fold(Money::zero(), |acc, c| acc + c.amount);

    LedgerSummary {
        total_sales,
        total_costs,
    }
}

// =============================================================================
// Text Export
// =============================================================================

/// Renders the ledger as a plain-text report.
///
/// Layout: header with the three totals, then one line per cost and one per
/// sale, in insertion order. Timestamps are RFC 3339 with seconds precision.
pub fn render_text(sales: &[Sale], costs: &[Cost]) -> String {
    use chrono::SecondsFormat;
    use std::fmt::Write;

    let summary = summarize(sales, costs);

    let mut out = String::new();
    out.push_str("=== SAFRA LEDGER REPORT ===\n\n");
    let _ = writeln!(out, "Total costs: {}", summary.total_costs);
    let _ = writeln!(out, "Total sales: {}", summary.total_sales);
    let _ = writeln!(out, "Net result:  {}", summary.net());

    out.push_str("\n--- COSTS ---\n");
    for cost in costs {
        let _ = writeln!(
            out,
            "{} - {} - {}",
            cost.category,
            cost.amount,
            cost.occurred_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    out.push_str("\n--- SALES ---\n");
    for sale in sales {
        let _ = writeln!(
            out,
            "{} - qty: {} - {} - {}",
            sale.product_name,
            sale.quantity,
            sale.total,
            sale.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CostCategory, Product};

    fn sample_ledger() -> (Vec<Sale>, Vec<Cost>) {
        let product = Product::new("Milho", Money::from_centavos(1000)).unwrap();
        let sales = vec![
            Sale::record(&product, 3).unwrap(),
            Sale::record(&product, 1).unwrap(),
        ];
        let costs = vec![
            Cost::new("Adubo", Money::from_centavos(1500), CostCategory::Supply).unwrap(),
            Cost::new("Frete", Money::from_centavos(700), CostCategory::Transport).unwrap(),
        ];
        (sales, costs)
    }

    #[test]
    fn test_summary_totals() {
        let (sales, costs) = sample_ledger();
        let summary = summarize(&sales, &costs);

        assert_eq!(summary.total_sales, Money::from_centavos(4000));
        assert_eq!(summary.total_costs, Money::from_centavos(2200));
        assert_eq!(summary.net(), Money::from_centavos(1800));
    }

    #[test]
    fn test_summary_can_be_a_loss() {
        let costs =
            vec![Cost::new("Trator", Money::from_centavos(500_000), CostCategory::Other).unwrap()];
        let summary = summarize(&[], &costs);
        assert!(summary.net().is_negative());
    }

    #[test]
    fn test_empty_ledger_summary_is_zero() {
        let summary = summarize(&[], &[]);
        assert_eq!(summary.total_sales, Money::zero());
        assert_eq!(summary.total_costs, Money::zero());
        assert_eq!(summary.net(), Money::zero());
    }

    #[test]
    fn test_render_text_contains_totals_and_lines() {
        let (sales, costs) = sample_ledger();
        let text = render_text(&sales, &costs);

        assert!(text.contains("Total costs: 22.00"));
        assert!(text.contains("Total sales: 40.00"));
        assert!(text.contains("Net result:  18.00"));
        assert!(text.contains("supply - 15.00"));
        assert!(text.contains("Milho - qty: 3 - 30.00"));
    }
}
