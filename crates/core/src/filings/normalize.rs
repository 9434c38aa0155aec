//! Holding normalization: duplicate CUSIP rows within one filing collapse
//! into a single position.
//!
//! Managers report the same security across several information-table rows
//! (different discretion buckets, share classes reported apart). Downstream
//! position math needs one row per CUSIP.

use log::warn;

use crate::filings::model::Holding;
use crate::mindex::{IndexError, MultiIndex};

/// Merge holdings that share a CUSIP, summing value and share counts.
///
/// The first row for a CUSIP keeps its descriptive fields; later duplicates
/// only contribute their totals. Rows without a CUSIP cannot be merged and
/// pass through untouched. Order of first appearance is preserved.
pub fn normalize_holdings(holdings: Vec<Holding>) -> Result<Vec<Holding>, IndexError> {
    let mut merged: MultiIndex<Holding> = MultiIndex::safe(["cusip"], "cusip")?;
    // Reinsertion on merge moves a record to the back of the index, so the
    // output order is reconstructed from first appearances.
    let mut order: Vec<String> = Vec::new();
    let mut unidentified = Vec::new();

    for holding in holdings {
        if holding.cusip.is_empty() {
            warn!("holding '{}' has no cusip, kept unmerged", holding.issuer_name);
            unidentified.push(holding);
            continue;
        }
        match merged.get("cusip", Some(&holding.cusip))? {
            None => {
                order.push(holding.cusip.clone());
                merged.insert(holding)?;
            }
            Some(_) => {
                let mut existing = merged.remove("cusip", &holding.cusip)?;
                existing.value += holding.value;
                existing.shares += holding.shares;
                merged.insert(existing)?;
            }
        }
    }

    let mut out = Vec::with_capacity(order.len() + unidentified.len());
    for cusip in &order {
        out.push(merged.remove("cusip", cusip)?);
    }
    out.extend(unidentified);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(issuer: &str, cusip: &str, value: i64, shares: i64) -> Holding {
        Holding {
            issuer_name: issuer.into(),
            cusip: cusip.into(),
            ticker: None,
            class_title: None,
            value,
            shares,
            put_call: None,
            investment_discretion: None,
        }
    }

    #[test]
    fn test_duplicate_cusips_merge_summing_totals() {
        let rows = vec![
            holding("APPLE INC", "037833100", 1_000_000, 5_000),
            holding("MICROSOFT CORP", "594918104", 2_000_000, 6_000),
            holding("APPLE INC", "037833100", 500_000, 2_500),
        ];

        let merged = normalize_holdings(rows).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].cusip, "037833100");
        assert_eq!(merged[0].value, 1_500_000);
        assert_eq!(merged[0].shares, 7_500);
        assert_eq!(merged[1].cusip, "594918104");
        assert_eq!(merged[1].value, 2_000_000);
    }

    #[test]
    fn test_first_row_keeps_descriptive_fields() {
        let mut first = holding("APPLE INC", "037833100", 100, 1);
        first.class_title = Some("COM".into());
        let mut second = holding("APPLE INC COMMON", "037833100", 200, 2);
        second.class_title = Some("COM CL A".into());

        let merged = normalize_holdings(vec![first, second]).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].issuer_name, "APPLE INC");
        assert_eq!(merged[0].class_title.as_deref(), Some("COM"));
        assert_eq!(merged[0].value, 300);
    }

    #[test]
    fn test_cusipless_rows_pass_through() {
        let rows = vec![
            holding("APPLE INC", "037833100", 100, 1),
            holding("UNKNOWN TRUST", "", 50, 10),
            holding("UNKNOWN TRUST", "", 60, 20),
        ];

        let merged = normalize_holdings(rows).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].issuer_name, "UNKNOWN TRUST");
        assert_eq!(merged[1].value, 50);
        assert_eq!(merged[2].value, 60);
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_holdings(Vec::new()).unwrap().is_empty());
    }
}
