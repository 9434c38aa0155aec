//! Joins the per-source indexes into the unified ticker mapping.
//!
//! Each identifier field has a fixed precedence chain over the sources that
//! can supply it; the first non-null candidate wins and later sources are
//! not consulted for that field. Fields with no candidate are omitted, never
//! filled with placeholders.

use chrono::Utc;
use log::{debug, warn};

use crate::identifiers::{compute_isin, normalize_cik, normalize_ticker};
use crate::mapping::errors::MappingError;
use crate::mapping::model::{
    mapping_index, ExchangeInfo, IndustryInfo, TickerDetails, TickerMappingRecord,
};
use crate::mapping::traits::SourceIndex;
use crate::mindex::{IndexError, MultiIndex, Record};

/// Everything the builder joins, already fetched and indexed per source.
///
/// All members are safe-mode indexes keyed by the field named in the
/// comment; chain lookups against them return `Ok(None)` on a miss.
pub struct MappingSources {
    /// Vendor ticker universe, by `ticker`.
    pub tickers: SourceIndex,
    /// Vendor per-ticker reference data, by `ticker`.
    pub ticker_details: SourceIndex,
    /// Vendor exchange table, by `mic`.
    pub exchanges: SourceIndex,
    /// Registry ticker-to-CIK table, by `ticker`.
    pub registry_ciks: SourceIndex,
    /// Registry CUSIP table, by `ticker`.
    pub registry_cusips: SourceIndex,
    /// Aggregator ticker table (CIK, SIC, IRS number), by `ticker`.
    pub aggregator_tickers: SourceIndex,
    /// Aggregator LEI table, by `cik`.
    pub aggregator_leis: SourceIndex,
    /// Aggregator SIC-to-NAICS table, by `sic`.
    pub aggregator_industries: SourceIndex,
    /// Legal-entity registry ISIN-to-LEI table, by `isin`.
    pub lei_registry: SourceIndex,
}

/// Build the unified mapping from the fetched source indexes.
///
/// Iterates the vendor ticker universe in order. Rows whose ticker fails
/// normalization or that lack a company name are skipped, as are records
/// whose insert collides with an already-mapped identifier; a skip is
/// logged and never aborts the build.
pub fn build_ticker_mapping(
    sources: &MappingSources,
) -> Result<MultiIndex<TickerMappingRecord>, MappingError> {
    let mut mapping = mapping_index()?;
    let mut skipped = 0usize;

    for row in sources.tickers.iter() {
        let Some(ticker) = row.get_str("ticker").and_then(normalize_ticker) else {
            skipped += 1;
            continue;
        };
        let Some(record) = assemble_record(sources, row, &ticker)? else {
            debug!("skipping '{ticker}': no company name from any source");
            skipped += 1;
            continue;
        };
        if let Err(IndexError::Collision { key, value }) = mapping.insert(record) {
            warn!("skipping '{ticker}': {key}='{value}' already mapped");
            skipped += 1;
        }
    }

    debug!(
        "ticker mapping built: {} records, {} rows skipped",
        mapping.len(),
        skipped
    );
    Ok(mapping)
}

fn field<'a>(row: Option<&'a Record>, key: &str) -> Option<&'a str> {
    row.and_then(|r| r.get_str(key))
}

/// Assemble one mapping record for a normalized ticker, or `None` when no
/// source can name the company.
fn assemble_record(
    sources: &MappingSources,
    universe_row: &Record,
    ticker: &str,
) -> Result<Option<TickerMappingRecord>, IndexError> {
    let ticker_key = Some(ticker);
    let details_row = sources.ticker_details.get("ticker", ticker_key)?;
    let registry_row = sources.registry_ciks.get("ticker", ticker_key)?;
    let cusip_row = sources.registry_cusips.get("ticker", ticker_key)?;
    let aggregator_row = sources.aggregator_tickers.get("ticker", ticker_key)?;

    let name = universe_row
        .get_str("name")
        .or_else(|| field(details_row, "name"))
        .or_else(|| field(registry_row, "name"));
    let Some(name) = name else {
        return Ok(None);
    };

    let mut record = TickerMappingRecord::new(ticker, name);

    record.cusip = field(details_row, "cusip")
        .or_else(|| field(cusip_row, "cusip"))
        .map(str::to_string);

    record.cik = field(registry_row, "cik")
        .or_else(|| field(details_row, "cik"))
        .or_else(|| field(aggregator_row, "cik"))
        .and_then(normalize_cik);

    record.figi = field(Some(universe_row), "composite_figi")
        .or_else(|| field(details_row, "composite_figi"))
        .map(str::to_string);
    record.bloomberg_gid = field(Some(universe_row), "share_class_figi")
        .or_else(|| field(details_row, "share_class_figi"))
        .map(str::to_string);

    record.locale = universe_row
        .get_str("locale")
        .map(|l| l.to_ascii_uppercase());

    // Never sourced: always derived from the CUSIP and the listing country.
    record.isin = match (record.locale.as_deref(), record.cusip.as_deref()) {
        (Some(locale), Some(cusip)) => compute_isin(locale, cusip),
        _ => None,
    };

    let lei_row = sources.lei_registry.get("isin", record.isin.as_deref())?;
    let lei_by_cik = sources.aggregator_leis.get("cik", record.cik.as_deref())?;
    record.lei = field(lei_row, "lei")
        .or_else(|| field(details_row, "lei"))
        .or_else(|| field(lei_by_cik, "lei"))
        .map(str::to_string);

    record.irs_number = field(aggregator_row, "irs_number").map(str::to_string);

    record.asset_class = universe_row.get_str("type").map(str::to_string);
    record.currency_code = universe_row
        .get_str("currency_name")
        .map(|c| c.to_ascii_uppercase());
    record.last_updated = Some(Utc::now());

    record.details = details_row.map(|row| TickerDetails {
        sector: row.get_str("sector").map(str::to_string),
        list_date: row.get_str("list_date").map(str::to_string),
        ceo: row.get_str("ceo").map(str::to_string),
        phone: row.get_str("phone").map(str::to_string),
        employees: row.get("total_employees").and_then(|v| v.as_u64()),
        url: row.get_str("homepage_url").map(str::to_string),
        description: row.get_str("description").map(str::to_string),
        address: row.get_str("address").map(str::to_string),
        state: row.get_str("state").map(str::to_string),
        country: row.get_str("country").map(str::to_string),
    });

    if let Some(mic) = universe_row.get_str("primary_exchange") {
        let exchange_row = sources.exchanges.get("mic", Some(mic))?;
        record.exchange = Some(ExchangeInfo {
            mic: mic.to_string(),
            name: field(exchange_row, "name").map(str::to_string),
            kind: field(exchange_row, "type").map(str::to_string),
            market: field(exchange_row, "market").map(str::to_string),
            tape_id: field(exchange_row, "tape_id").map(str::to_string),
        });
    }

    let sic = field(details_row, "sic_code").or_else(|| field(aggregator_row, "sic"));
    if let Some(sic) = sic {
        let industry_row = sources.aggregator_industries.get("sic", Some(sic))?;
        record.industry = Some(IndustryInfo {
            sic: sic.to_string(),
            sic_classification: field(industry_row, "sic_classification").map(str::to_string),
            naics: field(industry_row, "naics").map(str::to_string),
            naics_classification: field(industry_row, "naics_classification")
                .map(str::to_string),
        });
    }

    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn safe(keys: &[&str], default: &str) -> SourceIndex {
        MultiIndex::safe(keys.iter().copied(), default).unwrap()
    }

    fn empty_sources() -> MappingSources {
        MappingSources {
            tickers: safe(&["ticker"], "ticker"),
            ticker_details: safe(&["ticker"], "ticker"),
            exchanges: safe(&["mic"], "mic"),
            registry_ciks: safe(&["ticker"], "ticker"),
            registry_cusips: safe(&["ticker"], "ticker"),
            aggregator_tickers: safe(&["ticker"], "ticker"),
            aggregator_leis: safe(&["cik"], "cik"),
            aggregator_industries: safe(&["sic"], "sic"),
            lei_registry: safe(&["isin"], "isin"),
        }
    }

    fn apple_universe_row() -> Record {
        Record::new()
            .with("ticker", "AAPL")
            .with("name", "Apple Inc.")
            .with("locale", "us")
            .with("primary_exchange", "XNAS")
            .with("composite_figi", "BBG000B9XRY4")
            .with("type", "CS")
            .with("currency_name", "usd")
    }

    #[test]
    fn test_build_joins_sources_and_derives_isin() {
        let mut sources = empty_sources();
        sources.tickers.insert(apple_universe_row()).unwrap();
        sources
            .ticker_details
            .insert(
                Record::new()
                    .with("ticker", "AAPL")
                    .with("cusip", "037833100")
                    .with("sic_code", "3571"),
            )
            .unwrap();
        sources
            .registry_ciks
            .insert(Record::new().with("ticker", "AAPL").with("cik", "0000320193"))
            .unwrap();
        sources
            .lei_registry
            .insert(
                Record::new()
                    .with("isin", "US0378331005")
                    .with("lei", "HWUPKR0MPOU8FGXBT394"),
            )
            .unwrap();
        sources
            .aggregator_industries
            .insert(
                Record::new()
                    .with("sic", "3571")
                    .with("naics", "334111")
                    .with("sic_classification", "Electronic Computers"),
            )
            .unwrap();

        let mapping = build_ticker_mapping(&sources).unwrap();
        assert_eq!(mapping.len(), 1);

        let record = mapping.get("ticker", Some("AAPL")).unwrap().unwrap();
        assert_eq!(record.name, "Apple Inc.");
        assert_eq!(record.cusip.as_deref(), Some("037833100"));
        assert_eq!(record.cik.as_deref(), Some("320193"));
        assert_eq!(record.isin.as_deref(), Some("US0378331005"));
        assert_eq!(record.lei.as_deref(), Some("HWUPKR0MPOU8FGXBT394"));
        assert_eq!(record.locale.as_deref(), Some("US"));
        assert_eq!(record.currency_code.as_deref(), Some("USD"));
        let industry = record.industry.as_ref().unwrap();
        assert_eq!(industry.naics.as_deref(), Some("334111"));

        // The same record is reachable through every derived identifier.
        assert!(mapping.get("isin", Some("US0378331005")).unwrap().is_some());
        assert!(mapping.get("cik", Some("320193")).unwrap().is_some());
    }

    #[test]
    fn test_registry_cik_beats_vendor_and_aggregator() {
        let mut sources = empty_sources();
        sources.tickers.insert(apple_universe_row()).unwrap();
        sources
            .registry_ciks
            .insert(Record::new().with("ticker", "AAPL").with("cik", "320193"))
            .unwrap();
        sources
            .ticker_details
            .insert(Record::new().with("ticker", "AAPL").with("cik", "999999"))
            .unwrap();
        sources
            .aggregator_tickers
            .insert(Record::new().with("ticker", "AAPL").with("cik", "111111"))
            .unwrap();

        let mapping = build_ticker_mapping(&sources).unwrap();
        let record = mapping.get("ticker", Some("AAPL")).unwrap().unwrap();
        assert_eq!(record.cik.as_deref(), Some("320193"));
    }

    #[test]
    fn test_later_sources_fill_gaps() {
        let mut sources = empty_sources();
        sources.tickers.insert(apple_universe_row()).unwrap();
        // No registry row: the aggregator supplies the CIK instead.
        sources
            .aggregator_tickers
            .insert(
                Record::new()
                    .with("ticker", "AAPL")
                    .with("cik", "0000320193")
                    .with("irs_number", "942404110"),
            )
            .unwrap();

        let mapping = build_ticker_mapping(&sources).unwrap();
        let record = mapping.get("ticker", Some("AAPL")).unwrap().unwrap();
        assert_eq!(record.cik.as_deref(), Some("320193"));
        assert_eq!(record.irs_number.as_deref(), Some("942404110"));
    }

    #[test]
    fn test_missing_fields_are_omitted_not_defaulted() {
        let mut sources = empty_sources();
        sources
            .tickers
            .insert(Record::new().with("ticker", "NEWCO").with("name", "NewCo Inc."))
            .unwrap();

        let mapping = build_ticker_mapping(&sources).unwrap();
        let record = mapping.get("ticker", Some("NEWCO")).unwrap().unwrap();
        assert!(record.cusip.is_none());
        assert!(record.cik.is_none());
        assert!(record.isin.is_none());
        assert!(record.exchange.is_none());
        assert!(record.industry.is_none());
    }

    #[test]
    fn test_unnormalizable_or_nameless_rows_are_skipped() {
        let mut sources = empty_sources();
        sources
            .tickers
            .insert(Record::new().with("ticker", "toolongticker").with("name", "X"))
            .unwrap();
        sources
            .tickers
            .insert(Record::new().with("ticker", "NONAME"))
            .unwrap();
        sources
            .tickers
            .insert(Record::new().with("ticker", "OK").with("name", "Ok Corp"))
            .unwrap();

        let mapping = build_ticker_mapping(&sources).unwrap();
        assert_eq!(mapping.len(), 1);
        assert!(mapping.get("ticker", Some("OK")).unwrap().is_some());
    }

    #[test]
    fn test_identifier_collision_skips_row_and_continues() {
        let mut sources = empty_sources();
        sources.tickers.insert(apple_universe_row()).unwrap();
        // Distinct ticker claiming Apple's CIK; first-come wins.
        sources
            .tickers
            .insert(Record::new().with("ticker", "AAPLX").with("name", "Imposter"))
            .unwrap();
        sources
            .tickers
            .insert(Record::new().with("ticker", "MSFT").with("name", "Microsoft"))
            .unwrap();
        sources
            .registry_ciks
            .insert(Record::new().with("ticker", "AAPL").with("cik", "320193"))
            .unwrap();
        sources
            .registry_ciks
            .insert(Record::new().with("ticker", "AAPLX").with("cik", "0000320193"))
            .unwrap();

        let mapping = build_ticker_mapping(&sources).unwrap();
        assert_eq!(mapping.len(), 2);
        assert!(mapping.get("ticker", Some("AAPLX")).unwrap().is_none());
        assert_eq!(
            mapping
                .get("cik", Some("320193"))
                .unwrap()
                .unwrap()
                .ticker,
            "AAPL"
        );
    }

    #[test]
    fn test_share_class_punctuation_normalizes_before_join() {
        let mut sources = empty_sources();
        sources
            .tickers
            .insert(
                Record::new()
                    .with("ticker", "BRK.B")
                    .with("name", "Berkshire Hathaway Inc."),
            )
            .unwrap();
        // Registry already publishes the stripped form.
        sources
            .registry_ciks
            .insert(Record::new().with("ticker", "BRKB").with("cik", "1067983"))
            .unwrap();

        let mapping = build_ticker_mapping(&sources).unwrap();
        let record = mapping.get("ticker", Some("BRKB")).unwrap().unwrap();
        assert_eq!(record.cik.as_deref(), Some("1067983"));
    }
}
