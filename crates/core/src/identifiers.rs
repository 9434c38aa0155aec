//! Identifier normalization and derivation.
//!
//! Pure functions shared by every connector and by the mapping builder:
//! the ticker acceptance filter, CIK canonicalization, and ISIN check-digit
//! derivation from a CUSIP plus country code.

/// Canonicalize an exchange ticker symbol.
///
/// Hyphens and periods (share-class suffixes like `BRK.B`) are stripped.
/// The result is rejected when empty, longer than five characters, or when
/// anything other than uppercase ASCII letters and digits remains. Every
/// source connector applies this filter before a ticker enters an index.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| *c != '-' && *c != '.').collect();
    if stripped.is_empty() || stripped.len() > 5 {
        return None;
    }
    if !stripped
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return None;
    }
    Some(stripped)
}

/// Canonicalize an SEC CIK to its numeric string form.
///
/// Leading zeros are stripped so `"0000320193"` and `"320193"` compare
/// equal as index keys. Idempotent: normalizing an already-normalized CIK
/// returns it unchanged.
pub fn normalize_cik(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let stripped = trimmed.trim_start_matches('0');
    if stripped.is_empty() {
        Some("0".to_string())
    } else {
        Some(stripped.to_string())
    }
}

/// Derive the 12-character ISIN for a CUSIP listed under `country_code`.
///
/// Letters in the country code and CUSIP expand to their numeric codes
/// (A=10 .. Z=35); the Luhn check digit over the expanded payload becomes
/// the final character. `compute_isin("US", "037833100")` yields
/// `US0378331005` (Apple Inc.).
pub fn compute_isin(country_code: &str, cusip: &str) -> Option<String> {
    let country = country_code.trim().to_ascii_uppercase();
    if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let cusip = cusip.trim().to_ascii_uppercase();
    if cusip.len() != 9 || !cusip.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let payload = expand_letters(&format!("{country}{cusip}"));
    let digit = luhn_check_digit(&payload)?;
    Some(format!("{country}{cusip}{digit}"))
}

/// Luhn mod-10 check digit over a numeric payload.
pub fn luhn_check_digit(payload: &str) -> Option<u8> {
    if payload.is_empty() || !payload.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let sum: u32 = payload
        .chars()
        .rev()
        .enumerate()
        .map(|(i, c)| {
            let digit = c.to_digit(10).unwrap_or(0);
            if i % 2 == 0 {
                let doubled = digit * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                digit
            }
        })
        .sum();
    Some(((10 - (sum % 10)) % 10) as u8)
}

/// Expand letters to their two-digit alphabet codes, digits unchanged.
fn expand_letters(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 2);
    for c in input.chars() {
        if c.is_ascii_alphabetic() {
            let code = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 10;
            out.push_str(&code.to_string());
        } else {
            out.push(c);
        }
    }
    out
}
