//! Navigation beacon feed.
//!
//! A published spreadsheet exported as CSV. The first few rows are titles
//! and column headers; the system name sits in a fixed column.

use std::collections::HashSet;
use std::io::Read;

use crate::error::DumpError;
use crate::http::check_response;

/// Where the beacon names live inside the CSV.
#[derive(Debug, Clone, Copy)]
pub struct BeaconLayout {
    pub header_rows: usize,
    pub name_column: usize,
}

/// Download the beacon CSV and extract its system names.
///
/// # Errors
///
/// Returns `DumpError` if the request fails or the CSV is unreadable.
pub async fn fetch_beacon_names(
    client: &reqwest::Client,
    url: &str,
    layout: BeaconLayout,
) -> Result<Vec<String>, DumpError> {
    tracing::info!(%url, "fetching beacon feed");
    let body = check_response(client.get(url).send().await?)
        .await?
        .bytes()
        .await?;
    parse_beacon_csv(body.as_ref(), layout)
}

/// Extract distinct, non-empty names from a beacon CSV, in feed order.
///
/// Rows shorter than `name_column` are skipped.
///
/// # Errors
///
/// Returns [`DumpError::Csv`] if a record cannot be decoded.
pub fn parse_beacon_csv<R: Read>(reader: R, layout: BeaconLayout) -> Result<Vec<String>, DumpError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for record in csv.records().skip(layout.header_rows) {
        let record = record?;
        let Some(name) = record.get(layout.name_column).map(str::trim) else {
            continue;
        };
        if !name.is_empty() && seen.insert(name.to_lowercase()) {
            names.push(name.to_string());
        }
    }
    tracing::debug!(names = names.len(), "beacon feed parsed");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LAYOUT: BeaconLayout = BeaconLayout {
        header_rows: 3,
        name_column: 1,
    };

    #[test]
    fn skips_headers_and_reads_name_column() {
        let csv = "Nav beacons,,\r\nUpdated 2026-01-01,,\r\nOwner,System,Notes\r\nCMDR A,Sol,\r\nCMDR B,Achenar,busy\r\n";
        assert_eq!(
            parse_beacon_csv(csv.as_bytes(), LAYOUT).unwrap(),
            vec!["Sol".to_string(), "Achenar".to_string()]
        );
    }

    #[test]
    fn drops_blank_short_and_duplicate_rows() {
        let csv = "h\nh\nh\nA, Sol \nB,\nC\nD,sol\nE,Lave\n";
        assert_eq!(
            parse_beacon_csv(csv.as_bytes(), LAYOUT).unwrap(),
            vec!["Sol".to_string(), "Lave".to_string()]
        );
    }

    #[test]
    fn only_headers_yields_nothing() {
        assert!(parse_beacon_csv("a,b\nc,d\n".as_bytes(), LAYOUT).unwrap().is_empty());
    }
}
