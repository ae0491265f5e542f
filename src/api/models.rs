//! Wire types for the export API

use serde::{Deserialize, Serialize};

use crate::{Domain, RdsId};

/// Rows per export page. One page covers every codelist seen in practice.
pub const EXPORT_PAGE_SIZE: u32 = 10_000;

/// Response of the enumerations endpoint
#[derive(Debug, Deserialize)]
pub struct Enumerations {
    /// Selectable domains, in display order
    #[serde(default)]
    pub domain: Vec<Domain>,
}

/// Reference data set record from the `rds` listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RdsRecord {
    /// RDS identifier
    pub id: RdsId,
    /// Owning domain key; some records carry none
    #[serde(default)]
    pub domain: Option<String>,
}

/// Response of the token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token
    pub access_token: Option<String>,
}

/// Body of a CSV export request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    delimiter: &'static str,
    codepage: &'static str,
    decimal_separator: &'static str,
    thousand_separator: &'static str,
    date_format: &'static str,
    filename: String,
    container_type: &'static str,
    container_id: String,
    exclude_parent_id: bool,
    page_size: u32,
    page: u32,
    repeat_headers: bool,
    add_labels_for_reference_attribute: bool,
}

impl ExportRequest {
    /// Export of the first page of one codelist as comma-separated UTF-8
    pub fn for_codelist(id: &str, name: &str) -> Self {
        Self {
            delimiter: "COMMA",
            codepage: "UTF8",
            decimal_separator: "COMMA",
            thousand_separator: "DOT",
            date_format: "ISO",
            filename: format!("{name}.csv"),
            container_type: "codelist",
            container_id: id.to_string(),
            exclude_parent_id: true,
            page_size: EXPORT_PAGE_SIZE,
            page: 0,
            repeat_headers: false,
            add_labels_for_reference_attribute: true,
        }
    }
}
