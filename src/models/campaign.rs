//! Campaign model returned by the Google Ads API.

use serde::{Deserialize, Serialize};

/// A campaign as listed by `customers/{id}/campaigns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub resource_name: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    /// Customer account this campaign was fetched from (set locally)
    #[serde(default, skip_deserializing)]
    pub customer_id: String,
}
