//! Paged collection requests
//!
//! `Files` and `Folders` collections usually fit in one response, but large
//! folders are split: each page may carry `odata.nextLink` (an absolute URL
//! with its own skip token) until the last one. Pages are fetched once, in
//! order.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use spbridge_core::Result;
use tracing::debug;

use crate::client::LegacyClient;

/// One page of a `nometadata` collection
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub value: Vec<Map<String, Value>>,
    #[serde(rename = "odata.nextLink", alias = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Fetches `path` and every following page
///
/// # Errors
/// The first failing page aborts the whole listing.
pub async fn get_all(
    client: &LegacyClient,
    path: &str,
    resource: &str,
) -> Result<Vec<Map<String, Value>>> {
    let mut page: Page = client.get_json(path, resource).await?;
    let mut items = std::mem::take(&mut page.value);

    let mut page_count: u32 = 1;
    while let Some(next_link) = page.next_link.take() {
        page_count += 1;
        debug!(page = page_count, "Following odata.nextLink");

        let request = client.request_url(Method::GET, &next_link).await?;
        page = client.send(request, resource).await?.json().await?;
        items.append(&mut page.value);
    }

    debug!(total_items = items.len(), total_pages = page_count, "Listing complete");
    Ok(items)
}
