//! Paged collection requests
//!
//! Graph returns collections a page at a time:
//!
//! 1. **Initial request**: `GET {path}?$top={page_size}` plus any configured
//!    `$select`, `$expand`, `$filter` and `$orderby`
//! 2. **Follow pages**: each response may carry `@odata.nextLink`, an
//!    absolute URL that already holds every query parameter
//! 3. **Done**: the last page has no `@odata.nextLink`
//!
//! Every page is fetched once and items are returned in page order.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use spbridge_core::{ListOptions, Result};
use tracing::debug;

use crate::client::GraphClient;

/// One page of a Graph collection
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub value: Vec<Map<String, Value>>,
    /// URL for the next page of results (present when more pages exist)
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Fields records are built from; always part of a `$select`
const RECORD_FIELDS: &[&str] = &[
    "id",
    "name",
    "file",
    "folder",
    "createdDateTime",
    "lastModifiedDateTime",
    "webUrl",
    "parentReference",
];

/// `path` with `$top` and the listing options as query parameters
fn first_page(path: &str, page_size: u32, options: &ListOptions) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    let mut url = format!("{path}{separator}$top={page_size}");

    for (name, value) in options.query_pairs() {
        let value = if name == "$select" {
            with_record_fields(value)
        } else {
            value.to_string()
        };
        url.push('&');
        url.push_str(name);
        url.push('=');
        url.push_str(&urlencoding::encode(&value));
    }
    url
}

fn with_record_fields(select: &str) -> String {
    let mut fields: Vec<&str> = select
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    for field in RECORD_FIELDS {
        if !fields.iter().any(|f| f.eq_ignore_ascii_case(field)) {
            fields.push(field);
        }
    }
    fields.join(",")
}

/// Fetches `path` and every following page
///
/// # Errors
/// The first failing page aborts the whole listing.
pub async fn get_all(
    client: &GraphClient,
    path: &str,
    options: &ListOptions,
    resource: &str,
) -> Result<Vec<Map<String, Value>>> {
    let first = first_page(path, client.page_size(), options);

    let request = client.request(Method::GET, &first).await?;
    let mut page: Page = client.send(request, resource).await?.json().await?;
    let mut items = std::mem::take(&mut page.value);

    let mut page_count: u32 = 1;
    while let Some(next_link) = page.next_link.take() {
        page_count += 1;
        debug!(page = page_count, "Following nextLink");

        let request = client.request_url(Method::GET, &next_link).await?;
        page = client.send(request, resource).await?.json().await?;
        items.append(&mut page.value);
    }

    debug!(
        total_items = items.len(),
        total_pages = page_count,
        "Listing complete"
    );
    Ok(items)
}
