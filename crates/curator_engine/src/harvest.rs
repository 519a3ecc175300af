use std::collections::HashSet;
use std::time::Duration;

use pipeline_logging::{pipeline_info, pipeline_warn};
use scraper::{Html, Selector};
use url::Url;

use crate::source::{CatalogueSource, WordPressSource};
use crate::{Fetcher, ItemRef, PageRenderer};

/// Result of crawling one source's paginated listing.
///
/// Harvesting never fails outright: a page fetch error ends the crawl early
/// and whatever accumulated so far is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOutcome {
    pub refs: Vec<ItemRef>,
    pub pages_fetched: usize,
}

/// Enumerate every unique item link reachable from a catalogue source's
/// paginated search listing.
///
/// Termination, in order of precedence:
/// - a page fails to load (partial results are kept),
/// - the expected results marker is absent from the page,
/// - a page past the first yields zero links not seen before. Link sets may
///   overlap between adjacent pages, so "zero new" is the stop condition,
///   not "zero total".
pub async fn harvest_catalogue_links(
    renderer: &dyn PageRenderer,
    base_url: &Url,
    source: &CatalogueSource,
) -> HarvestOutcome {
    let mut refs: Vec<ItemRef> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pages_fetched = 0usize;
    let mut page = 1usize;

    loop {
        let page_url = listing_page_url(&source.search_url, page);
        let html = match renderer.load(&page_url).await {
            Ok(html) => html,
            Err(err) => {
                pipeline_warn!("listing page {page} failed ({page_url}): {err}");
                break;
            }
        };
        pages_fetched += 1;

        if let Some(marker) = source.results_marker.as_deref() {
            if !html.contains(marker) {
                pipeline_info!("no results marker on page {page}, end of listing");
                break;
            }
        }

        let mut new_on_page = 0usize;
        for item in extract_item_refs(&html, base_url, &source.item_path_segment) {
            if seen.insert(item.url.clone()) {
                refs.push(item);
                new_on_page += 1;
            }
        }

        if new_on_page == 0 && page > 1 {
            pipeline_info!("page {page} repeats known links, listing exhausted");
            break;
        }

        page += 1;
    }

    pipeline_info!(
        "harvested {} unique item links over {pages_fetched} pages",
        refs.len()
    );
    HarvestOutcome {
        refs,
        pages_fetched,
    }
}

/// Posts collected from a WordPress listing API.
#[derive(Debug, Clone)]
pub struct ApiHarvest {
    pub posts: Vec<serde_json::Value>,
    pub pages_fetched: usize,
    /// True when harvesting stopped because a page failed twice in a row,
    /// rather than because an empty page marked the end of the listing.
    pub aborted: bool,
}

/// Page through a WordPress posts endpoint at a fixed page size.
///
/// Stops on the first empty page. A failed request, or a 200 response whose
/// body is not a JSON post array (maintenance pages, HTML error bodies), is
/// retried once; a second consecutive failure ends harvesting with whatever
/// was accumulated.
pub async fn harvest_api_posts(
    fetcher: &dyn Fetcher,
    source: &WordPressSource,
    page_delay: Duration,
) -> ApiHarvest {
    let mut posts: Vec<serde_json::Value> = Vec::new();
    let mut pages_fetched = 0usize;
    let mut consecutive_failures = 0u32;
    let mut page = 1usize;

    loop {
        let params = [
            ("per_page", source.per_page.to_string()),
            ("page", page.to_string()),
            ("_embed", "wp:term".to_string()),
        ];
        pages_fetched += 1;
        let batch = match fetcher.get_with_params(&source.api_url, &params).await {
            Ok(output) => serde_json::from_slice::<Vec<serde_json::Value>>(&output.bytes)
                .map_err(|err| format!("unparseable response body: {err}")),
            Err(err) => Err(err.to_string()),
        };
        match batch {
            Ok(batch) => {
                consecutive_failures = 0;
                if batch.is_empty() {
                    pipeline_info!("api page {page} is empty, end of listing");
                    break;
                }
                pipeline_info!(
                    "api page {page}: {} posts ({} total so far)",
                    batch.len(),
                    posts.len() + batch.len()
                );
                posts.extend(batch);
                page += 1;
                tokio::time::sleep(page_delay).await;
            }
            Err(message) => {
                consecutive_failures += 1;
                pipeline_warn!(
                    "api page {page} failed (attempt {consecutive_failures}): {message}"
                );
                if consecutive_failures >= 2 {
                    return ApiHarvest {
                        posts,
                        pages_fetched,
                        aborted: true,
                    };
                }
            }
        }
    }

    ApiHarvest {
        posts,
        pages_fetched,
        aborted: false,
    }
}

fn listing_page_url(search_url: &str, page: usize) -> String {
    if page <= 1 {
        return search_url.to_string();
    }
    let separator = if search_url.contains('?') { '&' } else { '?' };
    format!("{search_url}{separator}page={page}")
}

/// Pull every href out of a rendered listing page and keep the ones that
/// look like item detail URLs for this source.
fn extract_item_refs(html: &str, base_url: &Url, item_path_segment: &str) -> Vec<ItemRef> {
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    doc.select(&anchor_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| item_ref_from_href(href, base_url, item_path_segment))
        .collect()
}

/// Accept an href as an item link when it contains the item path segment and
/// ends in an id-bearing segment; pagination and filter links are excluded
/// and query strings stripped so equivalent links dedupe to one ItemRef.
fn item_ref_from_href(href: &str, base_url: &Url, item_path_segment: &str) -> Option<ItemRef> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with("javascript:") || trimmed.starts_with("mailto:") {
        return None;
    }
    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => base_url.join(trimmed).ok()?,
    };
    let query = url.query().unwrap_or("");
    if query.contains("page=") || query.contains("filters=") {
        return None;
    }
    url.set_query(None);

    let text = url.to_string();
    if !text.contains(item_path_segment) {
        return None;
    }
    let canonical = text.trim_end_matches('/').to_string();
    let origin_id = canonical.rsplit('/').next()?.to_string();
    if origin_id.is_empty() || !origin_id.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(ItemRef {
        url: canonical,
        origin_id,
    })
}
