use std::collections::BTreeMap;

use pipeline_logging::pipeline_warn;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{AssetCandidate, ItemRef, MediaKind};

/// Caption assigned to audio candidates with no resolvable figcaption.
/// The classifier treats an exact match as implicit acceptance.
pub const UNTITLED_AUDIO_CAPTION: &str = "Untitled Audio";

/// Structured output of the extraction stage for one item, before
/// classification and download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub origin_id: String,
    pub url: String,
    pub title: String,
    /// Label/value rows, keys lower-cased and underscore-joined.
    pub metadata: BTreeMap<String, String>,
    /// Tag-stripped free text of the item body.
    pub body_text: String,
    pub candidates: Vec<AssetCandidate>,
    pub tags: Vec<String>,
    pub date_published: Option<String>,
}

/// Extract one catalogue item from its rendered detail page.
///
/// The origin id prefers an accession-number style metadata row over the
/// URL's trailing segment, matching how catalogue records are cited.
pub fn extract_catalogue_item(html: &str, item: &ItemRef, base_url: &Url) -> ExtractedItem {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, "h1")
        .or_else(|| first_text(&doc, "h2"))
        .unwrap_or_else(|| "Untitled".to_string());

    let metadata = extract_metadata_rows(&doc);
    let origin_id = metadata
        .get("accession_number")
        .or_else(|| metadata.get("idno"))
        .cloned()
        .unwrap_or_else(|| item.origin_id.clone());

    ExtractedItem {
        origin_id,
        url: item.url.clone(),
        title,
        body_text: body_text(&doc),
        candidates: collect_candidates(&doc, base_url),
        metadata,
        tags: Vec::new(),
        date_published: None,
    }
}

/// Extract one item from a WordPress REST post object.
///
/// Returns `None` when the post has no id or link; anything else missing
/// degrades to empty fields.
pub fn extract_wp_post(post: &serde_json::Value, base_url: &Url) -> Option<ExtractedItem> {
    let origin_id = post.get("id")?.as_i64()?.to_string();
    let url = post.get("link")?.as_str()?.to_string();

    let title_html = post
        .pointer("/title/rendered")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let title_doc = Html::parse_fragment(title_html);
    let mut title = fragment_text(&title_doc).join(" ").trim().to_string();
    if title.is_empty() {
        title = "Untitled".to_string();
    }

    let content_html = post
        .pointer("/content/rendered")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let content_doc = Html::parse_fragment(content_html);

    Some(ExtractedItem {
        origin_id,
        url,
        title,
        metadata: BTreeMap::new(),
        body_text: fragment_text(&content_doc).join("\n"),
        candidates: collect_candidates(&content_doc, base_url),
        tags: embedded_tags(post),
        date_published: post.get("date").and_then(|v| v.as_str()).map(String::from),
    })
}

/// Gather image and audio candidates in document order.
///
/// Images come from `<figure>` groups that carry a `<figcaption>`; figures
/// without a caption cannot be classified and are skipped. Audio elements
/// need a playable `.mp3`/`.ogg` source; their caption comes from an
/// enclosing figure when present, else the placeholder. Candidates without a
/// resolvable URL are dropped here.
fn collect_candidates(doc: &Html, base_url: &Url) -> Vec<AssetCandidate> {
    let mut candidates = Vec::new();
    let mut index = 0usize;

    let (Ok(figure_sel), Ok(caption_sel), Ok(img_sel), Ok(audio_sel)) = (
        Selector::parse("figure"),
        Selector::parse("figcaption"),
        Selector::parse("img"),
        Selector::parse("audio[src]"),
    ) else {
        return candidates;
    };

    for figure in doc.select(&figure_sel) {
        let Some(caption) = figure
            .select(&caption_sel)
            .next()
            .map(|c| element_text(&c))
            .filter(|c| !c.is_empty())
        else {
            continue;
        };
        let Some(src) = figure.select(&img_sel).next().and_then(|img| {
            img.value()
                .attr("src")
                .and_then(|src| resolve_url(src, base_url))
        }) else {
            continue;
        };
        candidates.push(AssetCandidate {
            url: src,
            caption,
            index,
            kind: MediaKind::Image,
        });
        index += 1;
    }

    for audio in doc.select(&audio_sel) {
        let Some(src) = audio.value().attr("src") else {
            continue;
        };
        if !playable_audio_source(src) {
            continue;
        }
        let Some(url) = resolve_url(src, base_url) else {
            pipeline_warn!("audio source did not resolve: {src}");
            continue;
        };
        let caption = enclosing_figure_caption(audio, &caption_sel)
            .unwrap_or_else(|| UNTITLED_AUDIO_CAPTION.to_string());
        candidates.push(AssetCandidate {
            url,
            caption,
            index,
            kind: MediaKind::Audio,
        });
        index += 1;
    }

    candidates
}

/// Label/value rows from `table tr` (`th`/`td`) and `dl` (`dt`/`dd`) pairs.
fn extract_metadata_rows(doc: &Html) -> BTreeMap<String, String> {
    let mut rows = BTreeMap::new();

    if let (Ok(tr_sel), Ok(th_sel), Ok(td_sel)) = (
        Selector::parse("table tr"),
        Selector::parse("th"),
        Selector::parse("td"),
    ) {
        for row in doc.select(&tr_sel) {
            let key = row.select(&th_sel).next().map(|e| element_text(&e));
            let value = row.select(&td_sel).next().map(|e| element_text(&e));
            if let (Some(key), Some(value)) = (key, value) {
                insert_row(&mut rows, &key, value);
            }
        }
    }

    if let (Ok(dl_sel), Ok(dt_sel), Ok(dd_sel)) = (
        Selector::parse("dl"),
        Selector::parse("dt"),
        Selector::parse("dd"),
    ) {
        for dl in doc.select(&dl_sel) {
            let keys: Vec<String> = dl.select(&dt_sel).map(|e| element_text(&e)).collect();
            let values: Vec<String> = dl.select(&dd_sel).map(|e| element_text(&e)).collect();
            for (key, value) in keys.into_iter().zip(values) {
                insert_row(&mut rows, &key, value);
            }
        }
    }

    rows
}

fn insert_row(rows: &mut BTreeMap<String, String>, key: &str, value: String) {
    let key = key
        .trim()
        .trim_end_matches(':')
        .to_lowercase()
        .replace(' ', "_");
    let value = value.trim().to_string();
    if !key.is_empty() && !value.is_empty() {
        rows.insert(key, value);
    }
}

fn playable_audio_source(src: &str) -> bool {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".mp3") || lower.ends_with(".ogg")
}

fn enclosing_figure_caption(
    audio: ElementRef<'_>,
    caption_sel: &Selector,
) -> Option<String> {
    for ancestor in audio.ancestors() {
        let Some(element) = ElementRef::wrap(ancestor) else {
            continue;
        };
        if element.value().name() == "figure" {
            return element
                .select(caption_sel)
                .next()
                .map(|c| element_text(&c))
                .filter(|c| !c.is_empty());
        }
    }
    None
}

fn resolve_url(reference: &str, base: &Url) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.join(trimmed).ok().map(Url::into)
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty())
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn body_text(doc: &Html) -> String {
    let Ok(body_sel) = Selector::parse("body") else {
        return String::new();
    };
    match doc.select(&body_sel).next() {
        Some(body) => text_lines(body.text()),
        None => String::new(),
    }
}

fn fragment_text(doc: &Html) -> Vec<String> {
    doc.root_element()
        .text()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn text_lines<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Post tags embedded by the `_embed=wp:term` query parameter.
fn embedded_tags(post: &serde_json::Value) -> Vec<String> {
    let mut tags = Vec::new();
    let Some(term_lists) = post.pointer("/_embedded/wp:term").and_then(|v| v.as_array()) else {
        return tags;
    };
    for term_list in term_lists {
        let Some(terms) = term_list.as_array() else {
            continue;
        };
        for term in terms {
            if term.get("taxonomy").and_then(|v| v.as_str()) == Some("post_tag") {
                if let Some(name) = term.get("name").and_then(|v| v.as_str()) {
                    if !tags.iter().any(|t| t == name) {
                        tags.push(name.to_string());
                    }
                }
            }
        }
    }
    tags
}
