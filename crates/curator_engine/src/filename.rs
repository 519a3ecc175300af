const MAX_BASENAME_LEN: usize = 100;

/// Collision-free asset filename:
/// `{source_id}_{item_id}_{index}_{millis}_{sanitized basename}`.
///
/// The index disambiguates siblings within one item, the millisecond
/// timestamp disambiguates across items and runs. Two independent runs over
/// the same source produce distinct names; re-runs do not deduplicate.
pub fn asset_filename(
    source_id: &str,
    item_id: &str,
    index: usize,
    timestamp_ms: i64,
    original_url: &str,
) -> String {
    let base = sanitize_basename(url_basename(original_url));
    format!(
        "{}_{}_{}_{}_{}",
        source_id,
        safe_item_id(item_id),
        index,
        timestamp_ms,
        base
    )
}

/// Item ids can be accession numbers with dots, slashes and spaces; map them
/// to a filesystem-safe form.
pub fn safe_item_id(id: &str) -> String {
    let cleaned: String = id
        .trim()
        .chars()
        .map(|c| match c {
            '.' | ' ' => '_',
            '/' | '\\' => '-',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Lower-case, dash-joined, stripped of anything outside `[a-z0-9._-]`,
/// capped in length. Empty results fall back to `"asset"` so the composed
/// filename never ends in a bare underscore.
pub fn sanitize_basename(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut prev_dash = false;
    for c in name.trim().to_lowercase().chars() {
        let mapped = if c.is_whitespace() { '-' } else { c };
        match mapped {
            'a'..='z' | '0'..='9' | '.' | '_' => {
                cleaned.push(mapped);
                prev_dash = false;
            }
            '-' => {
                if !prev_dash {
                    cleaned.push('-');
                }
                prev_dash = true;
            }
            _ => {}
        }
    }
    let cleaned = cleaned.trim_matches(['-', '.', '_']).to_string();
    if cleaned.is_empty() {
        return "asset".to_string();
    }
    let mut capped = cleaned;
    if capped.len() > MAX_BASENAME_LEN {
        let cut = (0..=MAX_BASENAME_LEN)
            .rev()
            .find(|i| capped.is_char_boundary(*i))
            .unwrap_or(0);
        capped.truncate(cut);
    }
    capped
}

/// Final path segment of a URL, query and fragment stripped.
fn url_basename(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
}
