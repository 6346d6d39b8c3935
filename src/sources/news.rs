//! Distro news feed fetching, caching and rendering.

use std::fs;
use std::path::Path;

use super::Result;
use crate::exec::CommandExecutor;
use crate::state::NewsItem;
use crate::util::curl::curl_text;

/// What: Fetch the news feed and render the newest items as text.
///
/// Inputs:
/// - `exec`: Command executor
/// - `feed_url`: RSS feed URL
/// - `cache_path`: File holding the last good feed, if caching is enabled
/// - `limit`: Maximum number of items to render
///
/// Output:
/// - Rendered news text
///
/// # Errors
/// - Returns `Err` when the feed cannot be fetched and no cached copy exists
///
/// Details:
/// - A successful fetch overwrites the cache; a failed one falls back to it
/// - A response without any `<item>` is treated as a failed fetch
pub fn fetch_distro_news(
    exec: &dyn CommandExecutor,
    feed_url: &str,
    cache_path: Option<&Path>,
    limit: usize,
) -> Result<String> {
    let fetched = curl_text(exec, feed_url).and_then(|body| {
        if body.contains("<item>") {
            Ok(body)
        } else {
            Err("news feed contains no items".into())
        }
    });

    match fetched {
        Ok(body) => {
            tracing::info!(bytes = body.len(), "fetched news feed");
            if let Some(path) = cache_path
                && let Err(e) = fs::write(path, &body)
            {
                tracing::warn!(error = %e, path = %path.display(), "failed to write news cache");
            }
            Ok(render_news(&parse_news_feed(&body, limit)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch news feed");
            let cached = cache_path.and_then(|p| fs::read_to_string(p).ok());
            match cached {
                Some(body) => {
                    tracing::info!("rendering cached news feed");
                    Ok(render_news(&parse_news_feed(&body, limit)))
                }
                None => Err(e),
            }
        }
    }
}

/// What: Parse up to `limit` `<item>` blocks from an RSS body.
///
/// Inputs:
/// - `body`: RSS XML text
/// - `limit`: Maximum number of items
///
/// Output:
/// - News items in feed order with `YYYY-MM-DD` dates where parseable
#[must_use]
pub fn parse_news_feed(body: &str, limit: usize) -> Vec<NewsItem> {
    let mut items: Vec<NewsItem> = Vec::new();
    let mut pos = 0;
    while items.len() < limit {
        let Some(start) = body[pos..].find("<item>") else {
            break;
        };
        let s = pos + start;
        let end = body[s..].find("</item>").map_or(body.len(), |e| s + e + 7);
        let chunk = &body[s..end];
        let title = extract_between(chunk, "<title>", "</title>")
            .map(|t| decode_entities(&strip_cdata(&t)))
            .unwrap_or_default();
        let url = extract_between(chunk, "<link>", "</link>")
            .map(|l| l.trim().to_string())
            .unwrap_or_default();
        let raw_date = extract_between(chunk, "<pubDate>", "</pubDate>").unwrap_or_default();
        items.push(NewsItem {
            date: normalize_date(&raw_date),
            title: title.trim().to_string(),
            url,
        });
        pos = end;
    }
    items
}

/// What: Render news items as plain text, one title line plus URL line each.
#[must_use]
pub fn render_news(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return "No news available".to_string();
    }
    items
        .iter()
        .map(|item| format!("{}  {}\n    {}", item.date, item.title, item.url))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substring strictly between the first `start` and the following `end`.
fn extract_between(s: &str, start: &str, end: &str) -> Option<String> {
    let i = s.find(start)? + start.len();
    let j = s[i..].find(end)? + i;
    Some(s[i..j].to_string())
}

/// Unwrap `<![CDATA[...]]>` if present.
fn strip_cdata(s: &str) -> String {
    let t = s.trim();
    t.strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
        .unwrap_or(t)
        .to_string()
}

/// Decode the handful of XML entities the feed uses.
fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// What: Turn an RFC 2822 `pubDate` into `YYYY-MM-DD`.
///
/// Details:
/// - Unparseable dates fall back to the text with time and zone cut off
fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    chrono::DateTime::parse_from_rfc2822(raw).map_or_else(
        |_| strip_time_and_tz(raw),
        |dt| dt.format("%Y-%m-%d").to_string(),
    )
}

/// What: Strip a trailing ` HH:MM:SS` and ` +ZZZZ` from a date string.
fn strip_time_and_tz(s: &str) -> String {
    let mut t = s.trim().to_string();
    if let Some(pos) = t.rfind(" +") {
        t.truncate(pos);
        t = t.trim_end().to_string();
    }
    if t.len() >= 9 {
        let n = t.len();
        let looks_time = t.is_char_boundary(n - 8)
            && t[n - 8..].chars().enumerate().all(|(i, c)| match i {
                2 | 5 => c == ':',
                _ => c.is_ascii_digit(),
            });
        if looks_time && t.as_bytes()[n - 9] == b' ' {
            t.truncate(n - 9);
        }
    }
    t.trim_end().to_string()
}
