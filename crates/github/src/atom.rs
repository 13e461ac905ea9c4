//! Release feed parsing.
//!
//! GitHub publishes every repository's releases as an Atom document at
//! `{html_url}/releases.atom`, newest entry first. Only the fields the digest
//! needs are decoded; everything else in the document is ignored.

use serde::Deserialize;
use tracker::{ReleaseGuid, ReleaseItem, Timestamp};

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Text,
    #[serde(default)]
    title: Option<Text>,
    #[serde(default)]
    published: Option<Text>,
    #[serde(default)]
    updated: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
    #[serde(default)]
    content: Option<Text>,
}

/// Text construct; attributes such as `type="html"` are ignored.
#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

/// Parses an Atom release feed into items, preserving document order.
///
/// Fails if the document is not Atom or any entry lacks a non-empty `<id>`:
/// an entry without an identity cannot be compared against a cursor.
pub fn parse_release_feed(xml: &str) -> Result<Vec<ReleaseItem>, String> {
    let feed: Feed = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;

    feed.entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| {
            let guid = ReleaseGuid::new(entry.id.value.trim())
                .ok_or_else(|| format!("entry {position} has an empty id"))?;
            // Atom only requires <updated>; fall back to it when <published> is absent.
            let published = entry
                .published
                .or(entry.updated)
                .and_then(|t| Timestamp::parse_rfc3339(&t.value));
            let link = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
                .or_else(|| entry.links.first())
                .map(|l| l.href.clone());

            Ok(ReleaseItem {
                guid,
                title: entry.title.map(|t| t.value).unwrap_or_default(),
                link,
                published,
                content: entry.content.map(|c| c.value).unwrap_or_default(),
            })
        })
        .collect()
}
