//! XML product feed source.
//!
//! A feed is any XML document whose product records are elements named
//! `product`, `urun` or `item` (any case). Each record's child elements and
//! attributes become the fields of one [`SourceRow`]:
//!
//! ```xml
//! <urunler>
//!   <urun id="42">
//!     <urun_adi>Zeytinyağlı Sabun</urun_adi>
//!     <fiyat>89,90</fiyat>
//!     <stok>25</stok>
//!     <kategori>Kişisel Bakım</kategori>
//!     <gorsel><![CDATA[https://cdn.example.com/sabun.jpg]]></gorsel>
//!   </urun>
//! </urunler>
//! ```

use reqwest::header::ACCEPT;
use roxmltree::{Document, Node};
use url::Url;

use super::ImportError;
use super::row::{CellValue, SourceRow};

/// Element names that mark a product record.
pub const RECORD_TAGS: &[&str] = &["product", "urun", "item"];

fn is_record(node: &Node<'_, '_>) -> bool {
    node.is_element()
        && RECORD_TAGS
            .iter()
            .any(|tag| node.tag_name().name().eq_ignore_ascii_case(tag))
}

/// First non-blank text under `node`, CDATA included.
fn first_text(node: &Node<'_, '_>) -> Option<String> {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(String::from)
}

/// Parse a feed document into rows.
///
/// Records nested inside another record (e.g. `<item>` inside a
/// `<product>`'s variants) are not treated as separate rows.
///
/// # Errors
///
/// Returns `ImportError::Xml` if the document is not well-formed.
pub fn parse_feed(xml: &str) -> Result<Vec<SourceRow>, ImportError> {
    let doc = Document::parse(xml)?;

    let rows = doc
        .descendants()
        .filter(is_record)
        .filter(|node| !node.ancestors().skip(1).any(|a| is_record(&a)))
        .map(|record| {
            let mut row = SourceRow::new();
            for attr in record.attributes() {
                row.insert(attr.name(), CellValue::Text(attr.value().to_string()));
            }
            for child in record.children().filter(Node::is_element) {
                if let Some(text) = first_text(&child) {
                    row.insert(child.tag_name().name(), CellValue::Text(text));
                }
            }
            row
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(rows)
}

/// Validate a feed URL. Only `http` and `https` are fetched.
///
/// # Errors
///
/// Returns `ImportError::InvalidUrl` for unparseable URLs or other schemes.
pub fn parse_feed_url(raw: &str) -> Result<Url, ImportError> {
    let url = Url::parse(raw.trim()).map_err(|e| ImportError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ImportError::InvalidUrl(format!(
            "unsupported scheme '{other}'"
        ))),
    }
}

/// Download a feed document of at most `max_bytes`.
///
/// The client's own timeout applies. The body is read chunk by chunk and
/// abandoned as soon as it passes the limit, whatever `Content-Length` says.
///
/// # Errors
///
/// Returns `ImportError::Fetch` on transport errors,
/// `ImportError::FetchStatus` for non-success responses,
/// `ImportError::FeedTooLarge` past the limit and `ImportError::FeedEncoding`
/// for a body that is not UTF-8.
#[tracing::instrument(skip(client), fields(url = %url))]
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &Url,
    max_bytes: usize,
) -> Result<String, ImportError> {
    let mut response = client
        .get(url.clone())
        .header(ACCEPT, "application/xml, text/xml, */*")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImportError::FetchStatus(status.as_u16()));
    }

    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if response.content_length().is_some_and(|len| len > limit) {
        return Err(ImportError::FeedTooLarge(max_bytes));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len().saturating_add(chunk.len()) > max_bytes {
            tracing::warn!(max_bytes, "Feed exceeded size limit");
            return Err(ImportError::FeedTooLarge(max_bytes));
        }
        body.extend_from_slice(&chunk);
    }

    tracing::debug!(bytes = body.len(), "Fetched product feed");
    String::from_utf8(body).map_err(|_| ImportError::FeedEncoding)
}
