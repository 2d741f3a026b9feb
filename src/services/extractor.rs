//! Tag extraction: raw HTML in, `MetadataRecord` out.
//!
//! Parsing is tolerant. Malformed or partial documents simply yield absent
//! fields; this module has no error path.

use crate::models::metadata::{MetadataRecord, clean_value};
use scraper::{ElementRef, Html, Selector};

/// Parse `html` and pull out the SEO tags.
///
/// For every field the first matching element wins, even if its value turns
/// out to be blank (the field is then absent).
pub fn extract_metadata(html: &str, url: &str) -> MetadataRecord {
    let doc = Html::parse_document(html);

    MetadataRecord {
        url: url.to_string(),
        title: first_text(&doc, "title"),
        meta_description: meta_content(&doc, "name", "description"),
        og_image: meta_content(&doc, "property", "og:image"),
        og_title: meta_content(&doc, "property", "og:title"),
        og_description: meta_content(&doc, "property", "og:description"),
        canonical: canonical_href(&doc),
        h1: first_text(&doc, "h1"),
    }
}

fn select_all<'a>(doc: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => doc.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    select_all(doc, selector)
        .into_iter()
        .next()
        .and_then(|el| clean_value(&normalize_text(&el.text().collect::<String>())))
}

fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `content` of the first `<meta {key}="{value}">`, attribute value compared
/// case-insensitively.
fn meta_content(doc: &Html, key: &str, value: &str) -> Option<String> {
    select_all(doc, "meta")
        .into_iter()
        .find(|el| {
            el.value()
                .attr(key)
                .is_some_and(|attr| attr.trim().eq_ignore_ascii_case(value))
        })
        .and_then(|el| el.value().attr("content").and_then(clean_value))
}

fn canonical_href(doc: &Html) -> Option<String> {
    select_all(doc, "link")
        .into_iter()
        .find(|el| {
            el.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("canonical"))
            })
        })
        .and_then(|el| el.value().attr("href").and_then(clean_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAGE: &str = r#"<!doctype html>
<html>
  <head>
    <title>
      Best Running Shoes | Acme
    </title>
    <meta name="Description" content="  Lightweight trainers for every distance.  ">
    <meta property="og:image" content="https://acme.com/og.png">
    <meta property="OG:TITLE" content="Acme Running">
    <meta property="og:description" content="Run further.">
    <link rel="stylesheet" href="/site.css">
    <link rel="canonical" href=" https://acme.com/shoes ">
  </head>
  <body>
    <h1>Best
        <em>Running</em> Shoes</h1>
    <h1>Second heading</h1>
  </body>
</html>"#;

    #[test]
    fn extracts_every_field() {
        let record = extract_metadata(FULL_PAGE, "https://acme.com/shoes");

        assert_eq!(record.url, "https://acme.com/shoes");
        assert_eq!(record.title.as_deref(), Some("Best Running Shoes | Acme"));
        assert_eq!(
            record.meta_description.as_deref(),
            Some("Lightweight trainers for every distance.")
        );
        assert_eq!(record.og_image.as_deref(), Some("https://acme.com/og.png"));
        assert_eq!(record.og_title.as_deref(), Some("Acme Running"));
        assert_eq!(record.og_description.as_deref(), Some("Run further."));
        assert_eq!(record.canonical.as_deref(), Some("https://acme.com/shoes"));
        assert_eq!(record.h1.as_deref(), Some("Best Running Shoes"));
    }

    #[test]
    fn whitespace_only_description_is_absent() {
        let html = r#"<html><head><meta name="description" content="   "></head></html>"#;
        let record = extract_metadata(html, "https://acme.com");

        assert_eq!(record.meta_description, None);
    }

    #[test]
    fn first_match_wins_even_when_blank() {
        let html = r#"<head>
            <meta property="og:title" content="">
            <meta property="og:title" content="Later">
        </head>"#;
        let record = extract_metadata(html, "https://acme.com");

        assert_eq!(record.og_title, None);
    }

    #[test]
    fn malformed_html_yields_absent_fields() {
        let record = extract_metadata("<html><head><title></title><meta name=", "https://x.io");

        assert_eq!(record.title, None);
        assert_eq!(record.meta_description, None);
        assert_eq!(record.h1, None);
        assert!(!record.has_signal());
    }

    #[test]
    fn url_shaped_fields_are_passed_through() {
        let html = r#"<link rel="canonical" href="not a url"><meta property="og:image" content="::bad::">"#;
        let record = extract_metadata(html, "https://acme.com");

        assert_eq!(record.canonical.as_deref(), Some("not a url"));
        assert_eq!(record.og_image.as_deref(), Some("::bad::"));
    }

    #[test]
    fn bare_title_page() {
        let record = extract_metadata("<title>Example Domain</title>", "https://example.com");

        assert_eq!(record.title.as_deref(), Some("Example Domain"));
        assert_eq!(record.meta_description, None);
        assert_eq!(record.og_image, None);
        assert_eq!(record.og_title, None);
        assert_eq!(record.og_description, None);
        assert_eq!(record.canonical, None);
        assert_eq!(record.h1, None);
    }
}
