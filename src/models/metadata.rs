//! The SEO metadata extracted from a single page.

use serde::{Deserialize, Deserializer, Serialize};

/// SEO-relevant tags of one analyzed URL.
///
/// Every optional field is either a trimmed, non-empty string or `None`.
/// Blank values never survive construction or deserialization.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    /// Scheme-normalized URL the record was fetched from.
    pub url: String,

    /// Text of the first `<title>` element.
    #[serde(default, deserialize_with = "non_blank")]
    pub title: Option<String>,

    /// `content` of `<meta name="description">`.
    #[serde(default, deserialize_with = "non_blank")]
    pub meta_description: Option<String>,

    /// `content` of `<meta property="og:image">`.
    #[serde(default, deserialize_with = "non_blank")]
    pub og_image: Option<String>,

    /// `content` of `<meta property="og:title">`.
    #[serde(default, deserialize_with = "non_blank")]
    pub og_title: Option<String>,

    /// `content` of `<meta property="og:description">`.
    #[serde(default, deserialize_with = "non_blank")]
    pub og_description: Option<String>,

    /// `href` of `<link rel="canonical">`.
    #[serde(default, deserialize_with = "non_blank")]
    pub canonical: Option<String>,

    /// Text of the first `<h1>` element.
    #[serde(default, deserialize_with = "non_blank")]
    pub h1: Option<String>,
}

impl MetadataRecord {
    /// True when at least one of title, meta description or og:image is present.
    ///
    /// The fetcher only accepts a strategy's result when this holds.
    pub fn has_signal(&self) -> bool {
        self.title.is_some() || self.meta_description.is_some() || self.og_image.is_some()
    }
}

/// Trim a raw value and collapse blank input to `None`.
pub fn clean_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(clean_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_deserialize_as_absent() {
        let record: MetadataRecord = serde_json::from_str(
            r#"{"url":"https://acme.com","title":"  Acme  ","metaDescription":"   ","ogImage":null}"#,
        )
        .unwrap();

        assert_eq!(record.title.as_deref(), Some("Acme"));
        assert_eq!(record.meta_description, None);
        assert_eq!(record.og_image, None);
        assert_eq!(record.h1, None);
    }

    #[test]
    fn absent_fields_serialize_as_null() {
        let record = MetadataRecord {
            url: "https://acme.com".into(),
            title: Some("Acme".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["title"], "Acme");
        assert!(json["metaDescription"].is_null());
        assert!(json["ogDescription"].is_null());
    }

    #[test]
    fn signal_requires_title_description_or_image() {
        let mut record = MetadataRecord {
            url: "https://acme.com".into(),
            h1: Some("Heading".into()),
            canonical: Some("https://acme.com/".into()),
            ..Default::default()
        };
        assert!(!record.has_signal());

        record.og_image = Some("https://acme.com/og.png".into());
        assert!(record.has_signal());
    }
}
