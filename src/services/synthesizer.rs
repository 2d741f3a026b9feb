//! Heuristic tag synthesis.
//!
//! Derives a subject keyword and a brand name from the extracted signals and
//! builds three differently-angled tag sets from fixed templates. Pure and
//! deterministic: the same record and URL always give the same result.

use crate::models::{
    metadata::MetadataRecord,
    optimization::{DESCRIPTION_LIMIT, OptimizationResult, OptimizedVariation, TITLE_LIMIT},
};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

const ELLIPSIS: char = '…';
const KEYWORD_LIMIT: usize = 50;

const TITLE_MIN: usize = 20;
const DESCRIPTION_MIN: usize = 50;

/// A trailing " | Brand" / " - Brand" style suffix of up to 30 characters.
static BRAND_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[|–—-]\s*.{1,30}$").expect("brand suffix regex"));

/// Build the heuristic `OptimizationResult` for `record`.
pub fn synthesize(record: &MetadataRecord, url: &str) -> OptimizationResult {
    let keyword = extract_keyword(record);
    let brand = extract_brand(url);

    let variations = vec![
        keyword_focused(&keyword, &brand),
        benefit_driven(&keyword, &brand),
        action_oriented(&keyword, &brand),
    ];

    OptimizationResult {
        original: record.clone(),
        variations,
        reasoning: compose_reasoning(&identify_issues(record)),
    }
}

/// Brand name from the URL host: `www.acme.co.uk` gives `Acme`.
pub fn extract_brand(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|h| !h.is_empty());
    let domain = match host.as_deref() {
        Some(h) => h.strip_prefix("www.").unwrap_or(h).to_string(),
        None => url.to_string(),
    };

    let label = domain.split('.').next().filter(|l| !l.is_empty());
    capitalize(label.unwrap_or(domain.as_str()))
}

/// Subject keyword: first of h1, title, og:title, minus any brand suffix,
/// lowercased and capped. Empty when none of them is present.
pub fn extract_keyword(record: &MetadataRecord) -> String {
    let Some(raw) = record
        .h1
        .as_deref()
        .or(record.title.as_deref())
        .or(record.og_title.as_deref())
    else {
        return String::new();
    };

    BRAND_SUFFIX
        .replace(raw, "")
        .trim()
        .to_lowercase()
        .chars()
        .take(KEYWORD_LIMIT)
        .collect()
}

/// Shorten `s` to at most `limit` characters without splitting a word.
///
/// Cuts to `limit - 1` characters, drops the trailing partial word together
/// with the whitespace before it, then appends an ellipsis.
pub fn truncate(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        return s.to_string();
    }

    let cut: String = s.chars().take(limit.saturating_sub(1)).collect();
    let kept = match cut.rfind(char::is_whitespace) {
        Some(idx) => cut[..idx].trim_end(),
        None => cut.as_str(),
    };

    format!("{kept}{ELLIPSIS}")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn variation(title: String, description: String, og_image: String) -> OptimizedVariation {
    OptimizedVariation {
        title: truncate(&title, TITLE_LIMIT),
        meta_description: truncate(&description, DESCRIPTION_LIMIT),
        og_image_suggestion: og_image,
    }
}

fn keyword_focused(keyword: &str, brand: &str) -> OptimizedVariation {
    let (title, description) = if keyword.is_empty() {
        (
            format!("{brand} — Official Website"),
            format!(
                "Visit {brand} for expert content, resources, and guides. Explore our website today."
            ),
        )
    } else {
        (
            format!("{} — {brand} | Official Guide", capitalize(keyword)),
            format!(
                "Discover everything about {keyword}. {brand} offers expert insights, guides, and resources. Learn more today."
            ),
        )
    };
    let subject = if keyword.is_empty() { brand } else { keyword };

    variation(
        title,
        description,
        format!(
            "Clean hero image featuring \"{subject}\" as large heading text with brand colors on a professional background."
        ),
    )
}

fn benefit_driven(keyword: &str, brand: &str) -> OptimizedVariation {
    let (title, description, og_image) = if keyword.is_empty() {
        (
            format!("{brand} — Your Trusted Resource"),
            format!(
                "Get the latest insights from {brand}. Trusted by thousands. Start exploring our curated content now."
            ),
            format!("Benefits-focused infographic showing key value propositions with {brand} branding."),
        )
    } else {
        (
            format!("Learn {} — Expert Tips & Resources", capitalize(keyword)),
            format!(
                "Get the latest insights about {keyword} from {brand}. Trusted by thousands. Start exploring our curated content now."
            ),
            format!(
                "Benefits-focused infographic showing key value propositions about {keyword} with {brand} branding."
            ),
        )
    };

    variation(title, description, og_image)
}

fn action_oriented(keyword: &str, brand: &str) -> OptimizedVariation {
    let (title, description) = if keyword.is_empty() {
        (
            format!("Get Started with {brand} Today"),
            format!(
                "Explore what {brand} has to offer. Get started today — discover expert resources and insights."
            ),
        )
    } else {
        (
            format!("{} — Get Started with {brand}", capitalize(keyword)),
            format!(
                "Ready to master {keyword}? {brand} has everything you need. Start now — it's free."
            ),
        )
    };
    let subject = if keyword.is_empty() { brand } else { keyword };

    variation(
        title,
        description,
        format!(
            "Bold call-to-action graphic with \"Get Started\" button, {subject} text, and energetic brand colors."
        ),
    )
}

/// Diagnose the original record against fixed length thresholds.
pub fn identify_issues(record: &MetadataRecord) -> Vec<String> {
    let mut issues = Vec::new();

    match record.title.as_deref().map(|t| t.chars().count()) {
        None => issues.push("Missing title tag".to_string()),
        Some(len) if len > TITLE_LIMIT => {
            issues.push(format!("Title too long ({len}/{TITLE_LIMIT} chars)"))
        }
        Some(len) if len < TITLE_MIN => {
            issues.push(format!("Title too short ({len}/{TITLE_LIMIT} chars)"))
        }
        Some(_) => {}
    }

    match record.meta_description.as_deref().map(|d| d.chars().count()) {
        None => issues.push("Missing meta description".to_string()),
        Some(len) if len > DESCRIPTION_LIMIT => issues.push(format!(
            "Description too long ({len}/{DESCRIPTION_LIMIT} chars)"
        )),
        Some(len) if len < DESCRIPTION_MIN => issues.push(format!(
            "Description too short ({len}/{DESCRIPTION_LIMIT} chars)"
        )),
        Some(_) => {}
    }

    let presence = [
        (&record.og_image, "Missing og:image tag"),
        (&record.og_title, "Missing og:title tag"),
        (&record.og_description, "Missing og:description tag"),
        (&record.canonical, "Missing canonical URL"),
    ];
    for (field, message) in presence {
        if field.is_none() {
            issues.push(message.to_string());
        }
    }

    issues
}

fn compose_reasoning(issues: &[String]) -> String {
    let plural = if issues.len() == 1 { "" } else { "s" };
    let list = if issues.is_empty() {
        "None — tags look solid.".to_string()
    } else {
        issues.join("; ")
    };
    format!(
        "Rule-based optimization (no API key required). {} issue{plural} found: {list}",
        issues.len()
    )
}
