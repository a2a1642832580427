//! Scraping incidental signals out of agent output
//!
//! Step outputs sometimes contain raw page HTML. Two things are read from
//! it: the id of the generated audio element and any direct audio download
//! link. Neither is needed for the pipeline to succeed.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Attributes of one `<button>` tag, names lower-cased
pub type ButtonAttributes = BTreeMap<String, String>;

/// `data-type` of the history entry the speech app renders for new audio
pub const AUDIO_ITEM_DATA_TYPE: &str = "list-item-trigger-overlay";

/// Extracts download links and button attributes from page text
pub trait PageInspector: Send + Sync {
    /// The first download URL the page exposes
    fn find_download_url(&self, page: &str) -> Option<String>;

    /// Attributes of every button on the page, in document order
    fn find_button_attributes(&self, page: &str) -> Vec<ButtonAttributes>;

    /// Id of the first audio history entry button on the page
    fn find_audio_element_id(&self, page: &str) -> Option<String> {
        self.find_button_attributes(page).into_iter().find_map(|attrs| {
            let is_audio_item = attrs.get("data-type").map(String::as_str) == Some(AUDIO_ITEM_DATA_TYPE);
            attrs
                .get("id")
                .filter(|id| is_audio_item && !id.is_empty())
                .cloned()
        })
    }
}

// literal patterns
#[allow(clippy::expect_used)]
static BUTTON_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<button\b([^>]*)>").expect("button pattern"));
#[allow(clippy::expect_used)]
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern")
});
#[allow(clippy::expect_used)]
static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a>").expect("anchor pattern"));
#[allow(clippy::expect_used)]
static AUDIO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>()]+?\.(?:mp3|wav)\b(?:\?[^\s"'<>(),]*)?"#).expect("audio url pattern")
});

/// [`PageInspector`] built on regular expressions
///
/// Tolerant of the truncated, loosely quoted HTML agents tend to echo back.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegexPageInspector;

impl RegexPageInspector {
    /// Create an inspector
    pub fn new() -> Self {
        Self
    }
}

fn parse_attributes(raw: &str) -> ButtonAttributes {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

fn is_http(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl PageInspector for RegexPageInspector {
    fn find_download_url(&self, page: &str) -> Option<String> {
        let from_button = self.find_button_attributes(page).into_iter().find_map(|attrs| {
            attrs
                .into_iter()
                .find(|(name, value)| name.contains("download") && is_http(value))
                .map(|(_, value)| value)
        });
        if from_button.is_some() {
            return from_button;
        }

        let from_link = ANCHOR.captures_iter(page).find_map(|caps| {
            if !caps[2].to_lowercase().contains("download") {
                return None;
            }
            parse_attributes(&caps[1])
                .remove("href")
                .filter(|href| is_http(href))
        });
        if from_link.is_some() {
            return from_link;
        }

        AUDIO_URL.find(page).map(|m| m.as_str().to_string())
    }

    fn find_button_attributes(&self, page: &str) -> Vec<ButtonAttributes> {
        BUTTON_TAG
            .captures_iter(page)
            .map(|caps| parse_attributes(&caps[1]))
            .collect()
    }
}
