use serde::{Deserialize, Serialize};

/// A live channel as returned by the catalog's per-category endpoint.
///
/// Records are rebuilt from every response and never persisted. The
/// catalog guarantees no identifier, so `channel_name` doubles as the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub channel_name: String,
    /// Logo / poster image URL.
    #[serde(default)]
    pub logo: String,
    /// Category label. The endpoint spells the field `catagory`; the
    /// correctly spelled `category` is still accepted on input.
    #[serde(default, rename = "catagory", alias = "category")]
    pub category: String,
    /// Playable media URL: a direct file or a segmented-stream manifest.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_key: Option<String>,
}

/// What kind of media the playable URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// HLS manifest (`.m3u8`).
    Segmented,
    /// MPEG-DASH manifest (`.mpd`).
    Dash,
    /// Anything else: progressive file or raw transport stream.
    Direct,
}

impl StreamKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Segmented => "HLS",
            Self::Dash => "DASH",
            Self::Direct => "direct",
        }
    }
}

impl Channel {
    pub fn key(&self) -> &str {
        &self.channel_name
    }

    pub fn stream_kind(&self) -> StreamKind {
        let path = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if path.ends_with(".m3u8") {
            StreamKind::Segmented
        } else if path.ends_with(".mpd") {
            StreamKind::Dash
        } else {
            StreamKind::Direct
        }
    }

    /// The license key, ignoring blank strings the endpoint sometimes sends.
    pub fn license(&self) -> Option<&str> {
        self.license_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Case-insensitive match of every whitespace-separated term against
    /// the channel name and category.
    pub fn matches(&self, query: &str) -> bool {
        if query.trim().is_empty() {
            return true;
        }
        let text = format!(
            "{} {}",
            self.channel_name.to_lowercase(),
            self.category.to_lowercase()
        );
        query
            .to_lowercase()
            .split_whitespace()
            .all(|term| text.contains(term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_misspelled_category_field() {
        let json = r#"{
            "channel_name": "Dangal TV",
            "logo": "https://img.example/dangal.png",
            "catagory": "dangal",
            "url": "https://cdn.example/dangal/index.m3u8",
            "license_key": ""
        }"#;
        let ch: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(ch.category, "dangal");
        assert_eq!(ch.key(), "Dangal TV");
        assert_eq!(ch.license(), None);
    }

    #[test]
    fn accepts_correct_spelling_as_alias() {
        let json = r#"{"channel_name":"Epic","category":"epic","url":"https://x/epic.mp4"}"#;
        let ch: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(ch.category, "epic");
        assert!(ch.logo.is_empty());
        assert_eq!(ch.license_key, None);
    }

    #[test]
    fn serializes_with_canonical_field_name() {
        let ch = Channel {
            channel_name: "A".into(),
            logo: String::new(),
            category: "news".into(),
            url: "https://x/a.m3u8".into(),
            license_key: None,
        };
        let value = serde_json::to_value(&ch).unwrap();
        assert_eq!(value["catagory"], "news");
        assert!(value.get("category").is_none());
        assert!(value.get("license_key").is_none());
    }

    #[test]
    fn stream_kind_ignores_query_string() {
        let mut ch = Channel {
            channel_name: "A".into(),
            logo: String::new(),
            category: String::new(),
            url: "https://cdn/live/master.M3U8?token=abc".into(),
            license_key: None,
        };
        assert_eq!(ch.stream_kind(), StreamKind::Segmented);
        ch.url = "https://cdn/live/manifest.mpd#t=1".into();
        assert_eq!(ch.stream_kind(), StreamKind::Dash);
        ch.url = "https://cdn/vod/file.mp4".into();
        assert_eq!(ch.stream_kind(), StreamKind::Direct);
    }

    #[test]
    fn filter_matches_all_terms() {
        let ch = Channel {
            channel_name: "Star Sports 1".into(),
            logo: String::new(),
            category: "sports".into(),
            url: "u".into(),
            license_key: None,
        };
        assert!(ch.matches("star sports"));
        assert!(ch.matches("  "));
        assert!(!ch.matches("star news"));
    }
}
