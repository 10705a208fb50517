//! In-app routes and the path format shared with watch links.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use thiserror::Error;

use crate::channel::Channel;

/// Characters left untouched by a browser's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const LIVE_PATH: &str = "/live";
const WATCH_PREFIX: &str = "/watch/live/";

pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

pub fn decode_component(encoded: &str) -> Result<String, RouteError> {
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| RouteError::InvalidEncoding(encoded.to_string()))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no page at {0:?}")]
    UnknownPath(String),
    #[error("watch link is missing a channel name")]
    MissingId,
    #[error("channel name {0:?} is not valid percent-encoded UTF-8")]
    InvalidEncoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Category tabs + channel grid.
    Live,
    /// Detail/player page for one channel.
    ///
    /// `state` is transient navigation state: present when the user came
    /// from a card, absent when the page was opened from a link.
    Watch { id: String, state: Option<Channel> },
}

impl Route {
    /// Navigate to a channel, carrying the full record along.
    pub fn watch(channel: Channel) -> Self {
        Self::Watch {
            id: channel.channel_name.clone(),
            state: Some(channel),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Live => LIVE_PATH.to_string(),
            Self::Watch { id, .. } => format!("{}{}", WATCH_PREFIX, encode_component(id)),
        }
    }

    /// Parse a path or a full watch link as typed or pasted by the user.
    /// Never carries state.
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let input = input.trim();
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url =
                Url::parse(input).map_err(|_| RouteError::UnknownPath(input.to_string()))?;
            return Self::parse_path(url.path());
        }
        Self::parse_path(input)
    }

    fn parse_path(path: &str) -> Result<Self, RouteError> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        if trimmed.is_empty() || trimmed == LIVE_PATH {
            return Ok(Self::Live);
        }

        match path.strip_prefix(WATCH_PREFIX) {
            Some(rest) => {
                let segment = rest.trim_end_matches('/');
                if segment.is_empty() {
                    return Err(RouteError::MissingId);
                }
                if segment.contains('/') {
                    return Err(RouteError::UnknownPath(path.to_string()));
                }
                Ok(Self::Watch {
                    id: decode_component(segment)?,
                    state: None,
                })
            }
            None if trimmed == WATCH_PREFIX.trim_end_matches('/') => Err(RouteError::MissingId),
            None => Err(RouteError::UnknownPath(path.to_string())),
        }
    }

    /// Absolute link for sharing, rooted at `origin`.
    pub fn share_url(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.path())
    }

    pub fn has_state(&self) -> bool {
        matches!(self, Self::Watch { state: Some(_), .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str) -> Channel {
        Channel {
            channel_name: name.into(),
            logo: String::new(),
            category: "news".into(),
            url: "https://x/y.m3u8".into(),
            license_key: None,
        }
    }

    #[test]
    fn encodes_like_encode_uri_component() {
        assert_eq!(encode_component("Star Sports 1"), "Star%20Sports%201");
        assert_eq!(encode_component("A&B/C?"), "A%26B%2FC%3F");
        assert_eq!(encode_component("it's (HD)!"), "it's%20(HD)!");
        assert_eq!(encode_component("Zee Café"), "Zee%20Caf%C3%A9");
    }

    #[test]
    fn watch_path_round_trips_without_state() {
        let route = Route::watch(channel("Zee Café / HD"));
        assert!(route.has_state());
        let path = route.path();
        assert_eq!(path, "/watch/live/Zee%20Caf%C3%A9%20%2F%20HD");

        let parsed = Route::parse(&path).unwrap();
        assert_eq!(
            parsed,
            Route::Watch {
                id: "Zee Café / HD".into(),
                state: None
            }
        );
        assert!(!parsed.has_state());
    }

    #[test]
    fn shared_link_opens_the_same_channel() {
        let url = Route::watch(channel("Ch 1")).share_url("https://livetv.local");
        assert_eq!(
            Route::parse(&url).unwrap(),
            Route::Watch {
                id: "Ch 1".into(),
                state: None
            }
        );
        assert_eq!(
            Route::parse("HTTP://tv.example/watch/live/Zee%20Caf%C3%A9?ref=x#top").unwrap(),
            Route::Watch {
                id: "Zee Café".into(),
                state: None
            }
        );
        assert_eq!(Route::parse("https://tv.example/live").unwrap(), Route::Live);
        assert!(matches!(
            Route::parse("https://tv.example/movies/1"),
            Err(RouteError::UnknownPath(_))
        ));
    }

    #[test]
    fn parses_listing_paths() {
        assert_eq!(Route::parse("/live").unwrap(), Route::Live);
        assert_eq!(Route::parse("/live/").unwrap(), Route::Live);
        assert_eq!(Route::parse("").unwrap(), Route::Live);
        assert_eq!(Route::parse("/").unwrap(), Route::Live);
    }

    #[test]
    fn rejects_bad_paths() {
        assert_eq!(Route::parse("/watch/live/"), Err(RouteError::MissingId));
        assert_eq!(Route::parse("/watch/live"), Err(RouteError::MissingId));
        assert!(matches!(
            Route::parse("/movies/12"),
            Err(RouteError::UnknownPath(_))
        ));
        assert!(matches!(
            Route::parse("/watch/live/%FF"),
            Err(RouteError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn share_url_joins_origin() {
        let route = Route::watch(channel("Ch 1"));
        assert_eq!(
            route.share_url("https://tv.example/"),
            "https://tv.example/watch/live/Ch%201"
        );
    }
}
