//! Search response JSON → raw items

use chrono::DateTime;
use serde::Deserialize;
use tweetline_core::{RawItem, RawKind};

/// Twitter's `created_at` layout, e.g. `Wed Aug 27 13:08:45 +0000 2008`
const TWITTER_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// RFC 1123 layout used in the output file; the zone is the numeric offset
/// Twitter sent, e.g. `Wed, 27 Aug 2008 13:08:45 +0000`
const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

// === Response structs (deserialized from JSON) ===

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub statuses: Vec<Status>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    pub id: u64,
    pub id_str: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub retweeted_status: Option<RetweetedStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
}

/// Only the original's identity is needed
#[derive(Debug, Deserialize)]
pub struct RetweetedStatus {
    pub id_str: String,
}

impl From<Status> for RawItem {
    fn from(s: Status) -> Self {
        let kind = match s.retweeted_status {
            Some(original) => RawKind::Reshare {
                original_id: original.id_str,
            },
            None => RawKind::Original,
        };
        RawItem {
            id: s.id,
            id_str: s.id_str,
            text: s.text,
            author_name: s.user.name,
            author_handle: s.user.screen_name,
            created_at: to_rfc1123(&s.created_at),
            kind,
        }
    }
}

/// Parse a search response body into raw items, keeping API order
pub fn parse_search(body: &str) -> Result<Vec<RawItem>, serde_json::Error> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response.statuses.into_iter().map(RawItem::from).collect())
}

/// Reformat a Twitter timestamp as RFC 1123; unparseable input passes through
pub fn to_rfc1123(created_at: &str) -> String {
    match DateTime::parse_from_str(created_at, TWITTER_TIME_FORMAT) {
        Ok(ts) => ts.format(RFC1123_FORMAT).to_string(),
        Err(_) => {
            if !created_at.is_empty() {
                log::trace!("unparseable created_at {created_at:?}, keeping as is");
            }
            created_at.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r##"{
        "statuses": [
            {
                "id": 1050118621198921728,
                "id_str": "1050118621198921728",
                "text": "RT @ada: Engines \"compute\"\nstuff",
                "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                "user": {"name": "Grace Hopper", "screen_name": "grace", "followers_count": 12},
                "retweeted_status": {
                    "id": 1050000000000000000,
                    "id_str": "1050000000000000000",
                    "text": "Engines \"compute\"\nstuff"
                }
            },
            {
                "id": 1050118621198921700,
                "id_str": "1050118621198921700",
                "text": "#IoT all the things",
                "created_at": "Wed Oct 10 18:00:00 +0200 2018",
                "user": {"name": "Ada", "screen_name": "ada"}
            }
        ],
        "search_metadata": {"count": 2}
    }"##;

    #[test]
    fn parses_statuses_in_order() {
        let items = parse_search(BODY).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 1050118621198921728);
        assert_eq!(items[1].id_str, "1050118621198921700");
    }

    #[test]
    fn retweet_resolves_to_original() {
        let items = parse_search(BODY).unwrap();
        assert_eq!(
            items[0].kind,
            RawKind::Reshare {
                original_id: "1050000000000000000".into()
            }
        );
        assert_eq!(items[0].canonical_id(), "1050000000000000000");
        assert_eq!(items[1].kind, RawKind::Original);
        assert_eq!(items[1].canonical_id(), "1050118621198921700");
    }

    #[test]
    fn user_fields_mapped() {
        let items = parse_search(BODY).unwrap();
        assert_eq!(items[0].author_name, "Grace Hopper");
        assert_eq!(items[0].author_handle, "grace");
        assert_eq!(items[0].text, "RT @ada: Engines \"compute\"\nstuff");
    }

    #[test]
    fn created_at_keeps_source_offset() {
        let items = parse_search(BODY).unwrap();
        assert_eq!(items[0].created_at, "Wed, 10 Oct 2018 20:19:24 +0000");
        assert_eq!(items[1].created_at, "Wed, 10 Oct 2018 18:00:00 +0200");
    }

    #[test]
    fn bad_timestamp_kept_verbatim() {
        assert_eq!(to_rfc1123("yesterday"), "yesterday");
        assert_eq!(to_rfc1123(""), "");
    }

    #[test]
    fn empty_statuses_is_empty_batch() {
        assert!(parse_search(r#"{"statuses": []}"#).unwrap().is_empty());
    }

    #[test]
    fn missing_statuses_is_an_error() {
        // 200 with an error payload must fail the query, not end the window
        let err = parse_search(r#"{"errors": [{"code": 88, "message": "Rate limit exceeded"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("statuses"), "{err}");
        assert!(parse_search("{}").is_err());
    }

    #[test]
    fn error_body_is_rejected() {
        assert!(parse_search("<html>Over capacity</html>").is_err());
        assert!(parse_search(r#"{"statuses": [{"text": "no id"}]}"#).is_err());
    }
}
