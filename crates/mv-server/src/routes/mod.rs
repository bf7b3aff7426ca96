//! Route handlers for the HTTP API.

pub mod admin;
pub mod download;
pub mod health;
pub mod home;
pub mod montage;
pub mod notify;
pub mod sequence;

use serde::Deserialize;

/// `video_urls` as clients send it: a list, or a bare string for one URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VideoUrls {
    One(String),
    Many(Vec<String>),
}

impl VideoUrls {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            VideoUrls::One(url) => vec![url],
            VideoUrls::Many(urls) => urls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_is_coerced_to_list() {
        let urls: VideoUrls = serde_json::from_str(r#""http://a/1.mp4""#).unwrap();
        assert_eq!(urls.into_vec(), vec!["http://a/1.mp4"]);
    }

    #[test]
    fn list_is_kept() {
        let urls: VideoUrls = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(urls.into_vec(), vec!["a", "b"]);
    }
}
