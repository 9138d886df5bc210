//! Attachment and avatar URL normalization.
//!
//! Message content for media kinds, and roster avatars, arrive in whatever
//! form the uploader produced. [`MediaUrls`] turns them into URLs a client
//! can fetch directly:
//!
//! - `http(s)`, `data:` and `blob:` URLs pass through.
//! - Protocol-relative URLs (`//host/x`) get `https:`.
//! - Relative paths resolve against the backend base URL.
//! - Google Drive share links become direct links (`export=view` for
//!   images, `export=download` for audio).
//!
//! Anything else is returned unchanged.

use deskchat_core::UrlNormalizer;
use deskchat_proto::MessageKind;
use url::Url;

const DRIVE_HOST: &str = "drive.google.com";

/// Production [`UrlNormalizer`].
#[derive(Debug, Clone)]
pub struct MediaUrls {
    base: Url,
}

impl MediaUrls {
    /// Normalizer resolving relative paths against `base`.
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    fn absolute(&self, raw: &str) -> Option<Url> {
        if let Some(rest) = raw.strip_prefix("//") {
            return Url::parse(&format!("https://{rest}")).ok();
        }
        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self.base.join(raw).ok(),
            Err(_) => None,
        }
    }
}

impl UrlNormalizer for MediaUrls {
    fn normalize(&self, raw: &str, kind: MessageKind) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with("data:") || trimmed.starts_with("blob:") {
            return raw.to_string();
        }

        let Some(url) = self.absolute(trimmed) else {
            return raw.to_string();
        };
        if !matches!(url.scheme(), "http" | "https") {
            return raw.to_string();
        }

        match drive_file_id(&url) {
            Some(id) => drive_direct_link(&id, kind),
            None => url.into(),
        }
    }
}

/// File id of a Drive share link (`/file/d/<id>/...` or `/open?id=<id>`).
fn drive_file_id(url: &Url) -> Option<String> {
    if url.host_str() != Some(DRIVE_HOST) {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.collect();
    match segments.as_slice() {
        ["file", "d", id, ..] if !id.is_empty() => Some((*id).to_string()),
        ["open"] => url.query_pairs().find(|(k, v)| k == "id" && !v.is_empty()).map(|(_, v)| v.into_owned()),
        _ => None,
    }
}

fn drive_direct_link(id: &str, kind: MessageKind) -> String {
    let export = match kind {
        MessageKind::Audio => "download",
        MessageKind::Image | MessageKind::Text => "view",
    };
    format!("https://{DRIVE_HOST}/uc?export={export}&id={id}")
}
