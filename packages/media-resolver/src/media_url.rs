//! URL rules for media: validity, original-quality upgrade, normalization.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::types::media::MediaType;

/// Path fragment of avatar images, which are never post media.
const PROFILE_IMAGE_PATH: &str = "profile_images";

static HTTP_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://\S+").unwrap());
static PROTOCOL_RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//[A-Za-z0-9.-]+(?::\d+)?/\S*$").unwrap());
static NAME_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]name=[^&#]*").unwrap());

/// Whether a URL may be treated as media.
///
/// Accepts absolute `http`/`https` URLs and protocol-relative `//host/path`
/// URLs. Anything under the profile-image path is rejected.
pub fn is_valid_media_url(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.is_empty() || is_profile_image_url(trimmed) {
        return false;
    }

    match Url::parse(trimmed) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => HTTP_PREFIX.is_match(trimmed) || PROTOCOL_RELATIVE.is_match(trimmed),
    }
}

pub fn is_profile_image_url(url: &str) -> bool {
    url.contains(PROFILE_IMAGE_PATH)
}

/// Emoji glyphs are served as images from `abs*.twimg.com/emoji/...`.
pub fn is_emoji_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };
    let host = parsed.host_str().unwrap_or("");
    host.starts_with("abs") && host.ends_with("twimg.com") && parsed.path().contains("/emoji/")
}

/// Resolve protocol-relative URLs to https; everything else is returned trimmed.
pub fn absolutize(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("//") {
        format!("https:{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Guess the media type from a URL alone.
pub fn detect_media_type(url: &str) -> MediaType {
    if url.contains("video") || url.contains(".mp4") || url.contains(".webm") {
        MediaType::Video
    } else {
        MediaType::Image
    }
}

/// Normalize a URL for duplicate detection: `scheme://host/path`, lower-cased.
///
/// Unparseable input is stripped of query and fragment instead. Returns
/// `None` for blank input.
pub fn normalize_url_for_dedupe(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = Url::parse(trimmed) {
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", parsed.host_str().unwrap_or(""), port),
            None => parsed.host_str().unwrap_or("").to_string(),
        };
        return Some(format!("{}://{}{}", parsed.scheme(), host, parsed.path()).to_lowercase());
    }

    let without_query = trimmed.split('?').next().unwrap_or(trimmed);
    let without_fragment = without_query.split('#').next().unwrap_or(without_query);
    let sanitized = without_fragment.trim();
    (!sanitized.is_empty()).then(|| sanitized.to_lowercase())
}

/// Last path segment of a URL, without query or fragment.
pub fn media_filename(url: &str) -> Option<String> {
    let path = match Url::parse(url.trim()) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => {
            let without_query = url.split('?').next().unwrap_or(url);
            without_query.split('#').next().unwrap_or(without_query).to_string()
        }
    };

    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Transform applied to every collected URL to reach its best-quality variant.
pub trait UrlUpgrader: Send + Sync {
    /// Return the upgraded URL, or the input unchanged when no upgrade applies.
    fn upgrade(&self, url: &str, media_type: MediaType) -> String;
}

/// Rewrites `pbs.twimg.com/media/` images to `name=orig`; leaves the rest alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginalQualityUpgrader;

impl OriginalQualityUpgrader {
    /// Whether `url` is a media image that is not already at original size.
    pub fn can_upgrade(url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if parsed.query_pairs().any(|(k, v)| k == "name" && v == "orig") {
                return false;
            }
        }
        url.contains("pbs.twimg.com") && url.contains("/media/")
    }
}

impl UrlUpgrader for OriginalQualityUpgrader {
    fn upgrade(&self, url: &str, media_type: MediaType) -> String {
        if media_type != MediaType::Image || !Self::can_upgrade(url) {
            return url.to_string();
        }

        match Url::parse(url) {
            Ok(mut parsed) => {
                let pairs: Vec<(String, String)> = parsed
                    .query_pairs()
                    .filter(|(k, _)| k != "name")
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                parsed
                    .query_pairs_mut()
                    .clear()
                    .extend_pairs(pairs)
                    .append_pair("name", "orig");
                parsed.to_string()
            }
            Err(e) => {
                debug!(url = %url, error = %e, "URL parse failed, upgrading by string rewrite");
                let stripped = NAME_PARAM.replace_all(url, "").to_string();
                if stripped.contains('?') {
                    format!("{}&name=orig", stripped)
                } else {
                    format!("{}?name=orig", stripped)
                }
            }
        }
    }
}

/// Upgrader that never changes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityUpgrader;

impl UrlUpgrader for IdentityUpgrader {
    fn upgrade(&self, url: &str, _media_type: MediaType) -> String {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_media_urls() {
        assert!(is_valid_media_url("https://pbs.twimg.com/media/A.jpg"));
        assert!(is_valid_media_url("  http://example.com/a.png  "));
        assert!(is_valid_media_url("//pbs.twimg.com/media/A.jpg"));
    }

    #[test]
    fn test_invalid_media_urls() {
        assert!(!is_valid_media_url(""));
        assert!(!is_valid_media_url("   "));
        assert!(!is_valid_media_url("data:image/png;base64,AAAA"));
        assert!(!is_valid_media_url("blob:https://x.com/1234"));
        assert!(!is_valid_media_url("/relative/path.jpg"));
        assert!(!is_valid_media_url(
            "https://pbs.twimg.com/profile_images/1/avatar_normal.jpg"
        ));
    }

    #[test]
    fn test_emoji_urls() {
        assert!(is_emoji_url("https://abs-0.twimg.com/emoji/v2/svg/1f600.svg"));
        assert!(!is_emoji_url("https://pbs.twimg.com/media/A.jpg"));
    }

    #[test]
    fn test_upgrade_sets_orig() {
        let upgrader = OriginalQualityUpgrader;
        let upgraded = upgrader.upgrade(
            "https://pbs.twimg.com/media/ABC?format=jpg&name=small",
            MediaType::Image,
        );
        assert_eq!(upgraded, "https://pbs.twimg.com/media/ABC?format=jpg&name=orig");
    }

    #[test]
    fn test_upgrade_leaves_other_urls() {
        let upgrader = OriginalQualityUpgrader;
        let already = "https://pbs.twimg.com/media/ABC?format=jpg&name=orig";
        assert_eq!(upgrader.upgrade(already, MediaType::Image), already);

        let elsewhere = "https://example.com/a.jpg?name=small";
        assert_eq!(upgrader.upgrade(elsewhere, MediaType::Image), elsewhere);

        let video = "https://video.twimg.com/media/v.mp4";
        assert_eq!(upgrader.upgrade(video, MediaType::Video), video);
    }

    #[test]
    fn test_normalize_url_for_dedupe() {
        assert_eq!(
            normalize_url_for_dedupe("HTTPS://PBS.twimg.com/Media/A.jpg?name=small#x").as_deref(),
            Some("https://pbs.twimg.com/media/a.jpg")
        );
        assert_eq!(
            normalize_url_for_dedupe("//pbs.twimg.com/media/A.jpg?name=small").as_deref(),
            Some("//pbs.twimg.com/media/a.jpg")
        );
        assert_eq!(normalize_url_for_dedupe("  "), None);
    }

    #[test]
    fn test_media_filename() {
        assert_eq!(
            media_filename("https://pbs.twimg.com/media/ABC.jpg?name=orig").as_deref(),
            Some("ABC.jpg")
        );
        assert_eq!(media_filename("not a url/abc.png?x=1").as_deref(), Some("abc.png"));
        assert_eq!(media_filename("https://example.com/"), None);
    }

    #[test]
    fn test_detect_media_type() {
        assert_eq!(detect_media_type("https://video.twimg.com/a"), MediaType::Video);
        assert_eq!(detect_media_type("https://a/b.webm"), MediaType::Video);
        assert_eq!(detect_media_type("https://a/b.jpg"), MediaType::Image);
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(absolutize("//a.com/b.jpg"), "https://a.com/b.jpg");
        assert_eq!(absolutize(" https://a.com/b.jpg "), "https://a.com/b.jpg");
    }
}
