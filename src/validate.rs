use once_cell::sync::Lazy;
use regex::Regex;

// ── Lazy static regexes ──────────────────────────────────────────────────────

static POST_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?i:https?)://(?i:www\.)?(?i:instagram\.com|instagr\.am)/(?:p|reel|reels|tv|stories)/[A-Za-z0-9_-]+(?:[/?#].*)?$",
    )
    .unwrap()
});

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("URL parameter is required")]
    MissingInput,
    #[error("Invalid Instagram URL format")]
    InvalidFormat,
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Checks that `raw` is present and looks like a link to an Instagram post,
/// reel, IGTV video or story. The accepted string is returned untouched.
pub fn validate_url(raw: Option<&str>) -> Result<&str, ValidationError> {
    let url = match raw {
        Some(url) if !url.trim().is_empty() => url,
        _ => return Err(ValidationError::MissingInput),
    };
    if POST_URL_RE.is_match(url) {
        Ok(url)
    } else {
        Err(ValidationError::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_content_types() {
        for url in [
            "https://instagram.com/reel/ABC123",
            "https://www.instagram.com/p/Cx-9_zQ/",
            "http://instagr.am/tv/XyZ",
            "https://www.instagram.com/reels/abc?igsh=MTc4",
            "https://instagram.com/stories/some_user/3141592653",
            "HTTPS://WWW.Instagram.com/p/abc#top",
        ] {
            assert_eq!(validate_url(Some(url)), Ok(url), "{url}");
        }
    }

    #[test]
    fn returns_input_unchanged() {
        let url = "https://www.instagram.com/p/Ab_c-1/?utm_source=ig_web_copy_link&x=%20";
        let accepted = validate_url(Some(url)).unwrap();
        assert!(std::ptr::eq(accepted, url));
    }

    #[test]
    fn missing_or_blank_is_missing_input() {
        assert_eq!(validate_url(None), Err(ValidationError::MissingInput));
        assert_eq!(validate_url(Some("")), Err(ValidationError::MissingInput));
        assert_eq!(validate_url(Some("   ")), Err(ValidationError::MissingInput));
    }

    #[test]
    fn rejects_other_shapes() {
        for url in [
            "https://example.com/x",
            "ftp://instagram.com/p/abc",
            "https://instagram.com/",
            "https://instagram.com/p/",
            "https://instagram.com/explore/abc",
            "https://instagram.com.evil.net/p/abc",
            "https://evil.net/?u=https://instagram.com/p/abc",
            "https://m.instagram.com/p/abc",
            "https://instagram.com/p/abc$def",
            "instagram.com/p/abc",
            " https://instagram.com/p/abc",
            "not a url",
        ] {
            assert_eq!(
                validate_url(Some(url)),
                Err(ValidationError::InvalidFormat),
                "{url}"
            );
        }
    }
}
