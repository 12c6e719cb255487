use url::Url;

/// Returns the `v` query parameter of a YouTube watch page.
///
/// Any `http(s)` URL on `youtube.com` or one of its subdomains with path
/// `/watch` and a non-empty `v` qualifies; everything else yields `None`.
pub fn extract_video_id(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host != "youtube.com" && !host.ends_with(".youtube.com") {
        return None;
    }
    if parsed.path().trim_end_matches('/') != "/watch" {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn is_supported_page(raw: &str) -> bool {
    extract_video_id(raw).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_watch_urls() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?feature=share&v=abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_video_id("http://youtube.com/watch?v=x").as_deref(),
            Some("x")
        );
    }

    #[test]
    fn rejects_other_pages() {
        assert_eq!(extract_video_id("https://www.youtube.com/"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(extract_video_id("https://notyoutube.com/watch?v=abc"), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=abc"), None);
        assert_eq!(extract_video_id("ftp://youtube.com/watch?v=abc"), None);
        assert_eq!(extract_video_id("not a url"), None);
    }
}
