/// Convert a profile URL to a sanitized filename
pub fn sanitize_filename(url: &str) -> String {
    // Remove protocol and replace invalid filename characters
    let mut name = url.replace("http://", "").replace("https://", "");
    name = name.replace(['/', ':', '?', '&', '=', '#', '%'], "_");

    // Limit filename length. Profile slugs can be non-ASCII, so the cut
    // must land on a char boundary.
    if name.len() > 100 {
        let mut end = 100;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_strips_protocol_and_separators() {
        assert_eq!(
            sanitize_filename("https://www.linkedin.com/in/alice"),
            "www.linkedin.com_in_alice"
        );
    }

    #[test]
    fn test_sanitize_filename_caps_length() {
        let long = format!("https://example.com/{}", "a".repeat(200));
        assert_eq!(sanitize_filename(&long).len(), 100);
    }

    #[test]
    fn test_sanitize_filename_truncates_multibyte_urls_on_char_boundary() {
        let long = format!("https://www.linkedin.com/in/{}", "あ".repeat(60));
        let name = sanitize_filename(&long);
        assert!(name.len() <= 100);
        // The cut never splits a character.
        assert!(name.is_char_boundary(name.len()));
        assert!(name.ends_with('あ'));
    }
}
