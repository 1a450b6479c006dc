//! Hashtag and mention extraction from post content.

use once_cell::sync::Lazy;
use regex::Regex;

// Word characters are ASCII only. The sigil must start the text or follow a
// non-word character, so `ada@example.com` and `issue#12` produce nothing.
static HASHTAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_])#([A-Za-z0-9_]+)").expect("valid hashtag regex")
});
static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_])@([A-Za-z0-9_]+)").expect("valid mention regex")
});

/// Lowercased, deduplicated hashtags in order of first appearance.
pub fn extract_hashtags(content: &str) -> Vec<String> {
    collect_tokens(&HASHTAG_RE, content)
}

/// Lowercased, deduplicated mentioned usernames in order of first appearance.
pub fn extract_mentions(content: &str) -> Vec<String> {
    collect_tokens(&MENTION_RE, content)
}

fn collect_tokens(re: &Regex, content: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in re.captures_iter(content) {
        let token = caps[1].to_lowercase();
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}
