//! Bulk endpoint address construction.
//!
//! The address is derived once from the customer token and the tag list and
//! never changes afterwards. Each path segment is percent-encoded so tokens
//! or tags containing reserved characters cannot escape their segment.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Default Loggly ingestion host.
pub const DEFAULT_ENDPOINT_HOST: &str = "https://logs-01.loggly.com";
/// Tag applied when the caller does not configure any.
pub const DEFAULT_TAG: &str = "bulk";
/// Content type sent with every request.
pub const CONTENT_TYPE: &str = "text/plain";

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b',')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Build `<host>/bulk/<token>/tag/<tag,tag,...>/`.
pub fn bulk_endpoint(host: &str, token: &str, tags: &[String]) -> String {
    let host = host.trim_end_matches('/');
    let token = utf8_percent_encode(token, PATH_SEGMENT);
    let tags = tags
        .iter()
        .map(|tag| utf8_percent_encode(tag, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{host}/bulk/{token}/tag/{tags}/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    fn default_endpoint_matches_loggly_format() {
        assert_eq!(
            bulk_endpoint(DEFAULT_ENDPOINT_HOST, "TOKEN", &[DEFAULT_TAG.to_string()]),
            "https://logs-01.loggly.com/bulk/TOKEN/tag/bulk/"
        );
    }

    #[rstest]
    #[case("http://127.0.0.1:8080/", "http://127.0.0.1:8080/bulk/abc/tag/bulk/")]
    #[case("http://127.0.0.1:8080", "http://127.0.0.1:8080/bulk/abc/tag/bulk/")]
    fn trailing_slash_on_host_is_ignored(#[case] host: &str, #[case] expected: &str) {
        assert_eq!(bulk_endpoint(host, "abc", &["bulk".into()]), expected);
    }

    #[rstest]
    fn multiple_tags_are_comma_joined() {
        let tags = vec!["web".to_string(), "prod".to_string()];
        assert_eq!(
            bulk_endpoint("https://h", "t", &tags),
            "https://h/bulk/t/tag/web,prod/"
        );
    }

    #[rstest]
    fn reserved_characters_are_escaped() {
        let url = bulk_endpoint("https://h", "a/b c", &["x,y".into()]);
        assert_eq!(url, "https://h/bulk/a%2Fb%20c/tag/x%2Cy/");
    }

    proptest! {
        #[test]
        fn token_never_adds_path_segments(token in "\\PC{1,32}") {
            let url = bulk_endpoint("https://h", &token, &["bulk".into()]);
            let path = url.trim_start_matches("https://h");
            prop_assert_eq!(path.matches('/').count(), 5);
        }
    }
}
