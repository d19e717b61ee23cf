//! Escaping contracts shared by the compiler and the runtime.
//! Both are part of the template format and must stay bit-exact.

/// Escapes text so it can sit between double quotes in the generated
/// script: backslash, carriage return, line feed, tab and double quote.
pub fn encode_string(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('"', "\\\"")
}

/// Escapes text for safe inclusion in HTML.
/// The ampersand goes first so later entities are not escaped twice.
pub fn encode_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn html() {
        assert_eq!(
            encode_html("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn ampersands_are_not_doubled() {
        assert_eq!(encode_html("&lt;"), "&amp;lt;");
        assert_eq!(encode_html("<"), "&lt;");
    }

    #[test]
    fn string() {
        assert_eq!(encode_string("a\\b\r\n\t\"c\""), "a\\\\b\\r\\n\\t\\\"c\\\"");
    }

    proptest! {
        #[test]
        fn html_output_has_no_markup(s in "\\PC*") {
            let encoded = encode_html(&s);
            prop_assert!(!encoded.contains('<'));
            prop_assert!(!encoded.contains('>'));
            prop_assert!(!encoded.contains('"'));
            prop_assert!(!encoded.contains('\''));
        }

        #[test]
        fn string_output_has_no_raw_newlines(s in "\\PC*") {
            let encoded = encode_string(&s);
            prop_assert!(!encoded.contains('\n'));
            prop_assert!(!encoded.contains('\r'));
        }
    }
}
