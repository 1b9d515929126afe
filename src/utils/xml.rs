//! XML escaping for TwiML documents
//!
//! Every piece of text interpolated into a TwiML response passes through
//! [`escape`]. The telephony provider rejects documents with stray markup
//! characters, so this is applied to greetings, replies, and URLs alike.

/// Escape the five XML special characters in `input`.
///
/// Returns a borrowed string unchanged when no escaping is needed, which is
/// the common case for generated replies.
pub fn escape(input: &str) -> std::borrow::Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return std::borrow::Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    std::borrow::Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_text_is_borrowed() {
        let escaped = escape("Thanks for calling");
        assert!(matches!(escaped, std::borrow::Cow::Borrowed(_)));
        assert_eq!(escaped, "Thanks for calling");
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(
            escape(r#"Dr. <Smith> & "partners""#),
            "Dr. &lt;Smith&gt; &amp; &quot;partners&quot;"
        );
        assert_eq!(escape("it's"), "it&apos;s");
    }

    #[test]
    fn test_escape_ampersand_not_double_escaped() {
        assert_eq!(escape("&amp;"), "&amp;amp;");
    }
}
