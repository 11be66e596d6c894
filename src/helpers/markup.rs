/// Escapes text for XML element content and attribute values. Also used for
/// the SVG cards.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Truncates on a character boundary, appending an ellipsis when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"Renal & Co <"Klang's">"#),
            "Renal &amp; Co &lt;&quot;Klang&apos;s&quot;&gt;"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Klang", 10), "Klang");
        assert_eq!(truncate("Pusat Dialisis", 6), "Pusat…");
    }
}
