/// Turns a display name into a URL-safe slug.
///
/// Lowercases ASCII letters, keeps digits, and collapses every other run of
/// characters into a single `-`. Leading and trailing separators are dropped,
/// so `"Kuala Lumpur"` and `" kuala--lumpur "` both become `"kuala-lumpur"`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn test_slugify_state_names() {
        assert_eq!(slugify("Kuala Lumpur"), "kuala-lumpur");
        assert_eq!(slugify("Pulau Pinang"), "pulau-pinang");
        assert_eq!(slugify("W.P. Labuan"), "w-p-labuan");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  kuala--lumpur "), "kuala-lumpur");
        assert_eq!(slugify("Pusat Dialisis (Klang) #2"), "pusat-dialisis-klang-2");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        let once = slugify("Johor Bahru");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("---"), "");
    }
}
