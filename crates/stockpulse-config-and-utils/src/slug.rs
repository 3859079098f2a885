//! Slug derivation for organization URLs.

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `-`, and trims leading/trailing dashes. Matches the slug the
/// onboarding form suggests, so a round-trip through the form is stable.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Green Fork"), "green-fork");
        assert_eq!(slugify("Mario's Kitchen"), "mario-s-kitchen");
    }

    #[test]
    fn slugify_collapses_runs() {
        assert_eq!(slugify("A  --  B"), "a-b");
    }

    #[test]
    fn slugify_trims_edges() {
        assert_eq!(slugify("  The Bistro  "), "the-bistro");
        assert_eq!(slugify("---x---"), "x");
    }

    #[test]
    fn slugify_empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_preserves_digits() {
        assert_eq!(slugify("Cafe 24/7"), "cafe-24-7");
    }
}
