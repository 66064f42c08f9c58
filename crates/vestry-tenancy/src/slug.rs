//! Slug generation for tenant and registry names.

/// Derive a URL-safe slug from a display name: lowercase, map
/// whitespace and underscores to hyphens, strip everything outside
/// `[a-z0-9-]`, collapse repeated hyphens, trim edge hyphens.
///
/// Returns an empty string when the name contains no usable
/// characters; callers treat that as a validation failure.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress leading hyphens

    for c in name.chars() {
        let mapped = match c {
            'A'..='Z' => Some(c.to_ascii_lowercase()),
            'a'..='z' | '0'..='9' => Some(c),
            ' ' | '\t' | '_' | '-' => None,
            _ => continue,
        };
        match mapped {
            Some(c) => {
                slug.push(c);
                last_was_hyphen = false;
            }
            None => {
                if !last_was_hyphen {
                    slug.push('-');
                    last_was_hyphen = true;
                }
            }
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
