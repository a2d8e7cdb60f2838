//! Group slug derivation and validation.
//!
//! Groups are provisioned administratively, so slug generation only has to be
//! deterministic and URL-safe; uniqueness is enforced by the database.

use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("slug `{slug}` is not URL-safe")]
    InvalidShape { slug: String },
}

/// Derive a URL-safe slug from a group title.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Use an explicitly chosen slug after validating its shape, or derive one
/// from the title when none was given.
pub fn resolve_slug(title: &str, explicit: Option<&str>) -> Result<String, SlugError> {
    match explicit {
        Some(slug) if is_valid_slug(slug) => Ok(slug.to_string()),
        Some(slug) => Err(SlugError::InvalidShape {
            slug: slug.to_string(),
        }),
        None => derive_slug(title),
    }
}

/// Check that a stored or requested slug has the shape `derive_slug` produces.
pub fn is_valid_slug(candidate: &str) -> bool {
    !candidate.is_empty()
        && !candidate.starts_with('-')
        && !candidate.ends_with('-')
        && candidate
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_lowercase_hyphenated_slug() {
        assert_eq!(derive_slug("Rust Enthusiasts").unwrap(), "rust-enthusiasts");
    }

    #[test]
    fn rejects_empty_title() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn explicit_slug_wins_when_well_formed() {
        assert_eq!(
            resolve_slug("Rust Enthusiasts", Some("rustaceans")).unwrap(),
            "rustaceans"
        );
        assert_eq!(
            resolve_slug("Rust Enthusiasts", None).unwrap(),
            "rust-enthusiasts"
        );
        assert_eq!(
            resolve_slug("Rust Enthusiasts", Some("Bad Slug")),
            Err(SlugError::InvalidShape {
                slug: "Bad Slug".to_string()
            })
        );
    }

    #[test]
    fn validates_slug_shape() {
        assert!(is_valid_slug("rust-enthusiasts"));
        assert!(is_valid_slug("cats"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("No Spaces"));
    }
}
