//! Slug generation with uniqueness-on-insert.
//!
//! Slugs are URL-safe lowercase identifiers derived from display text.
//! [`resolve_slug`] guarantees uniqueness within one entity type by appending
//! `-2`, `-3`, … until the candidate is unused. Uniqueness is checked through
//! a caller-supplied predicate so the same resolver works against any lookup
//! (in-memory catalog, SQL unique index, test fixture).
//!
//! The resolver only runs at creation time: the import pipeline is the single
//! writer, and the check-then-insert must happen inside its transaction (or
//! against a unique constraint) to stay race-free if that ever changes. The
//! read-only service never regenerates a slug.

use crate::error::{Error, Result};

/// Slugs never exceed this many characters, suffix included.
const MAX_SLUG_LEN: usize = 256;

/// When suffixing would overflow [`MAX_SLUG_LEN`], the base is cut back to
/// this many characters minus the suffix before appending.
const TRUNCATED_BASE_LEN: usize = 200;

/// An entity that can produce text to slugify.
///
/// Every sluggable entity implements this explicitly; there is no fallback to
/// a generic string conversion.
pub trait SlugSource {
    /// The text the slug is derived from.
    fn slug_text(&self) -> &str;
}

/// Normalize text into a URL-safe lowercase slug.
///
/// Diacritics on Latin letters are folded to their ASCII base, runs of
/// non-alphanumeric characters collapse to single hyphens, and leading or
/// trailing hyphens are trimmed. May return an empty string.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            push_slug_char(&mut slug, &mut pending_hyphen, ch);
        } else if let Some(folded) = fold_diacritic(ch) {
            for ch in folded.chars() {
                push_slug_char(&mut slug, &mut pending_hyphen, ch);
            }
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

fn push_slug_char(slug: &mut String, pending_hyphen: &mut bool, ch: char) {
    if *pending_hyphen && !slug.is_empty() {
        slug.push('-');
    }
    *pending_hyphen = false;
    slug.push(ch.to_ascii_lowercase());
}

/// Resolve a unique slug for `candidate`, checking candidates against the
/// `exists` predicate scoped to the entity's own table.
///
/// Returns the normalized base slug (capped at 256 characters) when it is
/// unused; otherwise appends `-2`, `-3`, … until an unused value is found,
/// truncating the base when a suffixed slug would exceed the ceiling. Fails
/// when the candidate normalizes to an empty string.
pub fn resolve_slug<F>(candidate: &str, mut exists: F) -> Result<String>
where
    F: FnMut(&str) -> bool,
{
    let mut base = slugify(candidate);
    if base.is_empty() {
        return Err(Error::EmptySlug {
            text: candidate.to_string(),
        });
    }
    base.truncate(MAX_SLUG_LEN);

    if !exists(&base) {
        return Ok(base);
    }

    let mut next = 2u64;
    loop {
        let suffix = format!("-{}", next);
        let mut slug = base.clone();
        if slug.len() + suffix.len() > MAX_SLUG_LEN {
            slug.truncate(TRUNCATED_BASE_LEN.saturating_sub(suffix.len()));
        }
        slug.push_str(&suffix);
        if !exists(&slug) {
            return Ok(slug);
        }
        next += 1;
    }
}

/// Fold a character with a diacritic to its ASCII base form.
///
/// Covers the Latin-1 supplement plus the ligatures that show up in authority
/// names. Returns `None` for anything else, which then acts as a separator.
fn fold_diacritic(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'đ' | 'Đ' | 'ð' | 'Ð' => "d",
        'þ' | 'Þ' => "th",
        _ => return None,
    };
    Some(folded)
}
