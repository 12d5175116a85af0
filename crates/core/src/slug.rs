//! URL slug generation.
//!
//! Product and category slugs are derived from their Turkish display names:
//! letters are lowercased, Turkish letters are folded to their ASCII base
//! letter, and every other run of characters collapses into a single `-`.
//!
//! ```rust
//! use carsi_core::slug::slugify;
//!
//! assert_eq!(slugify("Çelik Şişe 750ml"), "celik-sise-750ml");
//! assert_eq!(slugify("  Ağaç Oyuncak!  "), "agac-oyuncak");
//! ```

/// Fold a lowercase-or-uppercase Turkish letter to ASCII.
///
/// Returns `None` for characters outside the table.
const fn transliterate(c: char) -> Option<char> {
    match c {
        'ğ' | 'Ğ' => Some('g'),
        'ü' | 'Ü' => Some('u'),
        'ş' | 'Ş' => Some('s'),
        'ı' | 'I' | 'İ' | 'i' => Some('i'),
        'ö' | 'Ö' => Some('o'),
        'ç' | 'Ç' => Some('c'),
        _ => None,
    }
}

/// Generate a URL slug from a display name.
///
/// The result only contains `[a-z0-9-]`, never starts or ends with `-`, and
/// never contains `--`. Applying `slugify` to its own output returns the same
/// string. An input with no letters or digits yields an empty string.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        let folded = transliterate(c).or_else(|| {
            // Multi-char lowercase expansions are all outside [a-z0-9]
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) => Some(l),
                _ => None,
            }
        });

        match folded {
            Some(l) if l.is_ascii_lowercase() || l.is_ascii_digit() => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(l);
            }
            _ => pending_dash = true,
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turkish_letters_are_folded() {
        assert_eq!(slugify("ğüşıöç"), "gusioc");
        assert_eq!(slugify("ĞÜŞIÖÇ"), "gusioc");
        assert_eq!(slugify("İstanbul"), "istanbul");
    }

    #[test]
    fn test_runs_collapse_to_single_dash() {
        assert_eq!(slugify("Kırmızı   Kalem -- 2'li"), "kirmizi-kalem-2-li");
    }

    #[test]
    fn test_edges_are_trimmed() {
        assert_eq!(slugify("--Kupa--"), "kupa");
        assert_eq!(slugify("  (Yeni) "), "yeni");
    }

    #[test]
    fn test_no_alphanumerics_yields_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!! ---"), "");
    }

    #[test]
    fn test_other_accents_are_dropped() {
        // Only the Turkish table is transliterated
        assert_eq!(slugify("Café Crème"), "caf-cr-me");
    }

    #[test]
    fn test_deterministic_and_idempotent() {
        for name in ["Çay Bardağı Seti (6'lı)", "ÖZEL ÜRÜN", "a--b", "Şeker 1kg"] {
            let once = slugify(name);
            assert_eq!(once, slugify(name));
            assert_eq!(once, slugify(&once));
        }
    }
}
