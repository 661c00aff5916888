//! Text normalization shared by transcript/chunk loading, ASR hypothesis
//! dedup, and the matcher — one implementation used uniformly everywhere
//! text is compared (spec §3).

use unicode_normalization::UnicodeNormalization;

/// Lowercase, NFC-normalize, strip punctuation, turn hyphens into spaces,
/// and collapse whitespace. Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(s: &str) -> String {
    let nfc: String = s.nfc().collect();
    let lowered = nfc.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c == '-' {
            out.push(' ');
        } else if c.is_alphanumeric() || c.is_whitespace() {
            out.push(c);
        }
        // punctuation is dropped
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_idempotent() {
        let s = "Hello, World! -- this is a Test.";
        let once = normalize(s);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn strips_punctuation_and_splits_hyphens() {
        assert_eq!(normalize("well-known, right?"), "well known right");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  too   many   spaces  "), "too many spaces");
    }

    #[test]
    fn lowercases() {
        assert_eq!(normalize("The Ability To Say No"), "the ability to say no");
    }
}
