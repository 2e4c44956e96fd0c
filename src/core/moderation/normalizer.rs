// Text normalization - canonicalizes input before any matching happens.

use super::pattern_tables::LEET_SUBSTITUTIONS;

/// Longest run of one repeated character kept after collapsing.
const MAX_REPEAT: usize = 2;

/// Canonical form used for matching.
///
/// 1. lowercase
/// 2. fold leet-speak one character at a time (`4` -> `a`, `$` -> `s`, ...)
/// 3. cut runs of 3+ identical characters down to 2 (`fuuuuck` -> `fuuck`)
/// 4. collapse whitespace runs to a single space
pub fn normalize(text: &str) -> String {
    let folded: String = text.to_lowercase().chars().map(fold_leet).collect();
    collapse_whitespace(&collapse_repeats(&folded))
}

/// Same as [`normalize`] without the leet folding step.
///
/// Leet folding also rewrites ordinary punctuation (`!` becomes `i`), so
/// "I want to die!" only matches anything in this form.
pub fn fold_case(text: &str) -> String {
    collapse_whitespace(&collapse_repeats(&text.to_lowercase()))
}

fn fold_leet(c: char) -> char {
    LEET_SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    let mut run = 0;

    for c in text.chars() {
        if prev == Some(c) {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }

        if run <= MAX_REPEAT {
            out.push(c);
        }
    }

    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep only `a-z`, the form blocked-word lookups compare against.
pub(crate) fn strip_non_alpha(token: &str) -> String {
    token.chars().filter(|c| c.is_ascii_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_folds_leet() {
        assert_eq!(normalize("F4CK"), "fack");
        assert_eq!(normalize("$h1t"), "shit");
        assert_eq!(normalize("b0mb"), "bomb");
        assert_eq!(normalize("f*ck"), "fuck");
    }

    #[test]
    fn test_collapses_stretched_letters_to_two() {
        assert_eq!(normalize("fuuuuuuck"), "fuuck");
        assert_eq!(normalize("sooo"), "soo");
        // Doubles are left alone.
        assert_eq!(normalize("book"), "book");
    }

    #[test]
    fn test_leet_fold_happens_before_collapse() {
        // `***` folds to `uuu` first, then collapses.
        assert_eq!(normalize("fu***ck"), "fuuck");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  kill \t\n   my   self  "), "kill my self");
    }

    #[test]
    fn test_fold_case_keeps_punctuation() {
        assert_eq!(fold_case("I want to DIE!!!"), "i want to die!!");
        assert_eq!(normalize("I want to DIE!!!"), "i want to dieii");
    }

    #[test]
    fn test_strip_non_alpha() {
        assert_eq!(strip_non_alpha("fuck,"), "fuck");
        assert_eq!(strip_non_alpha("s-h_i.t"), "shit");
        assert_eq!(strip_non_alpha("..."), "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }
}
