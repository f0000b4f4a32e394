//! Case-insensitive substring matching for note search.
//!
//! # Invariants
//! - Only the empty query matches everything; whitespace is matched as typed.
//! - Case folding is Unicode-aware (`Reunião` matches `REUNIÃO`).

/// Returns `true` when `needle` occurs in `haystack`, ignoring case.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::contains_ignore_case;

    #[test]
    fn empty_needle_matches_anything() {
        assert!(contains_ignore_case("", ""));
        assert!(contains_ignore_case("coffee", ""));
    }

    #[test]
    fn whitespace_is_not_trimmed() {
        assert!(!contains_ignore_case("ab", " "));
        assert!(contains_ignore_case("a b", " "));
        assert!(!contains_ignore_case("ab", "a "));
        assert!(contains_ignore_case("a b", "A "));
    }

    #[test]
    fn accented_letters_fold_case() {
        assert!(contains_ignore_case("Reunião de Equipe", "REUNIÃO"));
        assert!(contains_ignore_case("MÓDULO CONCLUÍDO", "módulo"));
        assert!(!contains_ignore_case("Modulo", "módulo"));
    }

    #[test]
    fn sql_wildcards_are_plain_characters() {
        assert!(contains_ignore_case("Cupom de 20% off", "0%"));
        assert!(!contains_ignore_case("200 spent", "0%"));
        assert!(!contains_ignore_case("snake", "_"));
    }
}
