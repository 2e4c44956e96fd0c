// Moderation engine - the pure, synchronous content screen.
//
// Pipeline for one call:
// - normalize the text (see normalizer.rs)
// - check every whitespace token against the blocked-word set
// - run every category matcher, in fixed order, with no early exit
// - derive severity and the user-facing message from the final category set
//
// The engine holds only compiled, immutable tables. It is Send + Sync and
// can be shared across any number of concurrent callers without locking.

use super::moderation_models::{Category, ModerationResult, Severity, SupportResource};
use super::normalizer::{fold_case, normalize, strip_non_alpha};
use super::pattern_tables::{
    PatternError, PatternTable, GENERIC_BLOCK_MESSAGE, SELF_HARM_MESSAGE, SUPPORT_RESOURCES,
};
use once_cell::sync::Lazy;
use regex::{Captures, Regex, RegexSet};
use std::collections::HashSet;

static BUILTIN_ENGINE: Lazy<ModerationEngine> = Lazy::new(ModerationEngine::builtin);

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\S+").unwrap_or_else(|err| panic!("BUG: token pattern does not compile: {err}"))
});

// ============================================================================
// MATCHERS
// ============================================================================

/// Compiled patterns for one category.
#[derive(Debug)]
struct CategoryMatcher {
    category: Category,
    /// Cheap "does anything match at all" check.
    set: RegexSet,
    /// Same patterns, individually, to pull out the matched text.
    regexes: Vec<Regex>,
}

impl CategoryMatcher {
    fn compile(category: Category, patterns: &[String]) -> Result<Self, PatternError> {
        let regexes = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| PatternError::InvalidPattern {
                    category,
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let set = RegexSet::new(patterns).map_err(|source| PatternError::InvalidPattern {
            category,
            pattern: patterns.join(" | "),
            source,
        })?;

        Ok(Self {
            category,
            set,
            regexes,
        })
    }

    /// Every match of every pattern in this category.
    fn find_matches<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.set
            .matches(text)
            .into_iter()
            .flat_map(move |i| self.regexes[i].find_iter(text).map(|m| m.as_str()))
            .collect()
    }
}

/// Accumulates what a scan found, de-duplicating as it goes.
#[derive(Default)]
struct Findings {
    categories: Vec<Category>,
    flagged: Vec<String>,
}

impl Findings {
    fn record(&mut self, category: Category, matched: &str) {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        if !self.flagged.iter().any(|f| f == matched) {
            self.flagged.push(matched.to_string());
        }
    }

    fn into_result(self) -> ModerationResult {
        let severity = classify(&self.categories);
        let message = message_for(&self.categories).map(str::to_string);

        ModerationResult {
            is_clean: self.categories.is_empty(),
            blocked_categories: self.categories,
            flagged_content: self.flagged,
            severity,
            message,
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug)]
pub struct ModerationEngine {
    blocked_words: HashSet<String>,
    /// One matcher per category, in `Category::ALL` order.
    matchers: Vec<CategoryMatcher>,
}

impl ModerationEngine {
    /// Compile a pattern table.
    pub fn from_table(table: &PatternTable) -> Result<Self, PatternError> {
        let blocked_words = table
            .blocked_words
            .iter()
            .map(|word| strip_non_alpha(&word.trim().to_lowercase()))
            .filter(|word| !word.is_empty())
            .collect();

        let matchers = Category::ALL
            .into_iter()
            .map(|category| CategoryMatcher::compile(category, table.patterns_for(category)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            blocked_words,
            matchers,
        })
    }

    /// The engine built from the tables compiled into the binary.
    pub fn builtin() -> Self {
        Self::compile_builtin(&PatternTable::builtin())
    }

    /// Panics if `table` does not compile; only used for tables that ship
    /// with the binary.
    fn compile_builtin(table: &PatternTable) -> Self {
        Self::from_table(table).unwrap_or_else(|err| {
            panic!("BUG: built-in moderation tables do not compile: {err}");
        })
    }

    /// Screen a piece of user-authored text.
    ///
    /// Never fails: empty input is simply clean.
    pub fn moderate_content(&self, text: &str) -> ModerationResult {
        if text.trim().is_empty() {
            return ModerationResult::clean();
        }

        let normalized = normalize(text);
        let plain = fold_case(text);
        let mut findings = Findings::default();

        self.scan_blocked_words(text, &mut findings);

        for matcher in &self.matchers {
            for matched in matcher.find_matches(&normalized) {
                findings.record(matcher.category, matched);
            }
            if plain != normalized {
                for matched in matcher.find_matches(&plain) {
                    findings.record(matcher.category, matched);
                }
            }
        }

        let result = findings.into_result();

        if !result.is_clean {
            tracing::debug!(
                severity = %result.severity,
                categories = ?result.blocked_categories,
                flagged = ?result.flagged_content,
                "Content flagged"
            );
        }

        result
    }

    /// Screen a file name: the last `.ext` segment is dropped first.
    pub fn moderate_filename(&self, filename: &str) -> ModerationResult {
        self.moderate_content(strip_extension(filename))
    }

    /// Screen an untyped JSON value from a request body.
    ///
    /// Anything that isn't a string is treated as clean rather than rejected.
    pub fn moderate_value(&self, value: &serde_json::Value) -> ModerationResult {
        match value {
            serde_json::Value::String(text) => self.moderate_content(text),
            _ => ModerationResult::clean(),
        }
    }

    /// Mask blocked words for display: `fuck you` -> `f*** you`.
    ///
    /// Only single blocked tokens are touched. Phrase-pattern matches such
    /// as "kill myself" pass through unchanged, so this is not a
    /// substitute for [`ModerationEngine::moderate_content`].
    pub fn sanitize_text(&self, text: &str) -> String {
        TOKEN
            .replace_all(text, |caps: &Captures<'_>| {
                let token = &caps[0];
                if self.is_blocked(&strip_non_alpha(&token.to_lowercase())) {
                    mask(token)
                } else {
                    token.to_string()
                }
            })
            .into_owned()
    }

    fn scan_blocked_words(&self, text: &str, findings: &mut Findings) {
        for token in text.split_whitespace() {
            // Leet folding turns trailing `!` into `i` and collapsing eats
            // triple letters (`kkk`), so the less processed forms get a look too.
            let hit = [normalize(token), fold_case(token), token.to_lowercase()]
                .into_iter()
                .find(|form| self.is_blocked(&strip_non_alpha(form)));

            if let Some(form) = hit {
                findings.record(Category::Profanity, &form);
            }
        }
    }

    fn is_blocked(&self, word: &str) -> bool {
        !word.is_empty() && self.blocked_words.contains(word)
    }
}

impl Default for ModerationEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) => {
            let ext = &filename[dot + 1..];
            if ext.is_empty() || ext.contains(['/', '\\']) {
                filename
            } else {
                &filename[..dot]
            }
        }
        None => filename,
    }
}

fn mask(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => std::iter::once(first).chain(chars.map(|_| '*')).collect(),
        None => String::new(),
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Severity ladder over the final category set.
///
/// Self-harm always wins and is the only path to `Critical`; hate alone is
/// `High`.
pub fn classify(categories: &[Category]) -> Severity {
    let has = |category| categories.contains(&category);

    if has(Category::SelfHarm) {
        Severity::Critical
    } else if has(Category::Hate) || has(Category::Violence) || has(Category::Dangerous) {
        Severity::High
    } else if has(Category::Sexual) || has(Category::Drugs) {
        Severity::Medium
    } else if !categories.is_empty() {
        Severity::Low
    } else {
        Severity::None
    }
}

/// The canned message shown to the user for a category set.
pub fn message_for(categories: &[Category]) -> Option<&'static str> {
    if categories.contains(&Category::SelfHarm) {
        Some(SELF_HARM_MESSAGE)
    } else if !categories.is_empty() {
        Some(GENERIC_BLOCK_MESSAGE)
    } else {
        None
    }
}

// ============================================================================
// BUILT-IN ENGINE SHORTCUTS
// ============================================================================

pub fn moderate_content(text: &str) -> ModerationResult {
    BUILTIN_ENGINE.moderate_content(text)
}

pub fn moderate_filename(filename: &str) -> ModerationResult {
    BUILTIN_ENGINE.moderate_filename(filename)
}

pub fn sanitize_text(text: &str) -> String {
    BUILTIN_ENGINE.sanitize_text(text)
}

/// Crisis-support contacts to show alongside a self-harm block.
pub fn get_support_resources() -> Vec<SupportResource> {
    SUPPORT_RESOURCES.to_vec()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_engine_compiles() {
        let engine = ModerationEngine::builtin();
        assert_eq!(engine.matchers.len(), Category::ALL.len());
        for (matcher, category) in engine.matchers.iter().zip(Category::ALL) {
            assert_eq!(matcher.category, category);
        }
    }

    #[test]
    fn test_empty_input_is_clean() {
        for text in ["", "   ", "\n\t"] {
            let result = moderate_content(text);
            assert_eq!(result, ModerationResult::clean());
            assert!(result.blocked_categories.is_empty());
            assert!(result.flagged_content.is_empty());
            assert_eq!(result.severity, Severity::None);
        }
    }

    #[test]
    fn test_non_string_values_are_clean() {
        let engine = ModerationEngine::builtin();
        for value in [json!(null), json!(42), json!(["fuck"]), json!({"text": "fuck"})] {
            assert_eq!(engine.moderate_value(&value), ModerationResult::clean());
        }
        assert!(!engine.moderate_value(&json!("fuck off")).is_clean);
    }

    #[test]
    fn test_harmless_text_is_clean() {
        let result = moderate_content("Let's talk about cats and homework");
        assert!(result.is_clean);
        assert_eq!(result.severity, Severity::None);
        assert_eq!(result.message, None);
    }

    #[test]
    fn test_blocked_word_is_profanity() {
        for text in ["fuck", "FUCK off", "well, Shit.", "you bastard", "Fuck!"] {
            let result = moderate_content(text);
            assert!(!result.is_clean, "{text:?} should be blocked");
            assert!(result.has_category(Category::Profanity), "{text:?}");
            assert_eq!(result.message.as_deref(), Some(GENERIC_BLOCK_MESSAGE));
        }
    }

    #[test]
    fn test_word_list_tags_everything_as_profanity() {
        // "nazi" is a hate term, but the word list always says profanity;
        // the hate pattern adds the real category on top.
        let result = moderate_content("nazi");
        assert_eq!(
            result.blocked_categories,
            vec![Category::Profanity, Category::Hate]
        );
        assert_eq!(result.severity, Severity::High);
    }

    #[test]
    fn test_triple_letter_words_survive_collapsing() {
        let result = moderate_content("kkk");
        assert_eq!(result.blocked_categories, vec![Category::Profanity]);
        assert_eq!(result.flagged_content, vec!["kkk"]);
    }

    #[test]
    fn test_leet_speak_is_folded() {
        let result = moderate_content("f4ck this");
        assert!(result.has_category(Category::Profanity));
        assert_eq!(result.flagged_content, vec!["fack"]);

        assert!(moderate_content("what the $h1t").has_category(Category::Profanity));
        assert!(moderate_content("how to make a b0mb").has_category(Category::Dangerous));
    }

    #[test]
    fn test_stretched_letters_are_caught() {
        let result = moderate_content("fuuuuuuck");
        assert!(result.has_category(Category::Profanity));
        assert_eq!(result.flagged_content, vec!["fuuck"]);
    }

    #[test]
    fn test_self_harm_is_critical() {
        let result = moderate_content("I want to kill myself");
        assert!(result.has_category(Category::SelfHarm));
        assert_eq!(result.severity, Severity::Critical);
        assert_eq!(result.message.as_deref(), Some(SELF_HARM_MESSAGE));
    }

    #[test]
    fn test_stretched_self_harm_is_critical() {
        for text in [
            "I want to diiiie",
            "I want to kiiiill myself",
            "suiiiicide",
            "i'm better off deeeead",
        ] {
            let result = moderate_content(text);
            assert!(result.has_category(Category::SelfHarm), "{text:?} was not caught");
            assert_eq!(result.severity, Severity::Critical, "{text:?}");
        }
    }

    #[test]
    fn test_stretched_threats_are_caught() {
        let result = moderate_content("I will kiiiill you");
        assert_eq!(result.blocked_categories, vec![Category::Violence]);
        assert_eq!(result.severity, Severity::High);
    }

    #[test]
    fn test_telling_someone_to_kill_themselves_is_violence() {
        for text in ["go kill yourself", "just kys", "kill urself"] {
            let result = moderate_content(text);
            assert_eq!(result.blocked_categories, vec![Category::Violence], "{text:?}");
            assert_eq!(result.severity, Severity::High, "{text:?}");
        }
    }

    #[test]
    fn test_country_name_is_not_a_slur() {
        assert!(moderate_content("Niger is a country in Africa").is_clean);
        assert!(moderate_content("the capital of Nigeria is Abuja").is_clean);
    }

    #[test]
    fn test_self_harm_with_trailing_punctuation() {
        let result = moderate_content("I just want to die!");
        assert!(result.has_category(Category::SelfHarm));
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn test_self_harm_overrides_everything_else() {
        let result = moderate_content("fuck this, I want to kill myself and murder everyone");
        assert_eq!(
            result.blocked_categories,
            vec![Category::Profanity, Category::SelfHarm, Category::Violence]
        );
        assert_eq!(result.severity, Severity::Critical);
        assert_eq!(result.message.as_deref(), Some(SELF_HARM_MESSAGE));
    }

    #[test]
    fn test_hate_without_self_harm_is_high() {
        let result = moderate_content("I hate all immigrants");
        assert_eq!(result.blocked_categories, vec![Category::Hate]);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.message.as_deref(), Some(GENERIC_BLOCK_MESSAGE));
    }

    #[test]
    fn test_severity_per_category() {
        assert_eq!(moderate_content("I will kill you").severity, Severity::High);
        assert_eq!(moderate_content("how to make a bomb").severity, Severity::High);
        assert_eq!(moderate_content("send nudes").severity, Severity::Medium);
        assert_eq!(moderate_content("where can I buy weed").severity, Severity::Medium);
        assert_eq!(moderate_content("this is shit").severity, Severity::Low);
    }

    #[test]
    fn test_classify_ladder() {
        assert_eq!(classify(&[]), Severity::None);
        assert_eq!(classify(&[Category::Profanity]), Severity::Low);
        assert_eq!(classify(&[Category::Drugs, Category::Profanity]), Severity::Medium);
        assert_eq!(classify(&[Category::Sexual, Category::Dangerous]), Severity::High);
        assert_eq!(classify(&[Category::Hate]), Severity::High);
        assert_eq!(
            classify(&[Category::Hate, Category::Profanity, Category::SelfHarm]),
            Severity::Critical
        );
    }

    #[test]
    fn test_message_for() {
        assert_eq!(message_for(&[]), None);
        assert_eq!(message_for(&[Category::Drugs]), Some(GENERIC_BLOCK_MESSAGE));
        assert_eq!(
            message_for(&[Category::Drugs, Category::SelfHarm]),
            Some(SELF_HARM_MESSAGE)
        );
    }

    #[test]
    fn test_results_are_deduplicated() {
        let result = moderate_content("shit shit SHIT");
        assert_eq!(result.blocked_categories, vec![Category::Profanity]);
        assert_eq!(result.flagged_content, vec!["shit"]);
    }

    #[test]
    fn test_moderation_is_idempotent() {
        let text = "I hate my life, this shit is too much";
        assert_eq!(moderate_content(text), moderate_content(text));
    }

    #[test]
    fn test_end_to_end_self_harm() {
        let result = moderate_content("I hate my life and want to die");
        assert!(!result.is_clean);
        assert!(result.has_category(Category::SelfHarm));
        assert_eq!(result.severity, Severity::Critical);
        assert_eq!(result.message.as_deref(), Some(SELF_HARM_MESSAGE));
        assert!(!result.flagged_content.is_empty());
    }

    #[test]
    fn test_filename_drops_extension() {
        let result = moderate_filename("suicide_notes.txt");
        assert!(result.has_category(Category::SelfHarm));
        assert_eq!(result, moderate_content("suicide_notes"));

        assert!(moderate_filename("holiday_photos.png").is_clean);
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("notes.txt"), "notes");
        assert_eq!(strip_extension("archive.tar.gz"), "archive.tar");
        assert_eq!(strip_extension("README"), "README");
        assert_eq!(strip_extension("trailing."), "trailing.");
        assert_eq!(strip_extension("dir.d/file"), "dir.d/file");
    }

    #[test]
    fn test_sanitize_masks_blocked_words() {
        assert_eq!(sanitize_text("fuck you"), "f*** you");
        assert_eq!(sanitize_text("Fuck!"), "F****");
        assert_eq!(sanitize_text("a  shit\tday"), "a  s***\tday");
        assert_eq!(sanitize_text("nice day"), "nice day");
    }

    #[test]
    fn test_sanitize_leaves_phrase_matches_alone() {
        let text = "I want to kill myself";
        assert_eq!(sanitize_text(text), text);
        assert!(!moderate_content(text).is_clean);
    }

    #[test]
    fn test_support_resources_are_fixed() {
        let resources = get_support_resources();
        assert_eq!(resources.len(), 3);
        assert!(resources.iter().all(|r| !r.contact.is_empty()));
        assert_eq!(resources, get_support_resources());
    }

    #[test]
    fn test_custom_table_extends_engine() {
        let mut table = PatternTable::builtin();
        table.merge(PatternTable {
            blocked_words: vec![" Frick ".to_string()],
            ..Default::default()
        });
        let engine = ModerationEngine::from_table(&table).unwrap();

        assert!(engine.moderate_content("oh frick").has_category(Category::Profanity));
        assert_eq!(engine.sanitize_text("frick"), "f****");
        assert!(moderate_content("oh frick").is_clean);
    }

    #[test]
    #[should_panic(expected = "BUG: built-in moderation tables do not compile")]
    fn test_broken_builtin_table_panics() {
        let mut table = PatternTable::builtin();
        table
            .patterns
            .insert(Category::Hate, vec!["[unclosed".to_string()]);
        ModerationEngine::compile_builtin(&table);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let mut table = PatternTable::default();
        table
            .patterns
            .insert(Category::Drugs, vec!["(unclosed".to_string()]);

        let err = ModerationEngine::from_table(&table).unwrap_err();
        assert!(matches!(
            err,
            PatternError::InvalidPattern {
                category: Category::Drugs,
                ..
            }
        ));
    }
}
