// Pattern tables - the data side of the moderation engine.
//
// Everything the engine matches against lives here as plain static data so
// it can be audited and extended without touching the matching code.
// Patterns are written against NORMALIZED text: lowercase, leet folded,
// runs of 3+ identical characters cut down to 2.

use super::moderation_models::{Category, SupportResource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Character-level leet-speak folding, applied after lowercasing.
pub const LEET_SUBSTITUTIONS: &[(char, char)] = &[
    ('0', 'o'),
    ('1', 'i'),
    ('3', 'e'),
    ('4', 'a'),
    ('5', 's'),
    ('7', 't'),
    ('8', 'b'),
    ('9', 'g'),
    ('@', 'a'),
    ('$', 's'),
    ('!', 'i'),
    ('|', 'i'),
    ('+', 't'),
    ('*', 'u'),
];

/// Exact-match single-token denylist.
///
/// NOTE: a hit here is always reported as `Category::Profanity`, whatever
/// the word is actually about. The category patterns below are what give
/// thematic categories (and therefore severity).
pub const BLOCKED_WORDS: &[&str] = &[
    // profanity
    "fuck", "fucking", "fucker", "fucked", "fucks", "motherfucker",
    "shit", "shitty", "bullshit", "bitch", "bitches", "asshole", "bastard",
    "cunt", "dick", "dickhead", "piss", "pissed", "whore", "slut", "twat",
    "wanker", "prick",
    // self-harm
    "suicide", "suicidal", "selfharm",
    // violence
    "murder", "massacre", "stabbing",
    // sexual
    "porn", "porno", "nude", "nudes", "sexting", "horny", "dildo", "blowjob",
    // drugs
    "cocaine", "heroin", "meth", "fentanyl", "ecstasy",
    // hate
    "nazi", "kkk", "nigger", "nigga", "faggot", "fag", "retard", "kike",
    "chink", "spic", "tranny",
];

const PROFANITY_PATTERNS: &[&str] = &[
    r"\bf+[ua]+c+k+(?:e+r+|i+n+g?|e+d+|s+)?\b",
    r"\bm+o+t+h+e+r+f+[ua]+c+k+(?:e+r+|i+n+g?)?s*\b",
    r"\bs+h+i+t+(?:t+y+|s+)?\b",
    r"\bb+i+t+c+h+(?:e+s+|y+)?\b",
    r"\ba+s+h+o+l+e+s*\b",
    r"\bc+u+n+t+s*\b",
    r"\bd+i+c+k+(?:h+e+a+d+)?s*\b",
    r"\bb+a+s+t+a+r+d+s*\b",
    r"\bw+h+o+r+e+s*\b",
];

// Letters carry `+` so that doubled letters left over from run collapsing
// ("diiiie" normalizes to "diie") still match.
//
// `suicid…` has no trailing boundary on purpose: file names such as
// `suicide_notes` glue words together with `_`, which is a word character.
const SELF_HARM_PATTERNS: &[&str] = &[
    r"\bs+u+i+c+i+d+(?:e+|a+l+)",
    r"\bk+i+l+\s*(?:m+y+\s*)?s+e+l+f+\b",
    r"\b(?:w+a+n+(?:t+|n+a+)|g+o+(?:i+n+g+|n+n+a+))\s+(?:t+o+\s+)?d+i+e+\b",
    r"\be+n+d+(?:i+n+g+)?\s+(?:m+y+\s+l+i+f+e+|i+t+\s+a+l+l+)\b",
    r"\bs+e+l+f+[\s_-]*h+a+r+m+(?:i+n+g+)?\b",
    r"\b(?:c+u+t+(?:t+i+n+g+)?|h+u+r+t+(?:i+n+g+)?)\s+m+y+s+e+l+f+\b",
    r"\bb+e+t+e+r+\s+o+f+\s+d+e+a+d+\b",
    r"\bn+o+\s+r+e+a+s+o+n+\s+t+o+\s+l+i+v+e+\b",
];

// Telling someone else to kill themselves is treated as a threat, not as a
// self-harm disclosure.
const VIOLENCE_PATTERNS: &[&str] = &[
    r"\bk+i+l+\s+(?:y+o+u+|u+|h+i+m+|h+e+r+|t+h+e+m+|e+v+e+r+y+o+n+e+|e+v+e+r+y+b+o+d+y+)\b",
    r"\bk+i+l+\s*(?:y+o+u+r+|u+r+)\s*s+e+l+f+\b",
    r"\bk+y+s+\b",
    r"\b(?:s+h+o+o+t+|s+t+a+b+|m+u+r+d+e+r+)(?:i+n+g+)?\s+(?:y+o+u+|u+|h+i+m+|h+e+r+|t+h+e+m+|e+v+e+r+y+o+n+e+|p+e+o+p+l+e+|u+p+)\b",
    r"\b(?:s+c+h+o+o+l+|m+a+s+s+)\s+s+h+o+o+t+i+n+g+\b",
    r"\bb+e+a+t+\s+(?:y+o+u+|h+i+m+|h+e+r+|t+h+e+m+)\s+u+p+\b",
    r"\bm+u+r+d+e+r+(?:e+d+|e+r+s*|i+n+g+)?\b",
];

const SEXUAL_PATTERNS: &[&str] = &[
    r"\bporn(?:o|ography)?\b",
    r"\bnudes?\b",
    r"\bsex(?:ting|ual|y)?\b",
    r"\bhorny\b",
    r"\bnaked\b",
    r"\bblow\s*job\b",
];

const DRUG_PATTERNS: &[&str] = &[
    r"\b(?:cocaine|heroin|meth|methamphetamine|fentanyl|ecstasy|mdma|lsd|ketamine|xanax)\b",
    r"\bsmok(?:e|ing)\s+(?:weed|pot|crack|meth)\b",
    r"\bget(?:ting)?\s+(?:high|stoned|wasted)\b",
    r"\bbuy(?:ing)?\s+(?:drugs|weed|pills)\b",
];

const HATE_PATTERNS: &[&str] = &[
    r"\bi\s+hate\s+(?:all\s+)?(?:jews|muslims|christians|blacks|whites|asians|gays|immigrants|mexicans)\b",
    r"\b(?:nazis?|white\s+power|heil\s+hitler)\b",
    r"\bgo\s+back\s+to\s+your\s+country\b",
    r"\bn+i+g+g+(?:e+r+|a+)s*\b",
    r"\bf+a+g+(?:o+t+)?s*\b",
    r"\br+e+t+a+r+d+(?:e+d+|s+)?\b",
];

const DANGEROUS_PATTERNS: &[&str] = &[
    r"\bhow\s+to\s+(?:make|build)\s+(?:a\s+)?(?:bomb|explosive|weapon|gun|poison)s?\b",
    r"\b(?:bomb|explosive)\s+(?:making|instructions|recipe)\b",
    r"\bpoison\s+(?:someone|him|her|them|my)\b",
    r"\bhack(?:ing)?\s+(?:into|someone)\b",
    r"\brun(?:ning)?\s+away\s+from\s+home\b",
    r"\bmeet(?:ing)?\s+(?:up\s+with\s+)?(?:a\s+)?stranger\b",
];

/// Built-in patterns per category.
pub fn builtin_patterns(category: Category) -> &'static [&'static str] {
    match category {
        Category::Profanity => PROFANITY_PATTERNS,
        Category::SelfHarm => SELF_HARM_PATTERNS,
        Category::Violence => VIOLENCE_PATTERNS,
        Category::Sexual => SEXUAL_PATTERNS,
        Category::Drugs => DRUG_PATTERNS,
        Category::Hate => HATE_PATTERNS,
        Category::Dangerous => DANGEROUS_PATTERNS,
    }
}

pub const SELF_HARM_MESSAGE: &str = "It sounds like you might be going through something really hard right now. \
You matter, and you don't have to handle this alone. Please reach out to someone you trust, \
or to one of the free, confidential support lines below. They're there to listen, any time.";

pub const GENERIC_BLOCK_MESSAGE: &str =
    "That kind of language isn't allowed here. Let's keep things positive and respectful!";

pub const SUPPORT_RESOURCES: &[SupportResource] = &[
    SupportResource {
        name: "Crisis Text Line",
        contact: "Text HOME to 741741",
        description: "Free, 24/7 support by text with a trained crisis counselor.",
    },
    SupportResource {
        name: "988 Suicide & Crisis Lifeline",
        contact: "Call or text 988",
        description: "Free and confidential support for people in distress, 24/7.",
    },
    SupportResource {
        name: "Teen Line",
        contact: "Text TEEN to 839863",
        description: "Teens helping teens. Talk to someone your own age who gets it.",
    },
];

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid {category} pattern `{pattern}`: {source}")]
    InvalidPattern {
        category: Category,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed pattern table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serializable form of the tables, used to extend the built-ins from a file.
///
/// ```json
/// { "blocked_words": ["frick"], "patterns": { "drugs": ["\\bvap(?:e|ing)\\b"] } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternTable {
    #[serde(default)]
    pub blocked_words: Vec<String>,
    #[serde(default)]
    pub patterns: BTreeMap<Category, Vec<String>>,
}

impl PatternTable {
    /// The tables compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            blocked_words: BLOCKED_WORDS.iter().map(|w| w.to_string()).collect(),
            patterns: Category::ALL
                .into_iter()
                .map(|category| {
                    let patterns = builtin_patterns(category)
                        .iter()
                        .map(|p| p.to_string())
                        .collect();
                    (category, patterns)
                })
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Append another table's words and patterns to this one.
    pub fn merge(&mut self, other: PatternTable) {
        self.blocked_words.extend(other.blocked_words);
        for (category, patterns) in other.patterns {
            self.patterns.entry(category).or_default().extend(patterns);
        }
    }

    pub fn patterns_for(&self, category: Category) -> &[String] {
        self.patterns
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
