use regex_lite::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Adjective,
    Verb,
    Adverb,
    Pronoun,
    Determiner,
    Preposition,
    Conjunction,
    Other,
}

/// Lexical-class tagging for a single lowercase word.
pub trait PartOfSpeechTagger: Send + Sync {
    fn tag(&self, word: &str) -> PartOfSpeech;
}

const PRONOUNS: &[&str] = &[
    "i", "me", "my", "mine", "myself", "you", "your", "yours", "he", "him", "his", "she", "her",
    "hers", "it", "its", "we", "us", "our", "ours", "they", "them", "their", "theirs", "this",
    "that", "these", "those", "i'm", "i've", "i'll", "i'd", "it's", "everything", "something",
    "nothing", "anything", "everyone", "someone", "nobody", "anyone",
];

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "some", "any", "each", "every", "all", "both", "few", "many", "much",
    "more", "most", "other", "another", "such", "no", "one", "two", "three",
];

const PREPOSITIONS: &[&str] = &[
    "in", "on", "at", "to", "for", "from", "with", "without", "about", "of", "by", "into",
    "over", "under", "after", "before", "between", "through", "during", "up", "down", "out",
    "off", "around", "toward", "towards", "like",
];

const CONJUNCTIONS: &[&str] = &[
    "and", "but", "or", "nor", "so", "yet", "because", "although", "though", "while", "if",
    "when", "than", "as", "whether",
];

const VERBS: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "done", "can", "could", "will", "would", "shall", "should", "may", "might", "must",
    "get", "got", "make", "made", "go", "went", "take", "took", "feel", "felt", "think",
    "thought", "know", "knew", "want", "need", "seem", "seems", "keep", "kept", "let", "say",
    "said", "see", "saw", "come", "came", "try", "tried", "tackle", "don't", "didn't", "can't",
    "won't", "isn't", "wasn't", "counts", "pass",
];

const ADVERBS: &[&str] = &[
    "not", "very", "really", "just", "too", "also", "still", "even", "again", "always", "never",
    "often", "sometimes", "today", "tonight", "tomorrow", "yesterday", "now", "then", "here",
    "there", "how", "why", "where", "what", "which", "who", "far", "well", "almost", "bit",
];

const ADJECTIVES: &[&str] = &[
    "good", "great", "bad", "happy", "sad", "new", "old", "big", "small", "little", "long",
    "short", "high", "low", "hard", "easy", "calm", "proud", "tired", "amazing", "grateful",
    "positive", "negative", "daily", "weekly", "busy", "free", "better", "best", "worse",
    "worst", "strong", "weak", "kind", "content", "glad",
];

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ful", "ous", "ive", "able", "ible", "less", "ish", "ic", "al", "ent", "ant",
];
const NOUN_SUFFIXES: &[&str] = &[
    "ness", "ment", "tion", "sion", "ity", "ship", "ism", "ance", "ence", "hood", "ist",
];

/// Rule-based tagger: closed word classes first, then suffix rules, and
/// everything else is a noun.
pub struct HeuristicTagger;

impl HeuristicTagger {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeuristicTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl PartOfSpeechTagger for HeuristicTagger {
    fn tag(&self, word: &str) -> PartOfSpeech {
        if word.is_empty() || word.chars().all(|c| c.is_ascii_digit()) {
            return PartOfSpeech::Other;
        }
        if PRONOUNS.contains(&word) {
            return PartOfSpeech::Pronoun;
        }
        if DETERMINERS.contains(&word) {
            return PartOfSpeech::Determiner;
        }
        if PREPOSITIONS.contains(&word) {
            return PartOfSpeech::Preposition;
        }
        if CONJUNCTIONS.contains(&word) {
            return PartOfSpeech::Conjunction;
        }
        if ADVERBS.contains(&word) {
            return PartOfSpeech::Adverb;
        }
        if VERBS.contains(&word) {
            return PartOfSpeech::Verb;
        }
        if ADJECTIVES.contains(&word) {
            return PartOfSpeech::Adjective;
        }
        if word.len() < 3 {
            return PartOfSpeech::Other;
        }
        if NOUN_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            return PartOfSpeech::Noun;
        }
        if ADJECTIVE_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            return PartOfSpeech::Adjective;
        }
        if word.ends_with("ly") {
            return PartOfSpeech::Adverb;
        }
        if word.ends_with("ing") || word.ends_with("ed") {
            return PartOfSpeech::Verb;
        }
        PartOfSpeech::Noun
    }
}

fn word_regex() -> Option<&'static Regex> {
    static WORD_RE: OnceLock<Option<Regex>> = OnceLock::new();
    WORD_RE
        .get_or_init(|| Regex::new(r"[a-z0-9]+(?:'[a-z]+)?").ok())
        .as_ref()
}

/// Lowercase word tokens in reading order.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase().replace('\u{2019}', "'");
    match word_regex() {
        Some(re) => re
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect(),
        None => super::sentiment::words(&lowered),
    }
}

/// Most frequent nouns and adjectives using the default [`HeuristicTagger`].
pub fn extract_keywords(text: &str, max_count: usize) -> Vec<String> {
    extract_keywords_with(&HeuristicTagger, text, max_count)
}

/// Top `max_count` nouns/adjectives by frequency; ties keep first appearance.
pub fn extract_keywords_with(
    tagger: &dyn PartOfSpeechTagger,
    text: &str,
    max_count: usize,
) -> Vec<String> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for word in tokenize(text) {
        if !matches!(tagger.tag(&word), PartOfSpeech::Noun | PartOfSpeech::Adjective) {
            continue;
        }
        match index.get(&word) {
            Some(&slot) => order[slot].1 += 1,
            None => {
                index.insert(word.clone(), order.len());
                order.push((word, 1));
            }
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
        .into_iter()
        .take(max_count)
        .map(|(word, _)| word)
        .collect()
}
