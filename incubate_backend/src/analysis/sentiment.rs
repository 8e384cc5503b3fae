//! On-device sentiment scoring.
//!
//! Two scorers live here. [`analyze_sentiment`] is the plain keyword ratio the
//! pattern detectors use. [`SentimentAnalyzer`] blends a pluggable
//! [`SentimentTagger`] with keyword density and a gratitude bonus; the
//! summaries and the conversation layer use that one.

const POSITIVE_WORDS: [&str; 20] = [
    "amazing",
    "great",
    "awesome",
    "wonderful",
    "excellent",
    "fantastic",
    "happy",
    "joy",
    "love",
    "excited",
    "motivated",
    "energized",
    "grateful",
    "proud",
    "successful",
    "accomplished",
    "productive",
    "inspired",
    "confident",
    "optimistic",
];

const NEGATIVE_WORDS: [&str; 20] = [
    "terrible",
    "awful",
    "horrible",
    "bad",
    "sad",
    "angry",
    "frustrated",
    "disappointed",
    "worried",
    "anxious",
    "stressed",
    "overwhelmed",
    "tired",
    "exhausted",
    "defeated",
    "hopeless",
    "lonely",
    "afraid",
    "scared",
    "nervous",
];

// Extra vocabulary counted only by the density boost.
const EXTRA_POSITIVE_WORDS: &[&str] = &[
    "joyful",
    "content",
    "hopeful",
    "calm",
    "peaceful",
    "thankful",
    "blessed",
    "appreciate",
    "appreciative",
    "glad",
    "good",
    "better",
    "positive",
    "strong",
    "fulfilled",
    "relaxed",
    "pleased",
    "thrilled",
    "encouraged",
    "celebrating",
    "wins",
    "growth",
    "progress",
    "energy",
];

const EXTRA_NEGATIVE_WORDS: &[&str] = &[
    "drained",
    "disconnected",
    "struggling",
    "upset",
    "depressed",
    "stuck",
    "lost",
    "hurt",
    "miserable",
    "unmotivated",
    "burned",
    "burnout",
    "insecure",
    "guilty",
    "ashamed",
    "down",
    "difficult",
    "painful",
];

const GRATITUDE_STEMS: &[&str] = &[
    "grateful", "gratitude", "thankful", "thanks", "appreciat", "blessed",
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "didn't", "isn't", "wasn't", "can't", "won't", "hardly",
];

/// Valence lexicon for [`LexiconTagger`], weights in [-1, 1].
const VALENCE: &[(&str, f64)] = &[
    ("amazing", 0.9),
    ("awesome", 0.8),
    ("wonderful", 0.9),
    ("excellent", 0.9),
    ("fantastic", 0.9),
    ("great", 0.7),
    ("good", 0.5),
    ("better", 0.4),
    ("happy", 0.8),
    ("joy", 0.8),
    ("joyful", 0.8),
    ("love", 0.8),
    ("excited", 0.7),
    ("motivated", 0.6),
    ("energized", 0.6),
    ("grateful", 0.8),
    ("thankful", 0.8),
    ("blessed", 0.7),
    ("appreciate", 0.6),
    ("proud", 0.7),
    ("successful", 0.7),
    ("accomplished", 0.7),
    ("productive", 0.6),
    ("inspired", 0.7),
    ("confident", 0.6),
    ("optimistic", 0.6),
    ("hopeful", 0.5),
    ("calm", 0.4),
    ("content", 0.4),
    ("positive", 0.5),
    ("terrible", -0.9),
    ("awful", -0.9),
    ("horrible", -0.9),
    ("bad", -0.6),
    ("sad", -0.7),
    ("angry", -0.7),
    ("frustrated", -0.6),
    ("disappointed", -0.6),
    ("worried", -0.5),
    ("anxious", -0.6),
    ("stressed", -0.6),
    ("overwhelmed", -0.6),
    ("tired", -0.4),
    ("exhausted", -0.6),
    ("drained", -0.5),
    ("defeated", -0.7),
    ("hopeless", -0.8),
    ("lonely", -0.6),
    ("disconnected", -0.5),
    ("afraid", -0.6),
    ("scared", -0.6),
    ("nervous", -0.4),
    ("struggling", -0.4),
    ("challenging", -0.2),
];

/// Lowercased whitespace tokens with surrounding punctuation removed.
pub(crate) fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Keyword ratio `positive / (positive + negative)`; 0.5 when the text has no
/// emotional words.
pub fn analyze_sentiment(text: &str) -> f64 {
    let mut positive = 0usize;
    let mut negative = 0usize;

    for word in words(text) {
        if POSITIVE_WORDS.contains(&word.as_str()) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&word.as_str()) {
            negative += 1;
        }
    }

    let total = positive + negative;
    if total == 0 {
        return 0.5;
    }
    positive as f64 / total as f64
}

/// Scores text in [-1, 1]. `None` means the tagger has no opinion.
pub trait SentimentTagger: Send + Sync {
    fn score(&self, text: &str) -> Option<f64>;
}

/// Mean lexicon valence of the words it knows, with a negator directly
/// before a word flipping and halving it.
pub struct LexiconTagger;

impl LexiconTagger {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LexiconTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentTagger for LexiconTagger {
    fn score(&self, text: &str) -> Option<f64> {
        let tokens = words(text);
        let mut total = 0.0;
        let mut matched = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let Some((_, valence)) = VALENCE.iter().find(|(w, _)| *w == token.as_str()) else {
                continue;
            };
            let negated = i > 0 && NEGATORS.contains(&tokens[i - 1].as_str());
            total += if negated { -valence * 0.5 } else { *valence };
            matched += 1;
        }

        if matched == 0 {
            return None;
        }
        Some((total / matched as f64).clamp(-1.0, 1.0))
    }
}

pub struct SentimentAnalyzer {
    tagger: Box<dyn SentimentTagger>,
}

impl SentimentAnalyzer {
    pub fn new(tagger: Box<dyn SentimentTagger>) -> Self {
        Self { tagger }
    }

    /// Tagger output rescaled to [0, 1]; anything unusable reads as neutral.
    pub fn tagged_sentiment(&self, text: &str) -> f64 {
        match self.tagger.score(text) {
            Some(score) if score.is_finite() && (-1.0..=1.0).contains(&score) => {
                (score + 1.0) / 2.0
            }
            Some(score) => {
                tracing::debug!("Ignoring out-of-range tagger score {}", score);
                0.5
            }
            None => 0.5,
        }
    }

    pub fn enhanced_sentiment(&self, text: &str) -> f64 {
        let base = self.tagged_sentiment(text);
        let tokens = words(text);
        let boost = density_boost(&tokens);

        let mut score = 0.4 * base + 0.6 * boost;
        if has_gratitude(&tokens) {
            score += 0.3;
        }
        score.clamp(0.0, 1.0)
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new(Box::new(LexiconTagger::new()))
    }
}

fn is_positive_word(word: &str) -> bool {
    POSITIVE_WORDS.contains(&word) || EXTRA_POSITIVE_WORDS.contains(&word)
}

fn is_negative_word(word: &str) -> bool {
    NEGATIVE_WORDS.contains(&word) || EXTRA_NEGATIVE_WORDS.contains(&word)
}

fn density_boost(tokens: &[String]) -> f64 {
    let positive = tokens.iter().filter(|w| is_positive_word(w)).count();
    let negative = tokens.iter().filter(|w| is_negative_word(w)).count();
    if positive + negative == 0 {
        return 0.5;
    }

    let delta = positive as f64 - negative as f64;
    (0.5 + delta / tokens.len() as f64 * 2.5).clamp(0.0, 1.0)
}

fn has_gratitude(tokens: &[String]) -> bool {
    tokens
        .iter()
        .any(|w| GRATITUDE_STEMS.iter().any(|stem| w.starts_with(stem)))
}
