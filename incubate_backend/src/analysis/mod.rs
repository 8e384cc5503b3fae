//! Heuristic text analysis: sentiment, keywords, trends, pattern detectors
//! and the summaries shown on the insights screen. Everything here is pure.

pub mod keywords;
pub mod patterns;
pub mod sentiment;
pub mod summary;
pub mod trend;

pub use keywords::{
    extract_keywords, extract_keywords_with, HeuristicTagger, PartOfSpeech, PartOfSpeechTagger,
};
pub use patterns::{
    calculate_weekly_growth_momentum, detect_goal_progress_correlation, detect_momentum_shift,
    detect_productivity_patterns, detect_recurring_themes, detect_sentiment_trends, PatternDetector,
};
pub use sentiment::{analyze_sentiment, LexiconTagger, SentimentAnalyzer, SentimentTagger};
pub use summary::{
    daily_sentiment, journaling_streak, monthly_high_moments, top_themes, DailySentiment,
    MonthlyScore,
};
pub use trend::calculate_trend;
