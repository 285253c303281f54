// Rating range
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 16.5;
pub const DEFAULT_RATING: f64 = 5.0;

// Match rating
pub const ADJUSTMENT_FACTOR: f64 = 8.0;
/// Rating gap which multiplies the odds by 10
pub const EXPECTED_SCORE_DIVISOR: f64 = 2.5;

// Match weight
pub const COMPETITIVENESS_GAME_SPAN: f64 = 12.0;
pub const MIN_COMPETITIVENESS: f64 = 0.5;
pub const FORMAT_BASE: f64 = 0.5;
pub const FORMAT_GAME_SPAN: f64 = 20.0;
pub const MAX_FORMAT_WEIGHT: f64 = 1.5;

// Aggregation window
pub const MATCH_AGE_LIMIT_DAYS: i64 = 365;
pub const MAX_MATCHES_TO_CONSIDER: usize = 30;

// Prediction
pub const AVG_GAMES_PER_SET: f64 = 10.0;
pub const GAMES_TO_WIN_SET: u32 = 6;
pub const PREDICTED_SETS: usize = 3;
