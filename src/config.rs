/// Draw-rule thresholds parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesConfig {
    /// Half-move clock at which the fifty-move draw applies. The clock never
    /// exceeds 100, so larger values never trigger.
    pub fifty_move_plies: u16,
    /// Occurrences of one position that make a repetition draw.
    pub repetition_limit: u32,
}

impl RulesConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        RulesConfig {
            fifty_move_plies: std::env::var("CHESS_FIFTY_MOVE_PLIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &u16| (1..=100).contains(&n))
                .unwrap_or(100),
            repetition_limit: std::env::var("CHESS_REPETITION_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &u32| n > 0)
                .unwrap_or(3),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            fifty_move_plies: 100,
            repetition_limit: 3,
        }
    }
}
