use chrono::{DateTime, Utc};

/// One appended row of `resume_checks`. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub ats_score: f64,
    pub matched_keywords: Vec<String>,
    pub suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
}
