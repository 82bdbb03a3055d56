use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};

/// Why the user saved a piece of content.
///
/// The classifier coerces anything outside this set to `Other`; the database
/// column stores the kebab-case label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    Learning,
    Career,
    Startup,
    Shopping,
    Entertainment,
    SelfImprovement,
    Other,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::Learning,
        Intent::Career,
        Intent::Startup,
        Intent::Shopping,
        Intent::Entertainment,
        Intent::SelfImprovement,
        Intent::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Intent::Learning => "learning",
            Intent::Career => "career",
            Intent::Startup => "startup",
            Intent::Shopping => "shopping",
            Intent::Entertainment => "entertainment",
            Intent::SelfImprovement => "self-improvement",
            Intent::Other => "other",
        }
    }

    /// Parse a label, collapsing anything unrecognized to `Other`.
    pub fn parse_or_other(label: &str) -> Intent {
        Intent::ALL
            .into_iter()
            .find(|i| i.label() == label)
            .unwrap_or(Intent::Other)
    }

    /// Whether a label is a member of the fixed enumeration.
    pub fn is_valid_label(label: &str) -> bool {
        Intent::ALL.iter().any(|i| i.label() == label)
    }
}

/// One captured item with its enrichment metadata.
///
/// `embedding` never crosses the HTTP boundary — it exists only for
/// similarity ranking inside Postgres.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Save {
    pub id: i64,
    pub user_id: i64,

    pub url: String,
    pub title: Option<String>,
    pub selected_text: Option<String>,
    pub screenshot_text: Option<String>,
    pub summary: Option<String>,

    pub intent: Option<String>,
    pub intent_confidence: Option<f64>,
    pub suggested_action: Option<String>,

    pub action_taken: bool,
    pub engagement_score: f64,
    pub decay_score: f64,

    #[serde(skip_serializing)]
    pub embedding: Option<Vector>,

    pub created_at: DateTime<Utc>,
    pub last_opened_at: Option<DateTime<Utc>>,
}
