use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Why a summary version was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryReason {
    Initial,
    RegeneratedByPm,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySection {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    /// Lenient parse of model output; unknown values yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" | "major" => Some(Self::High),
            "medium" | "moderate" | "normal" => Some(Self::Medium),
            "low" | "minor" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
}

/// How much of the model output survived parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityConfidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryQuality {
    pub confidence: QualityConfidence,
    /// Share of the five output fields that came back populated, in `[0, 1]`
    pub score: f32,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub provider: String,
    pub model: String,
    pub prompt_version: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_provider: Option<String>,
}

/// One generated version of a meeting summary.
///
/// Per meeting, versions start at 1 and strictly increase, and exactly one
/// version has `is_latest` set once a write completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub meeting_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_id: Option<String>,
    pub version: u32,
    pub is_latest: bool,
    pub reason: SummaryReason,
    pub overview: String,
    pub sections: Vec<SummarySection>,
    /// Identifiers of the action items created from this summary
    pub action_items: Vec<String>,
    pub decisions: Vec<Decision>,
    pub risks: Vec<Risk>,
    pub quality: SummaryQuality,
    pub generation: GenerationMetadata,
    pub created_at: DateTime<Utc>,
}
