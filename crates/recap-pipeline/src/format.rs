// Coerces whatever JSON the model produced into the canonical summary shape

use chrono::{DateTime, NaiveDate, Utc};
use recap_types::{Decision, Priority, QualityConfidence, Risk, Severity, SummaryQuality, SummarySection};
use serde_json::{Map, Value};

use crate::parse::ParseOutcome;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedActionItem {
    pub name: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormattedSummary {
    pub overview: String,
    pub sections: Vec<SummarySection>,
    pub action_items: Vec<ExtractedActionItem>,
    pub decisions: Vec<Decision>,
    pub risks: Vec<Risk>,
}

/// Non-empty trimmed string form of a scalar
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| object.get(*k).and_then(as_text))
}

fn items<'a>(root: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|k| root.get(*k).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

fn overview(root: &Value) -> String {
    match root.get("overview").or_else(|| root.get("summary")) {
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(as_text)
            .collect::<Vec<_>>()
            .join(" "),
        Some(value) => as_text(value).unwrap_or_default(),
        None => String::new(),
    }
}

fn section(value: &Value) -> Option<SummarySection> {
    match value {
        Value::Object(o) => {
            let title = field(o, &["title", "heading", "topic"]).unwrap_or_default();
            let content = match o.get("content").or_else(|| o.get("points")) {
                Some(Value::Array(points)) => points
                    .iter()
                    .filter_map(as_text)
                    .map(|p| format!("- {}", p))
                    .collect::<Vec<_>>()
                    .join("\n"),
                Some(other) => as_text(other).unwrap_or_default(),
                None => field(o, &["text", "body"]).unwrap_or_default(),
            };
            (!title.is_empty() || !content.is_empty()).then_some(SummarySection { title, content })
        }
        other => as_text(other).map(|content| SummarySection {
            title: String::new(),
            content,
        }),
    }
}

fn action_item(value: &Value) -> Option<ExtractedActionItem> {
    match value {
        Value::Object(o) => {
            let description = field(o, &["description", "details"]).unwrap_or_default();
            let name = field(o, &["title", "name", "task", "action"]).or_else(|| {
                (!description.is_empty()).then(|| description.clone())
            })?;
            Some(ExtractedActionItem {
                name,
                description,
                due_date: field(o, &["dueDate", "due_date", "deadline"]).and_then(|d| parse_due_date(&d)),
                priority: field(o, &["priority"])
                    .and_then(|p| Priority::parse(&p))
                    .unwrap_or_default(),
            })
        }
        other => as_text(other).map(|name| ExtractedActionItem {
            name,
            description: String::new(),
            due_date: None,
            priority: Priority::default(),
        }),
    }
}

fn decision(value: &Value) -> Option<Decision> {
    match value {
        Value::Object(o) => Some(Decision {
            title: field(o, &["title", "decision", "name"])?,
            context: field(o, &["context", "rationale", "description"]),
        }),
        other => as_text(other).map(|title| Decision { title, context: None }),
    }
}

fn risk(value: &Value) -> Option<Risk> {
    match value {
        Value::Object(o) => Some(Risk {
            title: field(o, &["title", "risk", "name"])?,
            description: field(o, &["description", "impact", "details"]).unwrap_or_default(),
            severity: field(o, &["severity", "level", "priority"])
                .and_then(|s| Severity::parse(&s))
                .unwrap_or_default(),
        }),
        other => as_text(other).map(|title| Risk {
            title,
            description: String::new(),
            severity: Severity::default(),
        }),
    }
}

impl FormattedSummary {
    /// Never fails: unknown shapes become empty fields
    pub fn from_value(root: &Value) -> Self {
        Self {
            overview: overview(root),
            sections: items(root, &["sections"]).iter().filter_map(section).collect(),
            action_items: items(root, &["actionItems", "action_items"])
                .iter()
                .filter_map(action_item)
                .collect(),
            decisions: items(root, &["decisions"]).iter().filter_map(decision).collect(),
            risks: items(root, &["risks"]).iter().filter_map(risk).collect(),
        }
    }
    
    pub fn from_outcome(outcome: &ParseOutcome) -> Self {
        outcome.value().map(Self::from_value).unwrap_or_default()
    }
    
    /// How many of the five fields carry content
    pub fn populated_fields(&self) -> usize {
        [
            !self.overview.is_empty(),
            !self.sections.is_empty(),
            !self.action_items.is_empty(),
            !self.decisions.is_empty(),
            !self.risks.is_empty(),
        ]
        .iter()
        .filter(|&&populated| populated)
        .count()
    }
    
    pub fn quality(&self, outcome: &ParseOutcome, generated_at: DateTime<Utc>) -> SummaryQuality {
        let confidence = match outcome {
            ParseOutcome::Parsed(_) => QualityConfidence::High,
            ParseOutcome::Repaired(_) => QualityConfidence::Medium,
            ParseOutcome::EmptyFallback => QualityConfidence::Low,
        };
        SummaryQuality {
            confidence,
            score: self.populated_fields() as f32 / 5.0,
            generated_at,
        }
    }
}
