use serde::{Deserialize, Serialize};

/// Provider-agnostic chat message; text only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt (instructions)
    System { content: String },
    
    #[serde(rename = "user")]
    Human { content: String },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }
    
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }
    
    /// Wire role name
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
        }
    }
    
    pub fn content(&self) -> &str {
        match self {
            Self::System { content } | Self::Human { content } => content,
        }
    }
}
