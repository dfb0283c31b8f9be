use serde_json::Value;

/// How a model response was turned into JSON
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The whole response was a JSON object
    Parsed(Value),
    /// A JSON object was cut out of surrounding text
    Repaired(Value),
    /// Nothing usable; callers substitute an empty summary
    EmptyFallback,
}

impl ParseOutcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Parsed(v) | Self::Repaired(v) => Some(v),
            Self::EmptyFallback => None,
        }
    }
    
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parsed(_) => "parsed",
            Self::Repaired(_) => "repaired",
            Self::EmptyFallback => "empty_fallback",
        }
    }
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Whole response, then first `{` to last `}`, then give up
pub fn parse_model_output(raw: &str) -> ParseOutcome {
    if let Some(value) = parse_object(raw.trim()) {
        return ParseOutcome::Parsed(value);
    }
    
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Some(value) = parse_object(&raw[start..=end]) {
                return ParseOutcome::Repaired(value);
            }
        }
    }
    
    ParseOutcome::EmptyFallback
}
