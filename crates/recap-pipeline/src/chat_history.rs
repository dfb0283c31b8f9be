// Meeting chat logs: JSON exports of several shapes, or plain lines

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Option<String>,
    pub text: String,
    pub timestamp: Option<String>,
}

impl ChatMessage {
    pub fn render(&self) -> String {
        let mut line = String::new();
        if let Some(ts) = &self.timestamp {
            line.push_str(&format!("[{}] ", ts));
        }
        if let Some(sender) = &self.sender {
            line.push_str(&format!("{}: ", sender));
        }
        line.push_str(&self.text);
        line
    }
}

const SENDER_KEYS: [&str; 5] = ["sender", "author", "user", "name", "from"];
const TEXT_KEYS: [&str; 4] = ["text", "message", "content", "body"];
const TIME_KEYS: [&str; 5] = ["timestamp", "time", "createdAt", "created_at", "sentAt"];

fn first_string(object: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        // {"user": {"name": "Ana"}}
        Value::Object(inner) => first_string(inner, &["name", "displayName", "username", "email"]),
        _ => None,
    })
}

fn message_from_value(value: &Value) -> Option<ChatMessage> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(ChatMessage {
            sender: None,
            text: s.trim().to_string(),
            timestamp: None,
        }),
        Value::Object(object) => Some(ChatMessage {
            text: first_string(object, &TEXT_KEYS)?,
            sender: first_string(object, &SENDER_KEYS),
            timestamp: first_string(object, &TIME_KEYS),
        }),
        _ => None,
    }
}

/// Parse a chat export; bodies that are not JSON are read one message per line
pub fn parse_chat_history(body: &str) -> Vec<ChatMessage> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items.iter().filter_map(message_from_value).collect(),
        Ok(Value::Object(object)) => object
            .get("messages")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(message_from_value).collect())
            .unwrap_or_default(),
        _ => body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| ChatMessage {
                sender: None,
                text: line.to_string(),
                timestamp: None,
            })
            .collect(),
    }
}

/// Keep only the most recent `limit` messages, in original order
pub fn last_messages(mut messages: Vec<ChatMessage>, limit: usize) -> Vec<ChatMessage> {
    if messages.len() > limit {
        messages.drain(..messages.len() - limit);
    }
    messages
}
