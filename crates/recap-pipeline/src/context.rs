// Merges meeting metadata, transcript, chat and attachments into one prompt document

use recap_types::{Meeting, Transcript};
use serde::Serialize;
use tracing::{debug, warn};

use crate::chat_history::{last_messages, parse_chat_history, ChatMessage};
use crate::config::PipelineConfig;
use crate::download::Downloader;
use crate::extract::{AttachmentExtractor, ExtractedAttachment};
use crate::text::truncate_chars;

pub const NO_TRANSCRIPT: &str = "(no transcript)";
pub const NO_CHAT: &str = "(no chat history)";
pub const NO_ATTACHMENTS: &str = "(no attachments)";

/// The bounded document sent to the model, plus what went into it
#[derive(Debug, Clone, Serialize)]
pub struct MergedContext {
    pub document: String,
    pub transcript_chars: usize,
    pub chat_messages: usize,
    pub attachments: Vec<String>,
    pub truncated: bool,
}

/// Render the context document from already-gathered inputs
pub fn render_document(
    meeting: &Meeting,
    transcript: Option<&str>,
    chat: &[ChatMessage],
    attachments: &[ExtractedAttachment],
) -> String {
    let mut doc = String::from("# Meeting\n");
    if let Some(title) = meeting.title.as_deref().filter(|t| !t.trim().is_empty()) {
        doc.push_str(&format!("Title: {}\n", title.trim()));
    }
    if let Some(at) = meeting.scheduled_at {
        doc.push_str(&format!("Scheduled: {}\n", at.format("%Y-%m-%d %H:%M UTC")));
    }
    if !meeting.participants.is_empty() {
        doc.push_str(&format!("Participants: {}\n", meeting.participants.join(", ")));
    }
    if let Some(language) = &meeting.language {
        doc.push_str(&format!("Language: {}\n", language));
    }
    if let Some(description) = meeting.description.as_deref().filter(|d| !d.trim().is_empty()) {
        doc.push_str(&format!("Description: {}\n", description.trim()));
    }
    
    doc.push_str("\n# Transcript\n");
    match transcript.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => doc.push_str(text),
        None => doc.push_str(NO_TRANSCRIPT),
    }
    
    doc.push_str("\n\n# Chat history\n");
    if chat.is_empty() {
        doc.push_str(NO_CHAT);
    } else {
        let lines: Vec<String> = chat.iter().map(ChatMessage::render).collect();
        doc.push_str(&lines.join("\n"));
    }
    
    doc.push_str("\n\n# Attachments\n");
    if attachments.is_empty() {
        doc.push_str(NO_ATTACHMENTS);
    } else {
        for (i, attachment) in attachments.iter().enumerate() {
            if i > 0 {
                doc.push_str("\n\n");
            }
            doc.push_str(&format!("## {}\n{}", attachment.filename, attachment.text));
        }
    }
    doc.push('\n');
    doc
}

pub struct ContextBuilder {
    downloader: Downloader,
    attachments: AttachmentExtractor,
    chat_message_limit: usize,
    chat_max_bytes: u64,
    max_transcript_chars: usize,
    max_context_chars: usize,
}

impl ContextBuilder {
    pub fn new(downloader: Downloader, attachments: AttachmentExtractor, config: &PipelineConfig) -> Self {
        Self {
            downloader,
            attachments,
            chat_message_limit: config.chat_message_limit,
            chat_max_bytes: config.chat_max_bytes,
            max_transcript_chars: config.max_transcript_chars,
            max_context_chars: config.max_context_chars,
        }
    }
    
    /// Gather every optional input; missing or unreadable ones degrade to placeholders
    pub async fn build(&self, meeting: &Meeting, transcript: Option<&Transcript>) -> MergedContext {
        let (transcript_text, transcript_cut) = match transcript.map(Transcript::text) {
            Some(text) if !text.trim().is_empty() => {
                let (text, cut) = truncate_chars(text, self.max_transcript_chars);
                (Some(text), cut)
            }
            _ => (None, false),
        };
        
        let chat = self.load_chat(meeting).await;
        let attachments = self.attachments.extract_all(&meeting.attachments).await;
        
        let document = render_document(meeting, transcript_text.as_deref(), &chat, &attachments);
        let (document, document_cut) = truncate_chars(&document, self.max_context_chars);
        
        debug!(
            meeting_id = %meeting.id,
            chars = document.len(),
            chat_messages = chat.len(),
            attachments = attachments.len(),
            "Context merged"
        );
        
        MergedContext {
            transcript_chars: transcript_text.as_deref().map(|t| t.chars().count()).unwrap_or(0),
            chat_messages: chat.len(),
            attachments: attachments.into_iter().map(|a| a.filename).collect(),
            truncated: transcript_cut || document_cut,
            document,
        }
    }
    
    async fn load_chat(&self, meeting: &Meeting) -> Vec<ChatMessage> {
        let Some(url) = meeting.chat_history_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Vec::new();
        };
        
        match self.downloader.fetch_bytes(url, self.chat_max_bytes).await {
            Ok(fetched) => {
                let body = String::from_utf8_lossy(&fetched.bytes);
                last_messages(parse_chat_history(&body), self.chat_message_limit)
            }
            Err(e) => {
                warn!(meeting_id = %meeting.id, error = %e, "Chat history unavailable");
                Vec::new()
            }
        }
    }
}
