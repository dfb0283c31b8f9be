#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use recap_llm::{ChatClient, ChatRequest, ChatResponse, LlmError, Message, TokenUsage};
use recap_persist::InMemoryPersistence;
use recap_pipeline::{Pipeline, PipelineConfig};
use recap_transcribe::{
    AudioSource, Segment, TranscribeError, Transcriber, TranscriptionOutput, TranscriptionProvider,
};

pub fn response(content: &str) -> ChatResponse {
    ChatResponse {
        content: Some(content.to_string()),
        model: "gpt-4o-mini".to_string(),
        usage: Some(TokenUsage {
            input_tokens: 120,
            output_tokens: 80,
            total_tokens: 200,
        }),
        finish_reason: Some("stop".to_string()),
        raw: serde_json::Value::Null,
    }
}

/// Replays scripted results in order, then keeps answering with `fallback`
pub struct FakeChatClient {
    script: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    fallback: String,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChatClient {
    pub fn answering(content: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: content.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }
    
    pub fn scripted(results: Vec<Result<ChatResponse, LlmError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            ..Self::answering("{}")
        }
    }
    
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
    
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
    
    /// Text of the user message of the most recent request
    pub fn last_user_message(&self) -> String {
        let requests = self.requests.lock().unwrap();
        requests
            .last()
            .and_then(|r| {
                r.messages.iter().find_map(|m| match m {
                    Message::Human { content } => Some(content.clone()),
                    _ => None,
                })
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn chat(&self, request: ChatRequest) -> recap_llm::Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(response(&self.fallback)))
    }
    
    fn provider_name(&self) -> &str {
        "fake"
    }
}

/// Network-style provider that needs the downloaded media on disk
pub struct FakeTranscriber {
    text: String,
    calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
    
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::Whisper
    }
    
    async fn transcribe(
        &self,
        source: &AudioSource,
        language: &str,
    ) -> recap_transcribe::Result<TranscriptionOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = source.local_path.as_ref().ok_or(TranscribeError::MissingMedia)?;
        assert!(path.exists(), "media should be on disk while transcribing");
        
        Ok(TranscriptionOutput {
            text: self.text.clone(),
            segments: vec![Segment {
                start: 0.0,
                end: 4.2,
                speaker: Some("A".to_string()),
                text: self.text.clone(),
                confidence: 0.93,
            }],
            duration: Some(4.2),
            language: Some(language.to_string()),
        })
    }
}

pub fn fast_config(temp_dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        summarize_initial_backoff_ms: 1,
        summarize_max_backoff_ms: 5,
        temp_dir: Some(temp_dir.to_path_buf()),
        ..PipelineConfig::default()
    }
}

pub fn build_pipeline(
    store: Arc<InMemoryPersistence>,
    chat: Arc<FakeChatClient>,
    transcriber: Arc<FakeTranscriber>,
    config: PipelineConfig,
) -> Pipeline {
    Pipeline::builder()
        .store(store)
        .chat_client(chat)
        .transcriber(transcriber)
        .config(config)
        .build()
        .expect("pipeline should build")
}
