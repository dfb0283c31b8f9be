//! Plain-text extraction for the document types meetings carry as attachments.

use async_trait::async_trait;
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    
    #[error("Word document extraction failed: {0}")]
    Word(String),
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Converts one document format to plain text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, content: &[u8]) -> ExtractResult<String>;
    
    fn supported_types(&self) -> Vec<&'static str>;
    
    fn can_handle(&self, content_type: &str) -> bool {
        self.supported_types()
            .iter()
            .any(|&t| content_type.starts_with(t))
    }
    
    fn name(&self) -> &'static str;
}

/// UTF-8 with a Windows-1252 fallback
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, content: &[u8]) -> ExtractResult<String> {
        let text = match std::str::from_utf8(content) {
            Ok(s) => s.to_string(),
            Err(_) => {
                let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(content);
                debug!(lossy = had_errors, "Decoded attachment as windows-1252");
                decoded.into_owned()
            }
        };
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }
    
    fn supported_types(&self) -> Vec<&'static str> {
        vec!["text/", "application/json", "application/xml"]
    }
    
    fn name(&self) -> &'static str {
        "plain_text"
    }
}

pub struct PdfExtractor;

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, content: &[u8]) -> ExtractResult<String> {
        let bytes = content.to_vec();
        // CPU-bound and known to panic on some malformed files
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractError::Pdf(e.to_string()))?
            .map_err(|e| ExtractError::Pdf(e.to_string()))
    }
    
    fn supported_types(&self) -> Vec<&'static str> {
        vec!["application/pdf"]
    }
    
    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// Office Open XML (.docx): text runs of `word/document.xml`, one line per paragraph
pub struct WordExtractor;

const DOCX_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Ceiling on the decompressed `word/document.xml`
pub const MAX_DOCUMENT_XML_BYTES: u64 = 8 * 1024 * 1024;

fn xml_too_large(size: u64) -> ExtractError {
    ExtractError::Word(format!(
        "word/document.xml expands to {} bytes, limit is {}",
        size, MAX_DOCUMENT_XML_BYTES
    ))
}

fn docx_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|</w:p>|<w:tab/>|<w:br/>").ok())
        .as_ref()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

pub(crate) fn docx_xml_to_text(xml: &str) -> String {
    let Some(pattern) = docx_pattern() else {
        return String::new();
    };
    let mut text = String::new();
    for caps in pattern.captures_iter(xml) {
        match caps.get(1) {
            Some(run) => text.push_str(&unescape_xml(run.as_str())),
            None => match &caps[0] {
                "</w:p>" => text.push('\n'),
                "<w:tab/>" => text.push('\t'),
                _ => text.push('\n'),
            },
        }
    }
    text.trim().to_string()
}

#[async_trait]
impl TextExtractor for WordExtractor {
    async fn extract(&self, content: &[u8]) -> ExtractResult<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(content))
            .map_err(|e| ExtractError::Word(e.to_string()))?;
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|e| ExtractError::Word(e.to_string()))?;
        if entry.size() > MAX_DOCUMENT_XML_BYTES {
            return Err(xml_too_large(entry.size()));
        }
        
        // Declared sizes can lie, so the read itself is bounded too
        let mut xml = String::new();
        entry
            .take(MAX_DOCUMENT_XML_BYTES + 1)
            .read_to_string(&mut xml)
            .map_err(|e| ExtractError::Word(e.to_string()))?;
        if xml.len() as u64 > MAX_DOCUMENT_XML_BYTES {
            return Err(xml_too_large(xml.len() as u64));
        }
        Ok(docx_xml_to_text(&xml))
    }
    
    fn supported_types(&self) -> Vec<&'static str> {
        vec![DOCX_TYPE]
    }
    
    fn name(&self) -> &'static str {
        "word"
    }
}

/// Registry of text extractors. Content types without an extractor are unsupported.
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }
    
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PlainTextExtractor));
        registry.register(Arc::new(PdfExtractor));
        registry.register(Arc::new(WordExtractor));
        registry
    }
    
    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) {
        self.extractors.push(extractor);
    }
    
    pub fn get_extractor(&self, content_type: &str) -> Option<Arc<dyn TextExtractor>> {
        let content_type = content_type.trim().to_ascii_lowercase();
        self.extractors
            .iter()
            .find(|e| e.can_handle(&content_type))
            .cloned()
    }
    
    /// Pick an extractor from the filename, falling back to the server's content type
    pub fn resolve(&self, filename: &str, served_type: Option<&str>) -> Option<Arc<dyn TextExtractor>> {
        mime_guess::from_path(filename)
            .first_raw()
            .and_then(|ct| self.get_extractor(ct))
            .or_else(|| served_type.and_then(|ct| self.get_extractor(ct)))
    }
    
    /// Whether the filename alone maps to a supported type
    pub fn supports_filename(&self, filename: &str) -> bool {
        mime_guess::from_path(filename)
            .first_raw()
            .is_some_and(|ct| self.get_extractor(ct).is_some())
    }
    
    pub fn list(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
