// Bounded text extraction from meeting attachments

pub mod extractors;

pub use extractors::{
    ExtractError, ExtractorRegistry, PdfExtractor, PlainTextExtractor, TextExtractor, WordExtractor,
};

use recap_types::Attachment;
use tracing::{debug, warn};

use crate::config::AttachmentLimits;
use crate::download::Downloader;
use crate::text::truncate_chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAttachment {
    pub filename: String,
    pub text: String,
    pub truncated: bool,
}

pub struct AttachmentExtractor {
    downloader: Downloader,
    registry: ExtractorRegistry,
    limits: AttachmentLimits,
}

impl AttachmentExtractor {
    pub fn new(downloader: Downloader, limits: AttachmentLimits) -> Self {
        Self {
            downloader,
            registry: ExtractorRegistry::with_defaults(),
            limits,
        }
    }
    
    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = registry;
        self
    }
    
    /// Extract text from each attachment in order until the aggregate ceiling is hit.
    ///
    /// Oversized, unsupported and unreadable files are skipped; this never fails.
    pub async fn extract_all(&self, attachments: &[Attachment]) -> Vec<ExtractedAttachment> {
        let mut extracted = Vec::new();
        let mut total_chars = 0usize;
        
        for (index, attachment) in attachments.iter().enumerate() {
            if total_chars >= self.limits.max_total_chars {
                debug!(
                    skipped = attachments.len() - index,
                    "Attachment text ceiling reached, skipping the rest"
                );
                break;
            }
            
            let Some(text) = self.extract_one(attachment).await else {
                continue;
            };
            
            let allowed = self
                .limits
                .max_chars_per_file
                .min(self.limits.max_total_chars - total_chars);
            let (text, truncated) = truncate_chars(&text, allowed);
            
            // The marker does not count toward the ceiling
            total_chars += if truncated { allowed } else { text.chars().count() };
            extracted.push(ExtractedAttachment {
                filename: attachment.filename.clone(),
                text,
                truncated,
            });
        }
        
        extracted
    }
    
    async fn extract_one(&self, attachment: &Attachment) -> Option<String> {
        let filename = attachment.filename.as_str();
        
        // Skip known-unsupported types without downloading; extensionless names
        // still get a chance through the served content type
        if mime_guess::from_path(filename).first_raw().is_some() && !self.registry.supports_filename(filename) {
            debug!(filename, "Unsupported attachment type, skipping");
            return None;
        }
        
        let fetched = match self
            .downloader
            .fetch_bytes(&attachment.url, self.limits.max_file_bytes)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(filename, error = %e, "Skipping attachment");
                return None;
            }
        };
        
        let Some(extractor) = self.registry.resolve(filename, fetched.content_type.as_deref()) else {
            debug!(filename, content_type = ?fetched.content_type, "Unsupported attachment type, skipping");
            return None;
        };
        
        match extractor.extract(&fetched.bytes).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!(filename, extractor = extractor.name(), chars = text.len(), "Attachment extracted");
                Some(text.trim().to_string())
            }
            Ok(_) => {
                debug!(filename, "Attachment has no text");
                None
            }
            Err(e) => {
                warn!(filename, error = %e, "Attachment extraction failed, skipping");
                None
            }
        }
    }
}
