pub mod meeting;
pub mod transcript;
pub mod summary;
pub mod action_item;
pub mod processing_log;

pub use meeting::MongoMeetingRepository;
pub use transcript::MongoTranscriptRepository;
pub use summary::MongoSummaryRepository;
pub use action_item::MongoActionItemRepository;
pub use processing_log::MongoProcessingLogRepository;
