use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use recap_types::{Attachment, Meeting, ProcessingStatus};

/// Meeting document as the surrounding application stores it (camelCase, ObjectId)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoMeeting {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<bson::DateTime>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub video_link: Option<String>,
    #[serde(default)]
    pub chat_history_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub last_job_id: Option<String>,
    #[serde(default)]
    pub transcript_id: Option<String>,
    #[serde(default)]
    pub summary_id: Option<String>,
    #[serde(default)]
    pub summary_history: Vec<String>,
}

fn to_chrono(value: bson::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis())
}

impl From<MongoMeeting> for Meeting {
    fn from(meeting: MongoMeeting) -> Self {
        Self {
            id: meeting.id.to_hex(),
            title: meeting.title,
            description: meeting.description,
            scheduled_at: meeting.scheduled_at.and_then(to_chrono),
            participants: meeting.participants,
            language: meeting.language,
            video_link: meeting.video_link,
            chat_history_url: meeting.chat_history_url,
            attachments: meeting.attachments,
            processing_status: meeting.processing_status,
            last_job_id: meeting.last_job_id,
            transcript_id: meeting.transcript_id,
            summary_id: meeting.summary_id,
            summary_history: meeting.summary_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_external_meeting_document_converts() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "title": "Sprint review",
            "videoLink": "https://cdn.example.com/v.mp4",
            "attachments": [{ "filename": "notes.txt", "url": "https://cdn.example.com/notes.txt" }],
            "processingStatus": "idle",
            "scheduledAt": bson::DateTime::from_millis(1_700_000_000_000),
        };

        let mongo: MongoMeeting = bson::from_document(document).unwrap();
        let meeting: Meeting = mongo.into();

        assert_eq!(meeting.id, id.to_hex());
        assert_eq!(meeting.video_source(), Some("https://cdn.example.com/v.mp4"));
        assert_eq!(meeting.attachments.len(), 1);
        assert_eq!(meeting.scheduled_at.map(|d| d.timestamp()), Some(1_700_000_000));
        assert!(meeting.summary_history.is_empty());
    }
}
