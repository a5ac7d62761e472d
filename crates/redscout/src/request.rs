use redscout_engine::analysis::DEFAULT_COMMENT_TYPE;
use redscout_engine::formatter;
use redscout_engine::{NoteService, ServiceError};
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// One operation, as named on the `serve` wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Login,
    SearchNotes {
        keywords: String,
        #[serde(default = "default_limit")]
        limit: usize,
        #[serde(default)]
        sort_by_time: bool,
    },
    GetNoteContent {
        url: String,
    },
    GetNoteComments {
        url: String,
    },
    AnalyzeNote {
        url: String,
    },
    PostSmartComment {
        url: String,
        #[serde(default = "default_comment_type")]
        comment_type: String,
    },
    PostComment {
        url: String,
        comment: String,
    },
    LikeNote {
        url: String,
    },
    FollowUser {
        url: String,
    },
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn default_comment_type() -> String {
    DEFAULT_COMMENT_TYPE.to_string()
}

/// The rendered text plus the typed result as JSON.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub result: Value,
}

impl Reply {
    fn new(text: String, result: impl serde::Serialize) -> Result<Self, ServiceError> {
        let result = serde_json::to_value(result)
            .map_err(|e| ServiceError::Backend(e.into()))?;
        Ok(Self { text, result })
    }
}

pub async fn execute(service: &NoteService, request: Request) -> Result<Reply, ServiceError> {
    match request {
        Request::Login => {
            let outcome = service.login().await?;
            Reply::new(formatter::format_login(outcome), outcome)
        }
        Request::SearchNotes {
            keywords,
            limit,
            sort_by_time,
        } => {
            let hits = service.search_notes(&keywords, limit, sort_by_time).await?;
            Reply::new(formatter::format_search(&keywords, &hits, sort_by_time), &hits)
        }
        Request::GetNoteContent { url } => {
            let record = service.get_note_content(&url).await?;
            Reply::new(formatter::format_note(&record), &record)
        }
        Request::GetNoteComments { url } => {
            let comments = service.get_note_comments(&url).await?;
            Reply::new(formatter::format_comments(&comments), &comments)
        }
        Request::AnalyzeNote { url } => {
            let analysis = service.analyze_note(&url).await?;
            Reply::new(formatter::format_analysis(&analysis), &analysis)
        }
        Request::PostSmartComment { url, comment_type } => {
            let brief = service.post_smart_comment(&url, &comment_type).await?;
            Reply::new(formatter::format_brief(&brief), &brief)
        }
        Request::PostComment { url, comment } => {
            let result = service.post_comment(&url, &comment).await?;
            Reply::new(formatter::format_action(&result), &result)
        }
        Request::LikeNote { url } => {
            let result = service.like_note(&url).await?;
            Reply::new(formatter::format_action(&result), &result)
        }
        Request::FollowUser { url } => {
            let result = service.follow_user(&url).await?;
            Reply::new(formatter::format_action(&result), &result)
        }
    }
}
