use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Every collection created through the public API lives in this namespace.
pub(crate) const PUBLIC_NAMESPACE: &str = "public";

/// Returned by `transcribe_audio`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscribeResponse {
    pub transcript: String,
}

/// A generated question/answer pair for a document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// Returned by `get_document_outline_faq`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutlineFaqResponse {
    /// Section headings, in document order.
    #[serde(default)]
    pub outlines: Vec<String>,

    #[serde(default)]
    pub faqs: Vec<Faq>,
}

/// Returned by `summary`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// A passage the service used to ground an answer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerReference {
    pub doc_name: String,

    /// 0 for formats without pages.
    #[serde(default)]
    pub page_num: u32,

    #[serde(default)]
    pub sample_text: String,
}

/// Returned by `ask` / `ask_with`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerResponse {
    pub answer: String,

    #[serde(default)]
    pub refs: Vec<AnswerReference>,

    /// Pass back through [`AskOptions::conversation_id`] to continue the thread.
    #[serde(default)]
    pub conversation_id: Option<String>,

    #[serde(default)]
    pub request_id: Option<String>,
}

/// A document stored in a collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Document {
    pub name: String,

    /// Anything else the service reports (type, size, upload time).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Optional parameters for `ask_with`.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// Restrict retrieval to this document. `None` searches the whole collection.
    pub doc_name: Option<String>,

    /// Number of passages to retrieve. Server default when `None`.
    pub top_k: Option<u32>,

    /// Earlier `(question, answer)` turns, oldest first.
    pub history_messages: Vec<(String, String)>,

    pub conversation_id: Option<String>,
}

impl AskOptions {
    /// Options scoped to a single document.
    pub fn for_document(doc_name: impl Into<String>) -> Self {
        Self {
            doc_name: Some(doc_name.into()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub(crate) struct CollectionRequest<'a> {
    pub namespace_name: &'a str,
    pub collection_name: &'a str,
}

#[derive(Serialize)]
pub(crate) struct DocRequest<'a> {
    pub namespace_name: &'a str,
    pub collection_name: &'a str,
    pub doc_name: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SourceRequest<'a> {
    pub namespace_name: &'a str,
    pub collection_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<&'a str>,
}

#[derive(Serialize)]
pub(crate) struct AskRequest<'a> {
    pub namespace_name: &'a str,
    pub collection_name: &'a str,
    pub question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history_messages: Vec<[&'a str; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Response envelopes (not part of the public API surface)
// ---------------------------------------------------------------------------

/// POST /collections/list response.
#[derive(Deserialize)]
pub(crate) struct ListCollectionsResponse {
    #[serde(default)]
    pub names: Vec<String>,
}

/// POST /docs/list response.
#[derive(Deserialize)]
pub(crate) struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
}

// ---------------------------------------------------------------------------
// Source helpers
// ---------------------------------------------------------------------------

/// `true` if `source` should be fetched by the service instead of read locally.
pub(crate) fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Expand a leading `~/` against `$HOME`. Other paths are returned unchanged.
pub(crate) fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => Path::new(&home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Name the service will store a source under: the last path or URL segment.
pub(crate) fn file_name_of(source: &str) -> Option<String> {
    let trimmed = source.split(['?', '#']).next().unwrap_or(source);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_detected_by_scheme() {
        assert!(is_url("https://www.chatbees.ai/images/audio/test_5s.mp3"));
        assert!(is_url("http://localhost:8080/a.txt"));
        assert!(!is_url("~/Documents/T1_tran.txt"));
        assert!(!is_url("ftp.example.com/file.txt"));
    }

    #[test]
    fn file_name_strips_query_and_directories() {
        assert_eq!(
            file_name_of("https://example.com/audio/test_5s.mp3?sig=abc").as_deref(),
            Some("test_5s.mp3")
        );
        assert_eq!(
            file_name_of("~/Documents/customers/T1_tran.txt").as_deref(),
            Some("T1_tran.txt")
        );
        assert_eq!(file_name_of("https://example.com/"), None);
    }

    #[test]
    fn expand_home_leaves_other_paths_alone() {
        assert_eq!(expand_home("/tmp/a.txt"), PathBuf::from("/tmp/a.txt"));
        assert_eq!(expand_home("notes/~/a.txt"), PathBuf::from("notes/~/a.txt"));
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/a.txt"), Path::new(&home).join("a.txt"));
        }
    }

    #[test]
    fn ask_request_omits_unset_fields() {
        let body = serde_json::to_value(AskRequest {
            namespace_name: PUBLIC_NAMESPACE,
            collection_name: "chatbees",
            question: "what is a discount?",
            doc_name: Some("T1.txt"),
            top_k: None,
            history_messages: Vec::new(),
            conversation_id: None,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "namespace_name": "public",
                "collection_name": "chatbees",
                "question": "what is a discount?",
                "doc_name": "T1.txt",
            })
        );
    }

    #[test]
    fn answer_tolerates_missing_optional_fields() {
        let resp: AnswerResponse =
            serde_json::from_value(serde_json::json!({ "answer": "yes" })).unwrap();
        assert_eq!(resp.answer, "yes");
        assert!(resp.refs.is_empty());
        assert!(resp.conversation_id.is_none());
    }

    #[test]
    fn document_keeps_unknown_fields() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "name": "T1.txt",
            "type": "TXT",
        }))
        .unwrap();
        assert_eq!(doc.name, "T1.txt");
        assert_eq!(doc.extra.get("type"), Some(&serde_json::json!("TXT")));
    }
}
