use serde::de::IgnoredAny;
use tracing::{debug, info};

use crate::client::{require, Client, Payload};
use crate::errors::{ChatBeesError, Result};
use crate::models::{
    expand_home, file_name_of, is_url, AnswerResponse, AskOptions, AskRequest, DocRequest,
    Document, ListDocumentsResponse, OutlineFaqResponse, SourceRequest, SummaryResponse,
    TranscribeResponse, PUBLIC_NAMESPACE,
};

/// A named collection of documents.
///
/// Obtained from [`Client::collection`], [`Client::create_collection`] or
/// [`Client::get_or_create_collection`]. Every call is a single POST against
/// the service; nothing is cached locally.
#[derive(Debug, Clone)]
pub struct Collection<'a> {
    client: &'a Client,
    name: String,
}

impl<'a> Collection<'a> {
    pub(crate) fn new(client: &'a Client, name: String) -> Self {
        Self { client, name }
    }

    /// Name of the collection this handle is bound to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transcribe an audio file into text.
    ///
    /// `source` is either an `http(s)://` URL, which the service downloads
    /// itself, or a local path whose contents are uploaded. `language_code` is
    /// an ISO 639-1 hint such as `"ja"` or `"en"`.
    ///
    /// # Errors
    ///
    /// - [`ChatBeesError::Io`] if a local file cannot be read.
    pub async fn transcribe_audio(
        &self,
        source: &str,
        language_code: &str,
    ) -> Result<TranscribeResponse> {
        require("audio source", source)?;
        let lang = Some(language_code).filter(|l| !l.is_empty());

        let payload = if is_url(source) {
            Payload::json(&self.source_request(Some(source), lang))?
        } else {
            let (file_name, bytes) = read_local(source).await?;
            Payload::multipart(&self.source_request(None, lang), file_name, bytes)?
        };

        debug!(collection = %self.name, source, lang = language_code, "transcribing audio");
        self.client.post("/docs/transcribe_audio", payload).await
    }

    /// Add a document to the collection and return the name it is stored under.
    ///
    /// Local paths may start with `~/`. URLs are fetched by the service.
    pub async fn upload_document(&self, path_or_url: &str) -> Result<String> {
        require("document path", path_or_url)?;

        let (doc_name, payload) = if is_url(path_or_url) {
            let name = file_name_of(path_or_url).ok_or_else(|| {
                ChatBeesError::InvalidArgument(format!("cannot derive a document name from {path_or_url}"))
            })?;
            (name, Payload::json(&self.source_request(Some(path_or_url), None))?)
        } else {
            let (file_name, bytes) = read_local(path_or_url).await?;
            let payload = Payload::multipart(&self.source_request(None, None), &file_name, bytes)?;
            (file_name, payload)
        };

        let _: IgnoredAny = self.client.post("/docs/add", payload).await?;
        info!(collection = %self.name, doc = %doc_name, "document uploaded");
        Ok(doc_name)
    }

    /// Every document currently stored in the collection.
    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        let body = serde_json::json!({
            "namespace_name": PUBLIC_NAMESPACE,
            "collection_name": self.name,
        });
        let resp: ListDocumentsResponse = self.client.post("/docs/list", Payload::Json(body)).await?;
        Ok(resp.documents)
    }

    /// Remove a document from the collection.
    pub async fn delete_document(&self, doc_name: &str) -> Result<()> {
        let _: IgnoredAny = self.client.post("/docs/delete", self.doc_payload(doc_name)?).await?;
        Ok(())
    }

    /// Outline headings and generated FAQs for a document.
    pub async fn get_document_outline_faq(&self, doc_name: &str) -> Result<OutlineFaqResponse> {
        self.client
            .post("/docs/get_outline_faq", self.doc_payload(doc_name)?)
            .await
    }

    /// A prose summary of a document.
    pub async fn summary(&self, doc_name: &str) -> Result<SummaryResponse> {
        self.client.post("/docs/summary", self.doc_payload(doc_name)?).await
    }

    /// Ask a question, optionally scoped to one document.
    pub async fn ask(&self, question: &str, doc_name: Option<&str>) -> Result<AnswerResponse> {
        let opts = AskOptions {
            doc_name: doc_name.map(str::to_string),
            ..AskOptions::default()
        };
        self.ask_with(question, &opts).await
    }

    /// Ask a question with retrieval and conversation options.
    ///
    /// Feed the returned [`AnswerResponse::conversation_id`] and the previous
    /// turns back through `opts` to hold a multi-turn conversation.
    pub async fn ask_with(&self, question: &str, opts: &AskOptions) -> Result<AnswerResponse> {
        require("question", question)?;
        if let Some(doc) = &opts.doc_name {
            require("document name", doc)?;
        }

        let body = AskRequest {
            namespace_name: PUBLIC_NAMESPACE,
            collection_name: &self.name,
            question,
            doc_name: opts.doc_name.as_deref(),
            top_k: opts.top_k,
            history_messages: opts
                .history_messages
                .iter()
                .map(|(q, a)| [q.as_str(), a.as_str()])
                .collect(),
            conversation_id: opts.conversation_id.as_deref(),
        };

        debug!(collection = %self.name, doc = ?opts.doc_name, "asking question");
        self.client.post("/docs/ask", Payload::json(&body)?).await
    }

    fn source_request<'s>(&'s self, url: Option<&'s str>, lang: Option<&'s str>) -> SourceRequest<'s> {
        SourceRequest {
            namespace_name: PUBLIC_NAMESPACE,
            collection_name: &self.name,
            url,
            lang,
        }
    }

    fn doc_payload(&self, doc_name: &str) -> Result<Payload> {
        require("document name", doc_name)?;
        Payload::json(&DocRequest {
            namespace_name: PUBLIC_NAMESPACE,
            collection_name: &self.name,
            doc_name,
        })
    }
}

/// Read a local file, returning its base name and contents.
async fn read_local(path: &str) -> Result<(String, Vec<u8>)> {
    let path = expand_home(path);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ChatBeesError::InvalidArgument(format!("{} does not name a file", path.display()))
        })?;
    let bytes = tokio::fs::read(&path).await?;
    Ok((file_name, bytes))
}
