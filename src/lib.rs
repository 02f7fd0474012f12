//! # ChatBees SDK for Rust
//!
//! Async client for the [ChatBees](https://www.chatbees.ai) document
//! intelligence API. Organize documents into collections, transcribe audio,
//! and ask for outlines, FAQs, summaries and grounded answers -- every
//! computation runs on the service; this crate handles configuration,
//! transport, retries and typed responses.
//!
//! ## Quick start
//!
//! ```no_run
//! use chatbees::Client;
//!
//! #[tokio::main]
//! async fn main() -> chatbees::Result<()> {
//!     let client = Client::new("your_api_key", "YOUR_ACCOUNT_ID")?;
//!     let col = client.get_or_create_collection("lectures").await?;
//!
//!     let transcript = col
//!         .transcribe_audio("https://example.com/lecture.mp3", "en")
//!         .await?;
//!     println!("{}", transcript.transcript);
//!
//!     let doc = col.upload_document("~/notes/lecture.txt").await?;
//!
//!     let outline = col.get_document_outline_faq(&doc).await?;
//!     for heading in &outline.outlines {
//!         println!("- {heading}");
//!     }
//!     for faq in &outline.faqs {
//!         println!("Q: {}\nA: {}", faq.question, faq.answer);
//!     }
//!
//!     println!("{}", col.summary(&doc).await?.summary);
//!     println!("{}", col.ask("What is covered first?", Some(&doc)).await?.answer);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! [`ClientBuilder`] reads `CHATBEES_API_KEY`, `CHATBEES_ACCOUNT_ID` and
//! `CHATBEES_BASE_URL` for any value not set explicitly. Requests are logged
//! through [`tracing`] at `debug`, retries at `warn`.

mod client;
mod collection;
mod errors;
mod models;

pub use client::{Client, ClientBuilder};
pub use collection::Collection;
pub use errors::{ChatBeesError, Result};
pub use models::{
    AnswerReference, AnswerResponse, AskOptions, Document, Faq, OutlineFaqResponse,
    SummaryResponse, TranscribeResponse,
};
