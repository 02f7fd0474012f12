//! End-to-end walkthrough of the ChatBees SDK.
//!
//! Run with:
//!   CHATBEES_API_KEY=... CHATBEES_ACCOUNT_ID=... cargo run --example walkthrough -- ~/notes/T1.txt
//!
//! Set `CHATBEES_BASE_URL=localhost` to run against a local server.

use chatbees::ClientBuilder;

const COLLECTION: &str = "chatbees";
const AUDIO_URL: &str = "https://www.chatbees.ai/images/audio/test_5s.mp3";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chatbees=info".into()),
        )
        .init();

    let document = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "~/Documents/chatbees/T1_tran.txt".to_string());

    // -----------------------------------------------------------------------
    // 1. Configure once (reads CHATBEES_API_KEY / CHATBEES_ACCOUNT_ID)
    // -----------------------------------------------------------------------
    let client = ClientBuilder::new().build()?;

    // -----------------------------------------------------------------------
    // 2. Get or create the collection
    // -----------------------------------------------------------------------
    let col = client.get_or_create_collection(COLLECTION).await?;

    // -----------------------------------------------------------------------
    // 3. Transcribe a remote recording (Japanese)
    // -----------------------------------------------------------------------
    let resp = col.transcribe_audio(AUDIO_URL, "ja").await?;
    println!("{}", resp.transcript);
    println!();

    // -----------------------------------------------------------------------
    // 4. Upload a transcript document
    // -----------------------------------------------------------------------
    let doc = col.upload_document(&document).await?;

    // -----------------------------------------------------------------------
    // 5. Outline and FAQs
    // -----------------------------------------------------------------------
    let outline_faq = col.get_document_outline_faq(&doc).await?;
    for heading in &outline_faq.outlines {
        println!("- {heading}");
    }
    for faq in &outline_faq.faqs {
        println!("Q: {}\nA: {}", faq.question, faq.answer);
    }
    println!();

    // -----------------------------------------------------------------------
    // 6. Summary
    // -----------------------------------------------------------------------
    println!("{}", col.summary(&doc).await?.summary);
    println!();

    // -----------------------------------------------------------------------
    // 7. Questions scoped to the document
    // -----------------------------------------------------------------------
    let questions = [
        "「采购折扣」科目は「收到の利息」科目に置き換えることができますか？",
        "「割引」は何でしょうか？",
    ];
    for q in questions {
        let answer = col.ask(q, Some(&doc)).await?;
        println!("{}", answer.answer);
    }

    Ok(())
}
