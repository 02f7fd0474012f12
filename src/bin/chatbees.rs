use anyhow::Context;
use chatbees::{AskOptions, ClientBuilder};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "chatbees", version, about = "Command-line client for the ChatBees API")]
struct Cli {
    /// API key (or set `CHATBEES_API_KEY`).
    #[arg(long, env = "CHATBEES_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Account id the key belongs to (or set `CHATBEES_ACCOUNT_ID`).
    #[arg(long, env = "CHATBEES_ACCOUNT_ID")]
    account_id: String,

    /// Service URL override; `localhost` targets a local server on port 8080.
    #[arg(long, env = "CHATBEES_BASE_URL")]
    base_url: Option<String>,

    /// Collection the document commands operate on.
    #[arg(long, short, default_value = "chatbees")]
    collection: String,

    /// Retries for transient failures.
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the collection.
    CreateCollection,
    /// List collection names.
    ListCollections,
    /// Delete the collection and its documents.
    DeleteCollection,
    /// Transcribe an audio URL or local file.
    Transcribe {
        source: String,
        /// Language hint, e.g. `ja` or `en`.
        #[arg(long, default_value = "en")]
        lang: String,
    },
    /// Upload a local file or URL as a document.
    Upload { path: String },
    /// List documents in the collection.
    ListDocs,
    /// Delete a document.
    DeleteDoc { name: String },
    /// Print the outline and FAQs of a document.
    OutlineFaq { doc: String },
    /// Print the summary of a document.
    Summary { doc: String },
    /// Ask one or more questions, each answered independently.
    Ask {
        #[arg(required = true)]
        questions: Vec<String>,
        /// Restrict answers to this document.
        #[arg(long)]
        doc: Option<String>,
        /// Number of passages to retrieve.
        #[arg(long)]
        top_k: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chatbees=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut builder = ClientBuilder::new()
        .api_key(cli.api_key)
        .account_id(cli.account_id)
        .max_retries(cli.max_retries);
    if let Some(url) = cli.base_url {
        builder = builder.base_url(url);
    }
    let client = builder.build().context("failed to configure client")?;
    let col = client.collection(cli.collection.as_str());

    match cli.command {
        Command::CreateCollection => {
            client.create_collection(col.name()).await?;
            println!("created {}", col.name());
        }
        Command::ListCollections => {
            for name in client.list_collections().await? {
                println!("{name}");
            }
        }
        Command::DeleteCollection => {
            client.delete_collection(col.name()).await?;
            println!("deleted {}", col.name());
        }
        Command::Transcribe { source, lang } => {
            let resp = col
                .transcribe_audio(&source, &lang)
                .await
                .with_context(|| format!("transcribing {source}"))?;
            println!("{}", resp.transcript);
        }
        Command::Upload { path } => {
            let doc = col
                .upload_document(&path)
                .await
                .with_context(|| format!("uploading {path}"))?;
            println!("{doc}");
        }
        Command::ListDocs => {
            for doc in col.list_documents().await? {
                println!("{}", doc.name);
            }
        }
        Command::DeleteDoc { name } => {
            col.delete_document(&name).await?;
            println!("deleted {name}");
        }
        Command::OutlineFaq { doc } => {
            let resp = col.get_document_outline_faq(&doc).await?;
            println!("Outline:");
            for heading in &resp.outlines {
                println!("  {heading}");
            }
            println!("FAQ:");
            for faq in &resp.faqs {
                println!("  Q: {}", faq.question);
                println!("  A: {}", faq.answer);
            }
        }
        Command::Summary { doc } => {
            println!("{}", col.summary(&doc).await?.summary);
        }
        Command::Ask {
            questions,
            doc,
            top_k,
        } => {
            let opts = AskOptions {
                doc_name: doc,
                top_k,
                ..AskOptions::default()
            };
            for q in &questions {
                let resp = col.ask_with(q, &opts).await?;
                println!("{}", resp.answer);
                for r in &resp.refs {
                    println!("  [{} p.{}] {}", r.doc_name, r.page_num, r.sample_text);
                }
            }
        }
    }

    Ok(())
}
