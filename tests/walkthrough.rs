//! Replays the full transcribe → upload → query sequence against a mock
//! service and checks the order and scope of the calls it receives.

use chatbees::ClientBuilder;
use serde_json::{json, Value};
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_service() -> MockServer {
    let server = MockServer::start().await;
    let routes = [
        ("/collections/list", json!({ "names": [] })),
        ("/collections/create", json!({})),
        ("/docs/transcribe_audio", json!({ "transcript": "テスト" })),
        ("/docs/add", json!({})),
        (
            "/docs/get_outline_faq",
            json!({ "outlines": ["Part 1"], "faqs": [{ "question": "q", "answer": "a" }] }),
        ),
        ("/docs/summary", json!({ "summary": "short" })),
        ("/docs/ask", json!({ "answer": "answered" })),
    ];
    for (route, body) in routes {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }
    server
}

#[tokio::test]
async fn walkthrough_issues_calls_in_order() {
    let server = mock_service().await;
    let dir = std::env::temp_dir().join(format!("chatbees-walkthrough-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let doc_path = dir.join("T1.txt");
    std::fs::write(&doc_path, "会計の講義").unwrap();

    let client = ClientBuilder::new()
        .api_key("k")
        .account_id("acct")
        .base_url(server.uri())
        .max_retries(0)
        .build()
        .unwrap();

    let col = client.get_or_create_collection("chatbees").await.unwrap();
    let transcript = col
        .transcribe_audio("https://www.chatbees.ai/images/audio/test_5s.mp3", "ja")
        .await
        .unwrap();
    assert_eq!(transcript.transcript, "テスト");

    let doc = col.upload_document(doc_path.to_str().unwrap()).await.unwrap();
    assert_eq!(doc, "T1.txt");

    let outline = col.get_document_outline_faq(&doc).await.unwrap();
    assert_eq!(outline.outlines, vec!["Part 1"]);
    assert_eq!(col.summary(&doc).await.unwrap().summary, "short");

    let questions = ["「割引」は何でしょうか？", "What changed?"];
    for q in questions {
        assert_eq!(col.ask(q, Some(&doc)).await.unwrap().answer, "answered");
    }

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        vec![
            "/collections/list",
            "/collections/create",
            "/docs/transcribe_audio",
            "/docs/add",
            "/docs/get_outline_faq",
            "/docs/summary",
            "/docs/ask",
            "/docs/ask",
        ]
    );

    // One ask per question, each scoped to the uploaded document.
    let asked: Vec<Value> = requests
        .iter()
        .filter(|r| r.url.path() == "/docs/ask")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(asked.len(), questions.len());
    for (body, q) in asked.iter().zip(questions) {
        assert_eq!(body["question"], q);
        assert_eq!(body["doc_name"], "T1.txt");
        assert_eq!(body["collection_name"], "chatbees");
    }
}
