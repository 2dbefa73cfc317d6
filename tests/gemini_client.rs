use firma_scraper::config::GenerativeConfig;
use firma_scraper::generate::{
    CompanyProfile, EmailWriter, GeminiClient, GenerateError, PromptBook, TextGenerator,
    ANALYST_INSTRUCTION,
};
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(&GenerativeConfig {
        api_key: Some("test-key".to_string()),
        model: "gemini-test".to_string(),
        endpoint: format!("{}/", server.uri()),
        prompt_file: None,
    })
}

fn reply(parts: &[&str]) -> ResponseTemplate {
    let parts: Vec<_> = parts.iter().map(|t| json!({ "text": t })).collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{ "content": { "role": "model", "parts": parts } }]
    }))
}

#[tokio::test]
async fn request_carries_key_config_and_instruction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Merhaba" }] }],
            "systemInstruction": { "parts": [{ "text": "Kısa yaz." }] },
            "generationConfig": { "topK": 40, "maxOutputTokens": 2048 }
        })))
        .respond_with(reply(&["Merhaba ", "dünya"]))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server)
        .generate("Merhaba", Some("Kısa yaz."))
        .await
        .unwrap();

    assert_eq!(text, "Merhaba dünya");
}

#[tokio::test]
async fn api_error_keeps_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let err = client(&server).generate("x", None).await.unwrap_err();
    match err {
        GenerateError::Api { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("API key not valid"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn no_candidates_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client(&server).generate("x", None).await.unwrap_err();
    assert!(matches!(err, GenerateError::EmptyResponse));
}

#[tokio::test]
async fn analysis_then_email() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": ANALYST_INSTRUCTION }] }
        })))
        .respond_with(reply(&["Acme endüstriyel makine üretiyor."]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(reply(&["Konu: İş birliği"]))
        .mount(&server)
        .await;

    let client = client(&server);
    let writer = EmailWriter::new(&client, PromptBook::default());
    let company = CompanyProfile {
        name: "Acme Makina".to_string(),
        website: Some("https://acmemakina.com.tr".to_string()),
        about: Some("1985'ten beri makine üretimi".to_string()),
    };

    let analysis = writer.analyze(&company).await.unwrap();
    assert_eq!(analysis, "Acme endüstriyel makine üretiyor.");

    let email = writer.write_email(&company, &analysis).await.unwrap();
    assert_eq!(email, "Konu: İş birliği");
}
