//! Company analysis and sales-email drafting through a text-generation API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::config::GenerativeConfig;
use crate::error::ScraperError;

pub const ANALYST_INSTRUCTION: &str =
    "Sen profesyonel bir şirket analisti ve B2B pazarlama uzmanısın.";
pub const SALES_INSTRUCTION: &str = "Sen profesyonel bir B2B satış temsilcisisin.";

pub const COMPANY_ANALYSIS: &str = "company_analysis";
pub const SALES_EMAIL: &str = "sales_email";

const COMPANY_ANALYSIS_TEXT: &str = "Aşağıdaki firma bilgilerini analiz et ve bu firmanın ne iş yaptığını, \
güçlü yönlerini ve dijital medya/yazılım ihtiyaçlarını kısaca 3-5 cümle ile özetle.

Firma Adı: {{company_name}}
Web Sitesi: {{website}}
Hakkında: {{about}}

Yanıtını sadece özet bilgi olarak ver, ekstra açıklama yapma.";

const SALES_EMAIL_TEXT: &str = "Aşağıdaki firma analizi temelinde, bu firmaya dijital pazarlama ve yazılım hizmetleri \
sunmak için profesyonel bir satış e-postası oluştur:

Firma: {{company_name}}
Analiz: {{analysis}}

E-posta şu kriterleri karşılamalıdır:
1. Türkçe olmalı
2. Resmi bir dil kullanmalı
3. Bu analize göre firmanın ihtiyaçlarına odaklanmalı
4. Dijital pazarlama ve yazılım hizmetleri sunmalı
5. Somut çözümler ve faydalar içermeli
6. Kısa ve öz olmalı (max 250 kelime)
7. Konu başlığını belirt
8. Profesyonel hitap cümlesi ve kapanış cümlesi içermeli
9. İmza bölümünü ve iletişim bilgilerini ekle

E-posta şablonunu doğrudan ver, açıklamalar yapma.";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Generative API is not configured: no API key")]
    NotConfigured,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),
}

/// Produces text for a prompt and an optional system instruction.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, GenerateError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<PartOut<'a>>,
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Deserialize)]
struct PartIn {
    text: Option<String>,
}

/// Gemini `generateContent` REST client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &GenerativeConfig) -> Self {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            log::warn!("No Gemini API key configured; text generation is disabled");
        }
        Self {
            http_client: Client::new(),
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<String, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or(GenerateError::NotConfigured)?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![PartOut { text: prompt }],
            }],
            system_instruction: system_instruction.map(|text| Content {
                role: None,
                parts: vec![PartOut { text }],
            }),
            generation_config: GenerationConfig::default(),
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);
        let response = self
            .http_client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Gemini request failed: {}", e);
                GenerateError::Request(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            log::error!("Gemini API error {}: {}", status, message);
            return Err(GenerateError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Request(e.to_string()))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        log::debug!("Gemini returned {} chars", text.chars().count());
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub text: String,
}

/// Named prompt templates with `{{key}}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptBook {
    prompts: BTreeMap<String, PromptTemplate>,
}

impl Default for PromptBook {
    fn default() -> Self {
        let prompts = [
            (COMPANY_ANALYSIS, COMPANY_ANALYSIS_TEXT),
            (SALES_EMAIL, SALES_EMAIL_TEXT),
        ]
        .into_iter()
        .map(|(key, text)| {
            (
                key.to_string(),
                PromptTemplate {
                    text: text.to_string(),
                },
            )
        })
        .collect();
        Self { prompts }
    }
}

impl PromptBook {
    /// Built-in templates overlaid with those in a JSON file of the form
    /// `{ "<key>": { "text": "..." } }`.
    pub fn load(path: &Path) -> Result<Self, ScraperError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ScraperError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let loaded: BTreeMap<String, PromptTemplate> =
            serde_json::from_str(&raw).map_err(|e| ScraperError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        log::info!("Loaded {} prompt(s) from {}", loaded.len(), path.display());

        let mut book = Self::default();
        book.prompts.extend(loaded);
        Ok(book)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.prompts.keys().map(String::as_str)
    }

    /// Template `key` with every `{{name}}` replaced by its value.
    pub fn render(&self, key: &str, replacements: &[(&str, &str)]) -> Result<String, GenerateError> {
        let template = self.prompts.get(key).ok_or_else(|| {
            log::error!("Prompt not found: {}", key);
            GenerateError::PromptNotFound(key.to_string())
        })?;

        let mut text = template.text.clone();
        for (name, value) in replacements {
            text = text.replace(&format!("{{{{{}}}}}", name), value);
        }
        Ok(text)
    }
}

/// What the generator is told about a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub website: Option<String>,
    pub about: Option<String>,
}

impl CompanyProfile {
    fn display_name(&self, fallback: &'static str) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            fallback
        } else {
            name
        }
    }
}

/// Company analysis followed by a sales email built on it.
pub struct EmailWriter<'a> {
    generator: &'a dyn TextGenerator,
    prompts: PromptBook,
}

impl<'a> EmailWriter<'a> {
    pub fn new(generator: &'a dyn TextGenerator, prompts: PromptBook) -> Self {
        Self { generator, prompts }
    }

    pub async fn analyze(&self, company: &CompanyProfile) -> Result<String, GenerateError> {
        let prompt = self.prompts.render(
            COMPANY_ANALYSIS,
            &[
                ("company_name", company.display_name("Bilinmeyen Firma")),
                ("website", company.website.as_deref().unwrap_or("")),
                ("about", company.about.as_deref().unwrap_or("")),
            ],
        )?;
        log::info!("Analyzing company: {}", company.name);
        self.generator
            .generate(&prompt, Some(ANALYST_INSTRUCTION))
            .await
    }

    pub async fn write_email(
        &self,
        company: &CompanyProfile,
        analysis: &str,
    ) -> Result<String, GenerateError> {
        let prompt = self.prompts.render(
            SALES_EMAIL,
            &[
                ("company_name", company.display_name("Değerli İşletme")),
                ("analysis", analysis),
            ],
        )?;
        log::info!("Writing sales email for: {}", company.name);
        self.generator.generate(&prompt, Some(SALES_INSTRUCTION)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(
            &self,
            prompt: &str,
            system_instruction: Option<&str>,
        ) -> Result<String, GenerateError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), system_instruction.map(str::to_string)));
            Ok(format!("reply #{}", self.calls.lock().unwrap().len()))
        }
    }

    #[test]
    fn placeholders_are_replaced() {
        let book = PromptBook::default();
        let text = book
            .render(COMPANY_ANALYSIS, &[("company_name", "Acme"), ("website", "acme.com")])
            .unwrap();
        assert!(text.contains("Firma Adı: Acme"));
        assert!(text.contains("Web Sitesi: acme.com"));
        assert!(text.contains("{{about}}"));
    }

    #[test]
    fn unknown_prompt() {
        let err = PromptBook::default().render("nope", &[]).unwrap_err();
        assert!(matches!(err, GenerateError::PromptNotFound(key) if key == "nope"));
    }

    #[test]
    fn prompt_file_overrides_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"sales_email": {"text": "Merhaba {{company_name}}"}, "extra": {"text": "x"}}"#,
        )
        .unwrap();
        let book = PromptBook::load(file.path()).unwrap();

        assert_eq!(
            book.render(SALES_EMAIL, &[("company_name", "Acme")]).unwrap(),
            "Merhaba Acme"
        );
        assert!(book.keys().any(|k| k == COMPANY_ANALYSIS));
        assert!(book.keys().any(|k| k == "extra"));
    }

    #[tokio::test]
    async fn writer_uses_fixed_instructions() {
        let recorder = Recorder::default();
        let writer = EmailWriter::new(&recorder, PromptBook::default());
        let company = CompanyProfile {
            name: "".to_string(),
            website: Some("https://acme.com".to_string()),
            about: None,
        };

        let analysis = writer.analyze(&company).await.unwrap();
        let email = writer.write_email(&company, &analysis).await.unwrap();
        assert_eq!(email, "reply #2");

        let calls = recorder.calls.lock().unwrap();
        assert!(calls[0].0.contains("Firma Adı: Bilinmeyen Firma"));
        assert_eq!(calls[0].1.as_deref(), Some(ANALYST_INSTRUCTION));
        assert!(calls[1].0.contains("Firma: Değerli İşletme"));
        assert!(calls[1].0.contains("Analiz: reply #1"));
        assert_eq!(calls[1].1.as_deref(), Some(SALES_INSTRUCTION));
    }

    #[tokio::test]
    async fn unconfigured_client_refuses() {
        let client = GeminiClient {
            http_client: Client::new(),
            api_key: None,
            model: "m".to_string(),
            endpoint: "http://127.0.0.1:9".to_string(),
        };
        assert!(!client.is_configured());
        let err = client.generate("hi", None).await.unwrap_err();
        assert!(matches!(err, GenerateError::NotConfigured));
    }

    #[test]
    fn explicit_key_configures_client() {
        let config = GenerativeConfig {
            api_key: Some("  ".to_string()),
            ..GenerativeConfig::default()
        };
        let client = GeminiClient::new(&config).with_api_key("cli-key");
        assert!(client.is_configured());
        assert_eq!(client.api_key.as_deref(), Some("cli-key"));
    }
}
