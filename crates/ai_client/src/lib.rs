use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use models::SummaryStatistics;

const DEFAULT_MODELS: &[&str] = &["llama3.2", "mistral", "qwen2.5:7b"];

/// Configuration for talking to a local Ollama server.
///
/// Advice generation only ever targets Ollama's local HTTP API and refuses
/// to run against a non-local base URL.
#[derive(Debug, Clone)]
pub struct AdviceClientConfig {
    pub base_url: String,
    /// Ordered fallback list; the first model that answers wins.
    pub models: Vec<String>,
}

impl AdviceClientConfig {
    /// Loads config from env vars:
    /// - `OLLAMA_BASE_URL` (default: `http://localhost:11434`)
    /// - `OLLAMA_MODELS`   (comma-separated, default: `llama3.2,mistral,qwen2.5:7b`)
    pub fn from_env() -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());
        let models = std::env::var("OLLAMA_MODELS")
            .map(|raw| parse_model_list(&raw))
            .unwrap_or_else(|_| default_models());
        Self { base_url, models }
    }
}

fn default_models() -> Vec<String> {
    DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
}

fn parse_model_list(raw: &str) -> Vec<String> {
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect();
    if models.is_empty() {
        default_models()
    } else {
        models
    }
}

/// Minimal Ollama advice client (blocking HTTP).
#[derive(Debug, Clone)]
pub struct AdviceClient {
    http: Client,
    base_url: Url,
    models: Vec<String>,
}

impl AdviceClient {
    pub fn new(config: AdviceClientConfig) -> Result<Self> {
        let base_url = validate_local_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            models: config.models,
        })
    }

    /// Generates advice for a free-text question about the summarized
    /// dataset.
    ///
    /// Models are tried in configured order and the first one that answers
    /// wins. When none answers, the deterministic template built from the
    /// summary is returned instead, so the caller always gets a response.
    pub fn generate_advice(&self, summary: &SummaryStatistics, question: &str) -> String {
        let prompt = build_prompt(summary, question);
        for model in &self.models {
            match self.generate(model, &prompt) {
                Ok(text) => return text,
                Err(err) => eprintln!("Model {model} failed: {err:#}"),
            }
        }
        fallback_advice(summary)
    }

    /// Single-turn completion against one model.
    fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let endpoint = self
            .base_url
            .join("api/generate")
            .context("Failed to build Ollama /api/generate URL")?;

        let request = GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response: GenerateResponse = self
            .http
            .post(endpoint.clone())
            .json(&request)
            .send()
            .with_context(|| format!("POST {endpoint} failed"))?
            .error_for_status()
            .with_context(|| format!("POST {endpoint} returned non-success status"))?
            .json()
            .with_context(|| format!("Failed to parse JSON response from {endpoint}"))?;

        let text = response
            .response
            .ok_or_else(|| anyhow!("Ollama response had no text"))?;

        Ok(text.trim().to_string())
    }
}

fn validate_local_base_url(base_url: &str) -> Result<Url> {
    let url =
        Url::parse(base_url).with_context(|| format!("Invalid OLLAMA_BASE_URL: {base_url}"))?;

    match url.scheme() {
        "http" => {}
        other => {
            return Err(anyhow!(
                "Unsupported scheme '{other}' for OLLAMA_BASE_URL (use http://localhost:11434)"
            ))
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("OLLAMA_BASE_URL is missing a host"))?;

    let is_local = host.eq_ignore_ascii_case("localhost") || host == "127.0.0.1" || host == "::1";

    if !is_local {
        return Err(anyhow!(
            "Refusing non-local OLLAMA_BASE_URL host '{host}'. Advice generation only uses local Ollama (use http://localhost:11434)."
        ));
    }

    Ok(url)
}

/// Structured context the model answers against, built from the summary.
fn build_prompt(summary: &SummaryStatistics, question: &str) -> String {
    format!(
        "Financial Data Summary:\n\
         - Annual Income: {:.2}\n\
         - Annual Expenses: {:.2}\n\
         - Net Income: {:.2}\n\
         - Savings: {:.2}\n\
         - Investments: {:.2}\n\
         - Savings Rate: {:.1}%\n\
         - Months in Deficit: {}\n\
         - Largest Expense: {}\n\
         \n\
         Please provide structured, concise financial advice. Format your response as:\n\
         \n\
         ## Key Issues\n\
         - List 2-3 main problems\n\
         \n\
         ## Immediate Actions\n\
         - 3-4 specific steps to take now\n\
         \n\
         ## Budget Recommendations\n\
         - Specific expense reduction targets\n\
         - Income improvement suggestions\n\
         \n\
         ## Next Steps\n\
         - 2-3 follow-up actions\n\
         \n\
         Keep each section brief and actionable. Use bullet points and be specific \
         with amounts and percentages.\n\
         \n\
         User Question: {}\n\
         \n\
         Please provide detailed financial advice and recommendations:",
        summary.total_income,
        summary.total_expenses,
        summary.net_income,
        summary.total_savings,
        summary.total_investments,
        summary.savings_rate,
        summary.months_in_deficit,
        summary.largest_expense_category,
        question,
    )
}

/// Deterministic advice built directly from the summary fields. Used when
/// every configured model fails, so the chat endpoint never goes dark.
pub fn fallback_advice(summary: &SummaryStatistics) -> String {
    let largest = summary.largest_expense_category;
    let key_issue = if summary.net_income < 0.0 {
        format!(
            "Spending {:.0} more than you earn annually",
            summary.net_income.abs()
        )
    } else {
        "Living within your means".to_string()
    };

    format!(
        "## Key Issues\n\
         - {key_issue}\n\
         - {} months in deficit spending\n\
         - Largest expense: {largest}\n\
         \n\
         ## Immediate Actions\n\
         - Reduce {largest} expenses by 15-20%\n\
         - Create a detailed monthly budget\n\
         - Track every expense for 30 days\n\
         - Look for ways to increase income\n\
         \n\
         ## Budget Recommendations\n\
         - Target: reduce expenses by {:.0} annually\n\
         - Focus on: {largest} optimization\n\
         - Build an emergency fund of 3-6 months of expenses\n\
         \n\
         ## Next Steps\n\
         - Set up expense tracking\n\
         - Review and negotiate {largest} costs\n\
         - Explore additional income sources\n\
         \n\
         Note: advice service temporarily unavailable. This is basic guidance \
         based on your data.",
        summary.months_in_deficit,
        summary.net_income.abs() + 10000.0,
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}
