use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Tool, argument};
use crate::error::{LlmError, classify_http_error};
use crate::types::ToolDescriptor;

pub const GUTENDEX_URL: &str = "https://gutendex.com";

/// Book entry returned to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: Option<u64>,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Value,
}

#[derive(Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<BookSummary>,
}

/// Project Gutenberg search through the Gutendex API.
#[derive(Debug, Clone)]
pub struct GutenbergSearchTool {
    http: reqwest::Client,
    base_url: String,
}

impl Default for GutenbergSearchTool {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl GutenbergSearchTool {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: GUTENDEX_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Search books; the terms are joined with spaces into one query.
    pub async fn search(&self, terms: &[String]) -> Result<Vec<BookSummary>, LlmError> {
        let query = terms.join(" ");
        let response = self
            .http
            .get(format!("{}/books", self.base_url))
            .query(&[("search", query.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), &body));
        }
        let page: SearchPage = response.json().await?;
        Ok(page.results)
    }
}

#[async_trait]
impl Tool for GutenbergSearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "search_gutenberg_books",
            "Search for books in the Project Gutenberg library based on specified search terms",
            json!({
                "type": "object",
                "properties": {
                    "search_terms": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of search terms to find books in the Gutenberg library (e.g. ['dickens', 'great'] to search for books by Dickens with 'great' in the title)"
                    }
                },
                "required": ["search_terms"]
            }),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<Value, LlmError> {
        let terms: Vec<String> = serde_json::from_value(argument(&arguments, "search_terms")?.clone())
            .map_err(|_| {
                LlmError::InvalidInput("argument 'search_terms' must be a list of strings".into())
            })?;
        let books = self.search(&terms).await?;
        Ok(serde_json::to_value(books)?)
    }
}
