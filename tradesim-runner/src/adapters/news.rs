//! News sources: the NewsAPI `everything` endpoint and JSON article files.

use super::circuit_breaker::CircuitBreaker;
use super::http::{build_client, send_with_retry, RetryPolicy};
use super::{read_file, LoadError};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tradesim_core::{Article, NewsProvider, ProviderError};

pub const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
}

/// Articles for one symbol and day from NewsAPI, newest first, capped at
/// `max_articles`.
///
/// Without an API key every call returns no articles.
pub struct NewsApiProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    max_articles: usize,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    warned_no_key: AtomicBool,
}

impl NewsApiProvider {
    pub fn new(
        api_key: Option<String>,
        max_articles: usize,
        base_url: Option<String>,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(Duration::from_secs(20))?,
            base_url: base_url.unwrap_or_else(|| NEWS_API_URL.to_string()),
            api_key,
            max_articles,
            breaker,
            retry: RetryPolicy::none(),
            warned_no_key: AtomicBool::new(false),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

impl NewsProvider for NewsApiProvider {
    fn name(&self) -> &str {
        "news_api"
    }

    fn articles(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Article>, ProviderError> {
        let Some(key) = self.api_key.as_deref() else {
            if !self.warned_no_key.swap(true, Ordering::Relaxed) {
                warn!("no NewsAPI key configured; recommendations will see no news");
            }
            return Ok(Vec::new());
        };

        let day = date.to_string();
        let what = format!("news for {symbol} on {day}");
        let resp = send_with_retry(&self.breaker, &self.retry, &what, || {
            self.client
                .get(&self.base_url)
                .header("X-Api-Key", key)
                .query(&[
                    ("q", symbol),
                    ("from", day.as_str()),
                    ("to", day.as_str()),
                    ("sortBy", "publishedAt"),
                ])
                .send()
        })?;
        let body: NewsApiResponse = resp
            .json()
            .map_err(|e| ProviderError::MalformedResponse(format!("{what}: {e}")))?;
        let articles = parse_response(body, self.max_articles)?;
        debug!(symbol, %date, count = articles.len(), "fetched news");
        Ok(articles)
    }
}

fn parse_response(
    body: NewsApiResponse,
    max_articles: usize,
) -> Result<Vec<Article>, ProviderError> {
    if body.status != "ok" {
        let code = body.code.unwrap_or_default();
        let message = body.message.unwrap_or_default();
        return Err(match code.as_str() {
            "apiKeyInvalid" | "apiKeyMissing" | "apiKeyDisabled" => {
                ProviderError::Authentication(message)
            }
            "rateLimited" => ProviderError::RateLimited {
                retry_after_secs: 3600,
            },
            _ => ProviderError::Other(format!("NewsAPI {code}: {message}")),
        });
    }
    Ok(body
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty())?;
            let mut article = Article::new(title, a.description.unwrap_or_default());
            article.published_date = a
                .published_at
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.date_naive());
            Some(article)
        })
        .take(max_articles)
        .collect())
}

#[derive(Debug, Deserialize)]
struct ArticleRecord {
    symbol: String,
    date: NaiveDate,
    #[serde(flatten)]
    article: Article,
}

/// Articles from a JSON file: an array of `{symbol, date, title, summary}`.
///
/// Symbol/day pairs without entries have no news.
#[derive(Debug, Clone, Default)]
pub struct ArticleFile {
    articles: HashMap<(String, NaiveDate), Vec<Article>>,
    max_articles: usize,
}

impl ArticleFile {
    pub fn from_path(path: &Path, max_articles: usize) -> Result<Self, LoadError> {
        let content = read_file(path)?;
        Self::from_json(&content, path, max_articles)
    }

    pub fn from_json(json: &str, path: &Path, max_articles: usize) -> Result<Self, LoadError> {
        let records: Vec<ArticleRecord> =
            serde_json::from_str(json).map_err(|source| LoadError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let mut articles: HashMap<(String, NaiveDate), Vec<Article>> = HashMap::new();
        for record in records {
            let mut article = record.article;
            article.published_date.get_or_insert(record.date);
            articles
                .entry((record.symbol, record.date))
                .or_default()
                .push(article);
        }
        Ok(Self {
            articles,
            max_articles,
        })
    }
}

impl NewsProvider for ArticleFile {
    fn name(&self) -> &str {
        "file"
    }

    fn articles(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Article>, ProviderError> {
        Ok(self
            .articles
            .get(&(symbol.to_string(), date))
            .map(|list| list.iter().take(self.max_articles).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn parses_and_caps_articles() {
        let body: NewsApiResponse = serde_json::from_str(
            r#"{"status":"ok","totalResults":3,"articles":[
                {"source":{"name":"A"},"title":"Apple beats","description":"Record quarter","publishedAt":"2024-01-02T14:00:00Z"},
                {"title":"","description":"untitled"},
                {"title":"Apple slips","description":null,"publishedAt":"bad"},
                {"title":"Third","description":"x"}
            ]}"#,
        )
        .unwrap();
        let articles = parse_response(body, 2).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].headline(), "Apple beats - Record quarter");
        assert_eq!(articles[0].published_date, Some(d(2)));
        assert_eq!(articles[1].title, "Apple slips");
        assert_eq!(articles[1].published_date, None);
    }

    #[test]
    fn error_status_maps_to_provider_error() {
        let body: NewsApiResponse = serde_json::from_str(
            r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid"}"#,
        )
        .unwrap();
        assert!(matches!(
            parse_response(body, 5),
            Err(ProviderError::Authentication(_))
        ));
    }

    #[test]
    fn missing_key_means_no_news() {
        let provider =
            NewsApiProvider::new(None, 5, None, Arc::new(CircuitBreaker::default_for("news_api")))
                .unwrap();
        assert!(provider.articles("AAPL", d(2)).unwrap().is_empty());
        assert!(provider.articles("AAPL", d(3)).unwrap().is_empty());
    }

    #[test]
    fn unreachable_service_fails_after_one_attempt() {
        let provider = NewsApiProvider::new(
            Some("key".into()),
            5,
            Some("http://127.0.0.1:9/v2/everything".into()),
            Arc::new(CircuitBreaker::default_for("news_api")),
        )
        .unwrap();
        assert_eq!(provider.retry_policy().max_retries, 0);

        let started = std::time::Instant::now();
        let err = provider.articles("AAPL", d(2)).unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert!(started.elapsed() < RetryPolicy::default().base_delay);
    }

    #[test]
    fn article_file_groups_by_symbol_and_day() {
        let json = r#"[
            {"symbol":"AAPL","date":"2024-01-02","title":"One","summary":"a"},
            {"symbol":"AAPL","date":"2024-01-02","title":"Two"},
            {"symbol":"AAPL","date":"2024-01-03","title":"Three"},
            {"symbol":"MSFT","date":"2024-01-02","title":"Other"}
        ]"#;
        let file = ArticleFile::from_json(json, Path::new("news.json"), 5).unwrap();
        let articles = file.articles("AAPL", d(2)).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].published_date, Some(d(2)));
        assert_eq!(articles[1].summary, "");
        assert!(file.articles("AAPL", d(4)).unwrap().is_empty());

        let capped = ArticleFile::from_json(json, Path::new("news.json"), 1).unwrap();
        assert_eq!(capped.articles("AAPL", d(2)).unwrap().len(), 1);
    }

    #[test]
    fn article_file_rejects_bad_json() {
        let err = ArticleFile::from_json("{}", Path::new("news.json"), 5).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }
}
