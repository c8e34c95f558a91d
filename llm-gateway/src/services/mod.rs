pub mod ollama_service;
pub mod open_ai_service;

use reqwest::Response;
use tracing::error;

use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{HttpError, LlmError, ProviderError, ProviderErrorKind, make_snippet};

/// Converts a non-2xx response into a provider error, logging a short body snippet.
pub(crate) async fn status_error(provider: LlmProvider, url: &str, resp: Response) -> LlmError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let snippet = make_snippet(&text);

    error!(%status, %url, %snippet, %provider, "provider returned non-success status");

    ProviderError::new(
        provider,
        ProviderErrorKind::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet,
        }),
    )
    .into()
}

/// Fails fast on configs that target a different backend or carry a malformed endpoint.
pub(crate) fn checked_base(
    expected: LlmProvider,
    provider: LlmProvider,
    endpoint: &str,
) -> Result<String, LlmError> {
    if provider != expected {
        return Err(ProviderError::new(expected, ProviderErrorKind::InvalidProvider).into());
    }
    let endpoint = endpoint.trim();
    if endpoint.is_empty() || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        return Err(ProviderError::new(
            expected,
            ProviderErrorKind::InvalidEndpoint(endpoint.to_string()),
        )
        .into());
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}
