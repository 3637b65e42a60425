use crate::client::api_proxy::YouTubeApi;
use crate::util::errors::ApiError;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

// Walks a paged list endpoint to the end, collecting one projected field per
// item. `base_params` is the immutable first-page template; the continuation
// token is merged in for every page after the first. An absent nextPageToken
// (or a present but empty one) marks the final page.
pub async fn fetch_all<A, F>(
    api: &A,
    endpoint: &str,
    base_params: &HashMap<&str, &str>,
    extract: F,
) -> Result<Vec<String>, ApiError>
where
    A: YouTubeApi + Sync,
    F: Fn(&Value) -> Option<String>,
{
    let mut results = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut params = base_params.clone();
        if let Some(token) = page_token.as_deref() {
            params.insert("pageToken", token);
        }

        let (_status, json) = api.get(endpoint, Some(params)).await?;

        let items = json["items"]
            .as_array()
            .ok_or(ApiError::MalformedResponse)?;
        for item in items {
            results.push(extract(item).ok_or(ApiError::MalformedResponse)?);
        }

        page_token = match json["nextPageToken"].as_str() {
            Some(token) if !token.is_empty() => Some(token.to_string()),
            _ => None,
        };

        if page_token.is_none() {
            debug!("Fetched {} items from {}.", results.len(), endpoint);
            return Ok(results);
        }
    }
}
