use crate::client::api_proxy::YouTubeApi;
use crate::util::errors::ApiError;
use serde_json::Value;
use std::collections::HashMap;

const MAX_SEARCH_RESULTS: &str = "20";

#[derive(Debug)]
pub struct SearchManager<'a, A: YouTubeApi> {
    api: &'a A,
}

impl<'a, A: YouTubeApi + Sync> SearchManager<'a, A> {
    pub fn new(api: &'a A) -> Self {
        return SearchManager { api };
    }

    // Searches for video, playlist, or channel resources matching the query
    pub async fn search(&self, query: &str, resource_type: &str) -> Result<Value, ApiError> {
        let mut params = HashMap::new();
        params.insert("part", "snippet");
        params.insert("maxResults", MAX_SEARCH_RESULTS);
        params.insert("type", resource_type);
        params.insert("q", query);

        let (_status, json) = self.api.get("search", Some(params)).await?;
        return Ok(json);
    }
}
