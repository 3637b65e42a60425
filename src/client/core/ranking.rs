use crate::client::api_proxy::YouTubeApi;
use crate::util::errors::ApiError;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

// One video's ranking inputs, built per call and discarded after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStat {
    pub title: String,
    pub view_count: u64,
}

// Orders stats by view count descending (stable, so equal counts keep their
// input order) and returns the first `k` distinct titles.
pub fn rank_titles(mut stats: Vec<VideoStat>, k: usize) -> Vec<String> {
    stats.sort_by(|a, b| b.view_count.cmp(&a.view_count));

    let mut titles: Vec<String> = Vec::new();
    for stat in stats {
        if titles.len() == k {
            break;
        }
        if !titles.contains(&stat.title) {
            titles.push(stat.title);
        }
    }

    return titles;
}

// The API serves viewCount as a decimal string; tolerate a bare integer too.
fn parse_view_count(value: &Value) -> Result<u64, ApiError> {
    match value {
        Value::String(s) => s.parse::<u64>().map_err(|_| ApiError::MetadataParse),
        Value::Number(n) => n.as_u64().ok_or(ApiError::MetadataParse),
        _ => Err(ApiError::MetadataParse),
    }
}

// Resolves each video id to (title, view count) and ranks the lot. Duplicate
// ids are resolved independently, one request each, in input order.
pub async fn top_k<A>(api: &A, video_ids: &[String], k: usize) -> Result<Vec<String>, ApiError>
where
    A: YouTubeApi + Sync,
{
    let mut stats: Vec<VideoStat> = Vec::with_capacity(video_ids.len());

    for video_id in video_ids {
        let mut params = HashMap::new();
        params.insert("part", "snippet,statistics");
        params.insert("id", video_id.as_str());

        let (_status, json) = api.get("videos", Some(params)).await?;

        let items = json["items"]
            .as_array()
            .ok_or(ApiError::MalformedResponse)?;
        for video in items {
            let title = video["snippet"]["title"]
                .as_str()
                .ok_or(ApiError::MetadataParse)?
                .to_string();
            let view_count = parse_view_count(&video["statistics"]["viewCount"])?;

            stats.push(VideoStat { title, view_count });
        }
    }

    debug!("Ranking {} videos for top {}.", stats.len(), k);

    return Ok(rank_titles(stats, k));
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;

    fn stat(title: &str, view_count: u64) -> VideoStat {
        VideoStat {
            title: title.to_string(),
            view_count,
        }
    }

    #[test]
    fn ranks_by_views_with_ties_in_input_order() {
        let stats = vec![stat("A", 10), stat("B", 30), stat("C", 30), stat("D", 5)];
        assert_eq!(rank_titles(stats, 3), vec!["B", "C", "A"]);
    }

    #[test]
    fn duplicate_titles_count_once() {
        let stats = vec![stat("X", 100), stat("X", 50), stat("Y", 80)];
        assert_eq!(rank_titles(stats, 3), vec!["X", "Y"]);
    }

    #[test]
    fn zero_k_yields_nothing() {
        let stats = vec![stat("A", 10)];
        assert!(rank_titles(stats, 0).is_empty());
    }

    #[test]
    fn fewer_stats_than_k_returns_everything_ranked() {
        let stats = vec![stat("A", 1), stat("B", 2)];
        assert_eq!(rank_titles(stats, 5), vec!["B", "A"]);
    }

    // Serves videos?id=<id> from a fixture table, counting hits per id.
    struct MetadataApi {
        videos: HashMap<String, Value>,
        hits: Mutex<Vec<String>>,
    }

    impl MetadataApi {
        fn new(videos: Vec<(&str, Value)>) -> Self {
            MetadataApi {
                videos: videos
                    .into_iter()
                    .map(|(id, v)| (id.to_string(), v))
                    .collect(),
                hits: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl YouTubeApi for MetadataApi {
        async fn get(
            &self,
            endpoint: &str,
            params: Option<HashMap<&str, &str>>,
        ) -> Result<(StatusCode, Value), ApiError> {
            assert_eq!(endpoint, "videos");
            let id = params
                .and_then(|p| p.get("id").map(|s| s.to_string()))
                .expect("videos request without an id");
            self.hits.lock().unwrap().push(id.clone());

            let video = self.videos.get(&id).cloned().unwrap_or(json!(null));
            Ok((StatusCode::OK, json!({ "items": [video] })))
        }

        async fn post(
            &self,
            _endpoint: &str,
            _params: Option<HashMap<&str, &str>>,
            _body: Option<Value>,
        ) -> Result<(StatusCode, Value), ApiError> {
            unimplemented!()
        }

        async fn put(
            &self,
            _endpoint: &str,
            _params: Option<HashMap<&str, &str>>,
            _body: Option<Value>,
        ) -> Result<(StatusCode, Value), ApiError> {
            unimplemented!()
        }

        async fn delete(
            &self,
            _endpoint: &str,
            _params: Option<HashMap<&str, &str>>,
            _body: Option<Value>,
        ) -> Result<(StatusCode, Value), ApiError> {
            unimplemented!()
        }
    }

    fn video(title: &str, view_count: &str) -> Value {
        json!({
            "snippet": { "title": title },
            "statistics": { "viewCount": view_count },
        })
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn fetches_metadata_and_ranks() {
        let api = MetadataApi::new(vec![
            ("v1", video("A", "10")),
            ("v2", video("B", "30")),
            ("v3", video("C", "5")),
        ]);

        let top = top_k(&api, &ids(&["v1", "v2", "v3"]), 2).await.unwrap();

        assert_eq!(top, vec!["B", "A"]);
        assert_eq!(api.hits.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn duplicate_ids_are_resolved_independently() {
        let api = MetadataApi::new(vec![("v1", video("A", "10"))]);

        let top = top_k(&api, &ids(&["v1", "v1"]), 3).await.unwrap();

        assert_eq!(top, vec!["A"]);
        assert_eq!(
            *api.hits.lock().unwrap(),
            vec!["v1".to_string(), "v1".to_string()]
        );
    }

    #[tokio::test]
    async fn integer_view_count_is_accepted() {
        let api = MetadataApi::new(vec![(
            "v1",
            json!({
                "snippet": { "title": "A" },
                "statistics": { "viewCount": 42 },
            }),
        )]);

        let top = top_k(&api, &ids(&["v1"]), 1).await.unwrap();
        assert_eq!(top, vec!["A"]);
    }

    #[tokio::test]
    async fn non_numeric_view_count_is_a_parse_error() {
        let api = MetadataApi::new(vec![("v1", video("A", "a lot"))]);

        let err = top_k(&api, &ids(&["v1"]), 1).await.unwrap_err();
        assert_eq!(err, ApiError::MetadataParse);
    }

    #[tokio::test]
    async fn missing_view_count_is_a_parse_error() {
        let api = MetadataApi::new(vec![("v1", json!({ "snippet": { "title": "A" } }))]);

        let err = top_k(&api, &ids(&["v1"]), 1).await.unwrap_err();
        assert_eq!(err, ApiError::MetadataParse);
    }
}
