use crate::client::api_proxy::YouTubeApi;
use crate::client::core::{pagination, ranking};
use crate::util::errors::ApiError;
use log::info;
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug)]
pub struct PlaylistManager<'a, A: YouTubeApi> {
    api: &'a A,
}

impl<'a, A: YouTubeApi + Sync> PlaylistManager<'a, A> {
    pub fn new(api: &'a A) -> Self {
        return PlaylistManager { api };
    }

    // Lists the ids of every playlist on the account
    pub async fn my_playlists(&self) -> Result<Vec<String>, ApiError> {
        let mut params = HashMap::new();
        params.insert("part", "snippet,contentDetails");
        params.insert("mine", "true");

        return pagination::fetch_all(self.api, "playlists", &params, |item| {
            item["id"].as_str().map(str::to_string)
        })
        .await;
    }

    // Lists the video ids of every entry in a playlist
    pub async fn playlist_videos(&self, playlist_id: &str) -> Result<Vec<String>, ApiError> {
        let mut params = HashMap::new();
        params.insert("part", "snippet,contentDetails");
        params.insert("playlistId", playlist_id);

        return pagination::fetch_all(self.api, "playlistItems", &params, |item| {
            item["snippet"]["resourceId"]["videoId"]
                .as_str()
                .map(str::to_string)
        })
        .await;
    }

    // Retrieves the details about one playlist
    pub async fn playlist_details(&self, playlist_id: &str) -> Result<Value, ApiError> {
        let mut params = HashMap::new();
        params.insert("part", "snippet");
        params.insert("id", playlist_id);

        let (_status, json) = self.api.get("playlists", Some(params)).await?;
        return Ok(json);
    }

    // Creates a new public playlist and returns its id
    pub async fn create_playlist(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<String, ApiError> {
        let mut params = HashMap::new();
        params.insert("part", "snippet,status");

        let body = json!({
            "snippet": {
                "title": title,
                "description": description,
            },
            "status": {
                "privacyStatus": "public",
            },
        });

        let (_status, json) = self.api.post("playlists", Some(params), Some(body)).await?;

        let playlist_id = json["id"].as_str().ok_or(ApiError::MalformedResponse)?;
        info!("Created playlist {}.", playlist_id);

        return Ok(playlist_id.to_string());
    }

    // Edits a playlist's title, description, and privacy status
    pub async fn edit_playlist(
        &self,
        playlist_id: &str,
        title: &str,
        description: Option<&str>,
        privacy_status: &str,
    ) -> Result<Value, ApiError> {
        let mut params = HashMap::new();
        params.insert("part", "id,snippet,status");

        let body = json!({
            "id": playlist_id,
            "snippet": {
                "title": title,
                "description": description,
            },
            "status": {
                "privacyStatus": privacy_status,
            },
        });

        let (_status, json) = self.api.put("playlists", Some(params), Some(body)).await?;
        return Ok(json);
    }

    // Adds a video to a playlist
    pub async fn add_video(&self, playlist_id: &str, video_id: &str) -> Result<Value, ApiError> {
        let mut params = HashMap::new();
        params.insert("part", "snippet");

        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": {
                    "kind": "youtube#video",
                    "videoId": video_id,
                },
            },
        });

        let (_status, json) = self
            .api
            .post("playlistItems", Some(params), Some(body))
            .await?;
        return Ok(json);
    }

    // Removes one playlist entry by its playlist item id
    pub async fn remove_video(&self, item_id: &str) -> Result<Value, ApiError> {
        let mut params = HashMap::new();
        params.insert("part", "id");

        let body = json!({ "id": item_id });

        let (_status, json) = self
            .api
            .delete("playlistItems", Some(params), Some(body))
            .await?;
        return Ok(json);
    }

    // Deletes a playlist from the account
    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<Value, ApiError> {
        let mut params = HashMap::new();
        params.insert("part", "id");

        let body = json!({ "id": playlist_id });

        let (_status, json) = self.api.delete("playlists", Some(params), Some(body)).await?;
        return Ok(json);
    }

    // Copies any playlist into a new playlist on the account: create the
    // (empty) target, list the source, then add every member in order. A
    // failed add surfaces immediately; earlier adds are not rolled back.
    pub async fn clone_playlist(
        &self,
        source_id: &str,
        title: Option<&str>,
    ) -> Result<String, ApiError> {
        let target_id = self
            .create_playlist(title.unwrap_or("Cloned playlist"), None)
            .await?;

        let to_be_added = self.playlist_videos(source_id).await?;
        for video_id in &to_be_added {
            self.add_video(&target_id, video_id).await?;
        }

        info!("Cloned playlist {} into {}.", source_id, target_id);
        return Ok(target_id);
    }

    // Merges the source playlist into the target, then deletes the source.
    // A failure mid-way leaves both playlists as they are at that point.
    pub async fn merge_playlists(&self, target_id: &str, source_id: &str) -> Result<(), ApiError> {
        let to_be_merged = self.playlist_videos(source_id).await?;
        for video_id in &to_be_merged {
            self.add_video(target_id, video_id).await?;
        }

        self.delete_playlist(source_id).await?;

        info!("Merged playlist {} into {}.", source_id, target_id);
        return Ok(());
    }

    // The k most viewed video titles from one playlist, or from every
    // playlist on the account when none is given.
    pub async fn top_videos(
        &self,
        playlist_id: Option<&str>,
        k: usize,
    ) -> Result<Vec<String>, ApiError> {
        let video_ids = match playlist_id {
            Some(id) => self.playlist_videos(id).await?,
            None => {
                // one flat pool across all playlists, in listing order
                let mut all = Vec::new();
                for playlist in self.my_playlists().await? {
                    all.extend(self.playlist_videos(&playlist).await?);
                }
                all
            }
        };

        return ranking::top_k(self.api, &video_ids, k).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    // Fake account: owned playlists with members, a video metadata table, a
    // verb-level call log, and an optional add that is scripted to fail.
    struct FakeYouTube {
        playlists: Vec<(String, Vec<String>)>,
        videos: HashMap<String, (String, u64)>,
        calls: Mutex<Vec<String>>,
        fail_add_at: Option<usize>, // 1-based index of the add that fails
    }

    impl FakeYouTube {
        fn new(playlists: Vec<(&str, Vec<&str>)>, videos: Vec<(&str, &str, u64)>) -> Self {
            FakeYouTube {
                playlists: playlists
                    .into_iter()
                    .map(|(id, vs)| {
                        (
                            id.to_string(),
                            vs.into_iter().map(str::to_string).collect(),
                        )
                    })
                    .collect(),
                videos: videos
                    .into_iter()
                    .map(|(id, title, views)| (id.to_string(), (title.to_string(), views)))
                    .collect(),
                calls: Mutex::new(Vec::new()),
                fail_add_at: None,
            }
        }

        fn fail_add_at(mut self, n: usize) -> Self {
            self.fail_add_at = Some(n);
            self
        }

        fn log(&self, entry: String) {
            self.calls.lock().unwrap().push(entry);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn calls_matching(&self, prefix: &str) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter(|c| c.starts_with(prefix))
                .collect()
        }
    }

    #[async_trait]
    impl YouTubeApi for FakeYouTube {
        async fn get(
            &self,
            endpoint: &str,
            params: Option<HashMap<&str, &str>>,
        ) -> Result<(StatusCode, Value), ApiError> {
            let params = params.unwrap_or_default();
            match endpoint {
                "playlists" if params.get("mine") == Some(&"true") => {
                    self.log("GET playlists".to_string());
                    let items: Vec<Value> = self
                        .playlists
                        .iter()
                        .map(|(id, _)| json!({ "id": id }))
                        .collect();
                    Ok((StatusCode::OK, json!({ "items": items })))
                }
                "playlistItems" => {
                    let playlist_id = params.get("playlistId").expect("missing playlistId");
                    self.log(format!("GET playlistItems {}", playlist_id));
                    let members = self
                        .playlists
                        .iter()
                        .find(|(id, _)| id == playlist_id)
                        .map(|(_, vs)| vs.clone())
                        .unwrap_or_default();
                    let items: Vec<Value> = members
                        .iter()
                        .map(|v| json!({ "snippet": { "resourceId": { "videoId": v } } }))
                        .collect();
                    Ok((StatusCode::OK, json!({ "items": items })))
                }
                "videos" => {
                    let id = params.get("id").expect("missing video id").to_string();
                    self.log(format!("GET videos {}", id));
                    let item = match self.videos.get(&id) {
                        Some((title, views)) => json!({
                            "snippet": { "title": title },
                            "statistics": { "viewCount": views.to_string() },
                        }),
                        None => return Err(ApiError::ResponseError404),
                    };
                    Ok((StatusCode::OK, json!({ "items": [item] })))
                }
                _ => Err(ApiError::ResponseError404),
            }
        }

        async fn post(
            &self,
            endpoint: &str,
            _params: Option<HashMap<&str, &str>>,
            body: Option<Value>,
        ) -> Result<(StatusCode, Value), ApiError> {
            match endpoint {
                "playlists" => {
                    self.log("POST playlists".to_string());
                    Ok((StatusCode::OK, json!({ "id": "new-pl" })))
                }
                "playlistItems" => {
                    let body = body.expect("add without a body");
                    let video_id = body["snippet"]["resourceId"]["videoId"]
                        .as_str()
                        .expect("add without a video id")
                        .to_string();
                    self.log(format!("POST playlistItems {}", video_id));

                    let attempts = self.calls_matching("POST playlistItems").len();
                    if self.fail_add_at == Some(attempts) {
                        return Err(ApiError::ResponseError500);
                    }
                    Ok((StatusCode::OK, json!({ "id": format!("item-{}", video_id) })))
                }
                _ => Err(ApiError::ResponseError404),
            }
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
            endpoint: &str,
            _params: Option<HashMap<&str, &str>>,
            body: Option<Value>,
        ) -> Result<(StatusCode, Value), ApiError> {
            let id = body
                .and_then(|b| b["id"].as_str().map(str::to_string))
                .expect("delete without an id");
            self.log(format!("DELETE {} {}", endpoint, id));
            Ok((StatusCode::OK, json!({})))
        }
    }

    #[tokio::test]
    async fn scoped_top_ranks_one_playlist() {
        let api = FakeYouTube::new(
            vec![("pl1", vec!["v1", "v2", "v3"])],
            vec![("v1", "A", 10), ("v2", "B", 30), ("v3", "C", 20)],
        );
        let manager = PlaylistManager::new(&api);

        let top = manager.top_videos(Some("pl1"), 2).await.unwrap();

        assert_eq!(top, vec!["B", "C"]);
        assert!(api.calls_matching("GET playlists").is_empty());
    }

    #[tokio::test]
    async fn unscoped_top_ranks_across_all_playlists() {
        let api = FakeYouTube::new(
            vec![("pl1", vec!["v1", "v2"]), ("pl2", vec!["v3"])],
            vec![("v1", "A", 10), ("v2", "B", 30), ("v3", "C", 20)],
        );
        let manager = PlaylistManager::new(&api);

        let top = manager.top_videos(None, 3).await.unwrap();

        assert_eq!(top, vec!["B", "C", "A"]);
        // every member fetched exactly once, in listing order
        assert_eq!(
            api.calls_matching("GET videos"),
            vec!["GET videos v1", "GET videos v2", "GET videos v3"]
        );
    }

    #[tokio::test]
    async fn clone_creates_then_lists_then_adds_in_order() {
        let api = FakeYouTube::new(vec![("src", vec!["v1", "v2"])], vec![]);
        let manager = PlaylistManager::new(&api);

        let target = manager.clone_playlist("src", None).await.unwrap();

        assert_eq!(target, "new-pl");
        assert_eq!(
            api.calls(),
            vec![
                "POST playlists",
                "GET playlistItems src",
                "POST playlistItems v1",
                "POST playlistItems v2",
            ]
        );
    }

    #[tokio::test]
    async fn clone_stops_at_the_first_failed_add() {
        let api = FakeYouTube::new(
            vec![("src", vec!["v1", "v2", "v3", "v4", "v5"])],
            vec![],
        )
        .fail_add_at(3);
        let manager = PlaylistManager::new(&api);

        let err = manager.clone_playlist("src", None).await.unwrap_err();

        assert_eq!(err, ApiError::ResponseError500);
        // the first two adds stand, the failing third is the last attempt
        assert_eq!(
            api.calls_matching("POST playlistItems"),
            vec![
                "POST playlistItems v1",
                "POST playlistItems v2",
                "POST playlistItems v3",
            ]
        );
    }

    #[tokio::test]
    async fn merge_copies_source_then_deletes_it() {
        let api = FakeYouTube::new(vec![("src", vec!["v1", "v2"]), ("dst", vec![])], vec![]);
        let manager = PlaylistManager::new(&api);

        manager.merge_playlists("dst", "src").await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                "GET playlistItems src",
                "POST playlistItems v1",
                "POST playlistItems v2",
                "DELETE playlists src",
            ]
        );
    }

    #[tokio::test]
    async fn merge_failure_leaves_source_in_place() {
        let api = FakeYouTube::new(vec![("src", vec!["v1", "v2"]), ("dst", vec![])], vec![])
            .fail_add_at(2);
        let manager = PlaylistManager::new(&api);

        let err = manager.merge_playlists("dst", "src").await.unwrap_err();

        assert_eq!(err, ApiError::ResponseError500);
        assert!(api.calls_matching("DELETE playlists").is_empty());
    }

    #[tokio::test]
    async fn create_without_returned_id_is_malformed() {
        struct NoIdApi;

        #[async_trait]
        impl YouTubeApi for NoIdApi {
            async fn get(
                &self,
                _endpoint: &str,
                _params: Option<HashMap<&str, &str>>,
            ) -> Result<(StatusCode, Value), ApiError> {
                unimplemented!()
            }

            async fn post(
                &self,
                _endpoint: &str,
                _params: Option<HashMap<&str, &str>>,
                _body: Option<Value>,
            ) -> Result<(StatusCode, Value), ApiError> {
                Ok((StatusCode::OK, json!({})))
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

        let api = NoIdApi;
        let manager = PlaylistManager::new(&api);

        let err = manager.create_playlist("title", None).await.unwrap_err();
        assert_eq!(err, ApiError::MalformedResponse);
    }
}
