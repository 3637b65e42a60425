use crate::server::web::callback::start_callback_server;
use crate::util::errors::{self, ApiError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use log::{debug, info, warn};
use rand::Rng;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::env;
use std::iter;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use url::Url;

// The request surface the managers are written against. `ApiProxy` is the
// real implementation; tests substitute their own.
#[async_trait]
pub trait YouTubeApi {
    async fn get(
        &self,
        endpoint: &str,
        params: Option<HashMap<&str, &str>>,
    ) -> Result<(StatusCode, Value), ApiError>;

    async fn post(
        &self,
        endpoint: &str,
        params: Option<HashMap<&str, &str>>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ApiError>;

    async fn put(
        &self,
        endpoint: &str,
        params: Option<HashMap<&str, &str>>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ApiError>;

    async fn delete(
        &self,
        endpoint: &str,
        params: Option<HashMap<&str, &str>>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ApiError>;
}

#[derive(Debug, Clone)]
struct AuthInfo {
    // these should be locked together
    access_token: Option<(String, SystemTime)>, // (token, expiry time)
    refresh_token: Option<String>,
}

// On-disk copy of AuthInfo, written after every successful token grant so a
// later run can skip the browser flow.
#[derive(Debug, Serialize, Deserialize)]
struct TokenCache {
    access_token: String,
    expires_at: u64, // seconds since the unix epoch
    refresh_token: Option<String>,
}

#[derive(Debug)]
pub struct ApiProxy {
    client: Client,

    application_id: String,
    application_secret: String,
    scope: String,

    base_url: String,
    callback_url: String,
    callback_port: u16,
    token_cache_path: PathBuf,
    backoff: RwLock<SystemTime>, // time to start api calls again

    auth_info: RwLock<AuthInfo>,
}

fn gen_random_state(len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let one_char = || CHARSET[rng.gen_range(0..CHARSET.len())] as char;
    iter::repeat_with(one_char).take(len).collect()
}

fn gen_challenge(verifier: &str) -> String {
    let mut sha = Sha256::new();
    sha.update(verifier.as_bytes());
    return general_purpose::URL_SAFE_NO_PAD.encode(sha.finalize());
}

impl ApiProxy {
    pub fn new() -> Self {
        let client_id = env::var("YT_API_CLIENT_ID").expect("YT_API_CLIENT_ID must be set");
        let client_secret =
            env::var("YT_API_CLIENT_SECRET").expect("YT_API_CLIENT_SECRET must be set");
        let base_url = env::var("YT_API_BASE_URL").expect("YT_API_BASE_URL must be set");
        let scope = env::var("YT_API_SCOPE").expect("YT_API_SCOPE must be set");
        let callback_url = env::var("OAUTH_CALLBACK_URL").expect("OAUTH_CALLBACK_URL must be set");
        let callback_port = env::var("OAUTH_CALLBACK_PORT")
            .expect("OAUTH_CALLBACK_PORT must be set")
            .parse::<u16>()
            .expect("OAUTH_CALLBACK_PORT must be a port number");
        let token_cache_path = PathBuf::from(
            env::var("TOKEN_CACHE_PATH").unwrap_or_else(|_| "token.json".to_string()),
        );

        let auth_info = match load_token_cache(&token_cache_path) {
            Some(cache) => {
                info!("Loaded cached credentials from {:?}.", token_cache_path);
                AuthInfo {
                    access_token: Some((
                        cache.access_token,
                        UNIX_EPOCH + Duration::from_secs(cache.expires_at),
                    )),
                    refresh_token: cache.refresh_token,
                }
            }
            None => AuthInfo {
                access_token: None,
                refresh_token: None,
            },
        };

        return ApiProxy {
            client: Client::new(),

            application_id: client_id,
            application_secret: client_secret,
            scope,

            base_url,
            callback_url,
            callback_port,
            token_cache_path,
            backoff: RwLock::new(SystemTime::now()),

            auth_info: RwLock::new(auth_info),
        };
    }

    pub async fn execute_backoff(&self) -> Result<(), ApiError> {
        let backoff = self.backoff.read().await;

        // backoff if necessary
        match backoff.duration_since(SystemTime::now()) {
            Ok(duration) => {
                debug!("Entering backoff loop for {}s.", duration.as_secs());
                tokio::time::sleep(tokio::time::Duration::from_secs(duration.as_secs())).await;
                return Ok(());
            }
            Err(_) => {
                return Ok(()); // no backoff needed
            }
        }
    }

    async fn store_token_cache(&self) {
        let auth_info = self.auth_info.read().await;

        let (token, expiry) = match auth_info.access_token.clone() {
            Some(at) => at,
            None => return,
        };

        let cache = TokenCache {
            access_token: token,
            expires_at: expiry
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            refresh_token: auth_info.refresh_token.clone(),
        };

        let serialized = match serde_json::to_string_pretty(&cache) {
            Ok(s) => s,
            Err(_) => return,
        };

        if std::fs::write(&self.token_cache_path, serialized).is_err() {
            warn!(
                "Failed to write token cache to {:?}.",
                self.token_cache_path
            );
        }
    }

    // Full installed-app authorization: open the consent page in the browser
    // and wait for the loopback callback server to hand back the code.
    async fn auth(&self) -> Result<StatusCode, ApiError> {
        info!("Attempting to authenticate.");

        // generate verifier, challenge, and state
        let verifier = gen_random_state(64);
        let challenge = gen_challenge(&verifier);
        let state = gen_random_state(32);

        // request parameters
        let params = vec![
            ("response_type", "code"),
            ("client_id", &self.application_id),
            ("redirect_uri", &self.callback_url),
            ("scope", &self.scope),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("code_challenge", &challenge),
            ("code_challenge_method", "S256"),
            ("state", &state),
        ];

        let url =
            match Url::parse_with_params("https://accounts.google.com/o/oauth2/v2/auth", &params) {
                Ok(parsed_url) => Into::<String>::into(parsed_url),
                Err(_) => return Err(ApiError::RequestError),
            };

        // the callback server must be listening before the consent page
        // redirects back to it
        let listener = tokio::spawn(start_callback_server(self.callback_port, state));

        if let Err(_) = open::that(url) {
            return Err(ApiError::BrowserError);
        }

        let code = match listener.await {
            Ok(Ok(code)) => code,
            _ => return Err(ApiError::CallbackError),
        };

        debug!("Received callback authorization code.");

        // request parameters
        let params = [
            ("grant_type", "authorization_code"),
            ("code", &code),
            ("redirect_uri", &self.callback_url),
            ("code_verifier", &verifier),
            ("client_id", &self.application_id),
            ("client_secret", &self.application_secret),
        ];

        // send request
        let request = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&params);

        let response = match request.send().await {
            Ok(res) => res,
            Err(_) => return Err(ApiError::RequestError),
        };

        let status = response.status();

        if status.is_success() {
            // parse response json
            let json = match response.json::<Value>().await {
                Ok(data) => data,
                Err(_) => {
                    return Err(ApiError::ResponseParseError);
                }
            };

            // update access token, expiry time, and refresh token
            let access_token = match json["access_token"].as_str() {
                Some(token) => token.to_string(),
                None => return Err(ApiError::ResponseDataError),
            };

            let expires_in = match json["expires_in"].as_u64() {
                Some(exp) => exp,
                None => return Err(ApiError::ResponseDataError),
            };

            let refresh_token = match json["refresh_token"].as_str() {
                Some(token) => token.to_string(),
                None => return Err(ApiError::ResponseDataError),
            };

            let expiry = SystemTime::now() + Duration::new(expires_in, 0);

            {
                let mut auth_info = self.auth_info.write().await;

                auth_info.access_token = Some((access_token, expiry));
                auth_info.refresh_token = Some(refresh_token);
            }

            self.store_token_cache().await;

            info!("Successfully authenticated.");

            return Ok(status);
        }

        warn!("Failed to authenticate.");

        {
            let mut auth_info = self.auth_info.write().await;
            auth_info.access_token = None;
            auth_info.refresh_token = None;
        }

        Err(errors::return_response_error(status))
    }

    pub async fn validate_auth(&self) -> Result<StatusCode, ApiError> {
        let (at, rt) = {
            let auth_info = self.auth_info.read().await;
            (
                auth_info.access_token.clone(),
                auth_info.refresh_token.clone(),
            )
        };

        if at.is_none() || at.unwrap().1 < SystemTime::now() {
            if rt.is_none() {
                return self.auth().await;
            } else {
                match self.reauth().await {
                    Ok(status) => return Ok(status),
                    Err(_) => {
                        return self.auth().await;
                    }
                }
            }
        }

        return Ok(StatusCode::OK);
    }

    // Method for refreshing the YouTube API token
    pub async fn reauth(&self) -> Result<StatusCode, ApiError> {
        info!("Attempting to reauthenticate.");

        // ensure refresh token is present
        let refresh_token = {
            let auth_info = self.auth_info.read().await;
            auth_info.refresh_token.clone()
        };
        let refresh_token = match refresh_token {
            Some(token) => token,
            None => return self.auth().await,
        };

        // request parameters
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", &refresh_token),
            ("client_id", &self.application_id),
            ("client_secret", &self.application_secret),
        ];

        // send request
        let request = self
            .client
            .post("https://oauth2.googleapis.com/token")
            .form(&params);

        let response = match request.send().await {
            Ok(res) => res,
            Err(_) => return Err(ApiError::RequestError),
        };

        let status = response.status();

        // success response
        if status.is_success() {
            // parse json response
            let json = match response.json::<Value>().await {
                Ok(data) => data,
                Err(_) => {
                    return Err(ApiError::ResponseParseError);
                }
            };

            // update access token and expiry time
            let access_token = match json["access_token"].as_str() {
                Some(token) => token.to_string(),
                None => return Err(ApiError::ResponseDataError),
            };

            let expires_in = match json["expires_in"].as_u64() {
                Some(exp) => exp,
                None => return Err(ApiError::ResponseDataError),
            };

            let expiry = SystemTime::now() + Duration::new(expires_in, 0);

            {
                let mut auth_info = self.auth_info.write().await;

                auth_info.access_token = Some((access_token, expiry));

                // keep the old refresh token unless a new one is provided
                if let Some(new_refresh_token) = json["refresh_token"].as_str() {
                    auth_info.refresh_token = Some(new_refresh_token.to_string());
                } else {
                    auth_info.refresh_token = Some(refresh_token);
                }
            }

            self.store_token_cache().await;

            info!("Successfully reauthenticated.");

            return Ok(status);
        }

        // non-success response
        warn!("Failed to reauthenticate.");

        {
            let mut auth_info = self.auth_info.write().await;
            auth_info.access_token = None;
            auth_info.refresh_token = None;
        }

        return Err(errors::return_response_error(status));
    }

    // Single dispatch path for all verbs: auth check, backoff, bearer-auth
    // request, status match.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<HashMap<&str, &str>>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ApiError> {
        // check if access token is valid, if not, auth/reauth
        self.validate_auth().await?;

        // backoff
        self.execute_backoff().await?;

        // construct and send request
        let url = format!("{}/{}", self.base_url, endpoint);

        let access_token = {
            let auth_info = self.auth_info.read().await;
            auth_info.access_token.clone()
        };

        info!("Sending {} request to {}.", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(access_token.ok_or(ApiError::NoAccessToken)?.0)
            .query(&params.unwrap_or_default());

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = match request.send().await {
            Ok(res) => res,
            Err(_) => return Err(ApiError::RequestError),
        };

        let status = response.status();

        if status.is_success() {
            info!("Received response from {} with status {}.", url, status);
        } else {
            warn!("Received response from {} with status {}.", url, status);
        }

        // match status code
        match status.as_u16() {
            200 | 201 => {
                let json = match response.json::<Value>().await {
                    Ok(data) => data,
                    Err(_) => {
                        return Err(ApiError::ResponseParseError);
                    }
                };
                return Ok((status, json));
            }
            204 => Ok((status, serde_json::json!({}))),
            401 => {
                // drop the stored token and reauthenticate for the next call
                {
                    let mut auth_info = self.auth_info.write().await;
                    auth_info.access_token = None;
                }
                self.validate_auth().await?;
                return Err(ApiError::InvalidAccessToken);
            }
            429 => {
                // backoff if rate limited
                let mut backoff = self.backoff.write().await;
                if let Some(retry_after) = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|header| header.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                {
                    *backoff = SystemTime::now() + Duration::from_secs(retry_after);
                } else {
                    *backoff = SystemTime::now() + Duration::from_secs(5);
                    // default backoff
                }

                return Err(ApiError::ResponseError429);
            }
            _ => Err(errors::return_response_error(status)),
        }
    }
}

fn load_token_cache(path: &PathBuf) -> Option<TokenCache> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<TokenCache>(&contents) {
        Ok(cache) => Some(cache),
        Err(_) => {
            // a corrupt cache just forces a fresh login
            warn!("Ignoring unreadable token cache at {:?}.", path);
            None
        }
    }
}

#[async_trait]
impl YouTubeApi for ApiProxy {
    // Method for sending GET requests to the YouTube API
    async fn get(
        &self,
        endpoint: &str,
        params: Option<HashMap<&str, &str>>,
    ) -> Result<(StatusCode, Value), ApiError> {
        self.request(Method::GET, endpoint, params, None).await
    }

    // Method for sending POST requests to the YouTube API
    async fn post(
        &self,
        endpoint: &str,
        params: Option<HashMap<&str, &str>>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ApiError> {
        self.request(Method::POST, endpoint, params, body).await
    }

    // Method for sending PUT requests to the YouTube API
    async fn put(
        &self,
        endpoint: &str,
        params: Option<HashMap<&str, &str>>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ApiError> {
        self.request(Method::PUT, endpoint, params, body).await
    }

    // Method for sending DELETE requests to the YouTube API
    async fn delete(
        &self,
        endpoint: &str,
        params: Option<HashMap<&str, &str>>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value), ApiError> {
        self.request(Method::DELETE, endpoint, params, body).await
    }
}
