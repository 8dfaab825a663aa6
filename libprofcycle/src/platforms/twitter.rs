//! Twitter implementation of the profile session
//!
//! Requests are signed with OAuth 1.0a (see [`super::oauth1`]). Accounts are
//! authorized with the PIN-based flow: the user opens the authorize URL,
//! approves the application and types the PIN back into the terminal.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::Deserialize;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::{PlatformError, Result};
use crate::platforms::oauth1::{self, OAuthParams, Token};
use crate::platforms::{ProfileSession, UploadResponse};
use crate::types::{ProfileEndpoint, TimelineEntry};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)).into())
}

/// Join a base URL and a relative path with exactly one slash
fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn map_reqwest_error(error: reqwest::Error, context: &str) -> PlatformError {
    if error.is_timeout() {
        PlatformError::Network(format!(
            "Twitter request timed out ({}): {}. Suggestion: raise api.timeout_secs or retry later.",
            context, error
        ))
    } else {
        PlatformError::Network(format!("Twitter request failed ({}): {}", context, error))
    }
}

/// Split a response into status and body text
async fn read_response(response: Response, context: &str) -> Result<(u16, String)> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| map_reqwest_error(e, context))?;
    Ok((status, body))
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Credentials one request is signed with: the application's consumer
/// token plus the request or access token, if any
struct Signer<'a> {
    consumer: &'a Token,
    token: Option<&'a Token>,
}

impl<'a> Signer<'a> {
    fn new(consumer: &'a Token, token: Option<&'a Token>) -> Self {
        Self { consumer, token }
    }

    /// Fresh protocol parameters (nonce, timestamp) for one request
    fn oauth(&self) -> OAuthParams {
        OAuthParams::new(&self.consumer.key, self.token.map(|t| t.key.as_str()))
    }

    fn authorization_header(
        &self,
        oauth: &OAuthParams,
        method: &Method,
        url: &str,
        params: &[(String, String)],
    ) -> Result<String> {
        oauth.authorization_header(
            method.as_str(),
            url,
            params,
            self.consumer.secret(),
            self.token.map(Token::secret),
        )
    }

    /// Send one OAuth-signed request
    ///
    /// `params` are sent as the query string for GET and as a form body
    /// otherwise; either way they take part in the signature.
    async fn send(
        &self,
        client: &Client,
        method: Method,
        url: &str,
        params: &[(String, String)],
        oauth: OAuthParams,
        context: &str,
    ) -> Result<Response> {
        let header = self.authorization_header(&oauth, &method, url, params)?;

        let request = if method == Method::GET {
            let target = if params.is_empty() {
                url.to_string()
            } else {
                format!("{}?{}", url, oauth1::form_encode(params))
            };
            client.get(target)
        } else {
            client
                .request(method, url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(oauth1::form_encode(params))
        };

        request
            .header(AUTHORIZATION, header)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, context).into())
    }
}

/// Authorized session for one account
pub struct TwitterSession {
    client: Client,
    base_url: String,
    consumer: Token,
    access: Token,
}

impl TwitterSession {
    /// Create a session signing with the application's consumer token and
    /// the account's access token
    pub fn authorized(api: &ApiConfig, access: Token) -> Result<Self> {
        Ok(Self {
            client: build_client(api.timeout_secs)?,
            base_url: api.base_url.clone(),
            consumer: Token::new(api.consumer_key.clone(), api.consumer_secret.clone()),
            access,
        })
    }

    async fn signed(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        context: &str,
    ) -> Result<Response> {
        let url = join_url(&self.base_url, path);
        let signer = Signer::new(&self.consumer, Some(&self.access));
        signer
            .send(&self.client, method, &url, params, signer.oauth(), context)
            .await
    }
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    #[serde(alias = "full_text")]
    text: String,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    name: String,
}

#[async_trait]
impl ProfileSession for TwitterSession {
    async fn upload(&self, endpoint: ProfileEndpoint, image: &[u8]) -> Result<UploadResponse> {
        let context = endpoint.to_string();
        let params = vec![(endpoint.field().to_string(), STANDARD.encode(image))];

        tracing::debug!("Uploading {} bytes to {}", image.len(), endpoint.path());
        let response = self
            .signed(Method::POST, endpoint.path(), &params, &context)
            .await?;
        let (status, body) = read_response(response, &context).await?;

        if !is_success(status) {
            return Err(PlatformError::UploadFailed { status, body }.into());
        }

        Ok(UploadResponse {
            status,
            body: serde_json::from_str(&body).ok(),
        })
    }

    async fn home_timeline(&self, count: u32) -> Result<Vec<TimelineEntry>> {
        let context = "home timeline";
        let params = vec![("count".to_string(), count.to_string())];

        let response = self
            .signed(Method::GET, "statuses/home_timeline.json", &params, context)
            .await?;
        let (status, body) = read_response(response, context).await?;

        if !is_success(status) {
            return Err(PlatformError::RequestFailed { status, body }.into());
        }

        parse_timeline(&body)
    }

    fn name(&self) -> &str {
        "twitter"
    }
}

fn parse_timeline(body: &str) -> Result<Vec<TimelineEntry>> {
    let tweets: Vec<RawTweet> = serde_json::from_str(body)
        .map_err(|e| PlatformError::InvalidResponse(format!("home timeline: {}", e)))?;

    Ok(tweets
        .into_iter()
        .map(|tweet| TimelineEntry {
            author: tweet.user.name,
            text: tweet.text,
        })
        .collect())
}

/// First half of the PIN-based authorization
#[derive(Debug)]
pub struct PendingAuthorization {
    pub authorize_url: String,
    pub request_token: Token,
}

/// Runs the OAuth handshake that turns a PIN into an access token
pub struct Authorizer {
    client: Client,
    oauth_url: String,
    consumer: Token,
}

impl Authorizer {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(api.timeout_secs)?,
            oauth_url: api.oauth_url.clone(),
            consumer: Token::new(api.consumer_key.clone(), api.consumer_secret.clone()),
        })
    }

    /// Obtain a request token and the URL the user must visit
    pub async fn request_authorization(&self) -> Result<PendingAuthorization> {
        let url = join_url(&self.oauth_url, "request_token");
        let signer = Signer::new(&self.consumer, None);
        let oauth = signer.oauth().with("oauth_callback", "oob");

        let response = signer
            .send(&self.client, Method::POST, &url, &[], oauth, "request token")
            .await?;
        let request_token = self.read_token(response, "request token").await?;

        let authorize_url = format!(
            "{}?oauth_token={}",
            join_url(&self.oauth_url, "authorize"),
            oauth1::encode(&request_token.key)
        );

        Ok(PendingAuthorization {
            authorize_url,
            request_token,
        })
    }

    /// Exchange the PIN shown to the user for an access token
    pub async fn complete_authorization(
        &self,
        pending: &PendingAuthorization,
        pin: &str,
    ) -> Result<Token> {
        let pin = pin.trim();
        if pin.is_empty() {
            return Err(PlatformError::Authentication("PIN cannot be empty".to_string()).into());
        }

        let url = join_url(&self.oauth_url, "access_token");
        let signer = Signer::new(&self.consumer, Some(&pending.request_token));
        let oauth = signer.oauth().with("oauth_verifier", pin);

        let response = signer
            .send(&self.client, Method::POST, &url, &[], oauth, "access token")
            .await?;
        self.read_token(response, "access token").await
    }

    async fn read_token(&self, response: Response, context: &str) -> Result<Token> {
        let (status, body) = read_response(response, context).await?;
        if !is_success(status) {
            return Err(PlatformError::Authentication(format!(
                "Failed to obtain {} (status {}): {}",
                context, status, body
            ))
            .into());
        }
        parse_token_response(&body, context)
    }
}

fn parse_token_response(body: &str, context: &str) -> Result<Token> {
    let fields = oauth1::parse_form(body);
    let field = |name: &str| {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| {
                PlatformError::InvalidResponse(format!("{} response lacks {}", context, name))
            })
    };

    Ok(Token::new(field("oauth_token")?, field("oauth_token_secret")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfcycleError;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.twitter.com/1.1/", "account/update_profile_image.json"),
            "https://api.twitter.com/1.1/account/update_profile_image.json"
        );
        assert_eq!(
            join_url("https://api.twitter.com/oauth", "/request_token"),
            "https://api.twitter.com/oauth/request_token"
        );
    }

    #[test]
    fn test_signer_signs_with_consumer_and_token_secrets() {
        let consumer = Token::new("ck", "consumer-secret");
        let access = Token::new("at", "token-secret");
        let signer = Signer::new(&consumer, Some(&access));

        let mut oauth = signer.oauth();
        assert_eq!(oauth.consumer_key, "ck");
        assert_eq!(oauth.token.as_deref(), Some("at"));
        oauth.nonce = "nonce".to_string();
        oauth.timestamp = 1_300_000_000;

        let url = "https://api.twitter.com/1.1/statuses/home_timeline.json";
        let params = vec![("count".to_string(), "5".to_string())];
        let header = signer
            .authorization_header(&oauth, &Method::GET, url, &params)
            .unwrap();
        let expected = oauth
            .authorization_header("GET", url, &params, "consumer-secret", Some("token-secret"))
            .unwrap();
        assert_eq!(header, expected);

        let unsigned_token = Signer::new(&consumer, None)
            .authorization_header(&oauth, &Method::GET, url, &params)
            .unwrap();
        assert_ne!(header, unsigned_token);
    }

    #[test]
    fn test_parse_timeline() {
        let body = r#"[
            {"id": 1, "text": "first post", "user": {"name": "Alice", "screen_name": "alice"}},
            {"id": 2, "full_text": "second post", "user": {"name": "Bob"}}
        ]"#;

        let entries = parse_timeline(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].to_string(), "Alice: first post");
        assert_eq!(entries[1].author, "Bob");
        assert_eq!(entries[1].text, "second post");
    }

    #[test]
    fn test_parse_timeline_rejects_unexpected_shape() {
        let result = parse_timeline(r#"{"errors": [{"code": 89}]}"#);
        assert!(matches!(
            result,
            Err(ProfcycleError::Platform(PlatformError::InvalidResponse(_)))
        ));
    }

    #[test]
    fn test_parse_token_response() {
        let token = parse_token_response(
            "oauth_token=6253282-eWudHldSbIaelX7swmsiHImEL4KinwaGloHANdrY&oauth_token_secret=2EEfA6BG3ly3sR3RjE0IBSnlQu4ZrUzPiYKmrkVU&user_id=6253282",
            "access token",
        )
        .unwrap();

        assert_eq!(token.key, "6253282-eWudHldSbIaelX7swmsiHImEL4KinwaGloHANdrY");
        assert_eq!(token.secret(), "2EEfA6BG3ly3sR3RjE0IBSnlQu4ZrUzPiYKmrkVU");
    }

    #[test]
    fn test_parse_token_response_missing_secret() {
        let result = parse_token_response("oauth_token=abc", "request token");
        match result {
            Err(ProfcycleError::Platform(PlatformError::InvalidResponse(msg))) => {
                assert!(msg.contains("oauth_token_secret"));
            }
            other => panic!("Expected InvalidResponse, got {:?}", other.map(|t| t.key)),
        }
    }

    #[test]
    fn test_is_success() {
        assert!(is_success(200));
        assert!(is_success(201));
        assert!(!is_success(401));
        assert!(!is_success(500));
    }
}
