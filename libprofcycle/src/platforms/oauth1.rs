//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

use crate::error::{PlatformError, Result};

type HmacSha1 = Hmac<Sha1>;

/// A key and its secret, used for both consumer and access tokens
#[derive(Debug)]
pub struct Token {
    pub key: String,
    secret: SecretString,
}

impl Token {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

/// Percent-encode with the RFC 3986 unreserved set
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Build the signature base string
///
/// `url` must not carry a query string; query and body parameters go in
/// `params` together with the `oauth_*` parameters.
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&normalized)
    )
}

/// HMAC-SHA1 signature, base64 encoded
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: Option<&str>) -> Result<String> {
    let key = format!(
        "{}&{}",
        encode(consumer_secret),
        encode(token_secret.unwrap_or(""))
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| PlatformError::Authentication(format!("Invalid signing key: {}", e)))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Protocol parameters of one request, before signing
#[derive(Debug, Clone)]
pub struct OAuthParams {
    pub consumer_key: String,
    pub token: Option<String>,
    pub nonce: String,
    pub timestamp: i64,
    /// Extra `oauth_*` parameters such as `oauth_callback` or `oauth_verifier`
    pub extra: Vec<(String, String)>,
}

impl OAuthParams {
    /// Fresh nonce and current timestamp
    pub fn new(consumer_key: &str, token: Option<&str>) -> Self {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        Self {
            consumer_key: consumer_key.to_string(),
            token: token.map(str::to_string),
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
            extra: Vec::new(),
        }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.extra.push((key.to_string(), value.to_string()));
        self
    }

    fn protocol_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), self.nonce.clone()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), self.timestamp.to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];
        if let Some(token) = &self.token {
            params.push(("oauth_token".to_string(), token.clone()));
        }
        params.extend(self.extra.iter().cloned());
        params
    }

    /// Sign the request and render the `Authorization` header value
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        request_params: &[(String, String)],
        consumer_secret: &str,
        token_secret: Option<&str>,
    ) -> Result<String> {
        let mut protocol = self.protocol_params();

        let mut all = protocol.clone();
        all.extend(request_params.iter().cloned());
        let base = signature_base_string(method, url, &all);
        let signature = sign(&base, consumer_secret, token_secret)?;

        protocol.push(("oauth_signature".to_string(), signature));
        protocol.sort();

        let fields = protocol
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {}", fields))
    }
}

/// Render `k=v&...` with OAuth percent-encoding, for query strings and
/// form bodies
pub fn form_encode(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse a `k=v&...` token response
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.trim()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), decode(v))
        })
        .collect()
}

fn decode(value: &str) -> String {
    let value = value.replace('+', " ");
    match urlencoding::decode(&value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_unreserved_set() {
        assert_eq!(encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(encode("An encoded string!"), "An%20encoded%20string%21");
        assert_eq!(encode("Dogs, Cats & Mice"), "Dogs%2C%20Cats%20%26%20Mice");
        assert_eq!(encode("a-b_c.d~e"), "a-b_c.d~e");
    }

    #[test]
    fn test_hmac_sha1_rfc2202_vector() {
        // RFC 2202 test case 2
        let mut mac = HmacSha1::new_from_slice(b"Jefe").unwrap();
        mac.update(b"what do ya want for nothing?");
        assert_eq!(
            STANDARD.encode(mac.finalize().into_bytes()),
            "7/zfauXrL6LSdBbV8YTfnCWafHk="
        );
    }

    #[test]
    fn test_signature_matches_published_example() {
        let params = pairs(&[
            ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
            ("include_entities", "true"),
            ("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
            ("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            ("oauth_token", "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb"),
            ("oauth_version", "1.0"),
        ]);

        let base = signature_base_string(
            "post",
            "https://api.twitter.com/1.1/statuses/update.json",
            &params,
        );
        assert!(base.starts_with(
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key"
        ));

        let signature = sign(
            &base,
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            Some("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"),
        )
        .unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_authorization_header_reproduces_example_signature() {
        let params = OAuthParams {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            token: Some("370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string()),
            nonce: "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg".to_string(),
            timestamp: 1318622958,
            extra: Vec::new(),
        };

        let header = params.authorization_header(
            "POST",
            "https://api.twitter.com/1.1/statuses/update.json",
            &pairs(&[
                ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
                ("include_entities", "true"),
            ]),
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            Some("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"),
        )
        .unwrap();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(!header.contains("status="));
    }

    #[test]
    fn test_sign_without_token_secret() {
        assert_eq!(sign("GET&x", "cs", None).unwrap(), "KyDfqKXCF2ngPUTKjgwYksSMV7Q=");
    }

    #[test]
    fn test_params_new_generates_nonce() {
        let a = OAuthParams::new("ck", None);
        let b = OAuthParams::new("ck", None);
        assert_eq!(a.nonce.len(), 32);
        assert_ne!(a.nonce, b.nonce);
        assert!(a.timestamp > 0);
    }

    #[test]
    fn test_parse_form() {
        let parsed = parse_form("oauth_token=abc&oauth_token_secret=d%2Fe&oauth_callback_confirmed=true\n");
        assert_eq!(
            parsed,
            pairs(&[
                ("oauth_token", "abc"),
                ("oauth_token_secret", "d/e"),
                ("oauth_callback_confirmed", "true"),
            ])
        );
    }

    #[test]
    fn test_form_encode() {
        let body = form_encode(&pairs(&[("image", "a+b/c="), ("skip_status", "true")]));
        assert_eq!(body, "image=a%2Bb%2Fc%3D&skip_status=true");
    }

    #[test]
    fn test_token_debug_redacts_secret() {
        let token = Token::new("key", "super-secret");
        assert_eq!(token.secret(), "super-secret");
        assert!(!format!("{:?}", token).contains("super-secret"));
    }
}
