//! Cognito user-pool provider speaking the JSON-1.1 RPC protocol.
//!
//! Every call is a `POST /` with an `X-Amz-Target` header naming the
//! operation:
//! - `InitiateAuth` (USER_PASSWORD_AUTH, REFRESH_TOKEN_AUTH)
//! - `GetUser`, `GlobalSignOut`
//! - `SignUp`, `ConfirmSignUp`
//!
//! Errors come back as `{"__type": "...#NotAuthorizedException", "message": "..."}`.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::identity::{
    IdentityError, IdentityProvider, Session, SignUpOutcome, SignUpRequest, TokenCache,
};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

// ============================================================================
// Cognito Wire Types
// ============================================================================

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'static str,
    client_id: &'a str,
    auth_parameters: HashMap<&'static str, &'a str>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
    #[serde(default)]
    challenge_name: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AccessTokenRequest<'a> {
    access_token: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: String,
    #[serde(default)]
    user_attributes: Vec<AttributeType>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AttributeType {
    name: String,
    value: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SignUpBody<'a> {
    client_id: &'a str,
    username: &'a str,
    password: &'a str,
    user_attributes: Vec<AttributeType>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SignUpResponse {
    #[serde(default)]
    user_confirmed: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct ConfirmSignUpBody<'a> {
    client_id: &'a str,
    username: &'a str,
    confirmation_code: &'a str,
}

/// Empty-object responses (`GlobalSignOut`, `ConfirmSignUp`).
#[derive(Deserialize, Debug)]
struct Empty {}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    error_type: String,
    #[serde(default, alias = "Message")]
    message: String,
}

/// Maps an error response to an `IdentityError`.
/// `__type` may be namespaced (`com.amazon...#NotAuthorizedException`).
fn parse_error(status: u16, body: &str) -> IdentityError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let (code, message) = match parsed {
        Some(err) => {
            let code = err
                .error_type
                .rsplit('#')
                .next()
                .unwrap_or_default()
                .to_string();
            (code, err.message)
        }
        None => (String::new(), body.to_string()),
    };

    match code.as_str() {
        "NotAuthorizedException" | "UserNotFoundException" | "UserNotConfirmedException"
        | "CodeMismatchException" | "ExpiredCodeException" | "UsernameExistsException"
        | "InvalidPasswordException" => {
            if message.is_empty() {
                IdentityError::NotAuthorized(code)
            } else {
                IdentityError::NotAuthorized(message)
            }
        }
        _ => IdentityError::Api {
            status,
            code,
            message,
        },
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Connection settings for one user pool.
#[derive(Debug, Clone)]
pub struct CognitoSettings {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// Overrides `https://cognito-idp.{region}.amazonaws.com` (local emulators, tests).
    pub endpoint: Option<String>,
    /// When false, a cached, unexpired session survives a network failure during validation.
    pub mandatory_sign_in: bool,
    pub request_timeout: StdDuration,
}

pub struct CognitoProvider {
    settings: CognitoSettings,
    endpoint: String,
    cache: TokenCache,
    client: reqwest::Client,
}

impl CognitoProvider {
    pub fn new(settings: CognitoSettings, cache: TokenCache) -> Result<Self, IdentityError> {
        if settings.client_id.trim().is_empty() {
            return Err(IdentityError::Config("client_id is empty".to_string()));
        }
        if settings.region.trim().is_empty() && settings.endpoint.is_none() {
            return Err(IdentityError::Config(
                "region is required when no endpoint is set".to_string(),
            ));
        }

        let endpoint = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cognito-idp.{}.amazonaws.com", settings.region));
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| IdentityError::Config(e.to_string()))?;
        info!(
            "Cognito provider: pool={}, endpoint={}, mandatory_sign_in={}",
            settings.user_pool_id, endpoint, settings.mandatory_sign_in
        );

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            settings,
            cache,
            client,
        })
    }

    /// Sends one RPC call and decodes its response body.
    async fn call<B, R>(&self, operation: &str, body: &B) -> Result<R, IdentityError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let json_body = serde_json::to_string(body)
            .map_err(|e| IdentityError::Parse(format!("request serialization failed: {e}")))?;
        debug!("Cognito {} request ({} bytes)", operation, json_body.len());

        let response = self
            .client
            .post(format!("{}/", self.endpoint))
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .body(json_body)
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Cognito {} response status: {}", operation, status);

        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = parse_error(status.as_u16(), &text);
            warn!("Cognito {} failed: {}", operation, err);
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| IdentityError::Parse(e.to_string()))
    }

    async fn initiate_auth(
        &self,
        flow: &'static str,
        parameters: HashMap<&'static str, &str>,
    ) -> Result<AuthenticationResult, IdentityError> {
        let request = InitiateAuthRequest {
            auth_flow: flow,
            client_id: &self.settings.client_id,
            auth_parameters: parameters,
        };
        let response: InitiateAuthResponse = self.call("InitiateAuth", &request).await?;
        match (response.authentication_result, response.challenge_name) {
            (Some(result), _) => Ok(result),
            (None, Some(challenge)) => Err(IdentityError::NotAuthorized(format!(
                "unsupported challenge {challenge}"
            ))),
            (None, None) => Err(IdentityError::Parse(
                "InitiateAuth returned neither tokens nor a challenge".to_string(),
            )),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<GetUserResponse, IdentityError> {
        self.call("GetUser", &AccessTokenRequest { access_token }).await
    }

    /// Trades the refresh token for a new access token. Cognito does not
    /// rotate the refresh token, so the old one is carried over.
    async fn refresh(&self, session: &Session) -> Result<Session, IdentityError> {
        let refresh_token = session.refresh_token.as_deref().ok_or(IdentityError::NoSession)?;
        let mut parameters = HashMap::new();
        parameters.insert("REFRESH_TOKEN", refresh_token);
        let result = self.initiate_auth("REFRESH_TOKEN_AUTH", parameters).await?;
        info!("Refreshed session for {}", session.username);

        Ok(Session {
            username: session.username.clone(),
            email: session.email.clone(),
            access_token: result.access_token,
            id_token: result.id_token.or_else(|| session.id_token.clone()),
            refresh_token: result
                .refresh_token
                .or_else(|| session.refresh_token.clone()),
            expires_at: Utc::now() + Duration::seconds(result.expires_in),
        })
    }

    fn store(&self, session: &Session) -> Result<(), IdentityError> {
        self.cache
            .save(session)
            .map_err(|e| IdentityError::Storage(e.to_string()))
    }

    fn finish_sign_out(&self, username: &str) -> Result<(), IdentityError> {
        self.cache
            .clear()
            .map_err(|e| IdentityError::Storage(e.to_string()))?;
        info!("Signed out {}", username);
        Ok(())
    }

    fn forget(&self) {
        if let Err(e) = self.cache.clear() {
            warn!("Failed to clear token cache: {}", e);
        }
    }
}

fn email_of(attributes: &[AttributeType]) -> Option<String> {
    attributes
        .iter()
        .find(|attr| attr.name == "email")
        .map(|attr| attr.value.clone())
}

#[async_trait]
impl IdentityProvider for CognitoProvider {
    fn name(&self) -> &str {
        "cognito"
    }

    async fn current_session(&self) -> Result<Session, IdentityError> {
        let cached = self
            .cache
            .load()
            .map_err(|e| IdentityError::Storage(e.to_string()))?;
        let Some(mut session) = cached else {
            debug!("No cached session in {}", self.cache.path().display());
            return Err(IdentityError::NoSession);
        };

        if session.is_expired(Utc::now()) {
            debug!("Cached access token expired, refreshing");
            session = match self.refresh(&session).await {
                Ok(refreshed) => {
                    self.store(&refreshed)?;
                    refreshed
                }
                Err(IdentityError::NotAuthorized(msg)) => {
                    info!("Refresh token rejected: {}", msg);
                    self.forget();
                    return Err(IdentityError::NoSession);
                }
                Err(IdentityError::NoSession) => {
                    self.forget();
                    return Err(IdentityError::NoSession);
                }
                Err(e) => return Err(e),
            };
        }

        match self.get_user(&session.access_token).await {
            Ok(user) => {
                session.username = user.username;
                if let Some(email) = email_of(&user.user_attributes) {
                    session.email = Some(email);
                }
                Ok(session)
            }
            Err(IdentityError::NotAuthorized(msg)) => {
                info!("Cached session rejected: {}", msg);
                self.forget();
                Err(IdentityError::NoSession)
            }
            Err(e)
                if e.is_transient()
                    && !self.settings.mandatory_sign_in
                    && !session.is_expired(Utc::now()) =>
            {
                warn!("Could not validate session ({}), using cached tokens", e);
                Ok(session)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let cached = self
            .cache
            .load()
            .map_err(|e| IdentityError::Storage(e.to_string()))?;
        let Some(mut session) = cached else {
            debug!("Sign-out with no cached session");
            return Ok(());
        };

        if session.is_expired(Utc::now()) {
            debug!("Access token expired, refreshing before sign-out");
            let refreshed = self.refresh(&session).await;
            match refreshed {
                Ok(fresh) => session = fresh,
                Err(IdentityError::NotAuthorized(msg)) => {
                    info!("Refresh token rejected during sign-out: {}", msg);
                    return self.finish_sign_out(&session.username);
                }
                Err(IdentityError::NoSession) => {
                    return self.finish_sign_out(&session.username);
                }
                Err(e) if e.is_transient() => return Err(e),
                // Let GlobalSignOut judge the stale token.
                Err(e) => warn!("Refresh before sign-out failed: {}", e),
            }
        }

        let result: Result<Empty, IdentityError> = self
            .call(
                "GlobalSignOut",
                &AccessTokenRequest {
                    access_token: &session.access_token,
                },
            )
            .await;
        match result {
            Ok(_) => {}
            // Remote session is already gone; only local tokens remain.
            Err(IdentityError::NotAuthorized(msg)) => {
                info!("Remote session already ended: {}", msg);
            }
            Err(e) => return Err(e),
        }
        self.finish_sign_out(&session.username)
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<Session, IdentityError> {
        let mut parameters = HashMap::new();
        parameters.insert("USERNAME", username);
        parameters.insert("PASSWORD", password);
        let result = self.initiate_auth("USER_PASSWORD_AUTH", parameters).await?;
        let user = self.get_user(&result.access_token).await?;

        let session = Session {
            username: user.username,
            email: email_of(&user.user_attributes),
            access_token: result.access_token,
            id_token: result.id_token,
            refresh_token: result.refresh_token,
            expires_at: Utc::now() + Duration::seconds(result.expires_in),
        };
        self.store(&session)?;
        info!("Signed in {}", session.username);
        Ok(session)
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, IdentityError> {
        let body = SignUpBody {
            client_id: &self.settings.client_id,
            username: &request.username,
            password: &request.password,
            user_attributes: vec![AttributeType {
                name: "email".to_string(),
                value: request.email.clone(),
            }],
        };
        let response: SignUpResponse = self.call("SignUp", &body).await?;
        info!(
            "Registered {} (confirmed: {})",
            request.username, response.user_confirmed
        );
        Ok(SignUpOutcome {
            username: request.username,
            confirmed: response.user_confirmed,
        })
    }

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), IdentityError> {
        let body = ConfirmSignUpBody {
            client_id: &self.settings.client_id,
            username,
            confirmation_code: code,
        };
        let _: Empty = self.call("ConfirmSignUp", &body).await?;
        info!("Confirmed {}", username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CognitoSettings {
        CognitoSettings {
            region: "us-west-2".to_string(),
            user_pool_id: "us-west-2_pool".to_string(),
            client_id: "client".to_string(),
            endpoint: None,
            mandatory_sign_in: true,
            request_timeout: StdDuration::from_secs(5),
        }
    }

    #[test]
    fn test_default_endpoint_uses_region() {
        let dir = tempfile::tempdir().unwrap();
        let provider =
            CognitoProvider::new(settings(), TokenCache::new(dir.path(), "default")).unwrap();
        assert_eq!(provider.endpoint, "https://cognito-idp.us-west-2.amazonaws.com");
    }

    #[test]
    fn test_empty_client_id_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut bad = settings();
        bad.client_id = " ".to_string();
        let result = CognitoProvider::new(bad, TokenCache::new(dir.path(), "default"));
        assert!(matches!(result, Err(IdentityError::Config(_))));
    }

    #[test]
    fn test_parse_error_strips_namespace() {
        let body = r#"{"__type":"com.amazonaws.cognito#NotAuthorizedException","message":"Incorrect username or password."}"#;
        assert_eq!(
            parse_error(400, body),
            IdentityError::NotAuthorized("Incorrect username or password.".to_string())
        );
    }

    #[test]
    fn test_parse_error_unknown_code_is_api_error() {
        let body = r#"{"__type":"TooManyRequestsException","message":"slow down"}"#;
        let err = parse_error(429, body);
        assert!(err.is_transient());
        assert!(matches!(err, IdentityError::Api { status: 429, ref code, .. } if code == "TooManyRequestsException"));
    }

    #[test]
    fn test_parse_error_non_json_body() {
        let err = parse_error(502, "Bad Gateway");
        assert!(matches!(err, IdentityError::Api { status: 502, ref message, .. } if message == "Bad Gateway"));
    }

    #[test]
    fn test_initiate_auth_serializes_pascal_case() {
        let mut parameters = HashMap::new();
        parameters.insert("USERNAME", "ada");
        let request = InitiateAuthRequest {
            auth_flow: "USER_PASSWORD_AUTH",
            client_id: "client",
            auth_parameters: parameters,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["AuthFlow"], "USER_PASSWORD_AUTH");
        assert_eq!(json["ClientId"], "client");
        assert_eq!(json["AuthParameters"]["USERNAME"], "ada");
    }
}
