use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use study_core::model::{
    Deck, DeckId, Flashcard, Quiz, QuizId, QuizInfo, QuizResult, QuizSubmission, RemoteSessionId,
    SessionSummary, UserProfile,
};

use super::StudyApi;
use super::config::ApiConfig;
use super::dto::{
    CardDto, DeckDto, ListResponse, LoginDto, LoginResponse, ProfileDto, QuizDto, QuizInfoDto,
    ResultDto, SessionEndDto, SessionStartDto, SubmitDto,
};
use crate::error::ApiError;

const LOGIN_PATH: &str = "/auth/login/";
const LOGOUT_PATH: &str = "/auth/logout/";
const PROFILE_PATH: &str = "/auth/profile/";
const REFRESH_PATH: &str = "/auth/token/refresh/";

/// Tokens issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: Option<String>,
}

#[derive(Debug, Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// `StudyApi` over HTTP with bearer authentication.
///
/// A 401 triggers one token refresh and one retry. If the refresh fails both
/// tokens are dropped and the call reports `ApiError::Unauthorized`.
#[derive(Clone)]
pub struct HttpStudyApi {
    client: Client,
    config: ApiConfig,
    tokens: Arc<RwLock<Tokens>>,
}

impl HttpStudyApi {
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let tokens = Tokens {
            access: config.access_token.clone(),
            refresh: config.refresh_token.clone(),
        };
        Ok(Self {
            client,
            config,
            tokens: Arc::new(RwLock::new(tokens)),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Current access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.access.clone()
    }

    /// Exchange credentials for a token pair and use it for later calls.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCredentials` if the server rejects the
    /// credentials, `ApiError::HttpStatus` for other failures.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthTokens, ApiError> {
        let response = self
            .client
            .post(self.config.endpoint(LOGIN_PATH))
            .json(&LoginDto { username, password })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
            warn!(%status, username, "login rejected");
            return Err(ApiError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status));
        }

        let pair = response.json::<LoginResponse>().await?.into_pair();
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(pair.access.clone());
        tokens.refresh.clone_from(&pair.refresh);
        info!(username, "logged in");
        Ok(AuthTokens {
            access: pair.access,
            refresh: pair.refresh,
        })
    }

    /// End the server-side session and forget both tokens. The tokens are
    /// dropped even if the server call fails.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the logout request fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let refresh = self.tokens.read().await.refresh.clone();
        let body = refresh.map_or_else(|| json!({}), |r| json!({ "refresh": r }));
        let outcome = self.execute(Method::POST, LOGOUT_PATH, Some(body)).await;
        *self.tokens.write().await = Tokens::default();
        outcome.map(|_| ())
    }

    /// The signed-in learner.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a valid token.
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let profile: ProfileDto = self.get_json(PROFILE_PATH).await?;
        Ok(profile.into())
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, reqwest::Error> {
        let mut request = self
            .client
            .request(method.clone(), self.config.endpoint(path));
        if let Some(token) = self.tokens.read().await.access.as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Response, ApiError> {
        let mut response = self.send(&method, path, body.as_ref()).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(path, "access token rejected, refreshing");
            self.refresh().await?;
            response = self.send(&method, path, body.as_ref()).await?;
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status));
        }
        Ok(response)
    }

    async fn refresh(&self) -> Result<(), ApiError> {
        let Some(refresh) = self.tokens.read().await.refresh.clone() else {
            return Err(ApiError::Unauthorized);
        };

        let outcome = self
            .client
            .post(self.config.endpoint(REFRESH_PATH))
            .json(&json!({ "refresh": refresh }))
            .send()
            .await;

        let refreshed = match outcome {
            Ok(response) if response.status().is_success() => {
                response.json::<RefreshResponse>().await.ok()
            }
            Ok(response) => {
                warn!(status = %response.status(), "token refresh rejected");
                None
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                None
            }
        };

        let mut tokens = self.tokens.write().await;
        match refreshed {
            Some(body) => {
                tokens.access = Some(body.access);
                Ok(())
            }
            None => {
                *tokens = Tokens::default();
                Err(ApiError::Unauthorized)
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None).await?;
        Ok(response.json().await?)
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
        let response = self.execute(Method::POST, path, Some(body)).await?;
        Ok(response.json().await?)
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl StudyApi for HttpStudyApi {
    async fn list_decks(&self) -> Result<Vec<Deck>, ApiError> {
        let decks: ListResponse<DeckDto> = self.get_json("/flashcards/decks/").await?;
        Ok(decks
            .into_items()
            .into_iter()
            .filter_map(DeckDto::into_domain)
            .collect())
    }

    async fn get_cards(&self, deck_id: DeckId) -> Result<Vec<Flashcard>, ApiError> {
        let cards: ListResponse<CardDto> = self
            .get_json(&format!("/flashcards/decks/{deck_id}/cards/"))
            .await?;
        Ok(cards
            .into_items()
            .into_iter()
            .filter_map(CardDto::into_domain)
            .collect())
    }

    async fn start_session(&self, deck_id: DeckId) -> Result<RemoteSessionId, ApiError> {
        let started: SessionStartDto = self
            .post_json(&format!("/flashcards/sessions/start/{deck_id}/"), json!({}))
            .await?;
        Ok(started.into_domain())
    }

    async fn end_session(
        &self,
        session_id: RemoteSessionId,
        summary: &SessionSummary,
    ) -> Result<(), ApiError> {
        let body = encode(&SessionEndDto::from(summary))?;
        self.execute(
            Method::POST,
            &format!("/flashcards/sessions/end/{session_id}/"),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn list_quizzes(&self) -> Result<Vec<QuizInfo>, ApiError> {
        let quizzes: ListResponse<QuizInfoDto> = self.get_json("/quizzes/").await?;
        Ok(quizzes.into_items().into_iter().map(QuizInfo::from).collect())
    }

    async fn get_quiz(&self, quiz_id: QuizId) -> Result<Quiz, ApiError> {
        let quiz: QuizDto = self.get_json(&format!("/quizzes/{quiz_id}/")).await?;
        quiz.into_domain()
    }

    async fn submit_quiz(&self, submission: &QuizSubmission) -> Result<QuizResult, ApiError> {
        let body = encode(&SubmitDto::from(submission))?;
        let result: ResultDto = self.post_json("/quizzes/submit/", body).await?;
        result.into_domain()
    }
}
