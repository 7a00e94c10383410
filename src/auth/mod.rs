//! Authentification email / mot de passe avec sessions stockées en base.
//!
//! `AuthService` porte les règles (validation, hash, expiration); toute la
//! persistance passe par un [`AuthAdapter`].

pub mod adapter;

use chrono::Utc;
use validator::Validate;

use crate::config::AuthConfig;
use crate::error::{AuthError, ConstraintViolation, DataError};
use crate::models::dto::{SignInRequest, SignUpRequest};
use crate::models::{account, session, users, verification};
use crate::utils::{password, token};

pub use adapter::{AuthAdapter, NewSession, NewUser, SeaOrmAdapter};

pub const SESSION_COOKIE: &str = "clinic_session";

/// Infos de la requête HTTP conservées avec la session
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Session valide + son user
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub session: session::Model,
    pub user: users::Model,
    /// `expires_at` vient d'être repoussé: le cookie doit être renvoyé
    pub refreshed: bool,
}

pub type Auth = AuthService<SeaOrmAdapter>;

pub struct AuthService<A: AuthAdapter> {
    adapter: A,
    config: AuthConfig,
}

impl<A: AuthAdapter> AuthService<A> {
    pub fn new(adapter: A, config: AuthConfig) -> Self {
        Self { adapter, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Inscription: user + compte credential, puis connexion automatique
    pub async fn sign_up_email(
        &self,
        request: SignUpRequest,
        meta: RequestMeta,
    ) -> Result<AuthSession, AuthError> {
        request
            .validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let email = normalize_email(&request.email);
        if self.adapter.find_user_by_email(&email).await?.is_some() {
            tracing::warn!(email = %email, "sign-up rejected: email already registered");
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = password::hash_password(&request.password).map_err(AuthError::Password)?;

        let new_user = NewUser {
            name: request.name.trim().to_string(),
            email,
            image: request.image,
        };
        let user = match self.adapter.create_user_with_password(new_user, password_hash).await {
            Ok(user) => user,
            Err(e) => {
                // Deux inscriptions simultanées: la contrainte unique tranche
                let err = DataError::from(e);
                if err.violation() == Some(ConstraintViolation::Unique) {
                    return Err(AuthError::UserAlreadyExists);
                }
                return Err(err.into());
            }
        };

        tracing::info!(user_id = %user.id, "user registered");
        self.open_session(user, meta).await
    }

    /// Connexion. Email inconnu, compte sans mot de passe ou mauvais mot de
    /// passe donnent tous InvalidCredentials.
    pub async fn sign_in_email(
        &self,
        request: SignInRequest,
        meta: RequestMeta,
    ) -> Result<AuthSession, AuthError> {
        request
            .validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let email = normalize_email(&request.email);
        let Some(user) = self.adapter.find_user_by_email(&email).await? else {
            tracing::warn!(email = %email, "sign-in rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let stored_hash = self
            .adapter
            .find_credential_account(&user.id)
            .await?
            .and_then(|account| account.password)
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(&request.password, &stored_hash).map_err(AuthError::Password)? {
            tracing::warn!(user_id = %user.id, "sign-in rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.open_session(user, meta).await
    }

    /// Valide un token de session. Une session expirée est supprimée; une
    /// session passée la moitié de sa durée de vie est prolongée.
    pub async fn get_session(&self, token: &str) -> Result<AuthSession, AuthError> {
        let (session, user) = self
            .adapter
            .find_session(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if session.is_expired() {
            self.adapter.delete_session(token).await?;
            tracing::info!(session_id = %session.id, "expired session removed");
            return Err(AuthError::SessionExpired);
        }

        let now = Utc::now().naive_utc();
        let remaining = session.expires_at - now;
        let refreshed = remaining < self.config.session_ttl / 2;
        let session = if refreshed {
            self.adapter
                .extend_session(session, now + self.config.session_ttl)
                .await?
        } else {
            session
        };

        Ok(AuthSession {
            token: token.to_string(),
            session,
            user,
            refreshed,
        })
    }

    /// Déconnexion: supprime la session (sans erreur si elle n'existe plus)
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let removed = self.adapter.delete_session(token).await?;
        tracing::debug!(removed, "session signed out");
        Ok(())
    }

    pub async fn change_password(
        &self,
        current: &AuthSession,
        current_password: &str,
        new_password: &str,
        revoke_other_sessions: bool,
    ) -> Result<(), AuthError> {
        let account = self.verify_user_password(&current.user.id, current_password).await?;

        let new_hash = password::hash_password(new_password).map_err(AuthError::Password)?;
        self.adapter.update_account_password(account, new_hash).await?;

        if revoke_other_sessions {
            let revoked = self
                .adapter
                .delete_user_sessions(&current.user.id, Some(&current.token))
                .await?;
            tracing::info!(user_id = %current.user.id, revoked, "other sessions revoked");
        }
        Ok(())
    }

    /// Vérifie le mot de passe d'un user et renvoie son compte credential
    pub async fn verify_user_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<account::Model, AuthError> {
        let account = self
            .adapter
            .find_credential_account(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let stored_hash = account.password.as_deref().ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(password, stored_hash).map_err(AuthError::Password)? {
            tracing::warn!(user_id, "password check failed");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(account)
    }

    /// Crée un token de vérification et renvoie le lien à envoyer.
    /// Pas d'envoi d'email: le lien est seulement loggé.
    pub async fn send_verification_email(&self, email: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let user = self
            .adapter
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let value = token::generate_verification_token();
        let expires_at = Utc::now().naive_utc() + self.config.verification_ttl;
        self.adapter
            .create_verification(&user.email, &value, expires_at)
            .await?;

        let url = format!(
            "{}/api/auth/verify-email?token={}",
            self.config.base_url.trim_end_matches('/'),
            value
        );
        tracing::info!(user_id = %user.id, %url, "verification link created");
        Ok(url)
    }

    /// Consomme un token de vérification et marque l'email comme vérifié
    pub async fn verify_email(&self, value: &str) -> Result<users::Model, AuthError> {
        let record: verification::Model = self
            .adapter
            .find_verification(value)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        // Le token est à usage unique, expiré ou non
        self.adapter.delete_verification(&record.id).await?;
        if record.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        let user = self
            .adapter
            .find_user_by_email(&record.identifier)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let user = self.adapter.mark_email_verified(&user.id).await?;

        tracing::info!(user_id = %user.id, "email verified");
        Ok(user)
    }

    /// Valeur signée à mettre dans le cookie de session
    pub fn cookie_value(&self, token: &str) -> String {
        token::sign_token(token, &self.config.secret)
    }

    /// Token brut si la signature du cookie est valide
    pub fn token_from_cookie(&self, value: &str) -> Option<String> {
        token::verify_signed_token(value, &self.config.secret)
    }

    async fn open_session(&self, user: users::Model, meta: RequestMeta) -> Result<AuthSession, AuthError> {
        let token = token::generate_session_token();
        let session = self
            .adapter
            .create_session(NewSession {
                user_id: user.id.clone(),
                token: token.clone(),
                expires_at: Utc::now().naive_utc() + self.config.session_ttl,
                ip_address: meta.ip_address,
                user_agent: meta.user_agent,
            })
            .await?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "session created");
        Ok(AuthSession { token, session, user, refreshed: false })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
