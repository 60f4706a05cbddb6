use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

use tender_api::{AuthProvider, AuthUser, BackendError, Session, UserMetadata};

use crate::MemoryBackend;

/// A user account to register with the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

struct Account {
    user: AuthUser,
    password: String,
}

#[derive(Default)]
pub(crate) struct AuthState {
    accounts: Vec<Account>,
    /// access token -> user id
    tokens: HashMap<String, String>,
    current: Option<Session>,
    resets: Vec<(String, String)>,
    issued: u64,
}

impl MemoryBackend {
    /// Register an account. Emails are unique, case-insensitively.
    pub async fn register_user(&self, user: MemoryUser) -> Result<AuthUser, BackendError> {
        let mut auth = self.auth.write().await;
        let email = user.email.trim().to_lowercase();
        if auth.accounts.iter().any(|a| a.user.email.as_deref() == Some(email.as_str())) {
            return Err(BackendError::new(format!("user '{email}' already registered")));
        }
        let auth_user = AuthUser {
            id: format!("user-{:04}", auth.accounts.len() + 1),
            email: Some(email),
            user_metadata: UserMetadata {
                full_name: user.full_name,
                role: user.role,
                avatar_url: user.avatar_url,
            },
        };
        auth.accounts.push(Account {
            user: auth_user.clone(),
            password: user.password,
        });
        Ok(auth_user)
    }

    /// Resolve the owner of a session, rejecting unknown or revoked tokens.
    pub(crate) async fn authorize(&self, session: &Session) -> Result<String, BackendError> {
        let auth = self.auth.read().await;
        match auth.tokens.get(&session.access_token) {
            Some(user_id) if *user_id == session.user.id => Ok(user_id.clone()),
            _ => Err(BackendError::auth("JWT expired or revoked; sign in again")),
        }
    }

    /// Password-reset requests accepted so far, as `(email, redirect_to)`.
    pub async fn password_reset_requests(&self) -> Vec<(String, String)> {
        self.auth.read().await.resets.clone()
    }
}

impl AuthProvider for MemoryBackend {
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Session, BackendError>> + Send + '_>> {
        let email = email.trim().to_lowercase();
        let password = password.to_string();
        Box::pin(async move {
            let mut auth = self.auth.write().await;
            let user = auth
                .accounts
                .iter()
                .find(|a| a.user.email.as_deref() == Some(email.as_str()) && a.password == password)
                .map(|a| a.user.clone())
                .ok_or_else(|| BackendError::auth("Invalid login credentials"))?;

            auth.issued += 1;
            let access_token = format!("mem-token-{}-{}", user.id, auth.issued);
            auth.tokens.insert(access_token.clone(), user.id.clone());
            let session = Session { access_token, user };
            auth.current = Some(session.clone());
            tracing::info!(user = %session.user.id, "signed in");
            Ok(session)
        })
    }

    fn sign_out(&self) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        Box::pin(async move {
            let mut auth = self.auth.write().await;
            if let Some(session) = auth.current.take() {
                auth.tokens.remove(&session.access_token);
                tracing::info!(user = %session.user.id, "signed out");
            }
            Ok(())
        })
    }

    fn current_session(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Session>, BackendError>> + Send + '_>> {
        Box::pin(async move { Ok(self.auth.read().await.current.clone()) })
    }

    fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let email = email.trim().to_lowercase();
        let redirect_to = redirect_to.to_string();
        Box::pin(async move {
            let mut auth = self.auth.write().await;
            // Unknown addresses succeed silently so accounts can't be probed.
            if auth.accounts.iter().any(|a| a.user.email.as_deref() == Some(email.as_str())) {
                auth.resets.push((email, redirect_to));
            }
            Ok(())
        })
    }
}
