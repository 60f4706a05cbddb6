use serde::{Deserialize, Serialize};

/// Free-form metadata stored with an auth user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// User as returned by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Signed-in session. Passed explicitly to every call that needs an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

/// Display-ready view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: String,
    pub role: String,
    pub avatar: String,
}

impl From<&AuthUser> for UserProfile {
    fn from(user: &AuthUser) -> Self {
        let meta = &user.user_metadata;
        let name = non_blank(&meta.full_name)
            .or_else(|| non_blank(&user.email))
            .unwrap_or_else(|| "User".to_string());
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name,
            role: non_blank(&meta.role).unwrap_or_else(|| "User".to_string()),
            avatar: non_blank(&meta.avatar_url)
                .unwrap_or_else(|| format!("https://i.pravatar.cc/100?u={}", user.id)),
        }
    }
}

/// Blank metadata counts as unset.
fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

impl UserProfile {
    /// First word of the display name, for greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}
