use std::collections::HashMap;

use crate::error::Result;
use crate::platform::types::UserProfile;
use crate::platform::Platform;
use crate::redact::redact;

/// User profiles fetched during one run, keyed by login.
///
/// Populated lazily and never invalidated; dropped with the session that
/// owns it.
#[derive(Debug, Default)]
pub struct UserCache {
    users: HashMap<String, UserProfile>,
}

impl UserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached profile for `login`, fetching and storing it on a miss.
    pub async fn get_or_fetch(
        &mut self,
        platform: &dyn Platform,
        login: &str,
    ) -> Result<UserProfile> {
        if let Some(user) = self.users.get(login) {
            tracing::debug!(user = %redact(login), "User cache hit");
            return Ok(user.clone());
        }

        tracing::debug!(user = %redact(login), "User cache miss, fetching profile");
        let user = platform.get_user(login).await?;
        self.users.insert(login.to_string(), user.clone());

        Ok(user)
    }

    /// Email address of `login`, if the profile exposes one.
    pub async fn email(&mut self, platform: &dyn Platform, login: &str) -> Result<Option<String>> {
        let user = self.get_or_fetch(platform, login).await?;
        tracing::debug!(
            user = %redact(login),
            email = %user.email.as_deref().map(redact).unwrap_or_default(),
            "Resolved user email"
        );
        Ok(user.email)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.users.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
