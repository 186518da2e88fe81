use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AuthError;

const BUILTIN_ACCOUNTS: [(&str, &str); 4] = [
    ("admin", "admin123"),
    ("user1", "password1"),
    ("user2", "password2"),
    ("test", "test"),
];

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]{1,32}$").expect("valid username regex"))
}

/// Known accounts and the tokens issued by this node.
pub struct AuthManager {
    /// username -> password hash
    users: HashMap<String, String>,
    /// token -> username
    sessions: HashMap<String, String>,
}

impl AuthManager {
    pub fn new() -> Self {
        let users = BUILTIN_ACCOUNTS
            .iter()
            .map(|(name, password)| (name.to_string(), hash_password(password)))
            .collect();
        Self {
            users,
            sessions: HashMap::new(),
        }
    }

    /// Returns a fresh token when the credentials match.
    pub fn login(&mut self, username: &str, password: &str) -> Option<String> {
        let stored = self.users.get(username)?;
        if *stored != hash_password(password) {
            return None;
        }

        let token = generate_token(username);
        self.sessions.insert(token.clone(), username.to_string());
        Some(token)
    }

    pub fn logout(&mut self, token: &str) -> Option<String> {
        self.sessions.remove(token)
    }

    pub fn is_authenticated(&self, token: &str) -> bool {
        self.sessions.contains_key(token)
    }

    pub fn username(&self, token: &str) -> Option<&str> {
        self.sessions.get(token).map(String::as_str)
    }

    pub fn add_user(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        if !username_pattern().is_match(username) {
            return Err(AuthError::InvalidUsername(username.to_string()));
        }
        if self.users.contains_key(username) {
            return Err(AuthError::AlreadyExists(username.to_string()));
        }
        self.users
            .insert(username.to_string(), hash_password(password));
        Ok(())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn generate_token(username: &str) -> String {
    let seed = format!("{username}:{}", Uuid::new_v4());
    hex::encode(Sha256::digest(seed.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_accounts_can_log_in() {
        let mut auth = AuthManager::new();
        for (user, password) in BUILTIN_ACCOUNTS {
            let token = auth.login(user, password).expect("builtin login");
            assert_eq!(auth.username(&token), Some(user));
        }
    }

    #[test]
    fn wrong_password_or_unknown_user_gets_no_token() {
        let mut auth = AuthManager::new();
        assert!(auth.login("admin", "nope").is_none());
        assert!(auth.login("ghost", "admin123").is_none());
        assert_eq!(auth.session_count(), 0);
    }

    #[test]
    fn tokens_are_unique_per_login() {
        let mut auth = AuthManager::new();
        let first = auth.login("test", "test").unwrap();
        let second = auth.login("test", "test").unwrap();
        assert_ne!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn logout_revokes_token() {
        let mut auth = AuthManager::new();
        let token = auth.login("user1", "password1").unwrap();
        assert_eq!(auth.logout(&token).as_deref(), Some("user1"));
        assert!(!auth.is_authenticated(&token));
        assert!(auth.logout(&token).is_none());
    }

    #[test]
    fn add_user_validates_and_rejects_duplicates() {
        let mut auth = AuthManager::new();
        assert_eq!(auth.add_user("carol", "secret"), Ok(()));
        assert!(auth.login("carol", "secret").is_some());
        assert_eq!(
            auth.add_user("carol", "other"),
            Err(AuthError::AlreadyExists("carol".into()))
        );
        assert_eq!(
            auth.add_user("bad name", "x"),
            Err(AuthError::InvalidUsername("bad name".into()))
        );
    }
}
