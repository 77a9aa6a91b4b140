//! Password hash maintenance for the users fixture.
//!
//! Both helpers work on files and literals only, they never touch the database.

use crate::blocking::fixture::record::{load_fixture, save_json};
use crate::error::{FixtureError, Result};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// plaintext every fixture account shares.
pub const DEFAULT_PASSWORD: &str = "admin123456";
/// bcrypt cost the platform backend uses.
pub const DEFAULT_COST: u32 = 10;
/// user document key holding the hash.
pub const PASSWORD_KEY: &str = "password";
/// hash found in an exported users file, checked by default by `check_password`.
pub const EXPORTED_HASH: &str = "$2b$12$9pmkgBqOCuFw5Aso2ip7TOQ8rwDefq4A9sWioWmz5NFZi2YIhEhu.";

/// One account line of the rewrite report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// account role, `student`, `teacher`...
    pub role: String,
    /// login name.
    pub username: String,
    /// login email.
    pub email: String,
}

/// Outcome of [rewrite_users_file].
#[derive(Debug, Clone)]
pub struct RewriteSummary {
    /// the hash now stored for every user.
    pub hash: String,
    /// rewritten accounts, in file order.
    pub accounts: Vec<Account>,
}

/// Hash `password` with `cost`, and make sure the hash verifies before handing it out.
pub fn hash_and_verify(password: &str, cost: u32) -> Result<String> {
    let hash = bcrypt::hash(password, cost)?;
    if !bcrypt::verify(password, &hash)? {
        return Err(FixtureError::HashMismatch);
    }
    Ok(hash)
}

/// Does `password` match the stored `hash`?
pub fn check_hash(password: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(password, hash)?)
}

/// Set `hash` on every user object in `users`, returns the rewritten accounts.
///
/// Entries which aren't json objects are left alone.
pub fn set_password_hash(users: &mut [Value], hash: &str) -> Vec<Account> {
    let field = |user: &Value, key: &str| {
        user.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let mut accounts = Vec::with_capacity(users.len());
    for user in users.iter_mut() {
        if let Value::Object(map) = user {
            map.insert(PASSWORD_KEY.to_string(), Value::String(hash.to_string()));
        } else {
            continue;
        }
        let account = Account {
            role: field(user, "role"),
            username: field(user, "username"),
            email: field(user, "email"),
        };
        info!(username = %account.username, role = %account.role, "Update user password.");
        accounts.push(account);
    }
    accounts
}

/// Rewrite the password hash of every user in fixture `path`.
///
/// The hash is computed once and verified against `password` before anything is written;
/// a failed verification leaves the file untouched.
pub fn rewrite_users_file(path: &Path, password: &str, cost: u32) -> Result<RewriteSummary> {
    let mut users = load_fixture(path)?;
    info!(users = users.len(), file = %path.display(), "Users loaded.");

    let hash = hash_and_verify(password, cost)?;
    info!(%hash, "New password hash generated and verified.");

    let accounts = set_password_hash(&mut users, &hash);
    save_json(path, &users)?;
    info!(updated = accounts.len(), file = %path.display(), "Password update complete.");
    Ok(RewriteSummary { hash, accounts })
}

/// `institution_admin` -> `Institution Admin`.
pub fn role_title(role: &str) -> String {
    role.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
