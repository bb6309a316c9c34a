use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "scoutdesk";

/// Keychain account under which the backend API key is stored.
const API_KEY_ACCOUNT: &str = "__api_key__";

/// Secrets kept in the OS keychain: the backend API key and the
/// password of each signed-in user.
pub struct CredentialStore;

impl CredentialStore {
    /// Store a user's password in the OS keychain
    pub fn store(username: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve password for a username from the OS keychain
    pub fn get_password(username: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Delete stored credentials for a username
    pub fn delete(username: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    pub fn store_api_key(api_key: &str) -> Result<()> {
        Self::store(API_KEY_ACCOUNT, api_key).context("Failed to store API key")
    }

    pub fn get_api_key() -> Result<String> {
        Self::get_password(API_KEY_ACCOUNT).context("No API key in keychain")
    }
}
