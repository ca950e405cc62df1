//! ManageCredentialsUseCase: WiFi credentials and the web UI session token.
//!
//! Collaborators such as the WiFi connect routine and the web UI use these
//! calls instead of reaching into the record or the flat store.  Credential
//! changes go through the normal save path; the session token lives only in
//! the flat store and is written immediately.

use settings_core::flat::MAX_TOKEN_LEN;
use settings_core::UpsertOutcome;
use tracing::info;

use super::sync_settings::SettingsEngine;
use super::SettingsError;
use crate::infrastructure::flat_store::adapter::{read_token, write_token};
use crate::infrastructure::flat_store::FlatStore;
use crate::infrastructure::removable::RemovableStorage;

impl<R: RemovableStorage, F: FlatStore> SettingsEngine<R, F> {
    /// Password saved for `ssid` (exact, case-sensitive match).
    pub fn lookup_credential(&self, ssid: &str) -> Option<&str> {
        self.record().wifi().password_for(ssid)
    }

    /// Adds a network or replaces the password of a known one.
    ///
    /// With `persist_now` the full save runs before returning; otherwise the
    /// change is kept in memory until the caller saves.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::AllocationFailed`] if the list cannot grow.
    pub fn upsert_credential(
        &mut self,
        ssid: &str,
        password: &str,
        persist_now: bool,
    ) -> Result<UpsertOutcome, SettingsError> {
        let wifi = self.record_mut().wifi_mut();
        if wifi.password_for(ssid).is_none() {
            wifi.try_reserve(1)
                .map_err(|_| SettingsError::AllocationFailed)?;
        }
        let outcome = wifi.upsert(ssid, password);
        info!(ssid, ?outcome, "wifi credential stored");

        if persist_now {
            self.save();
        }
        Ok(outcome)
    }

    /// The web UI session token, if one is stored.
    pub fn get_token(&mut self) -> Option<String> {
        read_token(self.flat_mut())
    }

    /// Stores the session token in the flat store; an empty token clears it.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::TokenTooLong`] for tokens over 64 bytes and
    /// [`SettingsError::FlatStore`] if the flat store rejects the write.
    pub fn set_token(&mut self, token: &str) -> Result<(), SettingsError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(SettingsError::TokenTooLong(token.len()));
        }
        write_token(self.flat_mut(), token)?;
        if token.is_empty() {
            info!("session token cleared");
        } else {
            info!("session token updated");
        }
        Ok(())
    }
}
