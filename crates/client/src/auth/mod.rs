//! Customer OTP login flow.
//!
//! The state machine is Idle -> Pending -> Authenticated. Requesting a code
//! creates (or silently replaces) the single pending verification;
//! verifying consumes it and, when a backend is configured, establishes an
//! anonymous session, upserts the `users` row it identifies, and persists a
//! profile snapshot for restarts. `Pending` falls back to Idle on expiry or
//! attempt exhaustion.
//!
//! Code delivery goes through the [`OtpSender`] seam - the out-of-band
//! channel (SMS gateway, mail provider) is injected, and the crate only
//! ships a tracing-backed sender for development.

mod admin;
mod otp;

pub use admin::{AdminAuthError, AdminGate};

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use copperkart_core::{Contact, ContactError, Email, Mobile, UserAccount, UserId};

use crate::backend::{Backend, BackendError, RowQuery, Session};
use crate::session_store::{SessionStore, SessionStoreError, StoredAuth};

use otp::{MAX_ATTEMPTS, PendingVerification};

const USERS_TABLE: &str = "users";

/// Errors surfaced by the login flow. The validation variants are worded
/// for direct display to the customer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The contact is neither a valid email nor a valid mobile number.
    #[error(transparent)]
    Contact(#[from] ContactError),

    /// The code is not 6 digits.
    #[error("enter the 6-digit code that was sent to you")]
    MalformedCode,

    /// No pending verification for this contact.
    #[error("no code was sent to this contact; request a new OTP")]
    UnknownContact,

    /// The pending verification has expired.
    #[error("this code has expired; request a new OTP")]
    Expired,

    /// Too many wrong guesses.
    #[error("too many incorrect attempts; request a new OTP")]
    TooManyAttempts,

    /// Wrong code, with guesses still left.
    #[error("incorrect code; {remaining} attempts remaining")]
    WrongCode { remaining: u32 },

    /// Delivering the code out-of-band failed.
    #[error(transparent)]
    Delivery(#[from] OtpDeliveryError),

    /// The backend rejected a session or row operation.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Persisting the session snapshot failed.
    #[error("session storage error: {0}")]
    Storage(#[from] SessionStoreError),
}

/// Failure to hand a code to the out-of-band channel.
#[derive(Debug, Error)]
#[error("could not deliver the code: {0}")]
pub struct OtpDeliveryError(pub String);

/// Out-of-band code delivery.
///
/// Implementations route the code to wherever the contact lives (SMS
/// gateway for mobiles, mail provider for emails). Must not block.
pub trait OtpSender: Send + Sync {
    /// Deliver `code` to `contact`.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel refuses the message; the login
    /// flow rolls back the pending verification in that case.
    fn deliver(&self, contact: &Contact, code: &str) -> Result<(), OtpDeliveryError>;
}

/// Development sender: logs that a code was issued instead of sending
/// anything. The code itself only appears at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOtpSender;

impl OtpSender for TracingOtpSender {
    fn deliver(&self, contact: &Contact, code: &str) -> Result<(), OtpDeliveryError> {
        info!(%contact, "OTP issued");
        debug!(%contact, %code, "OTP code (development sender)");
        Ok(())
    }
}

/// The lightweight profile snapshot kept in memory and in the durable
/// session store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerProfile {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Mobile>,
    pub verified: bool,
}

impl From<UserAccount> for CustomerProfile {
    fn from(account: UserAccount) -> Self {
        Self {
            user_id: account.id,
            email: account.email,
            phone: account.phone,
            verified: account.verified,
        }
    }
}

/// Drives the customer login state machine.
pub struct Authenticator {
    backend: Backend,
    sessions: SessionStore,
    sender: Arc<dyn OtpSender>,
    pending: Mutex<Option<PendingVerification>>,
    current: Mutex<Option<CustomerProfile>>,
}

impl Authenticator {
    /// Wire the flow to a backend handle, a durable session store, and a
    /// code delivery channel.
    pub fn new(backend: Backend, sessions: SessionStore, sender: Arc<dyn OtpSender>) -> Self {
        Self {
            backend,
            sessions,
            sender,
            pending: Mutex::new(None),
            current: Mutex::new(None),
        }
    }

    /// The customer currently signed in, if any.
    #[must_use]
    pub fn current(&self) -> Option<CustomerProfile> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Issue a one-time code to `contact`.
    ///
    /// Any prior pending verification is replaced unconditionally, whoever
    /// it was for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Contact` for an invalid contact (nothing is
    /// issued) and `AuthError::Delivery` when the out-of-band channel
    /// refuses the code (the pending verification is rolled back).
    #[instrument(skip(self, contact))]
    pub fn request_otp(&self, contact: &str) -> Result<(), AuthError> {
        let contact = Contact::parse(contact)?;
        let code = otp::generate_code();

        self.sender.deliver(&contact, &code)?;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(PendingVerification::issue(contact, &code)) {
            debug!(contact = %previous.contact, "replaced pending verification");
        }

        Ok(())
    }

    /// Verify a code and sign the customer in.
    ///
    /// On success the pending verification is consumed, a backend session
    /// is established (reusing one if present), the `users` row is
    /// upserted, and a profile snapshot is persisted for restarts.
    ///
    /// # Errors
    ///
    /// The validation variants of [`AuthError`] describe exactly which
    /// check failed; backend and storage failures pass through.
    #[instrument(skip(self, contact, code))]
    pub async fn verify_otp(&self, contact: &str, code: &str) -> Result<CustomerProfile, AuthError> {
        let contact = Contact::parse(contact)?;

        // State machine step, entirely under the lock. Every early return
        // here leaves `pending` in the documented state for that failure.
        {
            let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

            let Some(pending) = slot.as_mut() else {
                return Err(AuthError::UnknownContact);
            };
            if pending.contact != contact {
                // A code for a different contact is pending; that one stays
                // live and this attempt costs nothing.
                return Err(AuthError::UnknownContact);
            }
            if pending.is_expired(chrono::Utc::now()) {
                *slot = None;
                return Err(AuthError::Expired);
            }
            if pending.attempts >= MAX_ATTEMPTS {
                *slot = None;
                return Err(AuthError::TooManyAttempts);
            }
            if !otp::is_well_formed_code(code) {
                return Err(AuthError::MalformedCode);
            }
            if !pending.matches(code) {
                pending.attempts += 1;
                if pending.attempts >= MAX_ATTEMPTS {
                    *slot = None;
                    return Err(AuthError::TooManyAttempts);
                }
                let remaining = MAX_ATTEMPTS - pending.attempts;
                return Err(AuthError::WrongCode { remaining });
            }

            // Match: the verification is spent whatever happens next.
            *slot = None;
        }

        self.complete_login(contact).await
    }

    /// Sign out: local state and storage first, then a best-effort backend
    /// sign-out whose failure is only logged.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = None;
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;

        if let Err(error) = self.sessions.update(|state| {
            state.profile = None;
            state.auth = None;
        }) {
            warn!(%error, "failed to clear session storage on logout");
        }

        if self.backend.is_configured()
            && let Err(error) = self.backend.sign_out().await
        {
            warn!(%error, "backend sign-out failed");
        }
    }

    /// Restore the signed-in customer from durable storage at startup.
    ///
    /// The stored snapshot is provisional: with a configured backend it is
    /// only kept if the backend still honors the stored session, and the
    /// profile is refreshed from the `users` row while we are at it. A
    /// backend that reports the session gone clears local state; a backend
    /// that cannot be reached leaves the provisional snapshot in place.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) -> Option<CustomerProfile> {
        let stored = self.sessions.load();
        let snapshot = stored.profile?;

        if !self.backend.is_configured() {
            self.set_current(snapshot.clone());
            return Some(snapshot);
        }

        let Some(auth) = stored.auth else {
            // A snapshot without a session token cannot be validated.
            self.forget_local_state();
            return None;
        };
        self.backend.adopt_session(auth.into_session()).await;

        match self.backend.current_user().await {
            Ok(Some(user)) => {
                let profile = self
                    .fetch_account_profile(user.id)
                    .await
                    .unwrap_or(snapshot);
                self.set_current(profile.clone());
                Some(profile)
            }
            Ok(None) => {
                debug!("stored session no longer honored by backend");
                self.forget_local_state();
                None
            }
            Err(error) => {
                warn!(%error, "could not validate stored session; keeping provisional profile");
                self.set_current(snapshot.clone());
                Some(snapshot)
            }
        }
    }

    /// Finish a successful verification: session, users row, snapshot.
    async fn complete_login(&self, contact: Contact) -> Result<CustomerProfile, AuthError> {
        let session = if self.backend.is_configured() {
            match self.backend.session().await {
                Some(session) => Some(session),
                None => Some(self.backend.sign_in_anonymously().await?),
            }
        } else {
            None
        };

        let user_id = session.as_ref().map_or_else(UserId::generate, Session::user_id);

        let (email, phone) = match &contact {
            Contact::Email(email) => (Some(email.clone()), None),
            Contact::Mobile(mobile) => (None, Some(mobile.clone())),
        };

        let profile = if self.backend.is_configured() {
            let mut body = serde_json::json!({ "id": user_id, "verified": true });
            if let Some(fields) = body.as_object_mut() {
                if let Some(email) = &email {
                    fields.insert(
                        "email".to_string(),
                        serde_json::Value::String(email.as_str().to_string()),
                    );
                }
                if let Some(phone) = &phone {
                    fields.insert(
                        "phone".to_string(),
                        serde_json::Value::String(phone.as_str().to_string()),
                    );
                }
            }

            let row = self.backend.upsert(USERS_TABLE, "id", &body).await?;
            match serde_json::from_value::<UserAccount>(row) {
                Ok(account) => CustomerProfile::from(account),
                Err(error) => {
                    // The upsert went through; a malformed representation
                    // should not fail the login.
                    warn!(%error, "could not decode users row; using local profile");
                    CustomerProfile {
                        user_id,
                        email,
                        phone,
                        verified: true,
                    }
                }
            }
        } else {
            CustomerProfile {
                user_id,
                email,
                phone,
                verified: true,
            }
        };

        self.set_current(profile.clone());
        self.sessions.update(|state| {
            state.profile = Some(profile.clone());
            state.auth = session.as_ref().map(StoredAuth::of);
        })?;

        Ok(profile)
    }

    /// Refresh the snapshot from the `users` row, best-effort.
    async fn fetch_account_profile(&self, user: UserId) -> Option<CustomerProfile> {
        let row = self
            .backend
            .select_single(USERS_TABLE, RowQuery::new().eq("id", user))
            .await
            .ok()??;
        let account: UserAccount = serde_json::from_value(row).ok()?;
        Some(CustomerProfile::from(account))
    }

    fn set_current(&self, profile: CustomerProfile) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(profile);
    }

    fn forget_local_state(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
        if let Err(error) = self.sessions.update(|state| {
            state.profile = None;
            state.auth = None;
        }) {
            warn!(%error, "failed to clear stale session state");
        }
    }

    /// Force the pending verification past its expiry.
    #[cfg(test)]
    fn force_expire_pending(&self) {
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = slot.as_mut() {
            pending.expires_at = chrono::Utc::now() - chrono::Duration::minutes(1);
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("signed_in", &self.current().is_some())
            .finish_non_exhaustive()
    }
}
