//! Session holder
//!
//! Tracks who is signed in by following an [`AuthProvider`]'s identity
//! channel. The session never changes identity on its own; every update
//! comes from the provider.

use tokio::sync::watch;

use crate::auth::{AuthError, AuthProvider, Identity};
use crate::error::Result;

/// The currently authenticated identity, if any
#[derive(Debug, Clone)]
pub struct Session {
    rx: watch::Receiver<Option<Identity>>,
}

impl Session {
    /// Follow a provider's identity changes
    pub fn new(provider: &impl AuthProvider) -> Self {
        Self::from_receiver(provider.subscribe())
    }

    /// Follow an existing identity channel
    pub fn from_receiver(rx: watch::Receiver<Option<Identity>>) -> Self {
        Self { rx }
    }

    /// Who is signed in right now
    pub fn current(&self) -> Option<Identity> {
        self.rx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// The signed-in identity, or `AuthError::NotSignedIn`
    pub fn require(&self) -> Result<Identity> {
        self.current().ok_or_else(|| AuthError::NotSignedIn.into())
    }

    /// Whether the identity changed since it was last observed
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Read the identity and mark it observed
    pub fn observe(&mut self) -> Option<Identity> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next identity change
    ///
    /// Returns `None` once the provider is gone.
    pub async fn changed(&mut self) -> Option<Option<Identity>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
