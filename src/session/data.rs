use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    expense::{Expense, GuestId},
};

/// Everything stored in a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Assigned the first time a guest adds an expense.
    #[serde(default)]
    pub guest_id: Option<GuestId>,
    /// The guest's expenses in the order they were added.
    #[serde(default)]
    pub guest_expenses: Vec<Expense>,
}

impl SessionData {
    /// Forget the guest ID and every guest expense.
    pub fn clear_guest_data(&mut self) {
        self.guest_id = None;
        self.guest_expenses.clear();
    }

    /// Whether there is nothing worth keeping in the session.
    pub fn is_empty(&self) -> bool {
        self.guest_id.is_none() && self.guest_expenses.is_empty()
    }
}

/// A handle to the data of the current request's session.
///
/// The session middleware inserts this into every request, so handlers can
/// take `Extension(session): Extension<Session>` and modify the data in place.
#[derive(Debug, Clone, Default)]
pub struct Session(Arc<Mutex<SessionData>>);

impl Session {
    /// Wrap `data` in a new handle.
    pub fn new(data: SessionData) -> Self {
        Self(Arc::new(Mutex::new(data)))
    }

    /// Lock the session data for reading or writing.
    ///
    /// # Errors
    ///
    /// Returns [Error::SessionLockError] if the lock is poisoned.
    pub fn lock(&self) -> Result<MutexGuard<'_, SessionData>, Error> {
        self.0
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire session lock: {error}"))
            .map_err(|_| Error::SessionLockError)
    }
}
