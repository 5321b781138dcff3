use crate::user::UserID;

/// Who is making a request.
///
/// The identity middleware inserts this into every request, so handlers can
/// take `Extension(identity): Extension<Identity>` to decide where expenses
/// are read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// A registered user with a valid auth cookie.
    User(UserID),
    /// A visitor who has not logged in.
    Guest,
}

impl Identity {
    /// Whether the request comes from a visitor who has not logged in.
    pub fn is_guest(&self) -> bool {
        matches!(self, Identity::Guest)
    }
}
