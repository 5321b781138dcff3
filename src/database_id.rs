//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The database ID of an expense that belongs to a registered user.
pub type ExpenseId = DatabaseId;
