// Accounts: profile endpoints and registration payload checks.
// Credential storage and token issuance belong to the authentication backend.

pub mod handlers;
pub mod validation;
