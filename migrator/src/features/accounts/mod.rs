pub mod store;
pub mod types;
pub mod validation;

pub use store::AccountStore;
pub use types::{Account, AccountSummary};
pub use validation::{display_name, validate_credentials, MIN_CREDENTIAL_LENGTH};
