pub mod authenticator;
pub mod credential;
pub mod stage;

pub use authenticator::Authenticator;
pub use credential::Credential;
pub use stage::Stage;
