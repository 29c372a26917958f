pub mod authenticator;
pub mod context;
pub mod extractor;
pub mod password;
pub mod reset;
pub mod session;
