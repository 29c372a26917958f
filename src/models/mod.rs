pub mod login_transaction;
pub mod role;
pub mod time_zone;
pub mod user;

pub use login_transaction::LoginTransaction;
pub use role::Role;
pub use time_zone::TimeZone;
pub use user::{NewUser, User};
