pub mod audit;
pub mod session_refresh;
