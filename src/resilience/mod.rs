pub mod retry;
pub mod unavailable;
