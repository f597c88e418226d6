pub mod common;

mod failures_and_retries;
