pub mod envelope;
pub mod fragment;
pub mod template;
