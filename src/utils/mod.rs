pub mod error;
pub mod sniff;
