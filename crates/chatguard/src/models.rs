//! These models represent the objects passed around during a chat session
//!
//! The conversation is kept in our own internal format and only converted into the
//! provider's wire format at the edge, inside the provider implementation.
pub mod message;
pub mod profile;
pub mod role;
