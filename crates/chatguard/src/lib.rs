pub mod attachments;
pub mod budget;
pub mod conversation;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod session;
pub mod token_counter;
