/// Cart model and persistent cart store
pub mod cart;
/// Product catalog
pub mod catalog;
/// Storage change notifications
pub mod channel;
/// Persisted FAQ chat sessions
pub mod chat;
/// Order service client
pub mod gateway;
/// Order validation, submission and history
pub mod order;
/// Keyword-matching FAQ responder
pub mod responder;
/// Cart synchronization across views
pub mod sync;
