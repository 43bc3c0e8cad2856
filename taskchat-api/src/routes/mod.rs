/// API route handlers
///
/// - `root`: Welcome message
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and the current user
/// - `tasks`: Task CRUD and completion
/// - `threads`: Conversation threads and their messages
/// - `chat`: Send a message and get the model's reply
/// - `pagination`: `limit`/`offset` handling shared by list endpoints

pub mod auth;
pub mod chat;
pub mod health;
pub mod pagination;
pub mod root;
pub mod tasks;
pub mod threads;
