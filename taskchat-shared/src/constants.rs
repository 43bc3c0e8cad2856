/// Shared constants for TaskChat
///
/// Wire values for task status and priority, pagination defaults, table names
/// and the user-facing error messages returned by the API.

// Task statuses
pub const TASK_STATUS_PENDING: &str = "pending";
pub const TASK_STATUS_COMPLETED: &str = "completed";
pub const TASK_STATUS_ARCHIVED: &str = "archived";

// Task priorities (ordered integer scale)
pub const TASK_PRIORITY_LOW: i16 = -1;
pub const TASK_PRIORITY_NORMAL: i16 = 0;
pub const TASK_PRIORITY_HIGH: i16 = 1;

// Pagination
pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_OFFSET: i64 = 0;
pub const MAX_LIMIT: i64 = 100;

// Table names
pub const TABLE_USERS: &str = "users";
pub const TABLE_TASKS: &str = "tasks";
pub const TABLE_THREADS: &str = "threads";
pub const TABLE_MESSAGES: &str = "messages";

// Error messages
pub const ERROR_INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const ERROR_USER_NOT_FOUND: &str = "User not found";
pub const ERROR_TASK_NOT_FOUND: &str = "Task not found";
pub const ERROR_THREAD_NOT_FOUND: &str = "Thread not found";
pub const ERROR_MESSAGE_NOT_FOUND: &str = "Message not found";
pub const ERROR_UNAUTHORIZED: &str = "Unauthorized";
pub const ERROR_FORBIDDEN: &str = "Forbidden";

// Chat
/// Number of most recent thread messages forwarded to the language model
pub const CHAT_HISTORY_LIMIT: i64 = 50;

/// Maximum characters of the first message used as a new thread's title
pub const THREAD_TITLE_MAX_CHARS: usize = 50;
