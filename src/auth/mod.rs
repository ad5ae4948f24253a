//! Authentication and session management

pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod storage;
pub mod token;

pub use middleware::{require_admin, require_auth};
pub use models::{Account, AccountInfo, Role, RoleKind, Session};
pub use service::AuthService;
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};
