pub mod avatar;
pub mod task;
pub mod user;

pub use avatar::Avatar;
pub use task::{Task, TaskFilter, TaskInput, TaskPatch, TaskQuery};
pub use user::{IssuedToken, User, UserChanges};
