pub mod question;
pub mod session;
pub mod user;

pub use question::StoredQuestion;
pub use session::{SessionRecord, UserSession};
pub use user::User;
