pub mod store;
pub mod user;

pub use store::{InMemoryUserStore, SupabaseUserStore, UserStore};
pub use user::UserService;
