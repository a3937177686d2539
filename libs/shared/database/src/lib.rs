pub mod error;
pub mod memory;
pub mod supabase;

pub use error::DbError;
pub use memory::MemoryTable;
pub use supabase::SupabaseClient;
