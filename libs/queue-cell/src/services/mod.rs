pub mod lifecycle;
pub mod sequencer;
pub mod store;

pub use sequencer::DailyQueueSequencer;
pub use store::{InMemoryQueueStore, QueueStore, SupabaseQueueStore};
