pub mod agent_directory;
pub mod backend_factory;
pub mod in_memory_queue;
pub mod redis_queue;

pub use agent_directory::HttpAgentDirectory;
pub use backend_factory::{BackendFactory, QueueBackends};
pub use in_memory_queue::{InMemoryDedupIndex, InMemoryWorkQueue};
pub use redis_queue::{RedisConnector, RedisDedupIndex, RedisWorkQueue};
