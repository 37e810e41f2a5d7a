pub mod agent_directory;
pub mod work_queue;

pub use agent_directory::*;
pub use work_queue::*;
