mod baseline;
mod registry;
mod types;

pub use baseline::BaselineAgent;
pub use registry::AgentRegistry;
pub use types::{Agent, AgentContext, AgentFactory, AgentSpec};
