pub mod agent;
pub mod bridge;
pub mod errors;
pub mod mcp;
pub mod models;
pub mod providers;
pub mod randoms;
pub mod registry;
pub mod transport;
