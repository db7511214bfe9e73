pub mod agent;
pub mod errors;
pub mod gateway;
pub mod guardrail;
pub mod models;
pub mod providers;
pub mod render;
pub mod toolsets;
