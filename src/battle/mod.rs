pub mod engine;
pub mod service;
pub mod state;
pub mod telemetry;

#[cfg(test)]
mod tests;
