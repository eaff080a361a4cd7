pub mod client;
pub mod delta;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod portraits;
pub mod prompt;
pub mod protocol;
pub mod reconcile;
pub mod runtime;
pub mod stream;
pub mod tokenizer;
