//! pharmadock-llm: LLM backend abstraction layer.
//! Implements the LlmBackend trait, the backend router, lenient JSON
//! extraction from model replies, and the docking assistant prompts.

pub mod backend;
pub mod router;
pub mod extract;
pub mod prompts;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
pub use router::LlmRouter;
