//! Model provider implementations for Loopy.
//!
//! All providers implement the `loopy_core::ModelProvider` trait.
//! The router selects the correct provider based on configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, default_base_url, default_model_for};
