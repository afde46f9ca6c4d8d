//! llama-gate library
//!
//! HTTP front end for a local llama.cpp binary: discovers the binary and model,
//! serializes generations through a single child process, and relays results to
//! REST and chat callers.

pub mod api;
pub mod app;
pub mod chat;
pub mod inference;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
