//! HTTP chat-completion clients for the supported LLM vendors.
//!
//! One module per vendor plus a [`router::ProviderRouter`] that picks the
//! right client from a [`shared::settings::ProviderConfig`].

pub mod anthropic;
pub mod azure;
pub mod openai;
pub mod router;
