//! Outbound adapters implementing the diagnosis provider port.
//!
//! - **local_rules**: offline keyword rules, no network
//! - **isabel** / **infermedica**: vendor DDx APIs over `vendor_http`
//! - **openai**: generative model via chat completions
//!
//! Adapters translate between vendor payloads and the canonical result. They
//! hold no routing or batching logic.

pub mod infermedica;
pub mod isabel;
pub mod local_rules;
pub mod openai;
pub mod vendor_http;

pub use self::infermedica::{INFERMEDICA, InfermedicaProvider};
pub use self::isabel::{ISABEL, IsabelProvider};
pub use self::local_rules::{LOCAL_RULES, LocalRulesProvider};
pub use self::openai::{OPENAI, OpenAiProvider};
pub use self::vendor_http::{VendorClientError, VendorConnection, VendorHttpClient, VendorMode};
