//! Wire and storage shapes for the mention cascade.
//!
//! Entities (Intent, Agent, Task) are what the cascade reads and writes to KV;
//! requests are the JSON bodies exchanged with callers.

mod entities;
mod requests;

pub use entities::*;
pub use requests::*;
