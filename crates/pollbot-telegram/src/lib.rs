//! Chat gateway contract and Telegram Bot API adapter for pollbot.
//!
//! ```rust
//! use pollbot_telegram::{GatewayError, Update};
//!
//! let update: Update = serde_json::from_str(
//!     r#"{"update_id": 7, "poll_answer": {"poll_id": "p1", "option_ids": [0]}}"#,
//! )
//! .unwrap();
//! assert_eq!(update.poll_answer.unwrap().option_ids, vec![0]);
//!
//! let error = GatewayError::Transient { method: "sendPoll", detail: "timed out".into() };
//! assert!(error.is_transient());
//! ```

pub mod gateway;
pub mod telegram;

pub use gateway::*;
pub use telegram::*;
