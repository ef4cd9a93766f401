//! Commit-list interception for commitgrab.
//!
//! Attaches to a browser tab through the debugger protocol, reloads it, and
//! captures the first response from the commit-list endpoint. The body is
//! handed to `commitgrab-extract` and the formatted messages are delivered
//! over a typed channel.
//!
//! ## Architecture
//!
//! ```text
//! StartRequest ──► Interceptor ──► SessionController (start, timeout)
//!                      │      └──► DebugGateway ──► DebuggerHost (attach)
//!                      │                                  │
//!                      ◄──────────── HostEvent ───────────┘
//!                      │
//!                      └──► MessagePayload (success | error)
//! ```
//!
//! The host side is abstracted by [`DebuggerHost`] and [`TabHost`];
//! [`cdp::CdpHost`] implements both over a Chrome remote debugging
//! endpoint:
//!
//! ```bash
//! google-chrome --remote-debugging-port=9222
//! ```

pub mod cdp;
mod error;
mod gateway;
mod host;
mod message;
mod orchestrator;
mod session;

pub use error::CaptureError;
pub use gateway::{DebugGateway, GatewayError};
pub use host::{DebuggerHost, HostError, HostEvent, TabHost, TargetId};
pub use message::{
    CopyData, ErrorAction, MessageDispatcher, MessagePayload, RequestAction, StartData,
    StartRequest, StartResponse, SuccessAction,
};
pub use orchestrator::{Interceptor, InterceptorConfig};
pub use session::{SessionController, SessionTicket};
