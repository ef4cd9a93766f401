//! Chrome DevTools Protocol transport.
//!
//! [`CdpClient`] owns the browser-level WebSocket and routes replies and
//! events; [`CdpHost`] adapts it to the [`DebuggerHost`](crate::DebuggerHost)
//! and [`TabHost`](crate::TabHost) surfaces the interceptor works against.
//!
//! Start Chrome with remote debugging before connecting:
//!
//! ```bash
//! chrome --remote-debugging-port=9222
//! ```
//!
//! ```rust,ignore
//! let (host, events) = CdpHost::connect("http://localhost:9222").await?;
//! let host = Arc::new(host);
//! let interceptor = Interceptor::new(config, host.clone(), host, formatter, dispatcher);
//! tokio::spawn(interceptor.clone().run(events));
//! ```

mod client;
mod error;
mod host;
mod protocol;

pub use client::CdpClient;
pub use error::CdpError;
pub use host::CdpHost;
pub use protocol::*;
