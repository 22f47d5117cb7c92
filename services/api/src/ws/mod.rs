//! WebSocket game sessions.
//!
//! - `protocol`: the JSON messages exchanged with the browser.
//! - `session`: one game per connection, from upgrade to close.
//! - `playback`: hands audio clips to the browser.

pub mod playback;
pub mod protocol;
pub mod session;

pub use session::ws_handler;
