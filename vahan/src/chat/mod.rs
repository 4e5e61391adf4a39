//! Chat sessions: a pure state machine, the lifecycle that executes its
//! effects, and the socket transports.

mod lifecycle;
mod machine;
mod transport;
mod ws;

pub use lifecycle::{chat_url, read_history, ChatLifecycle};
pub use machine::{transition, ChatState, ConnectionId, Effect, Input, Phase, SocketEvent};
pub use transport::{ConnectRequest, SocketEnvelope, SocketHandle, Transport};
pub use ws::WsTransport;

/// Popular questions offered before a conversation starts.
pub const SUGGESTIONS: &[&str] = &[
    "What is the price of a Pink T-shirt?",
    "Tell me about the available sizes for blue jeans.",
    "Do you have any discounts on red shoes?",
    "How much does a black leather jacket cost?",
];
