//! Protocol module containing the sway/i3 IPC message types and the codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_header, decode_message, encode_message, parse_reply, Frame, Header, ProtocolError};
pub use messages::*;
