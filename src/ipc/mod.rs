//! IPC module for observer (popup) communication

mod frame;
mod protocol;
mod server;

pub use frame::{read_frame, write_frame, ProtocolError, MAX_FRAME_LEN};
pub use protocol::{Request, Response};
pub use server::Server;
