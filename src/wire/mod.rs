mod address;
mod frame;
mod message;

pub use address::AddressParseError;
pub use address::NodeAddress;
pub use frame::read_frame;
pub use frame::request;
pub use frame::write_frame;
pub use frame::WireError;
pub use message::Envelope;
pub use message::Message;
