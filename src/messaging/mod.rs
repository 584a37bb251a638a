// Messaging - Lock-free communication between the control and audio threads

pub mod channels;
pub mod command;
pub mod parameters;

pub use channels::{CommandConsumer, CommandProducer, create_command_channel};
pub use command::TransportCommand;
pub use parameters::AtomicF64;
