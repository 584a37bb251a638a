// Communication channels lock-free

use crate::messaging::command::TransportCommand;
use ringbuf::{HeapRb, traits::Split};

pub type CommandProducer = ringbuf::HeapProd<TransportCommand>;
pub type CommandConsumer = ringbuf::HeapCons<TransportCommand>;

/// Bounded single-producer/single-consumer command queue
/// Push and pop never block; a push into a full queue is refused
pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<TransportCommand>::new(capacity.max(1));
    rb.split()
}
