mod arp_event;
pub use self::arp_event::*;

/// Turns one input into at most one output. Returning `None` drops the input, which is how
/// frames that are not ARP leave the processing loop.
pub trait Processor {
    type Input: Send + Clone;
    type Output: Send + Clone;

    fn process(&mut self, input: Self::Input) -> Option<Self::Output>;
}
