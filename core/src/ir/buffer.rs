use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;

use super::{IrEvent, IrSink};

/// Records events into a bump arena so they can be replayed into another
/// sink later. The parser uses one per call argument: the overload is only
/// known once the closing brace is reached.
pub struct IrBuffer<'bump> {
    events: BumpVec<'bump, IrEvent>,
}

impl<'bump> IrBuffer<'bump> {
    pub fn new_in(arena: &'bump Bump) -> Self {
        Self {
            events: BumpVec::new_in(arena),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[IrEvent] {
        &self.events
    }

    /// Moves every recorded event into `sink`, in order.
    pub fn replay_into<S: IrSink + ?Sized>(self, sink: &mut S) {
        for event in self.events {
            sink.emit(event);
        }
    }
}

impl IrSink for IrBuffer<'_> {
    fn emit(&mut self, event: IrEvent) {
        self.events.push(event);
    }
}
