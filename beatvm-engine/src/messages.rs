use beatvm_time::{TransportField, TransportPosition};

/// Sent from the processor back to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
  /// A transport field changed at the given frame offset of the block.
  Transport {
    frames: u32,
    field: TransportField,
    position: TransportPosition,
  },
  /// An output changed since the previous block.
  Output { index: usize, value: f32 },
}
