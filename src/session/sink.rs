//! Transport boundary for outgoing frames

use std::future::Future;

use crate::error::Result;
use crate::frame::Frame;

/// Destination a transmitter writes frames to
///
/// Implementations serialize the frame and write it to their transport.
/// The transmitter bounds every call with its write deadline, so an
/// implementation may simply wait on the transport.
pub trait FrameSink: Send {
    /// Write one frame, returning the number of bytes sent
    fn send_frame(&mut self, frame: &Frame) -> impl Future<Output = Result<usize>> + Send;

    /// Close the transport
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
