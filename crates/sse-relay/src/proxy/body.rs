//! Pass-through response body with session accounting.
//!
//! `RelayBody` wraps the upstream body and hands every frame to the
//! client-facing connection unmodified and in arrival order. No frame
//! is held back: hyper's HTTP/1 connection writes each data frame as
//! soon as it is yielded, so there is no batching window between the
//! upstream read and the client write.
//!
//! The wrapper also closes out the session state machine:
//! - end-of-stream from upstream logs a completed session,
//! - a mid-stream upstream error is logged and propagated (the status
//!   line is already on the wire, so closing both sides is the only
//!   option),
//! - dropping the body before end-of-stream means the client went
//!   away; the wrapped upstream body is dropped with it, which tears
//!   down the upstream read promptly. Logged at info, not as a fault.

use hyper::body::{Body, Frame, SizeHint};
use hyper::body::Bytes;
use hyper::Method;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tracing::{debug, error, info};

/// Terminal states of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Still streaming.
    Open,
    /// Upstream closed its write side normally.
    Completed,
    /// An upstream I/O error ended the stream.
    Failed,
}

pub struct RelayBody<B> {
    inner: B,
    method: Method,
    path: String,
    status: u16,
    bytes_relayed: u64,
    end: SessionEnd,
}

impl<B> RelayBody<B> {
    pub fn new(inner: B, method: Method, path: String, status: u16) -> Self {
        Self {
            inner,
            method,
            path,
            status,
            bytes_relayed: 0,
            end: SessionEnd::Open,
        }
    }

    /// Total body bytes handed to the client so far.
    pub fn bytes_relayed(&self) -> u64 {
        self.bytes_relayed
    }

    pub fn is_completed(&self) -> bool {
        self.end == SessionEnd::Completed
    }
}

impl<B> Body for RelayBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    this.bytes_relayed += data.len() as u64;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(e)) => {
                this.end = SessionEnd::Failed;
                error!(
                    method = %this.method,
                    path = %this.path,
                    status = this.status,
                    bytes_relayed = this.bytes_relayed,
                    "Upstream error mid-stream: {e}"
                );
                Poll::Ready(Some(Err(e)))
            }
            None => {
                this.end = SessionEnd::Completed;
                debug!(
                    method = %this.method,
                    path = %this.path,
                    status = this.status,
                    bytes_relayed = this.bytes_relayed,
                    "Stream completed"
                );
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for RelayBody<B> {
    fn drop(&mut self) {
        // Dropped while still open: the client disconnected. The inner
        // upstream body is dropped here too, closing the upstream read.
        if self.end == SessionEnd::Open {
            info!(
                method = %self.method,
                path = %self.path,
                status = self.status,
                bytes_relayed = self.bytes_relayed,
                "Client disconnected before end of stream, closing upstream"
            );
        }
    }
}
