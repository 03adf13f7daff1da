//! Background buffer clearing
//!
//! A worker thread clears the next frame's buffer while the current one is
//! being displayed. Ownership of each buffer moves through a pair of channels,
//! so the renderer and the worker can never touch the same buffer at once.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use super::pixel_buffer::PixelBuffer;

/// Work item for the clearing thread
struct ClearRequest {
    buffer: PixelBuffer,
    background: u32,
}

pub struct BackgroundClearer {
    requests: Option<Sender<ClearRequest>>,
    cleared: Receiver<PixelBuffer>,
    handle: Option<thread::JoinHandle<()>>,
    in_flight: usize,
}

impl BackgroundClearer {
    /// Start the worker thread
    pub fn spawn() -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ClearRequest>();
        let (cleared_tx, cleared_rx) = mpsc::channel::<PixelBuffer>();

        let handle = thread::Builder::new()
            .name("buffer-clearer".into())
            .spawn(move || {
                log::debug!("clearing thread started");
                while let Ok(ClearRequest {
                    mut buffer,
                    background,
                }) = request_rx.recv()
                {
                    buffer.clear(background);
                    if cleared_tx.send(buffer).is_err() {
                        break;
                    }
                }
                log::debug!("clearing thread stopped");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            cleared: cleared_rx,
            handle: Some(handle),
            in_flight: 0,
        })
    }

    /// Hand a displayed buffer to the worker to be cleared to `background`.
    ///
    /// Returns the buffer if the worker has gone away so the caller can clear
    /// it inline.
    pub fn release(&mut self, buffer: PixelBuffer, background: u32) -> Result<(), PixelBuffer> {
        let Some(requests) = &self.requests else {
            return Err(buffer);
        };
        match requests.send(ClearRequest { buffer, background }) {
            Ok(()) => {
                self.in_flight += 1;
                Ok(())
            }
            Err(mpsc::SendError(request)) => Err(request.buffer),
        }
    }

    /// Number of buffers currently owned by the worker
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Block until the worker returns a cleared buffer.
    ///
    /// If the background changed while the buffer was queued it is cleared
    /// again here, so the caller always receives a buffer matching
    /// `background`.
    pub fn acquire(&mut self, background: u32) -> Option<PixelBuffer> {
        if self.in_flight == 0 {
            return None;
        }
        let mut buffer = self.cleared.recv().ok()?;
        self.in_flight -= 1;
        let background = background | 0xFF00_0000;
        if buffer.cleared_to() != Some(background) {
            log::debug!("background changed during clear; clearing again");
            buffer.clear(background);
        }
        Some(buffer)
    }
}

impl Drop for BackgroundClearer {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("clearing thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_then_acquire_returns_cleared_buffer() {
        let mut clearer = BackgroundClearer::spawn().unwrap();
        let mut buf = PixelBuffer::with_size(4, 4);
        buf.plot(1, 1, 0, 0xFFFF_FFFF);
        assert!(clearer.release(buf, 0xFF20_4060).is_ok());
        assert_eq!(clearer.in_flight(), 1);

        let buf = clearer.acquire(0xFF20_4060).unwrap();
        assert_eq!(clearer.in_flight(), 0);
        assert!(!buf.has_content());
        assert_eq!(buf.pixel_at(1, 1), Some(0xFF20_4060));
    }

    #[test]
    fn test_background_change_forces_redo() {
        let mut clearer = BackgroundClearer::spawn().unwrap();
        let buf = PixelBuffer::with_size(2, 2);
        clearer.release(buf, 0xFF00_0000).unwrap();
        let buf = clearer.acquire(0xFFFF_FFFF).unwrap();
        assert_eq!(buf.pixel_at(0, 0), Some(0xFFFF_FFFF));
        assert_eq!(buf.cleared_to(), Some(0xFFFF_FFFF));
    }

    #[test]
    fn test_acquire_with_nothing_in_flight() {
        let mut clearer = BackgroundClearer::spawn().unwrap();
        assert!(clearer.acquire(0).is_none());
    }

    #[test]
    fn test_drop_joins_worker() {
        let mut clearer = BackgroundClearer::spawn().unwrap();
        clearer.release(PixelBuffer::with_size(8, 8), 0).unwrap();
        drop(clearer);
    }
}
