//! Background image decoding
//!
//! Paths go to a worker thread over a channel; decoded bitmaps come back on a
//! second channel and the waker nudges the UI loop to collect them.

use crate::decode::{load_image, DecodedImage};
use crate::{GalleryError, GalleryResult};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
#[cfg(test)]
use std::time::Duration;

/// Called after a result is queued
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Result of one decode request
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded {
        path: PathBuf,
        image: Arc<DecodedImage>,
    },
    Failed {
        path: PathBuf,
        error: GalleryError,
    },
}

/// Decoder thread handle. Dropping it finishes queued work and joins.
pub struct ImageLoader {
    requests: Option<Sender<PathBuf>>,
    results: Receiver<LoadOutcome>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ImageLoader {
    pub fn spawn(waker: Waker) -> GalleryResult<Self> {
        let (request_tx, request_rx) = unbounded::<PathBuf>();
        let (result_tx, result_rx) = unbounded::<LoadOutcome>();

        let handle = thread::Builder::new()
            .name("image-loader".to_string())
            .spawn(move || Self::worker(request_rx, result_tx, waker))?;

        Ok(Self {
            requests: Some(request_tx),
            results: result_rx,
            handle: Some(handle),
        })
    }

    fn worker(requests: Receiver<PathBuf>, results: Sender<LoadOutcome>, waker: Waker) {
        for path in requests {
            let outcome = match load_image(&path) {
                Ok(image) => LoadOutcome::Loaded {
                    path,
                    image: Arc::new(image),
                },
                Err(error) => LoadOutcome::Failed { path, error },
            };
            if results.send(outcome).is_err() {
                break;
            }
            waker();
        }
        tracing::debug!("image loader stopped");
    }

    /// Queue `path` for decoding
    pub fn request(&self, path: PathBuf) -> GalleryResult<()> {
        let sender = self.requests.as_ref().ok_or(GalleryError::LoaderClosed)?;
        tracing::debug!(path = %path.display(), "queued image");
        sender.send(path).map_err(|_| GalleryError::LoaderClosed)
    }

    /// Everything decoded so far, without blocking
    pub fn drain(&self) -> Vec<LoadOutcome> {
        self.results.try_iter().collect()
    }

    /// Wait up to `timeout` for the next result
    #[cfg(test)]
    fn recv_timeout(&self, timeout: Duration) -> Option<LoadOutcome> {
        self.results.recv_timeout(timeout).ok()
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
