//! Bounded single-producer/single-consumer byte pipe
//!
//! The fill loop is the only producer and the owning connection the only
//! consumer. Both sides park on a [`Notify`]; `notify_one` stores a permit
//! when nobody is waiting, so a wakeup that races a state check is never lost.

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug)]
struct PipeState {
    buf: BytesMut,
    completed: bool,
}

/// Snapshot of the consumer-visible buffer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeStatus {
    pub buffered: usize,
    pub completed: bool,
}

#[derive(Debug)]
pub struct Pipe {
    state: Mutex<PipeState>,
    capacity: usize,
    readable: Notify,
    writable: Notify,
}

impl Pipe {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PipeState {
                buf: BytesMut::with_capacity(capacity),
                completed: false,
            }),
            capacity,
            readable: Notify::new(),
            writable: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Producer side

    /// Free space the producer may commit without exceeding capacity
    pub fn available_space(&self) -> usize {
        let state = self.state.lock();
        self.capacity.saturating_sub(state.buf.len())
    }

    pub fn commit(&self, data: &[u8]) {
        {
            let mut state = self.state.lock();
            state.buf.extend_from_slice(data);
        }
        self.readable.notify_one();
    }

    /// Mark end of stream; no further commits follow
    pub fn complete(&self) {
        self.state.lock().completed = true;
        self.readable.notify_one();
    }

    pub async fn wait_writable(&self) {
        self.writable.notified().await
    }

    // Consumer side

    pub fn status(&self) -> PipeStatus {
        let state = self.state.lock();
        PipeStatus {
            buffered: state.buf.len(),
            completed: state.completed,
        }
    }

    /// Run `f` over the buffered bytes and the completion flag, taken under
    /// one lock, without consuming anything
    pub fn inspect<R>(&self, f: impl FnOnce(&[u8], bool) -> R) -> R {
        let state = self.state.lock();
        f(&state.buf, state.completed)
    }

    /// Remove up to `n` bytes from the front and wake the producer
    pub fn take(&self, n: usize) -> Bytes {
        let taken = {
            let mut state = self.state.lock();
            let n = n.min(state.buf.len());
            state.buf.split_to(n).freeze()
        };
        if !taken.is_empty() {
            self.writable.notify_one();
        }
        taken
    }

    pub async fn wait_readable(&self) {
        self.readable.notified().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_space_shrinks_and_recovers() {
        let pipe = Pipe::new(8);
        pipe.commit(b"abcde");
        assert_eq!(pipe.available_space(), 3);
        assert_eq!(&pipe.take(2)[..], b"ab");
        assert_eq!(pipe.available_space(), 5);
        assert_eq!(pipe.status(), PipeStatus { buffered: 3, completed: false });
    }

    #[test]
    fn test_take_never_exceeds_buffered() {
        let pipe = Pipe::new(8);
        pipe.commit(b"xy");
        assert_eq!(&pipe.take(10)[..], b"xy");
        assert!(pipe.take(1).is_empty());
    }

    #[tokio::test]
    async fn test_commit_before_wait_is_not_lost() {
        let pipe = Pipe::new(8);
        pipe.commit(b"z");
        tokio::time::timeout(Duration::from_millis(100), pipe.wait_readable())
            .await
            .expect("stored permit should wake the reader");
    }

    #[tokio::test]
    async fn test_take_wakes_waiting_producer() {
        let pipe = Arc::new(Pipe::new(2));
        pipe.commit(b"ab");
        assert_eq!(pipe.available_space(), 0);

        let producer = {
            let pipe = pipe.clone();
            tokio::spawn(async move {
                while pipe.available_space() == 0 {
                    pipe.wait_writable().await;
                }
                pipe.commit(b"c");
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        pipe.take(1);
        producer.await.unwrap();
        assert_eq!(pipe.inspect(|buf, _| buf.to_vec()), b"bc".to_vec());
    }
}
