//! Job system
use flume::{Receiver, TryRecvError};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    thread,
};

/// A render running on its own thread.
pub struct RenderJob<T> {
    rx: Receiver<Option<T>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[derive(Debug, PartialEq)]
pub enum JobState<T> {
    Pending,
    Done(Option<T>),
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "Failed to stringify panic"
    }
}

/// Runs `f` on a worker thread. A panic inside the job is logged and reported as `None`.
pub fn spawn<T, F>(f: F) -> RenderJob<T>
where
    T: Send + 'static,
    F: FnOnce() -> Option<T> + Send + 'static,
{
    let (tx, rx) = flume::bounded(1);
    let handle = thread::spawn(move || {
        let output = panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
            log::error!("render job panicked: {}", panic_message(payload.as_ref()));
            None
        });
        let _ = tx.send(output);
    });
    RenderJob {
        rx,
        handle: Some(handle),
    }
}

impl<T> RenderJob<T> {
    /// Waits without blocking the calling task.
    pub async fn recv_async(mut self) -> Option<T> {
        let output = self.rx.recv_async().await.ok().flatten();
        self.join();
        output
    }

    /// Blocks the current thread until the job is done.
    pub fn wait(mut self) -> Option<T> {
        let output = self.rx.recv().ok().flatten();
        self.join();
        output
    }

    pub fn try_result(&mut self) -> JobState<T> {
        let output = match self.rx.try_recv() {
            Ok(output) => output,
            Err(TryRecvError::Disconnected) => None,
            Err(TryRecvError::Empty) => return JobState::Pending,
        };
        self.join();
        JobState::Done(output)
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
