use std::io;
use std::thread::{self, JoinHandle};

/// Spawns the long-lived background threads a node needs (socket listener,
/// console reader).
pub trait Scheduler {
    fn spawn<F>(&self, name: &str, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static;
}

pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        ThreadScheduler
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn<F>(&self, name: &str, f: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::Builder::new().name(name.to_string()).spawn(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_thread_scheduler_spawn() {
        let scheduler = ThreadScheduler::new();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();

        let handle = scheduler
            .spawn("patchsync-test", move || {
                let name = thread::current().name().map(str::to_string);
                *seen_clone.lock().unwrap() = name;
            })
            .unwrap();

        handle.join().unwrap();
        assert_eq!(seen.lock().unwrap().as_deref(), Some("patchsync-test"));
    }
}
