//! FIFO serializer for work that must not interleave.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Runs posted tasks one at a time, in submission order.
///
/// Cloning shares the queue. Page wrappers use one queue per browser so
/// screenshots across tabs never overlap.
#[derive(Clone, Default)]
pub struct TaskQueue {
	lock: Arc<Mutex<()>>,
}

impl TaskQueue {
	pub fn new() -> Self {
		Self::default()
	}

	/// Waits for every earlier task, then runs `task`.
	pub async fn post_task<F, T>(&self, task: F) -> T
	where
		F: Future<Output = T>,
	{
		let _turn = self.lock.lock().await;
		task.await
	}
}

impl std::fmt::Debug for TaskQueue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TaskQueue")
			.field("busy", &self.lock.try_lock().is_err())
			.finish()
	}
}
