use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::Mutex;

/// Allocator and diagnostics capability injected into every schema tree and instance.
///
/// Memory obtained from one `Traits` value must be released through the same value.
/// Several implementations may coexist in one process.
pub trait Traits: Send + Sync {
	/// Allocate `layout.size()` bytes (never zero) aligned to `layout.align()`.
	fn alloc(&self, layout: Layout) -> Option<NonNull<u8>>;

	/// Release memory returned by [`Traits::alloc`].
	///
	/// # Safety
	/// `ptr` must come from `self.alloc(layout)` and not have been freed already.
	unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);

	/// Allocate storage for `len` string bytes plus the terminating zero.
	fn str_alloc(&self, len: usize) -> Option<NonNull<u8>> {
		self.alloc(Layout::array::<u8>(len.checked_add(1)?).ok()?)
	}

	/// Release storage returned by [`Traits::str_alloc`].
	///
	/// # Safety
	/// `ptr` must come from `self.str_alloc(len)` and not have been freed already.
	unsafe fn str_free(&self, ptr: NonNull<u8>, len: usize) {
		let layout = Layout::array::<u8>(len + 1).unwrap_or(Layout::new::<u8>());
		// SAFETY: forwarded caller contract.
		unsafe { self.free(ptr, layout) }
	}

	/// Diagnostic warning sink.
	fn warn(&self, message: &str) {
		log::warn!(target: "paramtree::traits", "{message}");
	}
}

/// Traits backed by the global Rust allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapTraits;

impl Traits for HeapTraits {
	fn alloc(&self, layout: Layout) -> Option<NonNull<u8>> {
		if layout.size() == 0 {
			return None;
		}
		// SAFETY: layout has non-zero size.
		NonNull::new(unsafe { std::alloc::alloc(layout) })
	}

	unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
		// SAFETY: caller guarantees `ptr` came from `alloc(layout)`.
		unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
	}
}

/// One allocator interaction observed by [`TrackingTraits`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocEvent {
	/// Block allocation of `size` bytes.
	Alloc {
		/// Requested byte size.
		size: usize,
	},
	/// Block release of `size` bytes.
	Free {
		/// Released byte size.
		size: usize,
	},
	/// String allocation of `len` bytes (terminator excluded).
	StrAlloc {
		/// String length.
		len: usize,
	},
	/// String release of `len` bytes (terminator excluded).
	StrFree {
		/// String length.
		len: usize,
	},
	/// Diagnostic emitted through [`Traits::warn`].
	Warn(String),
}

#[derive(Debug, Default)]
struct TrackerState {
	outstanding: usize,
	events: Vec<AllocEvent>,
}

/// Heap traits that count outstanding blocks and record an ordered event log.
#[derive(Debug, Default)]
pub struct TrackingTraits {
	state: Mutex<TrackerState>,
}

impl TrackingTraits {
	/// Create a tracker with no outstanding blocks.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of blocks and strings allocated but not yet released.
	pub fn outstanding(&self) -> usize {
		self.with_state(|state| state.outstanding)
	}

	/// Snapshot of the event log in call order.
	pub fn events(&self) -> Vec<AllocEvent> {
		self.with_state(|state| state.events.clone())
	}

	/// Drop recorded events, keeping the outstanding count.
	pub fn clear_events(&self) {
		self.with_state(|state| state.events.clear());
	}

	fn with_state<T>(&self, f: impl FnOnce(&mut TrackerState) -> T) -> T {
		let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
		f(&mut guard)
	}

	fn record(&self, event: AllocEvent, delta: isize) {
		self.with_state(|state| {
			state.outstanding = state.outstanding.saturating_add_signed(delta);
			state.events.push(event);
		});
	}
}

impl Traits for TrackingTraits {
	fn alloc(&self, layout: Layout) -> Option<NonNull<u8>> {
		let ptr = HeapTraits.alloc(layout)?;
		self.record(AllocEvent::Alloc { size: layout.size() }, 1);
		Some(ptr)
	}

	unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
		self.record(AllocEvent::Free { size: layout.size() }, -1);
		// SAFETY: forwarded caller contract.
		unsafe { HeapTraits.free(ptr, layout) }
	}

	fn str_alloc(&self, len: usize) -> Option<NonNull<u8>> {
		let ptr = HeapTraits.str_alloc(len)?;
		self.record(AllocEvent::StrAlloc { len }, 1);
		Some(ptr)
	}

	unsafe fn str_free(&self, ptr: NonNull<u8>, len: usize) {
		self.record(AllocEvent::StrFree { len }, -1);
		// SAFETY: forwarded caller contract.
		unsafe { HeapTraits.str_free(ptr, len) }
	}

	fn warn(&self, message: &str) {
		log::warn!(target: "paramtree::traits", "{message}");
		self.record(AllocEvent::Warn(message.to_owned()), 0);
	}
}
