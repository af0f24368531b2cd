//! Pointer-event hub with scoped subscriptions, and overlays that close when
//! the pointer goes down outside their bounds.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::trace;

/// Rendered bounds in screen cells/pixels; right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, point: Point) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x && px < x + i64::from(self.width) && py >= y && py < y + i64::from(self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A pointer (mouse/touch) press, delivered to every subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerDown {
    pub at: Point,
}

impl PointerDown {
    pub const fn at(x: i32, y: i32) -> Self {
        Self { at: Point { x, y } }
    }
}

type Listener = Arc<dyn Fn(&PointerDown) + Send + Sync>;
type Registry = Mutex<BTreeMap<u64, Listener>>;

fn lock(registry: &Registry) -> MutexGuard<'_, BTreeMap<u64, Listener>> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Global listener list for pointer-down events.
#[derive(Default)]
pub struct PointerEvents {
    listeners: Arc<Registry>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for PointerEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl PointerEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` until the returned guard is dropped.
    #[must_use = "dropping the subscription deregisters the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&PointerDown) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).insert(id, Arc::new(listener));
        trace!(id, "pointer listener registered");
        Subscription {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver `event` to every listener registered at the time of the call.
    pub fn dispatch(&self, event: PointerDown) {
        // Listeners run unlocked so they may subscribe or drop subscriptions.
        let listeners: Vec<Listener> = lock(&self.listeners).values().cloned().collect();
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }
}

/// Guard for a registered listener; deregisters on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).remove(&self.id);
            trace!(id = self.id, "pointer listener deregistered");
        }
    }
}

#[derive(Debug, Default)]
struct OverlayShared {
    open: AtomicBool,
    bounds: Mutex<Option<Rect>>,
}

impl OverlayShared {
    fn bounds(&self) -> Option<Rect> {
        *self.bounds.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// An open/closed overlay (dropdown, popover) that closes on any pointer-down
/// outside its rendered bounds. The listener lives exactly as long as the
/// overlay.
#[derive(Debug)]
pub struct DismissableOverlay {
    shared: Arc<OverlayShared>,
    _subscription: Subscription,
}

impl DismissableOverlay {
    pub fn mount(events: &PointerEvents) -> Self {
        let shared = Arc::new(OverlayShared::default());
        let watched = Arc::clone(&shared);
        let subscription = events.subscribe(move |event| {
            let Some(bounds) = watched.bounds() else {
                return;
            };
            if !bounds.contains(event.at) && watched.open.swap(false, Ordering::SeqCst) {
                trace!(?event, "overlay dismissed by outside pointer-down");
            }
        });
        Self {
            shared,
            _subscription: subscription,
        }
    }

    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    pub fn toggle(&self) -> bool {
        !self.shared.open.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn open(&self) {
        self.shared.open.store(true, Ordering::SeqCst);
    }

    pub fn close(&self) {
        self.shared.open.store(false, Ordering::SeqCst);
    }

    /// Record where the overlay (including its toggle control) was drawn.
    pub fn set_bounds(&self, bounds: Rect) {
        *self
            .shared
            .bounds
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(bounds);
    }
}
