//! Platform Scheduling Primitives
//!
//! The surface (terminal, test harness) owns a [`Platform`]: the current
//! viewport, pending frame requests and resize listeners. Views acquire
//! [`FrameRequest`] and [`ResizeListener`] guards from it; dropping a guard
//! cancels the registration, so a view that is torn down can never leave a
//! self-rescheduling redraw loop or a dangling listener behind.
//!
//! The surface drives the platform each frame:
//!
//! ```ignore
//! platform.set_viewport(Viewport::new(w, h));   // on resize
//! platform.begin_frame();                       // fire pending requests
//! if snowfall.on_frame(&mut surface) { ... }     // draws only if its request fired
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

/// Size of the drawing surface in surface pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Width in surface pixels
    pub width: f32,
    /// Height in surface pixels
    pub height: f32,
}

impl Viewport {
    /// Create a viewport
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether anything can be drawn
    pub fn is_drawable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Identifier of one frame callback opportunity
pub type FrameNumber = u64;

#[derive(Debug, Default)]
struct PlatformInner {
    viewport: Option<Viewport>,
    next_id: u64,
    frame: FrameNumber,
    /// Pending frame requests, by id
    frame_requests: BTreeSet<u64>,
    /// Frame requests fired by the latest `begin_frame`, by id
    fired: BTreeMap<u64, FrameNumber>,
    /// Resize listeners and whether they have an undelivered resize
    resize_listeners: BTreeMap<u64, bool>,
}

/// Shared handle to the platform scheduling state
#[derive(Clone, Debug, Default)]
pub struct Platform {
    inner: Arc<Mutex<PlatformInner>>,
}

impl Platform {
    /// Platform with no drawing surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform with an initial viewport
    pub fn with_viewport(viewport: Viewport) -> Self {
        let platform = Self::default();
        platform.inner.lock().viewport = Some(viewport);
        platform
    }

    /// Current viewport, if a surface exists
    pub fn viewport(&self) -> Option<Viewport> {
        self.inner.lock().viewport
    }

    /// Change the viewport and notify every resize listener
    pub fn set_viewport(&self, viewport: Viewport) {
        let mut inner = self.inner.lock();
        if inner.viewport == Some(viewport) {
            return;
        }
        inner.viewport = Some(viewport);
        for pending in inner.resize_listeners.values_mut() {
            *pending = true;
        }
    }

    /// Register interest in the next frame
    pub fn request_frame(&self) -> FrameRequest {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.frame_requests.insert(id);
        FrameRequest {
            id,
            platform: self.clone(),
        }
    }

    /// Subscribe to viewport changes
    pub fn listen_resize(&self) -> ResizeListener {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.resize_listeners.insert(id, false);
        ResizeListener {
            id,
            platform: self.clone(),
        }
    }

    /// Start a new frame, firing every pending request
    pub fn begin_frame(&self) -> FrameNumber {
        let mut inner = self.inner.lock();
        inner.frame += 1;
        let frame = inner.frame;
        let requests = std::mem::take(&mut inner.frame_requests);
        inner.fired = requests.into_iter().map(|id| (id, frame)).collect();
        frame
    }

    /// Number of frame requests waiting for the next frame
    pub fn pending_frame_requests(&self) -> usize {
        self.inner.lock().frame_requests.len()
    }

    /// Number of registered resize listeners
    pub fn resize_listener_count(&self) -> usize {
        self.inner.lock().resize_listeners.len()
    }

    fn cancel_frame(&self, id: u64) {
        let mut inner = self.inner.lock();
        inner.frame_requests.remove(&id);
        inner.fired.remove(&id);
    }

    fn take_fired(&self, id: u64) -> Option<FrameNumber> {
        self.inner.lock().fired.remove(&id)
    }

    fn is_frame_pending(&self, id: u64) -> bool {
        self.inner.lock().frame_requests.contains(&id)
    }

    fn take_resize(&self, id: u64) -> Option<Viewport> {
        let mut inner = self.inner.lock();
        let viewport = inner.viewport;
        match inner.resize_listeners.get_mut(&id) {
            Some(pending) if *pending => {
                *pending = false;
                viewport
            }
            _ => None,
        }
    }

    fn remove_listener(&self, id: u64) {
        self.inner.lock().resize_listeners.remove(&id);
    }
}

/// A pending frame request; dropping it cancels the request
#[derive(Debug)]
pub struct FrameRequest {
    id: u64,
    platform: Platform,
}

impl FrameRequest {
    /// Consume the fired frame, if this request was fired by the latest frame
    pub fn take_fired(&self) -> Option<FrameNumber> {
        self.platform.take_fired(self.id)
    }

    /// Whether the request is still waiting for a frame
    pub fn is_pending(&self) -> bool {
        self.platform.is_frame_pending(self.id)
    }
}

impl Drop for FrameRequest {
    fn drop(&mut self) {
        self.platform.cancel_frame(self.id);
    }
}

/// A resize subscription; dropping it unsubscribes
#[derive(Debug)]
pub struct ResizeListener {
    id: u64,
    platform: Platform,
}

impl ResizeListener {
    /// The new viewport, if a resize happened since the last call
    pub fn take_resize(&self) -> Option<Viewport> {
        self.platform.take_resize(self.id)
    }
}

impl Drop for ResizeListener {
    fn drop(&mut self) {
        self.platform.remove_listener(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_request_fires_once() {
        let platform = Platform::new();
        let request = platform.request_frame();
        assert!(request.is_pending());

        let frame = platform.begin_frame();
        assert!(!request.is_pending());
        assert_eq!(request.take_fired(), Some(frame));
        assert_eq!(request.take_fired(), None);
    }

    #[test]
    fn test_dropped_request_is_cancelled() {
        let platform = Platform::new();
        let request = platform.request_frame();
        drop(request);
        assert_eq!(platform.pending_frame_requests(), 0);
    }

    #[test]
    fn test_resize_delivered_to_listener() {
        let platform = Platform::with_viewport(Viewport::new(100.0, 50.0));
        let listener = platform.listen_resize();
        assert_eq!(listener.take_resize(), None);

        platform.set_viewport(Viewport::new(200.0, 80.0));
        assert_eq!(listener.take_resize(), Some(Viewport::new(200.0, 80.0)));
        assert_eq!(listener.take_resize(), None);

        drop(listener);
        assert_eq!(platform.resize_listener_count(), 0);
    }

    #[test]
    fn test_same_viewport_is_not_a_resize() {
        let platform = Platform::with_viewport(Viewport::new(100.0, 50.0));
        let listener = platform.listen_resize();
        platform.set_viewport(Viewport::new(100.0, 50.0));
        assert_eq!(listener.take_resize(), None);
    }
}
