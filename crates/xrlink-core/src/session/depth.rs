// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Near/far clip distances and change detection for derived projection data.

use serde::{Deserialize, Serialize};

/// Default near clip distance, in meters.
pub const DEFAULT_DEPTH_NEAR_Z: f32 = 0.5;
/// Default far clip distance, in meters.
pub const DEFAULT_DEPTH_FAR_Z: f32 = 1000.0;

/// A near/far clip distance pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl DepthRange {
    /// Creates a depth range.
    pub const fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }
}

impl Default for DepthRange {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH_NEAR_Z, DEFAULT_DEPTH_FAR_Z)
    }
}

/// Tracks the caller's requested depth range against the one last used to
/// derive projection data.
///
/// Requests take effect on the next frame. Derived data is recomputed once per
/// change, or whenever the display geometry changed.
#[derive(Debug, Clone, Default)]
pub struct DepthRangeTracker {
    requested: DepthRange,
    applied: Option<DepthRange>,
}

impl DepthRangeTracker {
    /// Starts tracking from `initial`. Nothing has been applied yet.
    pub fn new(initial: DepthRange) -> Self {
        Self {
            requested: initial,
            applied: None,
        }
    }

    /// Records a new requested range.
    pub fn request(&mut self, range: DepthRange) {
        self.requested = range;
    }

    /// The most recently requested range.
    pub fn current(&self) -> DepthRange {
        self.requested
    }

    /// Returns the range to recompute with when derived data is stale, and marks
    /// it as applied. Returns `None` when nothing changed.
    pub fn take_update(&mut self, geometry_changed: bool) -> Option<DepthRange> {
        if geometry_changed || self.applied != Some(self.requested) {
            self.applied = Some(self.requested);
            Some(self.requested)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_always_recomputes() {
        let mut tracker = DepthRangeTracker::default();
        assert_eq!(tracker.take_update(false), Some(DepthRange::default()));
        assert_eq!(tracker.take_update(false), None);
    }

    #[test]
    fn consecutive_changes_recompute_each_time() {
        let mut tracker = DepthRangeTracker::default();
        tracker.request(DepthRange::new(0.1, 100.0));
        assert!(tracker.take_update(false).is_some());
        tracker.request(DepthRange::new(0.2, 100.0));
        assert_eq!(tracker.take_update(false), Some(DepthRange::new(0.2, 100.0)));
    }

    #[test]
    fn repeated_value_recomputes_once() {
        let mut tracker = DepthRangeTracker::default();
        tracker.request(DepthRange::new(0.1, 100.0));
        assert!(tracker.take_update(false).is_some());
        tracker.request(DepthRange::new(0.1, 100.0));
        assert!(tracker.take_update(false).is_none());
    }

    #[test]
    fn geometry_change_forces_recompute() {
        let mut tracker = DepthRangeTracker::default();
        tracker.take_update(false);
        assert!(tracker.take_update(true).is_some());
    }
}
