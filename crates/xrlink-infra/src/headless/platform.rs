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

//! Platform services driven by the test or demo instead of an operating system.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use xrlink_core::capability::Permission;
use xrlink_core::platform::{
    LifecycleEvent, LifecycleHub, PermissionHub, PermissionResult, PlatformServices,
};

/// How a simulated user answers permission prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    /// The user grants the permission.
    Grant,
    /// The user denies the permission.
    Deny,
}

/// In-memory [`PlatformServices`].
///
/// Permission prompts are answered from a separate thread, the way a platform
/// delivers them on its UI thread.
#[derive(Debug)]
pub struct HeadlessPlatform {
    lifecycle: LifecycleHub,
    permissions: PermissionHub,
    granted: Arc<Mutex<HashSet<Permission>>>,
    answer: PromptAnswer,
    requests: AtomicU32,
}

impl HeadlessPlatform {
    /// Creates a platform where `granted` permissions are already held and
    /// prompts for anything else are answered with `answer`.
    pub fn new(granted: &[Permission], answer: PromptAnswer) -> Self {
        Self {
            lifecycle: LifecycleHub::new(),
            permissions: PermissionHub::new(),
            granted: Arc::new(Mutex::new(granted.iter().copied().collect())),
            answer,
            requests: AtomicU32::new(0),
        }
    }

    /// A platform where every permission is already granted.
    pub fn permissive() -> Self {
        Self::new(&[Permission::Camera], PromptAnswer::Grant)
    }

    /// Number of permission prompts shown so far.
    pub fn permission_requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Sends the application to the background.
    pub fn pause(&self) {
        self.lifecycle.emit(&LifecycleEvent::Paused);
    }

    /// Brings the application back to the foreground.
    pub fn resume(&self) {
        self.lifecycle.emit(&LifecycleEvent::Resumed);
    }
}

impl PlatformServices for HeadlessPlatform {
    fn lifecycle(&self) -> &LifecycleHub {
        &self.lifecycle
    }

    fn permissions(&self) -> &PermissionHub {
        &self.permissions
    }

    fn has_permission(&self, permission: Permission) -> bool {
        self.granted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&permission)
    }

    fn request_permission(&self, permission: Permission) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let granted = self.answer == PromptAnswer::Grant;
        let store = Arc::clone(&self.granted);
        let hub = self.permissions.clone();
        thread::spawn(move || {
            if granted {
                store
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(permission);
            }
            hub.emit(&PermissionResult {
                permission,
                granted,
            });
        });
    }
}
