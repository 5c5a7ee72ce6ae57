// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Guest memory backends.
//!
//! [`RawMemory`] is a flat zero-filled image with bounds checks only;
//! [`ProtectedMemory`] additionally authorizes every access against a list of
//! (possibly overlapping) [`AccessRange`]s. [`GuestMemory`] selects one of the
//! two at runtime.

pub mod backend;
pub mod permission;
pub mod protected;
pub mod raw;

pub use backend::{GuestMemory, MemoryBackend};
pub use permission::{AccessPermission, AccessRange};
pub use protected::ProtectedMemory;
pub use raw::RawMemory;
