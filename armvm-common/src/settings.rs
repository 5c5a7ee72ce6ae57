// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::types::{VAddr, DEFAULT_MEMORY_SIZE};

/// VM configuration, populated from the command line and an optional INI file.
#[derive(Debug, Clone)]
pub struct Settings {
    // Memory
    pub memory_size: usize,
    pub memory_model: MemoryModel,
    /// Protected-model windows. Empty means the whole allocated image is
    /// readable and writable.
    pub access_ranges: Vec<RangeSetting>,

    // Devices
    pub uart_address: Option<VAddr>,
    pub suspend_address: Option<VAddr>,

    // Cpu
    pub max_iterations: u32,
    pub enable_vfp: bool,

    // Debug
    pub use_debug_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            memory_model: MemoryModel::Raw,
            access_ranges: Vec::new(),
            uart_address: None,
            suspend_address: None,
            max_iterations: 0,
            enable_vfp: true,
            use_debug_logging: false,
        }
    }
}

/// Which memory backend the VM runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryModel {
    /// No permission checks.
    Raw,
    /// Every access must be authorized by a registered range.
    Protected,
}

impl MemoryModel {
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "protected" | "checked" | "1" => Self::Protected,
            _ => Self::Raw,
        }
    }
}

/// Permission of a configured access range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePermission {
    Read,
    Write,
    ReadWrite,
}

impl RangePermission {
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "r" | "read" | "ro" => Self::Read,
            "w" | "write" | "wo" => Self::Write,
            _ => Self::ReadWrite,
        }
    }
}

/// One configured access window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSetting {
    pub start: VAddr,
    pub size: usize,
    pub permission: RangePermission,
}

impl RangeSetting {
    /// Parse `start,size,perm` (numbers may be decimal or `0x` hex).
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split(',').map(str::trim);
        let start = parse_number(parts.next()?)?;
        let size = parse_number(parts.next()?)?;
        let permission = parts
            .next()
            .map(RangePermission::from_str_or_default)
            .unwrap_or(RangePermission::ReadWrite);
        Some(Self {
            start: VAddr::try_from(start).ok()?,
            size: usize::try_from(size).ok()?,
            permission,
        })
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal number.
pub fn parse_number(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(&hex.replace('_', ""), 16).ok()
    } else {
        s.replace('_', "").parse().ok()
    }
}
