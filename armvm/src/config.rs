// SPDX-FileCopyrightText: 2025 armvm contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;

use anyhow::{bail, Context, Result};
use armvm_common::settings::{parse_number, MemoryModel, RangeSetting, Settings};
use armvm_common::VAddr;
use ini::Ini;
use log::debug;

/// Load settings from an INI file, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let Some(path) = path else {
        return Ok(settings);
    };
    let conf = Ini::load_from_file(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    apply_ini(&conf, &mut settings)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(settings)
}

/// Overlay the values present in `conf` on top of `settings`.
pub fn apply_ini(conf: &Ini, settings: &mut Settings) -> Result<()> {
    // [Memory]
    if let Some(section) = conf.section(Some("Memory")) {
        if let Some(size) = section.get("size") {
            settings.memory_size = parse_size(size)?;
        }
        if let Some(model) = section.get("model") {
            settings.memory_model = MemoryModel::from_str_or_default(model);
            debug!("Memory model: {:?}", settings.memory_model);
        }
        for range in section.get_all("range") {
            let Some(parsed) = RangeSetting::parse(range) else {
                bail!("malformed access range '{range}' (expected start,size,perm)");
            };
            settings.access_ranges.push(parsed);
        }
    }

    // [Devices]
    if let Some(section) = conf.section(Some("Devices")) {
        if let Some(uart) = section.get("uart") {
            settings.uart_address = Some(parse_address(uart)?);
        }
        if let Some(suspend) = section.get("suspend") {
            settings.suspend_address = Some(parse_address(suspend)?);
        }
    }

    // [Cpu]
    if let Some(section) = conf.section(Some("Cpu")) {
        if let Some(iterations) = section.get("max_iterations") {
            settings.max_iterations = iterations
                .trim()
                .parse()
                .with_context(|| format!("invalid max_iterations '{iterations}'"))?;
        }
        if let Some(vfp) = section.get("vfp") {
            settings.enable_vfp = parse_bool(vfp);
        }
    }

    // [Debug]
    if let Some(section) = conf.section(Some("Debug")) {
        if let Some(logging) = section.get("logging") {
            settings.use_debug_logging = parse_bool(logging);
        }
    }

    if settings.memory_size == 0 {
        bail!("memory size must be non-zero");
    }
    Ok(())
}

fn parse_bool(s: &str) -> bool {
    matches!(s.trim(), "true" | "1" | "yes" | "on")
}

/// Byte count, decimal or `0x` hex.
pub fn parse_size(s: &str) -> Result<usize> {
    parse_number(s)
        .and_then(|n| usize::try_from(n).ok())
        .with_context(|| format!("invalid size '{s}'"))
}

/// 32-bit guest address, decimal or `0x` hex.
pub fn parse_address(s: &str) -> Result<VAddr> {
    parse_number(s)
        .and_then(|n| VAddr::try_from(n).ok())
        .with_context(|| format!("invalid guest address '{s}'"))
}
