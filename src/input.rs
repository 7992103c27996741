//! Interactive input collection
//!
//! Every prompt has a default that Enter selects. Bad free text or an
//! out-of-range menu number falls back to the default with a warning and the
//! installer carries on; only the disk selection and its confirmation can
//! abort the run.

use crate::error::{InstallerError, Result};
use crate::hardware::{self, DiskInfo};
use crate::host::{self, HostSystem};
use crate::install_state::{
    InstallerContext, DEFAULT_HOSTNAME, DEFAULT_LOCALE, DEFAULT_USERNAME,
};
use crate::tools::disk::ListDisks;
use crate::tools::system::LoadKeys;
use crate::types::{Compositor, Keymap};
use crate::ui::Console;
use std::io::{BufRead, Write};
use strum::IntoEnumIterator;
use tracing::{info, warn};

/// Timezone menu; the first entry is the default
pub const TIMEZONES: &[&str] = &[
    "Asia/Jerusalem",
    "UTC",
    "Europe/London",
    "Europe/Berlin",
    "America/New_York",
    "America/Los_Angeles",
    "Asia/Tokyo",
];

// ============================================================================
// Validation
// ============================================================================

/// Letters, digits and inner hyphens; starts and ends alphanumeric.
pub fn is_valid_hostname(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

/// Lowercase letters, digits, `_` and `-`; starts with a letter or `_`.
pub fn is_valid_username(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_lowercase() || first == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

// ============================================================================
// Answer resolution
// ============================================================================

/// How a menu answer was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAnswer {
    /// Empty answer or end of input
    Default,
    /// Valid zero-based index
    Picked(usize),
    /// Not a number in range
    Invalid,
}

/// Interpret a one-based menu answer against `count` options.
pub fn parse_menu_answer(answer: Option<&str>, count: usize) -> MenuAnswer {
    let Some(answer) = answer.map(str::trim).filter(|a| !a.is_empty()) else {
        return MenuAnswer::Default;
    };
    match answer.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => MenuAnswer::Picked(n - 1),
        _ => MenuAnswer::Invalid,
    }
}

/// Outcome of a free-text answer with a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextAnswer {
    Accepted(String),
    Default,
    /// Rejected input, replaced by the default
    Rejected(String),
}

impl TextAnswer {
    pub fn value_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self {
            Self::Accepted(value) => value,
            Self::Default | Self::Rejected(_) => default,
        }
    }
}

pub fn parse_text_answer(answer: Option<&str>, valid: fn(&str) -> bool) -> TextAnswer {
    match answer.map(str::trim) {
        None | Some("") => TextAnswer::Default,
        Some(value) if valid(value) => TextAnswer::Accepted(value.to_string()),
        Some(value) => TextAnswer::Rejected(value.to_string()),
    }
}

/// Pick a disk by menu number, full path or kernel name. Empty picks the first.
pub fn select_disk(answer: Option<&str>, disks: &[DiskInfo]) -> Result<DiskInfo> {
    let first = disks.first().ok_or(InstallerError::NoDisks)?;
    let Some(answer) = answer.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(first.clone());
    };

    if let Ok(n) = answer.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| disks.get(i))
            .cloned()
            .ok_or_else(|| InstallerError::InvalidDisk(answer.to_string()));
    }

    disks
        .iter()
        .find(|d| d.path == answer || d.name() == answer)
        .cloned()
        .ok_or_else(|| InstallerError::InvalidDisk(answer.to_string()))
}

// ============================================================================
// Collection
// ============================================================================

/// Ask every question and record the answers in the context.
///
/// The disk is confirmed here, before anything destructive can run: an answer
/// other than the literal `yes` aborts.
pub fn collect<R: BufRead, W: Write>(
    ctx: &mut InstallerContext,
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
) -> Result<()> {
    let keymaps = Keymap::all();
    let labels: Vec<String> = keymaps
        .iter()
        .map(|k| format!("{} ({})", k, k.label()))
        .collect();
    let keymap = keymaps[choose(console, "Keyboard layout:", &labels)?];
    apply_keymap(host, console, keymap)?;

    let labels: Vec<String> = TIMEZONES.iter().map(|tz| tz.to_string()).collect();
    let timezone = TIMEZONES[choose(console, "Timezone:", &labels)?];

    let compositors: Vec<Compositor> = Compositor::iter().collect();
    let labels: Vec<String> = compositors.iter().map(|c| c.label().to_string()).collect();
    let compositor = compositors[choose(console, "Compositor:", &labels)?];

    let disk = choose_disk(host, console)?;
    confirm_wipe(ctx, console, &disk)?;

    let hostname = ask_text(
        console,
        "Hostname",
        DEFAULT_HOSTNAME,
        is_valid_hostname,
    )?;
    let username = ask_text(
        console,
        "Username",
        DEFAULT_USERNAME,
        is_valid_username,
    )?;

    let state = ctx.state_mut();
    state.keymap = keymap;
    state.timezone = timezone.to_string();
    state.compositor = compositor;
    state.disk = Some(disk.path);
    state.hostname = hostname;
    state.username = username;
    state.locale = DEFAULT_LOCALE.to_string();

    info!(
        "Input collected: keymap={} timezone={} compositor={} disk={:?} hostname={} username={}",
        state.keymap, state.timezone, state.compositor, state.disk, state.hostname, state.username
    );
    Ok(())
}

/// Show a menu whose first entry is the default; return the chosen index.
fn choose<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    title: &str,
    options: &[String],
) -> Result<usize> {
    console.menu(title, options, 0)?;
    let answer = console.prompt(&format!("Select [1-{}, default 1]: ", options.len()))?;

    match parse_menu_answer(answer.as_deref(), options.len()) {
        MenuAnswer::Picked(i) => Ok(i),
        MenuAnswer::Default => Ok(0),
        MenuAnswer::Invalid => {
            let answer = answer.unwrap_or_default();
            warn!("Invalid choice '{}' for '{}', using default", answer, title);
            console.warning(format!(
                "Invalid choice '{}', using default: {}",
                answer, options[0]
            ))?;
            Ok(0)
        }
    }
}

fn apply_keymap<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
    keymap: Keymap,
) -> Result<()> {
    let args = LoadKeys {
        keymap: keymap.to_string(),
    };
    match host::run_checked(host, &args) {
        Ok(_) => console.info(format!("Console keymap set to {}", keymap))?,
        Err(e) => {
            warn!("loadkeys {} failed: {:#}", keymap, e);
            console.warning(format!("Could not load keymap {} on this console", keymap))?;
        }
    }
    Ok(())
}

fn choose_disk<R: BufRead, W: Write>(
    host: &mut dyn HostSystem,
    console: &mut Console<R, W>,
) -> Result<DiskInfo> {
    let output = host::run_checked(host, &ListDisks)?;
    let disks = hardware::parse_lsblk_disks(&output.stdout);
    if disks.is_empty() {
        return Err(InstallerError::NoDisks);
    }

    let labels: Vec<String> = disks.iter().map(|d| d.to_string()).collect();
    console.menu("Target disk:", &labels, 0)?;
    let answer = console.prompt("Disk [number or path, default 1]: ")?;
    let disk = select_disk(answer.as_deref(), &disks)?;
    info!("Selected disk {}", disk);
    Ok(disk)
}

fn confirm_wipe<R: BufRead, W: Write>(
    ctx: &mut InstallerContext,
    console: &mut Console<R, W>,
    disk: &DiskInfo,
) -> Result<()> {
    console.warning(format!("ALL DATA ON {} WILL BE ERASED.", disk))?;
    let answer = console.prompt("Type 'yes' to continue: ")?;

    if answer.as_deref() != Some("yes") {
        warn!("Wipe of {} not confirmed (answer: {:?})", disk.path, answer);
        return Err(InstallerError::NotConfirmed {
            disk: disk.path.clone(),
        });
    }

    ctx.confirm_destructive_operations();
    Ok(())
}

fn ask_text<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    field: &str,
    default: &str,
    valid: fn(&str) -> bool,
) -> Result<String> {
    let answer = console.prompt(&format!("{} [{}]: ", field, default))?;
    let parsed = parse_text_answer(answer.as_deref(), valid);
    if let TextAnswer::Rejected(value) = &parsed {
        warn!("Invalid {} '{}', using default", field.to_lowercase(), value);
        console.warning(format!(
            "Invalid {} '{}', using default: {}",
            field.to_lowercase(),
            value,
            default
        ))?;
    }
    Ok(parsed.value_or(default).to_string())
}
