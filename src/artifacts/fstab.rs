//! Mount table records as produced by `genfstab`.

use std::fmt;

/// One non-comment line of an fstab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstabEntry {
    /// Device spec (`UUID=...`, `/dev/sda2`)
    pub spec: String,
    pub mountpoint: String,
    pub fstype: String,
    pub options: String,
    pub dump: u8,
    pub pass: u8,
}

impl fmt::Display for FstabEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{} {}",
            self.spec, self.mountpoint, self.fstype, self.options, self.dump, self.pass
        )
    }
}

/// Parse fstab text. Comment, blank and malformed lines (fewer than four
/// fields) are skipped; missing dump/pass fields default to 0.
pub fn parse(text: &str) -> Vec<FstabEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let number = |i: usize| fields.get(i).and_then(|s| s.parse().ok()).unwrap_or(0);
            Some(FstabEntry {
                spec: fields[0].to_string(),
                mountpoint: fields[1].to_string(),
                fstype: fields[2].to_string(),
                options: fields[3].to_string(),
                dump: number(4),
                pass: number(5),
            })
        })
        .collect()
}

/// True if some entry mounts `/`
pub fn has_root(entries: &[FstabEntry]) -> bool {
    entries.iter().any(|e| e.mountpoint == "/")
}
