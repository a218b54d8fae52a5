//! Package scan over the compressed license notices bundled next to an
//! application executable.
//!
//! The notices asset is a zlib stream of license records separated by an
//! 80-column rule of `-`. The first paragraph of every record lists the
//! package names the record applies to; those names are checked against a
//! [`PackagePolicy`].

use crate::decompress::Decompressor;
use crate::error::InflateError;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Location of the asset relative to the executable's directory.
pub const NOTICES_ASSET: [&str; 3] = ["data", "flutter_assets", "NOTICES.Z"];

/// Upper bound for both the compressed asset and its decoded text.
pub const MAX_ASSET_LEN: usize = 10 * 1024 * 1024;

const RULE_WIDTH: usize = 80;

#[derive(Error, Debug)]
pub enum NoticesError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("notices asset is corrupt: {0}")]
    Inflate(#[from] InflateError),

    #[error("notices asset is {len} bytes, limit is {max}")]
    AssetTooLarge { len: usize, max: usize },

    #[error("cannot derive asset location from {0:?}")]
    InvalidExecutablePath(PathBuf),
}

pub fn asset_path(executable: &Path) -> Option<PathBuf> {
    let dir = executable.parent()?;
    Some(NOTICES_ASSET.iter().fold(dir.to_path_buf(), |p, c| p.join(c)))
}

pub fn executable_name(executable: &Path) -> Option<String> {
    let name = executable.file_name()?.to_string_lossy().into_owned();
    if name.is_empty() { None } else { Some(name) }
}

/// Reads and inflates the notices asset at `path`.
pub fn load_notices(path: &Path) -> Result<String, NoticesError> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    if file_len > MAX_ASSET_LEN as u64 {
        return Err(NoticesError::AssetTooLarge {
            len: usize::try_from(file_len).unwrap_or(usize::MAX),
            max: MAX_ASSET_LEN,
        });
    }
    // The file may grow after the metadata check; never buffer past the limit.
    let mut data = Vec::with_capacity(file_len as usize);
    file.take(MAX_ASSET_LEN as u64 + 1).read_to_end(&mut data)?;
    if data.len() > MAX_ASSET_LEN {
        return Err(NoticesError::AssetTooLarge {
            len: data.len(),
            max: MAX_ASSET_LEN,
        });
    }
    let mut out = vec![0u8; MAX_ASSET_LEN];
    let len = Decompressor::new().feed(&data, &mut out, true)?;
    out.truncate(len);
    debug!(path = %path.display(), compressed = data.len(), len, "notices loaded");
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Collects the package names heading each license record.
pub fn package_names(text: &str) -> BTreeSet<String> {
    let rule = "-".repeat(RULE_WIDTH);
    let mut names = BTreeSet::new();
    for record in text.split(rule.as_str()) {
        let mut found = false;
        for line in record.split('\n') {
            let value = line.trim();
            if !value.is_empty() {
                names.insert(value.to_string());
                found = true;
            } else if found {
                break;
            }
        }
    }
    names
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackagePolicy {
    /// Substring identifying packages of the checked family.
    pub family: String,
    /// Family members that are current.
    pub supported: BTreeSet<String>,
    /// Family members under this prefix are always accepted.
    pub accepted_prefix: String,
}

impl Default for PackagePolicy {
    fn default() -> Self {
        Self {
            family: "media_kit".to_string(),
            supported: ["media_kit", "media_kit_video", "media_kit_native_event_loop"]
                .into_iter()
                .map(String::from)
                .collect(),
            accepted_prefix: "media_kit_libs".to_string(),
        }
    }
}

impl PackagePolicy {
    /// Names that also appear in the executable name are skipped.
    pub fn evaluate(&self, names: &BTreeSet<String>, executable: &str) -> PolicyReport {
        let mut report = PolicyReport::default();
        for name in names {
            if executable.contains(name.as_str()) {
                continue;
            }
            if name.contains(self.family.as_str()) {
                if !name.starts_with(self.accepted_prefix.as_str()) && !self.supported.contains(name) {
                    report.unsupported.insert(name.clone());
                }
            } else if name.contains("video")
                && name.contains("player")
                && !name.contains("video_player")
                && !name.contains('-')
            {
                report.incompatible.insert(name.clone());
            }
        }
        report
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyReport {
    pub unsupported: BTreeSet<String>,
    pub incompatible: BTreeSet<String>,
}

impl PolicyReport {
    pub fn is_clean(&self) -> bool {
        self.unsupported.is_empty() && self.incompatible.is_empty()
    }
}

impl fmt::Display for PolicyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);
        if !self.unsupported.is_empty() {
            writeln!(f, "{}", rule)?;
            writeln!(f, "media_kit")?;
            writeln!(f, "  Some packages are outdated.")?;
            writeln!(f, "  Update all media_kit packages to use following package(s):")?;
            for name in &self.unsupported {
                writeln!(f, "    * {}", name)?;
            }
            writeln!(f, "{}", rule)?;
            writeln!(f)?;
        }
        if !self.incompatible.is_empty() {
            writeln!(f, "{}", rule)?;
            writeln!(f, "media_kit")?;
            writeln!(f, "  Following packages(s) are incompatible:")?;
            for name in &self.incompatible {
                writeln!(f, "    * {}", name)?;
            }
            writeln!(f, "{}", rule)?;
            writeln!(f)?;
        }
        if !self.is_clean() {
            writeln!(f, "GitHub  : https://github.com/media-kit/media-kit")?;
            writeln!(f, "pub.dev : https://pub.dev/packages/media_kit")?;
        }
        Ok(())
    }
}

/// Memoizes the first clean scan; a failing scan is repeated on the next
/// call. Whether to terminate on a dirty report is up to the caller.
#[derive(Debug, Default)]
pub struct PackageCheck {
    policy: PackagePolicy,
    clean: Mutex<Option<PolicyReport>>,
}

impl PackageCheck {
    pub fn new(policy: PackagePolicy) -> Self {
        Self {
            policy,
            clean: Mutex::new(None),
        }
    }

    pub fn run(&self, executable: &Path) -> Result<PolicyReport, NoticesError> {
        let mut clean = self.clean.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(report) = clean.as_ref() {
            return Ok(report.clone());
        }

        let asset = asset_path(executable)
            .ok_or_else(|| NoticesError::InvalidExecutablePath(executable.to_path_buf()))?;
        let exe_name = executable_name(executable)
            .ok_or_else(|| NoticesError::InvalidExecutablePath(executable.to_path_buf()))?;
        let text = load_notices(&asset)?;
        let report = self.policy.evaluate(&package_names(&text), &exe_name);

        if report.is_clean() {
            *clean = Some(report.clone());
        } else {
            warn!(
                unsupported = ?report.unsupported,
                incompatible = ?report.incompatible,
                "package policy violations"
            );
        }
        Ok(report)
    }

    /// Runs against the current process executable.
    pub fn run_current(&self) -> Result<PolicyReport, NoticesError> {
        let exe = std::env::current_exe()?;
        self.run(&exe)
    }
}
