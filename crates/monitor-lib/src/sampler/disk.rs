//! Disk space sampling
//!
//! Enumerates real filesystems from /proc/mounts (virtual and pseudo
//! filesystems are filtered out), queries each with statvfs, and reports
//! the worst mount as the headline record while keeping per-mount detail.

use super::{parse_error, read_proc_file, SampleError, Sampler};
use crate::models::{MetricRecord, ResourceKind};
use async_trait::async_trait;
use std::ffi::CString;
use std::path::PathBuf;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Filesystem types that never correspond to real storage.
const VIRTUAL_FS: &[&str] = &[
    "proc", "sysfs", "devtmpfs", "tmpfs", "cgroup", "cgroup2", "pstore", "mqueue",
    "hugetlbfs", "debugfs", "tracefs", "securityfs", "configfs", "fusectl",
    "binfmt_misc", "devpts", "autofs", "overlay", "squashfs", "nsfs", "rpc_pipefs",
    "nfsd", "fuse.lxcfs", "ramfs", "efivarfs",
];

/// Space usage for a single mounted filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct MountUsage {
    pub mount: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl MountUsage {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.total_bytes as f64) * 100.0
    }
}

/// Samples filesystem utilization for all real mounts.
pub struct DiskSampler {
    mounts_path: PathBuf,
    usage_fn: fn(&str) -> Option<MountUsage>,
}

impl Default for DiskSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskSampler {
    pub fn new() -> Self {
        Self {
            mounts_path: PathBuf::from("/proc/mounts"),
            usage_fn: Self::statvfs_usage,
        }
    }

    /// Create a sampler with a custom mounts file (for testing).
    pub fn with_mounts_path(mounts_path: impl Into<PathBuf>) -> Self {
        Self {
            mounts_path: mounts_path.into(),
            usage_fn: Self::statvfs_usage,
        }
    }

    /// Replace the filesystem query (for testing).
    pub fn with_usage_fn(mut self, usage_fn: fn(&str) -> Option<MountUsage>) -> Self {
        self.usage_fn = usage_fn;
        self
    }

    /// Parse /proc/mounts contents into mount points backed by real storage.
    pub fn parse_mounts(content: &str) -> Vec<String> {
        content
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let _device = fields.next()?;
                let mount = fields.next()?;
                let fstype = fields.next()?;
                if VIRTUAL_FS.contains(&fstype)
                    || mount.starts_with("/proc")
                    || mount.starts_with("/sys")
                    || mount.starts_with("/dev")
                    || mount.starts_with("/run")
                    || mount.starts_with("/snap")
                {
                    return None;
                }
                Some(mount.to_string())
            })
            .collect()
    }

    /// Build the headline record from per-mount usage: the worst mount's
    /// utilization, with every mount retained in the detail text.
    pub fn headline(usages: &[MountUsage]) -> Option<MetricRecord> {
        let worst = usages.iter().max_by(|a, b| {
            a.percent()
                .partial_cmp(&b.percent())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

        let details: Vec<String> = usages
            .iter()
            .map(|u| {
                format!(
                    "{} {:.1}% ({:.2}GB of {:.2}GB)",
                    u.mount,
                    u.percent(),
                    u.used_bytes as f64 / BYTES_PER_GB,
                    u.total_bytes as f64 / BYTES_PER_GB
                )
            })
            .collect();

        Some(
            MetricRecord::new(ResourceKind::Disk, worst.percent(), details.join("; "))
                .with_scope(worst.mount.clone()),
        )
    }

    /// Query filesystem usage for a mount point via statvfs.
    fn statvfs_usage(mount: &str) -> Option<MountUsage> {
        let c_path = CString::new(mount).ok()?;
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if ret != 0 {
            return None;
        }

        let block_size = stat.f_frsize as u64;
        let total = stat.f_blocks as u64 * block_size;
        let free = stat.f_bfree as u64 * block_size;
        Some(MountUsage {
            mount: mount.to_string(),
            total_bytes: total,
            used_bytes: total.saturating_sub(free),
        })
    }
}

#[async_trait]
impl Sampler for DiskSampler {
    fn name(&self) -> &'static str {
        "disk"
    }

    async fn sample(&self) -> Result<Vec<MetricRecord>, SampleError> {
        let content = read_proc_file(&self.mounts_path).await?;
        let mounts = Self::parse_mounts(&content);

        // statvfs can block indefinitely on a hung mount; run the queries
        // on the blocking pool so the caller's timeout stays effective.
        let usage_fn = self.usage_fn;
        let usages: Vec<MountUsage> = tokio::task::spawn_blocking(move || {
            mounts
                .iter()
                .map(String::as_str)
                .filter_map(usage_fn)
                .filter(|u| u.total_bytes > 0)
                .collect()
        })
        .await
        .unwrap_or_default();

        match Self::headline(&usages) {
            Some(record) => Ok(vec![record]),
            None => Err(parse_error(&self.mounts_path, "no real filesystems found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUNTS: &str = "\
proc /proc proc rw,nosuid 0 0
sysfs /sys sysfs rw,nosuid 0 0
tmpfs /run tmpfs rw,nosuid 0 0
/dev/sda1 / ext4 rw,relatime 0 0
/dev/sdb1 /data xfs rw,relatime 0 0
overlay /var/lib/docker/overlay2/abc overlay rw 0 0
cgroup2 /sys/fs/cgroup cgroup2 rw 0 0";

    #[test]
    fn test_parse_mounts_filters_virtual_filesystems() {
        let mounts = DiskSampler::parse_mounts(MOUNTS);
        assert_eq!(mounts, vec!["/".to_string(), "/data".to_string()]);
    }

    #[test]
    fn test_headline_picks_worst_mount() {
        let usages = vec![
            MountUsage {
                mount: "/".to_string(),
                total_bytes: 100_000_000_000,
                used_bytes: 92_300_000_000,
            },
            MountUsage {
                mount: "/data".to_string(),
                total_bytes: 500_000_000_000,
                used_bytes: 100_000_000_000,
            },
        ];

        let record = DiskSampler::headline(&usages).unwrap();
        assert_eq!(record.kind, ResourceKind::Disk);
        assert_eq!(record.scope.as_deref(), Some("/"));
        assert!((record.value - 92.3).abs() < 0.01);
        // Both mounts appear in the detail text
        assert!(record.details.contains("/ 92.3%"));
        assert!(record.details.contains("/data 20.0%"));
    }

    #[test]
    fn test_headline_empty_is_none() {
        assert!(DiskSampler::headline(&[]).is_none());
    }

    #[test]
    fn test_mount_usage_percent_zero_total() {
        let usage = MountUsage {
            mount: "/".to_string(),
            total_bytes: 0,
            used_bytes: 0,
        };
        assert_eq!(usage.percent(), 0.0);
    }

    #[tokio::test]
    async fn test_hung_filesystem_query_is_cancellable() {
        let dir = tempfile::tempdir().unwrap();
        let mounts_path = dir.path().join("mounts");
        std::fs::write(&mounts_path, "/dev/sda1 / ext4 rw,relatime 0 0").unwrap();

        // A filesystem query stuck in the kernel, e.g. an unresponsive
        // NFS mount. The sampler must stay cancellable while it runs.
        let sampler = DiskSampler::with_mounts_path(&mounts_path).with_usage_fn(|_| {
            std::thread::sleep(std::time::Duration::from_secs(1));
            None
        });

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(50), sampler.sample()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sample_missing_mounts_file_is_io_error() {
        let sampler = DiskSampler::with_mounts_path("/nonexistent/mounts");
        let err = sampler.sample().await.unwrap_err();
        assert!(matches!(err, SampleError::Io { .. }));
    }

    #[tokio::test]
    async fn test_sample_real_root_filesystem() {
        // The real /proc/mounts always includes at least the root mount.
        let sampler = DiskSampler::new();
        if let Ok(records) = sampler.sample().await {
            assert_eq!(records.len(), 1);
            assert!(records[0].value >= 0.0 && records[0].value <= 100.0);
            assert!(records[0].scope.is_some());
        }
    }
}
