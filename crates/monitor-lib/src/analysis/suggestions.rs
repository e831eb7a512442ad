//! Remediation suggestions
//!
//! A total lookup from (resource family, severity) to human-readable
//! remediation text. Pairs without a specific entry fall back to a
//! generic suggestion rather than failing.

use crate::models::{ResourceKind, Severity};

const GENERIC: &str =
    "Review recent workload changes and consult system logs for the affected resource";

/// Suggestion text for a detected issue.
pub fn suggestion_for(kind: ResourceKind, severity: Severity) -> &'static str {
    match (kind, severity) {
        (ResourceKind::Cpu, Severity::Warning) => {
            "Check CPU-intensive processes with 'top' command"
        }
        (ResourceKind::Cpu, Severity::High | Severity::Critical) => {
            "Check CPU-intensive processes with 'top' command\n\
             Consider process optimization or load balancing"
        }
        (ResourceKind::Memory, Severity::Warning) => {
            "Identify memory-hogging processes with 'ps aux --sort=-%mem'"
        }
        (ResourceKind::Memory, Severity::High | Severity::Critical) => {
            "Identify memory-hogging processes with 'ps aux --sort=-%mem'\n\
             Consider adding more RAM or optimizing applications"
        }
        (ResourceKind::Swap, Severity::Warning) => {
            "Reduce memory pressure or increase swap space"
        }
        (ResourceKind::Swap, Severity::High | Severity::Critical) => {
            "Reduce memory pressure or increase swap space\n\
             Check for memory leaks in applications"
        }
        (ResourceKind::Disk, Severity::Warning) => {
            "Clean up disk space on the affected mount\n\
             Use 'du -sh <mount>/* | sort -rh' to find large files"
        }
        (ResourceKind::Disk, Severity::High | Severity::Critical) => {
            "Clean up disk space on the affected mount immediately\n\
             Use 'du -sh <mount>/* | sort -rh' to find large files\n\
             Consider expanding the filesystem or archiving old data"
        }
        (ResourceKind::Network, Severity::High | Severity::Critical) => {
            "Identify heavy network consumers with 'iftop' or 'ss -tunap'\n\
             Consider rate limiting or moving bulk transfers off-peak"
        }
        _ => GENERIC,
    }
}
