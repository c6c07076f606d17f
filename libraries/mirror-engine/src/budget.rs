//! Pre-flight resource budget guard.

use crate::error::{Result, SyncError};
use mirror_core::format_mib;
use tracing::debug;

/// Share of the configured memory limit available to the mirrored content.
/// The remaining 10% is headroom for runtime overhead during fetch and
/// publish.
pub const SAFETY_MARGIN_PERCENT: u64 = 90;

/// Effective byte limit after the safety margin.
pub fn effective_limit(memory_limit: u64) -> u64 {
    memory_limit * SAFETY_MARGIN_PERCENT / 100
}

/// Reject the sync before any transfer if the projected size exceeds the
/// effective limit.
///
/// This is a pre-flight check, not a running limit: the download step itself
/// is not metered, so it must run strictly before any content fetch begins.
pub fn check_budget(total_size: u64, memory_limit: u64) -> Result<()> {
    let effective = effective_limit(memory_limit);

    debug!(
        total_size = %format_mib(&total_size),
        effective_limit = %format_mib(&effective),
        "Checking memory budget"
    );

    if total_size > effective {
        return Err(SyncError::SizeExceeded {
            total_bytes: total_size,
            effective_limit: effective,
        });
    }

    Ok(())
}
