//! Serial number formatting and range allocation.

mod allocator;

use std::fmt;

pub use allocator::SerialAllocator;

/// Minimum display width for a serial number.
pub const MIN_SERIAL_WIDTH: usize = 4;

/// Zero-pad a serial number to at least four digits.
///
/// Larger numbers simply widen the field: 7 -> "0007", 12345 -> "12345".
pub fn format_serial(n: u64) -> String {
    format!("{:0width$}", n, width = MIN_SERIAL_WIDTH)
}

/// Inclusive, contiguous block of serial numbers within one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialRange {
    pub start: u64,
    pub end: u64,
}

impl SerialRange {
    /// Range of `quantity` serials beginning at `start`.
    ///
    /// Callers guarantee `quantity >= 1`.
    pub fn starting_at(start: u64, quantity: u64) -> Self {
        Self {
            start,
            end: start + quantity - 1,
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Serial numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> {
        self.start..=self.end
    }
}

impl fmt::Display for SerialRange {
    /// Renders as "NNNN-MMMM", both sides zero-padded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_serial(self.start), format_serial(self.end))
    }
}
