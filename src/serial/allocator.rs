//! Allocation façade: input validation in front of the store's atomic
//! batch allocation.

use crate::core::error::{Result, ServerError};
use crate::db::{BatchAllocation, LabelStore};

/// Validates allocation requests and delegates to
/// [`LabelStore::allocate_batch`], which reserves the range and
/// persists the session and counter in one transaction. Allocation and
/// persistence are indivisible; there is no reserve-without-commit.
#[derive(Clone)]
pub struct SerialAllocator {
    store: LabelStore,
}

impl SerialAllocator {
    pub fn new(store: LabelStore) -> Self {
        Self { store }
    }

    /// Reserve `quantity` serials for `year` and persist the batch.
    ///
    /// `year` must be non-empty after trimming and `quantity` at least
    /// 1; violations return [`ServerError::InvalidInput`] without
    /// touching the store.
    pub fn reserve(
        &self,
        part_name: &str,
        vendor_name: &str,
        year: &str,
        location: &str,
        quantity: i64,
    ) -> Result<BatchAllocation> {
        let year = year.trim();
        if year.is_empty() {
            return Err(ServerError::InvalidInput("Year is required".to_string()));
        }
        if quantity < 1 {
            return Err(ServerError::InvalidInput(
                "Quantity must be a positive integer".to_string(),
            ));
        }
        let quantity = u32::try_from(quantity).map_err(|_| {
            ServerError::InvalidInput("Quantity must be a positive integer".to_string())
        })?;

        let allocation = self
            .store
            .allocate_batch(part_name, vendor_name, year, location, quantity)?;
        Ok(allocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator() -> SerialAllocator {
        SerialAllocator::new(LabelStore::open_in_memory().unwrap())
    }

    #[test]
    fn test_reserve_sequential_blocks() {
        let allocator = allocator();

        let first = allocator
            .reserve("Bracket", "Acme", "2025", "WH1", 4)
            .unwrap();
        let second = allocator
            .reserve("Bracket", "Acme", "2025", "WH1", 6)
            .unwrap();

        assert_eq!(first.range.start, 1);
        assert_eq!(second.range.start, first.range.start + 4);
        assert_eq!(second.year_count, 10);
    }

    #[test]
    fn test_reserve_rejects_blank_year() {
        let allocator = allocator();
        let err = allocator
            .reserve("Bracket", "Acme", "   ", "WH1", 1)
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidInput(_)));
    }

    #[test]
    fn test_reserve_rejects_non_positive_quantity() {
        let allocator = allocator();
        for quantity in [0, -3] {
            let err = allocator
                .reserve("Bracket", "Acme", "2025", "WH1", quantity)
                .unwrap_err();
            assert!(matches!(err, ServerError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_rejected_reserve_leaves_counter_untouched() {
        let store = LabelStore::open_in_memory().unwrap();
        let allocator = SerialAllocator::new(store.clone());

        let _ = allocator.reserve("Bracket", "Acme", "2025", "WH1", 0);
        assert_eq!(store.get_year_count("2025").unwrap(), 0);
        assert_eq!(store.get_total_count().unwrap(), 0);
    }
}
