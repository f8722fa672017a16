//! Reservation expiry sweeping.
//!
//! Expiry is not scheduled inside the aggregate: an external timer calls
//! `sweep` periodically, which finds Active reservations past their deadline
//! and drives the compensating release for each held item. Kept outside the
//! domain so no hidden background state exists.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::operations::{InventoryOperations, OperationError, ReleaseOutcome, ReleaseStock};
use crate::repository::ProductRepository;
use crate::reservations::ReservationStore;

use artisania_inventory::RESERVATION_EXPIRED_REASON;

/// What one sweep pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub released_items: usize,
    pub rejected_items: usize,
    pub failed_items: usize,
}

/// Polls for timed-out reservations and compensates their stock holds.
#[derive(Debug)]
pub struct ReservationSweeper<P, S> {
    operations: InventoryOperations<P, S>,
    reservations: S,
}

impl<P, S> ReservationSweeper<P, S>
where
    P: ProductRepository,
    S: ReservationStore,
{
    pub fn new(operations: InventoryOperations<P, S>, reservations: S) -> Self {
        Self {
            operations,
            reservations,
        }
    }

    /// One polling pass. Safe to call repeatedly: expiry is idempotent and
    /// already-terminal reservations are never picked up again.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, OperationError> {
        let mut report = SweepReport::default();

        for mut reservation in self.reservations.find_expired(now)? {
            // Expire the record before releasing stock, so the release below
            // finds no Active reservation and the status stays Expired.
            reservation.expire(now);
            self.reservations.update(&reservation)?;
            report.expired += 1;

            for item in reservation.items() {
                let release = ReleaseStock {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    order_id: reservation.order_id(),
                    reason: RESERVATION_EXPIRED_REASON.to_string(),
                    saga_id: None,
                };

                // Per-item failures must not abort the batch.
                match self.operations.release_stock(release, now) {
                    Ok(ReleaseOutcome::Released { .. }) => report.released_items += 1,
                    Ok(ReleaseOutcome::Rejected { message, .. }) => {
                        warn!(
                            reservation_id = %reservation.reservation_id(),
                            %message,
                            "expiry release rejected"
                        );
                        report.rejected_items += 1;
                    }
                    Err(e) => {
                        warn!(
                            reservation_id = %reservation.reservation_id(),
                            error = %e,
                            "expiry release failed"
                        );
                        report.failed_items += 1;
                    }
                }
            }

            info!(
                reservation_id = %reservation.reservation_id(),
                order_id = %reservation.order_id(),
                "reservation expired"
            );
        }

        Ok(report)
    }
}
