use crate::{Kitchen, Visit};
use core::time::Duration;

/// Frees a served table after `delay`, once the customers have eaten.
///
/// If shutdown fires first the clear is abandoned and the table keeps its
/// last state. If the table was emptied or re-seated in the meantime (for
/// instance by the patience monitor) nothing happens.
pub async fn clear_after(kitchen: Kitchen, visit: Visit, delay: Duration) {
    if kitchen.sleep(delay).await.is_err() {
        return;
    }

    if kitchen.tables().clear_visit(visit) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Table {} cleared", visit.table);
    }
}
