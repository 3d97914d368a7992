use std::sync::Arc;

use log::{error, info};

use crate::ingest::{IngestError, MAX_WINDOW, PetClinicLoader};

/// Walks the clinic feed window by window and upserts everything it finds.
pub struct PetClinicSyncJob {
    loader: Arc<PetClinicLoader>,
    page_size: u32,
    max_rows: u32,
}

impl PetClinicSyncJob {
    pub fn new(loader: Arc<PetClinicLoader>, page_size: u32, max_rows: u32) -> Self {
        Self {
            loader,
            page_size: page_size.clamp(1, MAX_WINDOW),
            max_rows,
        }
    }

    /// One scheduled run. Failures are logged; rows loaded before a failure stay stored.
    pub async fn run_tick(&self) {
        match self.sync().await {
            Ok(total) => info!(rows = total; "Pet clinic sync finished"),
            Err(e) => error!(error:% = e; "Pet clinic sync failed"),
        }
    }

    /// Loads windows of `page_size` rows starting at row 1 until a window comes
    /// back short or empty, or `max_rows` is reached. Returns the number of
    /// records upserted.
    pub async fn sync(&self) -> Result<usize, IngestError> {
        self.sync_from(1).await
    }

    async fn sync_from(&self, first_row: u32) -> Result<usize, IngestError> {
        let mut total = 0;
        let mut start = first_row;

        while start <= self.max_rows {
            let end = start.saturating_add(self.page_size - 1).min(self.max_rows);

            match self.loader.load_window(start, end).await {
                Ok(window) => {
                    total += window.clinics.len();
                    if window.rows_fetched < (end - start + 1) as usize {
                        break;
                    }
                },
                Err(IngestError::NoData { .. }) => break,
                Err(e) => return Err(e),
            }

            match end.checked_add(1) {
                Some(next) => start = next,
                None => break,
            }
        }

        Ok(total)
    }
}
