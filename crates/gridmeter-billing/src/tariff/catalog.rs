//! Tariff catalog
//!
//! Concurrent, read-mostly store of admitted tariffs. Tariffs are immutable
//! post-creation, so readers never need a lock.

use super::{NewTariff, Tariff};
use dashmap::DashMap;
use gridmeter_common::{Result, TariffError, TariffId};
use std::sync::Arc;
use tracing::{info, instrument};

/// Store of admitted tariff definitions
#[derive(Default)]
pub struct TariffCatalog {
    tariffs: DashMap<TariffId, Arc<Tariff>>,
}

impl TariffCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new tariff, returning its assigned id
    #[instrument(skip(self, new), fields(description = %new.description))]
    pub fn create(&self, new: NewTariff) -> Result<TariffId> {
        new.validate()?;

        let id = TariffId::new();
        let tariff = Arc::new(Tariff::from_new(id, new));
        self.tariffs.insert(id, tariff);

        info!(tariff_id = %id, "tariff admitted");
        Ok(id)
    }

    /// Look up a tariff by id
    pub fn get(&self, id: TariffId) -> Result<Arc<Tariff>> {
        self.tariffs
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TariffError::NotFound(id).into())
    }

    /// Number of admitted tariffs
    pub fn len(&self) -> usize {
        self.tariffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tariffs.is_empty()
    }
}
