//! Tenant-scoped inventory operations.

use crate::types::clamped_quantity;
use crate::{InventoryError, InventoryResult};
use backend_client::{BackendClient, InventoryRecord, NewItem};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Inventory operations for one organization.
///
/// Thin orchestration over the row endpoints: validation and the
/// zero-clamp happen here, storage and ordering happen backend-side.
/// Every method takes the caller's access token; the service itself holds
/// no credentials.
pub struct InventoryService {
    client: Arc<BackendClient>,
    organization_id: Uuid,
}

impl InventoryService {
    /// Create a service scoped to one organization.
    pub fn new(client: Arc<BackendClient>, organization_id: Uuid) -> Self {
        Self {
            client,
            organization_id,
        }
    }

    /// The organization this service is scoped to.
    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    fn validate(item: &NewItem) -> InventoryResult<()> {
        if item.name.trim().is_empty() {
            return Err(InventoryError::InvalidItem("name is required".to_string()));
        }
        if item.quantity < 0.0 {
            return Err(InventoryError::InvalidItem(
                "quantity must be non-negative".to_string(),
            ));
        }
        if item.min_stock < 0.0 {
            return Err(InventoryError::InvalidItem(
                "minimum stock must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// List the organization's inventory, ordered by item name.
    pub async fn list(&self, access_token: &str) -> InventoryResult<Vec<InventoryRecord>> {
        Ok(self
            .client
            .list_inventory(access_token, self.organization_id)
            .await?)
    }

    /// Add a new item.
    pub async fn add(
        &self,
        access_token: &str,
        item: NewItem,
    ) -> InventoryResult<InventoryRecord> {
        Self::validate(&item)?;

        let record = self
            .client
            .insert_item(access_token, self.organization_id, &item)
            .await?;

        info!(item_id = record.id, name = %record.name, "Item added");
        Ok(record)
    }

    /// Replace an item's fields.
    pub async fn update(
        &self,
        access_token: &str,
        item_id: i64,
        item: NewItem,
    ) -> InventoryResult<InventoryRecord> {
        Self::validate(&item)?;

        let record = self
            .client
            .update_item(access_token, self.organization_id, item_id, &item)
            .await?;

        info!(item_id, "Item updated");
        Ok(record)
    }

    /// Remove an item.
    pub async fn remove(&self, access_token: &str, item_id: i64) -> InventoryResult<()> {
        self.client
            .delete_item(access_token, self.organization_id, item_id)
            .await?;
        Ok(())
    }

    /// Adjust an item's quantity by a delta, clamped at zero.
    ///
    /// Reads the current row first so the clamp applies to the latest
    /// backend state rather than a stale display value.
    pub async fn adjust_quantity(
        &self,
        access_token: &str,
        item_id: i64,
        change: f64,
    ) -> InventoryResult<InventoryRecord> {
        let records = self.list(access_token).await?;
        let current = records
            .iter()
            .find(|r| r.id == item_id)
            .ok_or(InventoryError::NotFound(item_id))?;

        let quantity = clamped_quantity(current.quantity, change);
        debug!(item_id, from = current.quantity, to = quantity, "Adjusting quantity");

        let record = self
            .client
            .set_quantity(access_token, self.organization_id, item_id, quantity)
            .await?;
        Ok(record)
    }
}
