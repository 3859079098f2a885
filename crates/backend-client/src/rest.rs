//! Row endpoint operations (organizations, memberships, inventory).
//!
//! Every query is filtered by owner or organization; no operation here ever
//! reads or writes rows outside the caller's tenant.

use crate::types::{InventoryRecord, Membership, NewItem, Organization};
use crate::{ApiError, ApiResult, BackendClient};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Postgres unique-constraint violation, surfaced by the row layer.
const UNIQUE_VIOLATION: &str = "23505";

/// Membership row joined to its organization.
#[derive(Debug, Deserialize)]
struct MembershipRow {
    id: i64,
    user_id: Uuid,
    organization_id: Uuid,
    role: String,
    #[serde(default)]
    organizations: Option<Organization>,
}

/// Extract the constraint-violation code from a row-layer error body.
fn record_error_code(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("code")?
        .as_str()
        .map(String::from)
}

fn record_error(status: reqwest::StatusCode, body: &str) -> ApiError {
    ApiError::Record(format!("HTTP {}: {}", status, body))
}

impl BackendClient {
    /// Look up the organization a user belongs to via the membership
    /// relation.
    ///
    /// At most one organization per user is supported. If more than one
    /// membership exists, the row with the lowest membership id wins — the
    /// ordering below makes that pick deterministic rather than leaving it
    /// to the backend's row order.
    ///
    /// Returns `Ok(None)` when the user has no membership (onboarding is
    /// the next step), or when the joined organization row is missing.
    pub async fn find_membership(
        &self,
        access_token: &str,
        user_id: Uuid,
    ) -> ApiResult<Option<(Membership, Organization)>> {
        let url = format!(
            "{}?user_id=eq.{}&select=id,user_id,organization_id,role,organizations(id,name,slug)&order=id.asc",
            self.rest_url("user_organizations"),
            user_id
        );

        debug!(user_id = %user_id, "Resolving organization membership");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Membership lookup failed");
            return Err(record_error(status, &body));
        }

        let rows: Vec<MembershipRow> = response.json().await?;
        for row in rows {
            if let Some(organization) = row.organizations {
                let membership = Membership {
                    id: row.id,
                    user_id: row.user_id,
                    organization_id: row.organization_id,
                    role: row.role,
                };

                debug!(
                    user_id = %user_id,
                    organization_id = %organization.id,
                    "Membership resolved"
                );

                return Ok(Some((membership, organization)));
            }
        }

        debug!(user_id = %user_id, "No membership found");
        Ok(None)
    }

    /// Create an organization and link the creating user as its owner.
    ///
    /// Slug uniqueness is enforced by the backend's unique constraint; a
    /// violation surfaces as [`ApiError::SlugTaken`] rather than being
    /// pre-validated (and racing) client-side.
    pub async fn create_organization(
        &self,
        access_token: &str,
        user_id: Uuid,
        name: &str,
        slug: &str,
    ) -> ApiResult<Organization> {
        let url = self.rest_url("organizations");

        debug!(name = %name, slug = %slug, "Creating organization");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&serde_json::json!([{ "name": name, "slug": slug }]))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if record_error_code(&body).as_deref() == Some(UNIQUE_VIOLATION) {
                warn!(slug = %slug, "Organization slug already claimed");
                return Err(ApiError::SlugTaken(slug.to_string()));
            }
            warn!(status = %status, body = %body, "Organization insert failed");
            return Err(record_error(status, &body));
        }

        let mut rows: Vec<Organization> = response.json().await?;
        let organization = rows
            .pop()
            .ok_or_else(|| ApiError::Record("Organization insert returned no row".to_string()))?;

        // Link the creator as owner
        let link_url = self.rest_url("user_organizations");
        let response = self
            .http
            .post(&link_url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!([{
                "user_id": user_id,
                "organization_id": organization.id,
                "role": "owner",
            }]))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Owner membership insert failed");
            return Err(record_error(status, &body));
        }

        info!(
            organization_id = %organization.id,
            slug = %organization.slug,
            "Organization created"
        );

        Ok(organization)
    }

    /// List an organization's inventory, ordered by item name.
    pub async fn list_inventory(
        &self,
        access_token: &str,
        organization_id: Uuid,
    ) -> ApiResult<Vec<InventoryRecord>> {
        let url = format!(
            "{}?organization_id=eq.{}&select=*&order=name.asc",
            self.rest_url("inventory"),
            organization_id
        );

        debug!(organization_id = %organization_id, "Listing inventory");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Inventory list failed");
            return Err(record_error(status, &body));
        }

        let records: Vec<InventoryRecord> = response.json().await?;
        debug!(count = records.len(), "Inventory listed");
        Ok(records)
    }

    /// Insert a new inventory item for an organization.
    pub async fn insert_item(
        &self,
        access_token: &str,
        organization_id: Uuid,
        item: &NewItem,
    ) -> ApiResult<InventoryRecord> {
        let url = self.rest_url("inventory");
        let now = chrono::Utc::now().to_rfc3339();

        debug!(organization_id = %organization_id, name = %item.name, "Inserting item");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&serde_json::json!([{
                "name": item.name,
                "category": item.category,
                "quantity": item.quantity,
                "unit": item.unit,
                "min_stock": item.min_stock,
                "updated_at": now,
                "organization_id": organization_id,
            }]))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Item insert failed");
            return Err(record_error(status, &body));
        }

        let mut rows: Vec<InventoryRecord> = response.json().await?;
        rows.pop()
            .ok_or_else(|| ApiError::Record("Item insert returned no row".to_string()))
    }

    /// Update an existing inventory item's fields.
    pub async fn update_item(
        &self,
        access_token: &str,
        organization_id: Uuid,
        item_id: i64,
        item: &NewItem,
    ) -> ApiResult<InventoryRecord> {
        let url = format!(
            "{}?id=eq.{}&organization_id=eq.{}",
            self.rest_url("inventory"),
            item_id,
            organization_id
        );
        let now = chrono::Utc::now().to_rfc3339();

        debug!(item_id, "Updating item");

        let response = self
            .http
            .patch(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({
                "name": item.name,
                "category": item.category,
                "quantity": item.quantity,
                "unit": item.unit,
                "min_stock": item.min_stock,
                "updated_at": now,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Item update failed");
            return Err(record_error(status, &body));
        }

        let mut rows: Vec<InventoryRecord> = response.json().await?;
        rows.pop()
            .ok_or_else(|| ApiError::Record(format!("No item with id {}", item_id)))
    }

    /// Set an item's quantity directly (increment/decrement controls).
    pub async fn set_quantity(
        &self,
        access_token: &str,
        organization_id: Uuid,
        item_id: i64,
        quantity: f64,
    ) -> ApiResult<InventoryRecord> {
        let url = format!(
            "{}?id=eq.{}&organization_id=eq.{}",
            self.rest_url("inventory"),
            item_id,
            organization_id
        );
        let now = chrono::Utc::now().to_rfc3339();

        debug!(item_id, quantity, "Setting quantity");

        let response = self
            .http
            .patch(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({
                "quantity": quantity,
                "updated_at": now,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Quantity update failed");
            return Err(record_error(status, &body));
        }

        let mut rows: Vec<InventoryRecord> = response.json().await?;
        rows.pop()
            .ok_or_else(|| ApiError::Record(format!("No item with id {}", item_id)))
    }

    /// Delete an inventory item.
    pub async fn delete_item(
        &self,
        access_token: &str,
        organization_id: Uuid,
        item_id: i64,
    ) -> ApiResult<()> {
        let url = format!(
            "{}?id=eq.{}&organization_id=eq.{}",
            self.rest_url("inventory"),
            item_id,
            organization_id
        );

        debug!(item_id, "Deleting item");

        let response = self
            .http
            .delete(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Item delete failed");
            return Err(record_error(status, &body));
        }

        info!(item_id, "Item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_error_code_reads_constraint_violations() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"organizations_slug_key\""}"#;
        assert_eq!(record_error_code(body).as_deref(), Some(UNIQUE_VIOLATION));
    }

    #[test]
    fn record_error_code_absent_for_plain_errors() {
        assert_eq!(record_error_code("bad gateway"), None);
        assert_eq!(record_error_code(r#"{"message":"denied"}"#), None);
    }

    #[test]
    fn membership_row_deserializes_with_joined_organization() {
        let json = r#"[{
            "id": 7,
            "user_id": "00000000-0000-0000-0000-000000000001",
            "organization_id": "00000000-0000-0000-0000-000000000002",
            "role": "owner",
            "organizations": {
                "id": "00000000-0000-0000-0000-000000000002",
                "name": "Mario's Kitchen",
                "slug": "marios-kitchen"
            }
        }]"#;

        let rows: Vec<MembershipRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 1);
        let org = rows[0].organizations.as_ref().unwrap();
        assert_eq!(org.name, "Mario's Kitchen");
        assert_eq!(org.slug, "marios-kitchen");
        assert_eq!(rows[0].role, "owner");
    }

    #[test]
    fn membership_row_tolerates_missing_join() {
        let json = r#"[{
            "id": 7,
            "user_id": "00000000-0000-0000-0000-000000000001",
            "organization_id": "00000000-0000-0000-0000-000000000002",
            "role": "owner"
        }]"#;

        let rows: Vec<MembershipRow> = serde_json::from_str(json).unwrap();
        assert!(rows[0].organizations.is_none());
    }
}
