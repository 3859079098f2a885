//! Inventory commands.

use super::{build_app, require_dashboard, App};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use inventory_service::{
    alerts, stats, InventoryError, InventoryRecord, InventoryService, NewItem, StockLevel,
};
use std::sync::Arc;

fn service(app: &App, organization_id: uuid::Uuid) -> InventoryService {
    InventoryService::new(Arc::clone(&app.client), organization_id)
}

fn print_record_line(record: &InventoryRecord) {
    println!(
        "  {:<5} {:<24} {:<12} {:>8.1} {:<10} {:>8.1}  {}",
        record.id,
        record.name,
        record.category,
        record.quantity,
        record.unit,
        record.min_stock,
        record.status()
    );
}

fn report_inventory_error(error: InventoryError, format: &OutputFormat) {
    match &error {
        InventoryError::Api(api) if api.is_transient() => {
            output::print_error(&format!("Network problem: {}. Retry.", api), format);
        }
        other => output::print_error(&other.to_string(), format),
    }
}

/// List all items with stats and status.
pub async fn list(format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;
    let (organization, access_token) = require_dashboard(&app, format)?;
    let service = service(&app, organization.id);

    let records = match service.list(&access_token).await {
        Ok(records) => records,
        Err(e) => {
            report_inventory_error(e, format);
            return Ok(());
        }
    };

    match format {
        OutputFormat::Text => {
            let totals = stats(&records);
            output::print_heading(&format!("{} inventory", organization.name));
            output::print_row("Items", &totals.total_items.to_string());
            output::print_row("Categories", &totals.categories.to_string());
            output::print_row("Low stock", &totals.low_stock.to_string());
            output::print_row("Critical", &totals.critical.to_string());
            println!();
            println!(
                "  {:<5} {:<24} {:<12} {:>8} {:<10} {:>8}  {}",
                "ID", "Item", "Category", "Qty", "Unit", "Min", "Status"
            );
            for record in &records {
                print_record_line(record);
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "organization": organization,
                "stats": stats(&records),
                "items": records,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

/// Show items at or below their minimum stock.
pub async fn show_alerts(format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;
    let (organization, access_token) = require_dashboard(&app, format)?;
    let service = service(&app, organization.id);

    let records = match service.list(&access_token).await {
        Ok(records) => records,
        Err(e) => {
            report_inventory_error(e, format);
            return Ok(());
        }
    };
    let flagged = alerts(&records);

    match format {
        OutputFormat::Text => {
            if flagged.is_empty() {
                println!("No stock alerts. Everything is above minimum.");
                return Ok(());
            }
            output::print_heading("Stock alerts");
            for record in flagged {
                println!(
                    "  [{}] {} - {:.1} {} remaining (min: {:.1})",
                    record.status(),
                    record.name,
                    record.quantity,
                    record.unit,
                    record.min_stock
                );
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({ "alerts": flagged });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

/// Add a new item.
pub async fn add(
    name: String,
    category: String,
    quantity: f64,
    unit: String,
    min_stock: f64,
    format: &OutputFormat,
) -> Result<()> {
    let app = build_app(format).await?;
    let (organization, access_token) = require_dashboard(&app, format)?;
    let service = service(&app, organization.id);

    let item = NewItem {
        name,
        category,
        quantity,
        unit,
        min_stock,
    };

    match service.add(&access_token, item).await {
        Ok(record) => {
            output::print_success(
                &format!("Added {} (id {}, {})", record.name, record.id, record.status()),
                format,
            );
        }
        Err(e) => report_inventory_error(e, format),
    }

    Ok(())
}

/// Edit fields of an existing item; unspecified fields keep their values.
#[allow(clippy::too_many_arguments)]
pub async fn edit(
    item_id: i64,
    name: Option<String>,
    category: Option<String>,
    quantity: Option<f64>,
    unit: Option<String>,
    min_stock: Option<f64>,
    format: &OutputFormat,
) -> Result<()> {
    let app = build_app(format).await?;
    let (organization, access_token) = require_dashboard(&app, format)?;
    let service = service(&app, organization.id);

    let records = match service.list(&access_token).await {
        Ok(records) => records,
        Err(e) => {
            report_inventory_error(e, format);
            return Ok(());
        }
    };
    let current = match records.iter().find(|r| r.id == item_id) {
        Some(record) => record,
        None => {
            output::print_error(&format!("No item with id {}", item_id), format);
            return Ok(());
        }
    };

    let item = NewItem {
        name: name.unwrap_or_else(|| current.name.clone()),
        category: category.unwrap_or_else(|| current.category.clone()),
        quantity: quantity.unwrap_or(current.quantity),
        unit: unit.unwrap_or_else(|| current.unit.clone()),
        min_stock: min_stock.unwrap_or(current.min_stock),
    };

    match service.update(&access_token, item_id, item).await {
        Ok(record) => {
            output::print_success(
                &format!("Updated {} ({})", record.name, record.status()),
                format,
            );
        }
        Err(e) => report_inventory_error(e, format),
    }

    Ok(())
}

/// Remove an item.
pub async fn remove(item_id: i64, format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;
    let (organization, access_token) = require_dashboard(&app, format)?;
    let service = service(&app, organization.id);

    match service.remove(&access_token, item_id).await {
        Ok(()) => output::print_success(&format!("Removed item {}", item_id), format),
        Err(e) => report_inventory_error(e, format),
    }

    Ok(())
}

/// Adjust an item's quantity. The displayed quantity never goes below
/// zero.
pub async fn adjust(item_id: i64, change: f64, format: &OutputFormat) -> Result<()> {
    let app = build_app(format).await?;
    let (organization, access_token) = require_dashboard(&app, format)?;
    let service = service(&app, organization.id);

    match service.adjust_quantity(&access_token, item_id, change).await {
        Ok(record) => {
            output::print_success(
                &format!(
                    "{}: {:.1} {} ({})",
                    record.name,
                    record.quantity,
                    record.unit,
                    record.status()
                ),
                format,
            );
        }
        Err(e) => report_inventory_error(e, format),
    }

    Ok(())
}
