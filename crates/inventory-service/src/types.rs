//! Stock classification and derived inventory views.

use backend_client::InventoryRecord;
use serde::Serialize;
use std::fmt;

/// Derived stock classification. Never stored; always recomputed from the
/// quantity / minimum-stock ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// Above the minimum stock level.
    Good,
    /// At or below the minimum, above half of it. Boundary inclusive on
    /// both ends: a ratio of exactly 0.5 or 1.0 is Low.
    Low,
    /// Below half the minimum.
    Critical,
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::Good => write!(f, "Good"),
            StockStatus::Low => write!(f, "Low"),
            StockStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// Classify a quantity against a minimum stock threshold.
///
/// An item with no threshold (`min_stock <= 0`) has nothing to fall
/// under and is always Good.
pub fn stock_status(quantity: f64, min_stock: f64) -> StockStatus {
    if min_stock <= 0.0 {
        return StockStatus::Good;
    }
    let ratio = quantity / min_stock;
    if ratio < 0.5 {
        StockStatus::Critical
    } else if ratio <= 1.0 {
        StockStatus::Low
    } else {
        StockStatus::Good
    }
}

/// Apply a quantity change, clamping at zero. The displayed quantity is
/// never negative, for any starting value and any sequence of decrements.
pub fn clamped_quantity(current: f64, change: f64) -> f64 {
    (current + change).max(0.0)
}

/// Dashboard-header totals for an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    /// Number of items
    pub total_items: usize,
    /// Number of distinct categories
    pub categories: usize,
    /// Items at or below their minimum (Low or Critical)
    pub low_stock: usize,
    /// Items below half their minimum
    pub critical: usize,
}

/// Extension for types carrying a quantity and a minimum stock level.
pub trait StockLevel {
    /// The derived stock status.
    fn status(&self) -> StockStatus;
}

impl StockLevel for InventoryRecord {
    fn status(&self) -> StockStatus {
        stock_status(self.quantity, self.min_stock)
    }
}

/// Items needing attention (Low or Critical), most depleted first.
pub fn alerts(records: &[InventoryRecord]) -> Vec<&InventoryRecord> {
    let mut flagged: Vec<&InventoryRecord> = records
        .iter()
        .filter(|r| r.status() != StockStatus::Good)
        .collect();
    flagged.sort_by(|a, b| {
        let ra = if a.min_stock > 0.0 { a.quantity / a.min_stock } else { f64::MAX };
        let rb = if b.min_stock > 0.0 { b.quantity / b.min_stock } else { f64::MAX };
        ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
    });
    flagged
}

/// Distinct categories in first-appearance order.
pub fn categories(records: &[InventoryRecord]) -> Vec<&str> {
    let mut seen = Vec::new();
    for record in records {
        if !seen.contains(&record.category.as_str()) {
            seen.push(record.category.as_str());
        }
    }
    seen
}

/// Compute the dashboard totals for a set of records.
pub fn stats(records: &[InventoryRecord]) -> InventoryStats {
    InventoryStats {
        total_items: records.len(),
        categories: categories(records).len(),
        low_stock: records
            .iter()
            .filter(|r| r.status() != StockStatus::Good)
            .count(),
        critical: records
            .iter()
            .filter(|r| r.status() == StockStatus::Critical)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(name: &str, category: &str, quantity: f64, min_stock: f64) -> InventoryRecord {
        InventoryRecord {
            id: 1,
            name: name.to_string(),
            category: category.to_string(),
            quantity,
            unit: "lbs".to_string(),
            min_stock,
            updated_at: Utc::now(),
            organization_id: Uuid::nil(),
        }
    }

    #[test]
    fn status_boundaries() {
        // Ratio 0.5 is Low, boundary inclusive
        assert_eq!(stock_status(5.0, 10.0), StockStatus::Low);
        // Ratio 0.4 is Critical
        assert_eq!(stock_status(4.0, 10.0), StockStatus::Critical);
        // Ratio 2.0 is Good
        assert_eq!(stock_status(20.0, 10.0), StockStatus::Good);
        // Ratio exactly 1.0 is still Low
        assert_eq!(stock_status(10.0, 10.0), StockStatus::Low);
        // Just above the minimum is Good
        assert_eq!(stock_status(10.1, 10.0), StockStatus::Good);
    }

    #[test]
    fn status_with_zero_quantity() {
        assert_eq!(stock_status(0.0, 10.0), StockStatus::Critical);
    }

    #[test]
    fn status_without_threshold_is_good() {
        assert_eq!(stock_status(0.0, 0.0), StockStatus::Good);
        assert_eq!(stock_status(5.0, 0.0), StockStatus::Good);
    }

    #[test]
    fn clamp_never_goes_negative() {
        assert_eq!(clamped_quantity(5.0, -1.0), 4.0);
        assert_eq!(clamped_quantity(0.5, -1.0), 0.0);
        assert_eq!(clamped_quantity(0.0, -1.0), 0.0);

        // Any sequence of decrements stays at or above zero
        let mut quantity = 3.0;
        for _ in 0..10 {
            quantity = clamped_quantity(quantity, -1.0);
            assert!(quantity >= 0.0);
        }
        assert_eq!(quantity, 0.0);

        // And increments still work from the floor
        assert_eq!(clamped_quantity(quantity, 1.0), 1.0);
    }

    #[test]
    fn alerts_sorted_most_depleted_first() {
        let records = vec![
            record("Lettuce", "Produce", 5.0, 10.0),      // ratio 0.5, Low
            record("Heavy Cream", "Dairy", 1.0, 5.0),     // ratio 0.2, Critical
            record("Pasta", "Pantry", 40.0, 20.0),        // Good, excluded
            record("Salmon", "Proteins", 12.0, 15.0),     // ratio 0.8, Low
        ];

        let flagged = alerts(&records);
        let names: Vec<&str> = flagged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Heavy Cream", "Lettuce", "Salmon"]);
    }

    #[test]
    fn categories_distinct_in_first_appearance_order() {
        let records = vec![
            record("Chicken", "Proteins", 45.0, 20.0),
            record("Salmon", "Proteins", 12.0, 15.0),
            record("Olive Oil", "Pantry", 8.0, 5.0),
            record("Tomatoes", "Produce", 30.0, 25.0),
            record("Pasta", "Pantry", 40.0, 20.0),
        ];

        assert_eq!(categories(&records), vec!["Proteins", "Pantry", "Produce"]);
    }

    #[test]
    fn stats_totals() {
        let records = vec![
            record("Chicken", "Proteins", 45.0, 20.0), // Good
            record("Salmon", "Proteins", 12.0, 15.0),  // Low
            record("Lettuce", "Produce", 5.0, 10.0),   // Low (boundary)
            record("Cream", "Dairy", 1.0, 5.0),        // Critical
        ];

        let stats = stats(&records);
        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.categories, 3);
        assert_eq!(stats.low_stock, 3);
        assert_eq!(stats.critical, 1);
    }

    #[test]
    fn stats_empty_inventory() {
        let stats = stats(&[]);
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.categories, 0);
        assert_eq!(stats.low_stock, 0);
        assert_eq!(stats.critical, 0);
    }

    #[test]
    fn status_display() {
        assert_eq!(StockStatus::Good.to_string(), "Good");
        assert_eq!(StockStatus::Low.to_string(), "Low");
        assert_eq!(StockStatus::Critical.to_string(), "Critical");
    }
}
