//! Load-order check for the registry
//!
//! The registry is never reordered. This only reports descriptors that appear
//! before a table they reference, so a misordered registry is visible before
//! the first foreign key violation.

use std::fmt;

use super::registry::Registry;

/// A descriptor loaded before one of its parent tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderViolation {
    pub table: String,
    pub parent: String,
    pub position: usize,
    /// `None` when the parent is not in the registry at all
    pub parent_position: Option<usize>,
}

impl fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent_position {
            Some(parent_position) => write!(
                f,
                "'{}' (position {}) references '{}' which is loaded later (position {})",
                self.table, self.position, self.parent, parent_position
            ),
            None => write!(
                f,
                "'{}' (position {}) references '{}' which is not in the registry",
                self.table, self.position, self.parent
            ),
        }
    }
}

/// Report every descriptor that precedes one of its foreign key parents
pub fn check_order(registry: &Registry) -> Vec<OrderViolation> {
    let mut violations = Vec::new();

    for (position, table) in registry.iter().enumerate() {
        let mut seen = Vec::new();
        for parent in table.parents() {
            // Skip self-references; report each parent once
            if parent == table.table || seen.contains(&parent) {
                continue;
            }
            seen.push(parent);

            let parent_position = registry.position(parent);
            if parent_position.is_none_or(|p| p > position) {
                violations.push(OrderViolation {
                    table: table.table.to_string(),
                    parent: parent.to_string(),
                    position,
                    parent_position,
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::registry::{BUDGETS, CUSTOMERS, PRODUCT_CATEGORIES, PRODUCT_PRICES, SALES};

    #[test]
    fn test_standard_registry_is_ordered() {
        assert!(check_order(&Registry::standard()).is_empty());
    }

    #[test]
    fn test_prices_before_categories() {
        let registry = Registry::new(vec![
            CUSTOMERS.clone(),
            PRODUCT_PRICES.clone(),
            PRODUCT_CATEGORIES.clone(),
            SALES.clone(),
            BUDGETS.clone(),
        ]);

        let violations = check_order(&registry);
        assert_eq!(
            violations,
            vec![OrderViolation {
                table: "product_prices".to_string(),
                parent: "product_categories".to_string(),
                position: 1,
                parent_position: Some(2),
            }]
        );
        assert!(violations[0].to_string().contains("loaded later"));
    }

    #[test]
    fn test_missing_parent() {
        let registry = Registry::new(vec![PRODUCT_CATEGORIES.clone(), SALES.clone()]);

        let violations = check_order(&registry);
        let parents: Vec<_> = violations.iter().map(|v| v.parent.as_str()).collect();
        assert_eq!(parents, vec!["product_prices", "customers"]);
        assert!(violations.iter().all(|v| v.parent_position.is_none()));
    }

    #[test]
    fn test_only_later_parents_reported() {
        // product_prices is already loaded when budgets runs, customers is not
        let registry = Registry::new(vec![
            PRODUCT_CATEGORIES.clone(),
            PRODUCT_PRICES.clone(),
            BUDGETS.clone(),
            CUSTOMERS.clone(),
        ]);

        let violations = check_order(&registry);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].table, "budgets");
        assert_eq!(violations[0].parent_position, Some(3));
    }
}
