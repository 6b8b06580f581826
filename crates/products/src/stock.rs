//! Stock statement: quantities bought and sold per goods product.

use std::collections::BTreeMap;

use serde::Serialize;

use ledgerly_core::{DomainResult, Money};

use crate::product::{Product, ProductId};

/// Quantity flow for one product, taken from confirmed bills (in) and invoices (out).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: ProductId,
    pub quantity_in: i64,
    pub quantity_out: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLine {
    pub product_id: ProductId,
    pub name: String,
    pub purchased: i64,
    pub sold: i64,
    pub on_hand: i64,
    pub unit_cost: Money,
    pub value: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockStatement {
    pub lines: Vec<StockLine>,
    pub total_value: Money,
}

impl StockStatement {
    /// Fold movements onto goods products. Services and unknown products are skipped.
    pub fn build<'a>(
        products: impl IntoIterator<Item = &'a Product>,
        movements: impl IntoIterator<Item = StockMovement>,
    ) -> DomainResult<Self> {
        let mut flows: BTreeMap<ProductId, (i64, i64)> = BTreeMap::new();
        for m in movements {
            let entry = flows.entry(m.product_id).or_default();
            entry.0 += m.quantity_in;
            entry.1 += m.quantity_out;
        }

        let mut lines: Vec<StockLine> = products
            .into_iter()
            .filter(|p| p.is_stocked())
            .map(|p| {
                let (purchased, sold) = flows.get(&p.id).copied().unwrap_or_default();
                let on_hand = purchased - sold;
                Ok(StockLine {
                    product_id: p.id,
                    name: p.name.clone(),
                    purchased,
                    sold,
                    on_hand,
                    unit_cost: p.purchase_price,
                    value: p.purchase_price.times(on_hand)?,
                })
            })
            .collect::<DomainResult<_>>()?;
        lines.sort_by(|a, b| a.name.cmp(&b.name));

        let total_value = Money::checked_sum(lines.iter().map(|l| l.value))?;
        Ok(Self { lines, total_value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{NewProduct, ProductKind};

    fn product(name: &str, kind: ProductKind, cost: i64) -> Product {
        Product::new(
            ProductId::generate(),
            NewProduct {
                name: name.to_string(),
                kind,
                category: None,
                hsn_code: None,
                sales_price: Money::from_minor(cost * 2),
                purchase_price: Money::from_minor(cost),
                sales_tax_id: None,
                purchase_tax_id: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn on_hand_is_purchased_minus_sold() {
        let desk = product("Desk", ProductKind::Goods, 1_000);
        let movements = vec![
            StockMovement { product_id: desk.id, quantity_in: 10, quantity_out: 0 },
            StockMovement { product_id: desk.id, quantity_in: 0, quantity_out: 3 },
            StockMovement { product_id: desk.id, quantity_in: 2, quantity_out: 1 },
        ];

        let statement = StockStatement::build([&desk], movements).unwrap();
        let line = &statement.lines[0];
        assert_eq!((line.purchased, line.sold, line.on_hand), (12, 4, 8));
        assert_eq!(line.value, Money::from_minor(8_000));
        assert_eq!(statement.total_value, Money::from_minor(8_000));
    }

    #[test]
    fn services_are_excluded_and_idle_goods_listed() {
        let consulting = product("Consulting", ProductKind::Service, 5_000);
        let lamp = product("Lamp", ProductKind::Goods, 300);
        let movements = vec![StockMovement {
            product_id: consulting.id,
            quantity_in: 0,
            quantity_out: 4,
        }];

        let statement = StockStatement::build([&consulting, &lamp], movements).unwrap();
        assert_eq!(statement.lines.len(), 1);
        assert_eq!(statement.lines[0].name, "Lamp");
        assert_eq!(statement.lines[0].on_hand, 0);
        assert_eq!(statement.total_value, Money::ZERO);
    }
}
