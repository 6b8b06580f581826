use core::str::FromStr;
use serde::{Deserialize, Serialize};

use ledgerly_core::error::require_non_empty;
use ledgerly_core::{DomainError, DomainResult, Money};
use ledgerly_tax::TaxId;

pub use ledgerly_tax::TaxScope as TradeSide;

ledgerly_core::entity_id!(ProductId, "product id");

/// Goods are stocked; services are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Goods,
    Service,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Goods => "goods",
            ProductKind::Service => "service",
        }
    }
}

impl FromStr for ProductKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "goods" => Ok(ProductKind::Goods),
            "service" => Ok(ProductKind::Service),
            other => Err(DomainError::invalid_id(format!(
                "kind must be goods or service (got {other})"
            ))),
        }
    }
}

/// Product status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Archived => "archived",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "archived" => Ok(ProductStatus::Archived),
            other => Err(DomainError::invalid_id(format!("unknown product status: {other}"))),
        }
    }
}

/// Catalog entry used on orders, invoices and bills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub kind: ProductKind,
    pub category: Option<String>,
    /// Harmonized System Nomenclature code.
    pub hsn_code: Option<String>,
    pub sales_price: Money,
    pub purchase_price: Money,
    pub sales_tax_id: Option<TaxId>,
    pub purchase_tax_id: Option<TaxId>,
    pub status: ProductStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub kind: ProductKind,
    pub category: Option<String>,
    pub hsn_code: Option<String>,
    pub sales_price: Money,
    pub purchase_price: Money,
    pub sales_tax_id: Option<TaxId>,
    pub purchase_tax_id: Option<TaxId>,
}

/// Partial update. The tax fields use `Some(None)` to clear a default tax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub kind: Option<ProductKind>,
    pub category: Option<String>,
    pub hsn_code: Option<String>,
    pub sales_price: Option<Money>,
    pub purchase_price: Option<Money>,
    pub sales_tax_id: Option<Option<TaxId>>,
    pub purchase_tax_id: Option<Option<TaxId>>,
}

impl Product {
    pub fn new(id: ProductId, input: NewProduct) -> DomainResult<Self> {
        let product = Self {
            id,
            name: input.name.trim().to_string(),
            kind: input.kind,
            category: normalize_optional(input.category),
            hsn_code: normalize_optional(input.hsn_code),
            sales_price: input.sales_price,
            purchase_price: input.purchase_price,
            sales_tax_id: input.sales_tax_id,
            purchase_tax_id: input.purchase_tax_id,
            status: ProductStatus::Active,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn update(&mut self, patch: ProductPatch) -> DomainResult<()> {
        if self.status == ProductStatus::Archived {
            return Err(DomainError::invariant("archived products cannot be edited"));
        }

        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if patch.category.is_some() {
            next.category = normalize_optional(patch.category);
        }
        if patch.hsn_code.is_some() {
            next.hsn_code = normalize_optional(patch.hsn_code);
        }
        if let Some(price) = patch.sales_price {
            next.sales_price = price;
        }
        if let Some(price) = patch.purchase_price {
            next.purchase_price = price;
        }
        if let Some(tax) = patch.sales_tax_id {
            next.sales_tax_id = tax;
        }
        if let Some(tax) = patch.purchase_tax_id {
            next.purchase_tax_id = tax;
        }
        next.validate()?;

        *self = next;
        Ok(())
    }

    pub fn archive(&mut self) -> DomainResult<()> {
        if self.status == ProductStatus::Archived {
            return Err(DomainError::conflict("product is already archived"));
        }
        self.status = ProductStatus::Archived;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    pub fn is_stocked(&self) -> bool {
        self.kind == ProductKind::Goods
    }

    /// Price used when a line does not specify one.
    pub fn default_price(&self, side: TradeSide) -> Money {
        match side {
            TradeSide::Sales => self.sales_price,
            TradeSide::Purchase => self.purchase_price,
        }
    }

    /// Tax used when a line does not specify one.
    pub fn default_tax(&self, side: TradeSide) -> Option<TaxId> {
        match side {
            TradeSide::Sales => self.sales_tax_id,
            TradeSide::Purchase => self.purchase_tax_id,
        }
    }

    pub fn ensure_sellable(&self) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::invariant(format!("product '{}' is archived", self.name)));
        }
        Ok(())
    }

    fn validate(&self) -> DomainResult<()> {
        require_non_empty("product name", &self.name)?;

        if self.sales_price.is_negative() || self.purchase_price.is_negative() {
            return Err(DomainError::validation("prices must not be negative"));
        }

        if let Some(hsn) = &self.hsn_code {
            let digits = hsn.chars().all(|c| c.is_ascii_digit());
            if !digits || !(2..=8).contains(&hsn.len()) {
                return Err(DomainError::validation("HSN code must be 2 to 8 digits"));
            }
        }

        Ok(())
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn office_chair() -> NewProduct {
        NewProduct {
            name: "Office Chair".to_string(),
            kind: ProductKind::Goods,
            category: Some("Furniture".to_string()),
            hsn_code: Some("9401".to_string()),
            sales_price: Money::from_minor(650_000),
            purchase_price: Money::from_minor(420_000),
            sales_tax_id: Some(TaxId::generate()),
            purchase_tax_id: None,
        }
    }

    #[test]
    fn defaults_depend_on_trade_side() {
        let p = Product::new(ProductId::generate(), office_chair()).unwrap();
        assert_eq!(p.default_price(TradeSide::Sales), Money::from_minor(650_000));
        assert_eq!(p.default_price(TradeSide::Purchase), Money::from_minor(420_000));
        assert!(p.default_tax(TradeSide::Sales).is_some());
        assert!(p.default_tax(TradeSide::Purchase).is_none());
    }

    #[test]
    fn hsn_code_must_be_numeric() {
        let mut input = office_chair();
        input.hsn_code = Some("94A1".to_string());
        assert!(Product::new(ProductId::generate(), input).is_err());

        let mut input = office_chair();
        input.hsn_code = Some("940112345".to_string());
        assert!(Product::new(ProductId::generate(), input).is_err());
    }

    #[test]
    fn negative_prices_are_rejected() {
        let mut input = office_chair();
        input.purchase_price = Money::from_minor(-1);
        assert!(Product::new(ProductId::generate(), input).is_err());
    }

    #[test]
    fn patch_clears_default_tax() {
        let mut p = Product::new(ProductId::generate(), office_chair()).unwrap();
        p.update(ProductPatch {
            sales_tax_id: Some(None),
            ..ProductPatch::default()
        })
        .unwrap();
        assert_eq!(p.sales_tax_id, None);
    }

    #[test]
    fn archived_products_cannot_be_sold() {
        let mut p = Product::new(ProductId::generate(), office_chair()).unwrap();
        p.archive().unwrap();
        assert!(p.ensure_sellable().is_err());
        assert!(p.update(ProductPatch::default()).is_err());
    }
}
