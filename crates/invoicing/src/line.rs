//! Priced document lines shared by orders, invoices and bills.

use serde::{Deserialize, Serialize};

use ledgerly_core::{DomainError, DomainResult, Money};
use ledgerly_products::{Product, ProductId, TradeSide};
use ledgerly_tax::{LineAmounts, Tax, TaxId, TaxRule};

/// Tax as it was when the line was priced. Later edits to the tax master
/// never reach documents that already carry this snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTax {
    pub tax_id: TaxId,
    pub name: String,
    pub rule: TaxRule,
}

impl AppliedTax {
    pub fn snapshot(tax: &Tax) -> Self {
        Self {
            tax_id: tax.id,
            name: tax.name.clone(),
            rule: tax.rule,
        }
    }
}

/// Line as submitted by a client, before prices and taxes are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineDraft {
    pub product_id: ProductId,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: i64,
    /// Falls back to the product's price for the document side.
    #[serde(default)]
    pub unit_price: Option<Money>,
    /// Falls back to the product's default tax for the document side.
    #[serde(default)]
    pub tax_id: Option<TaxId>,
}

impl LineDraft {
    /// The tax that should be looked up for this line, if any.
    pub fn tax_to_apply(&self, product: &Product, side: TradeSide) -> Option<TaxId> {
        self.tax_id.or_else(|| product.default_tax(side))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub tax: Option<AppliedTax>,
    pub amounts: LineAmounts,
}

impl DocumentLine {
    /// Price a draft line against its product and (already resolved) tax.
    pub fn price(
        line_no: u32,
        draft: &LineDraft,
        product: &Product,
        side: TradeSide,
        tax: Option<&Tax>,
    ) -> DomainResult<Self> {
        if draft.product_id != product.id {
            return Err(DomainError::invariant("line product does not match the priced product"));
        }
        product.ensure_sellable()?;
        if let Some(tax) = tax {
            tax.ensure_usable_for(side)?;
        }

        let unit_price = draft.unit_price.unwrap_or_else(|| product.default_price(side));
        let applied = tax.map(AppliedTax::snapshot);
        let amounts = LineAmounts::compute(draft.quantity, unit_price, applied.as_ref().map(|t| &t.rule))
            .map_err(|e| match e {
                DomainError::Validation(msg) => DomainError::validation(format!("line {line_no}: {msg}")),
                other => other,
            })?;

        let description = draft
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map_or_else(|| product.name.clone(), str::to_string);

        Ok(Self {
            line_no,
            product_id: product.id,
            description,
            quantity: draft.quantity,
            unit_price,
            tax: applied,
            amounts,
        })
    }

    /// Copy onto another document, keeping the price and tax snapshot.
    pub fn renumbered(&self, line_no: u32) -> Self {
        Self {
            line_no,
            ..self.clone()
        }
    }
}
