use core::str::FromStr;
use serde::{Deserialize, Serialize};

use ledgerly_core::error::require_non_empty;
use ledgerly_core::money::BPS_SCALE;
use ledgerly_core::{DomainError, DomainResult, Money};

ledgerly_core::entity_id!(TaxId, "tax id");

/// How a tax amount is derived from a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxComputation {
    /// `value` is a rate in basis points applied to the line subtotal.
    Percentage,
    /// `value` is an amount in minor units charged per unit of quantity.
    Fixed,
}

impl TaxComputation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxComputation::Percentage => "percentage",
            TaxComputation::Fixed => "fixed",
        }
    }
}

impl FromStr for TaxComputation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "percentage" => Ok(TaxComputation::Percentage),
            "fixed" => Ok(TaxComputation::Fixed),
            other => Err(DomainError::invalid_id(format!(
                "computation must be percentage or fixed, got {other}"
            ))),
        }
    }
}

/// Which side of the business a tax may be used on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxScope {
    Sales,
    Purchase,
}

impl TaxScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxScope::Sales => "sales",
            TaxScope::Purchase => "purchase",
        }
    }
}

impl FromStr for TaxScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sales" => Ok(TaxScope::Sales),
            "purchase" => Ok(TaxScope::Purchase),
            other => Err(DomainError::invalid_id(format!(
                "scope must be sales or purchase, got {other}"
            ))),
        }
    }
}

/// The computation part of a tax, copied onto document lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRule {
    pub computation: TaxComputation,
    pub value: i64,
}

impl TaxRule {
    pub fn percentage(bps: i64) -> Self {
        Self {
            computation: TaxComputation::Percentage,
            value: bps,
        }
    }

    pub fn fixed(per_unit: Money) -> Self {
        Self {
            computation: TaxComputation::Fixed,
            value: per_unit.minor(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.value < 0 {
            return Err(DomainError::validation("tax value must not be negative"));
        }
        if self.computation == TaxComputation::Percentage && self.value > BPS_SCALE {
            return Err(DomainError::validation("tax rate cannot exceed 100%"));
        }
        Ok(())
    }

    /// Tax due on a line with the given subtotal and quantity.
    pub fn tax_on(&self, subtotal: Money, quantity: i64) -> DomainResult<Money> {
        match self.computation {
            TaxComputation::Percentage => Ok(subtotal.percent_bps(self.value)),
            TaxComputation::Fixed => Money::from_minor(self.value).times(quantity),
        }
    }
}

/// Tax master record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tax {
    pub id: TaxId,
    pub name: String,
    pub rule: TaxRule,
    pub scope: TaxScope,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTax {
    pub name: String,
    pub computation: TaxComputation,
    pub value: i64,
    pub scope: TaxScope,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaxPatch {
    pub name: Option<String>,
    pub computation: Option<TaxComputation>,
    pub value: Option<i64>,
    pub scope: Option<TaxScope>,
}

impl Tax {
    pub fn new(id: TaxId, input: NewTax) -> DomainResult<Self> {
        require_non_empty("tax name", &input.name)?;
        let rule = TaxRule {
            computation: input.computation,
            value: input.value,
        };
        rule.validate()?;

        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            rule,
            scope: input.scope,
            active: true,
        })
    }

    pub fn update(&mut self, patch: TaxPatch) -> DomainResult<()> {
        if !self.active {
            return Err(DomainError::invariant("archived taxes cannot be edited"));
        }

        let mut next = self.clone();
        if let Some(name) = patch.name {
            require_non_empty("tax name", &name)?;
            next.name = name.trim().to_string();
        }
        if let Some(computation) = patch.computation {
            next.rule.computation = computation;
        }
        if let Some(value) = patch.value {
            next.rule.value = value;
        }
        if let Some(scope) = patch.scope {
            next.scope = scope;
        }
        next.rule.validate()?;

        *self = next;
        Ok(())
    }

    pub fn archive(&mut self) -> DomainResult<()> {
        if !self.active {
            return Err(DomainError::conflict("tax is already archived"));
        }
        self.active = false;
        Ok(())
    }

    /// A tax can only be put on a line of its own side while active.
    pub fn ensure_usable_for(&self, scope: TaxScope) -> DomainResult<()> {
        if !self.active {
            return Err(DomainError::invariant(format!("tax '{}' is archived", self.name)));
        }
        if self.scope != scope {
            return Err(DomainError::validation(format!(
                "tax '{}' applies to {} documents, not {}",
                self.name,
                self.scope.as_str(),
                scope.as_str()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gst(value: i64) -> NewTax {
        NewTax {
            name: "GST 18%".to_string(),
            computation: TaxComputation::Percentage,
            value,
            scope: TaxScope::Sales,
        }
    }

    #[test]
    fn percentage_tax_is_base_times_rate_over_100() {
        let rule = TaxRule::percentage(1800);
        assert_eq!(rule.tax_on(Money::from_minor(10_000), 4).unwrap(), Money::from_minor(1_800));
    }

    #[test]
    fn fixed_tax_is_charged_per_unit() {
        let rule = TaxRule::fixed(Money::from_minor(250));
        assert_eq!(rule.tax_on(Money::from_minor(10_000), 4).unwrap(), Money::from_minor(1_000));
    }

    #[test]
    fn rejects_rates_over_one_hundred_percent() {
        let err = Tax::new(TaxId::generate(), gst(10_001)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_blank_names_and_negative_values() {
        let mut input = gst(1800);
        input.name = "  ".to_string();
        assert!(Tax::new(TaxId::generate(), input).is_err());
        assert!(Tax::new(TaxId::generate(), gst(-1)).is_err());
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut tax = Tax::new(TaxId::generate(), gst(1800)).unwrap();
        let err = tax
            .update(TaxPatch {
                name: Some("GST 28%".to_string()),
                value: Some(20_000),
                ..TaxPatch::default()
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(tax.name, "GST 18%");
        assert_eq!(tax.rule.value, 1800);
    }

    #[test]
    fn scope_mismatch_is_rejected() {
        let tax = Tax::new(TaxId::generate(), gst(1800)).unwrap();
        assert!(tax.ensure_usable_for(TaxScope::Sales).is_ok());
        assert!(tax.ensure_usable_for(TaxScope::Purchase).is_err());
    }

    #[test]
    fn archived_taxes_cannot_be_used_or_archived_again() {
        let mut tax = Tax::new(TaxId::generate(), gst(500)).unwrap();
        tax.archive().unwrap();
        assert!(matches!(tax.archive(), Err(DomainError::Conflict(_))));
        assert!(tax.ensure_usable_for(TaxScope::Sales).is_err());
    }
}
