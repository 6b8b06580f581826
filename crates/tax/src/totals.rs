//! Line and document totals: `subtotal + tax = total`, summed per line.

use serde::{Deserialize, Serialize};

use ledgerly_core::{DomainError, DomainResult, Money};

use crate::tax::TaxRule;

/// Computed amounts for a single priced line.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl LineAmounts {
    pub fn compute(quantity: i64, unit_price: Money, tax: Option<&TaxRule>) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if unit_price.is_negative() {
            return Err(DomainError::validation("unit price must not be negative"));
        }

        let subtotal = unit_price.times(quantity)?;
        let tax = match tax {
            Some(rule) => rule.tax_on(subtotal, quantity)?,
            None => Money::ZERO,
        };

        Ok(Self {
            subtotal,
            tax,
            total: subtotal.checked_add(tax)?,
        })
    }
}

/// Aggregated amounts for an order, invoice or bill.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
}

impl DocumentTotals {
    pub fn sum<'a>(lines: impl IntoIterator<Item = &'a LineAmounts>) -> DomainResult<Self> {
        lines.into_iter().try_fold(Self::default(), |acc, line| {
            Ok(Self {
                subtotal: acc.subtotal.checked_add(line.subtotal)?,
                tax_total: acc.tax_total.checked_add(line.tax)?,
                total: acc.total.checked_add(line.total)?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn untaxed_line_total_equals_subtotal() {
        let line = LineAmounts::compute(3, Money::from_minor(1_250), None).unwrap();
        assert_eq!(line.subtotal, Money::from_minor(3_750));
        assert_eq!(line.tax, Money::ZERO);
        assert_eq!(line.total, Money::from_minor(3_750));
    }

    #[test]
    fn document_totals_mix_percentage_and_fixed_taxes() {
        let gst = TaxRule::percentage(1800);
        let cess = TaxRule::fixed(Money::from_minor(100));
        let lines = [
            LineAmounts::compute(2, Money::from_minor(50_000), Some(&gst)).unwrap(),
            LineAmounts::compute(5, Money::from_minor(2_000), Some(&cess)).unwrap(),
        ];
        let totals = DocumentTotals::sum(&lines).unwrap();
        assert_eq!(totals.subtotal, Money::from_minor(110_000));
        assert_eq!(totals.tax_total, Money::from_minor(18_000 + 500));
        assert_eq!(totals.total, Money::from_minor(128_500));
    }

    #[test]
    fn rejects_non_positive_quantities_and_negative_prices() {
        assert!(LineAmounts::compute(0, Money::from_minor(10), None).is_err());
        assert!(LineAmounts::compute(1, Money::from_minor(-10), None).is_err());
    }

    #[test]
    fn oversized_lines_fail_instead_of_overflowing() {
        let err = LineAmounts::compute(1_000_000_000_000, Money::from_minor(1_000_000_000_000), None).unwrap_err();
        assert_eq!(err, DomainError::validation("amount out of range"));

        let cess = TaxRule::fixed(Money::from_minor(i64::MAX / 2));
        assert!(LineAmounts::compute(3, Money::from_minor(1), Some(&cess)).is_err());

        let big = LineAmounts::compute(1, Money::from_minor(i64::MAX - 10), None).unwrap();
        assert!(DocumentTotals::sum([&big, &big]).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every document total is its subtotal plus its tax.
        #[test]
        fn total_is_subtotal_plus_tax(
            lines in prop::collection::vec(
                (1i64..1_000, 0i64..10_000_000, 0i64..=10_000, any::<bool>()),
                1..20,
            )
        ) {
            let computed: Vec<LineAmounts> = lines
                .iter()
                .map(|(qty, price, value, fixed)| {
                    let rule = if *fixed {
                        TaxRule::fixed(Money::from_minor(*value))
                    } else {
                        TaxRule::percentage(*value)
                    };
                    LineAmounts::compute(*qty, Money::from_minor(*price), Some(&rule)).unwrap()
                })
                .collect();

            let totals = DocumentTotals::sum(&computed).unwrap();
            prop_assert_eq!(totals.total, totals.subtotal + totals.tax_total);
            for line in &computed {
                prop_assert!(!line.tax.is_negative());
            }
        }
    }
}
