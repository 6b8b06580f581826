use core::str::FromStr;
use serde::{Deserialize, Serialize};

use ledgerly_core::error::require_non_empty;
use ledgerly_core::{DomainError, DomainResult};

ledgerly_core::entity_id!(AccountId, "account id");

/// Codes of the seeded system accounts that posting rules rely on.
pub mod codes {
    pub const CASH: &str = "1000";
    pub const BANK: &str = "1010";
    pub const ACCOUNTS_RECEIVABLE: &str = "1100";
    pub const INPUT_TAX: &str = "1200";
    pub const INVENTORY: &str = "1300";
    pub const ACCOUNTS_PAYABLE: &str = "2000";
    pub const OUTPUT_TAX: &str = "2100";
    pub const OWNERS_EQUITY: &str = "3000";
    pub const SALES_INCOME: &str = "4000";
    pub const PURCHASE_EXPENSE: &str = "5000";
}

/// High-level account kind (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Asset => "asset",
            AccountKind::Liability => "liability",
            AccountKind::Equity => "equity",
            AccountKind::Income => "income",
            AccountKind::Expense => "expense",
        }
    }

    /// Assets and expenses grow on the debit side.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountKind::Asset | AccountKind::Expense)
    }
}

impl FromStr for AccountKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asset" => Ok(AccountKind::Asset),
            "liability" => Ok(AccountKind::Liability),
            "equity" => Ok(AccountKind::Equity),
            "income" => Ok(AccountKind::Income),
            "expense" => Ok(AccountKind::Expense),
            other => Err(DomainError::invalid_id(format!(
                "kind must be one of: asset, liability, equity, income, expense (got {other})"
            ))),
        }
    }
}

/// Chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    /// Seeded accounts used by posting rules.
    pub system: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
}

impl Account {
    /// A user-defined (non-system) account.
    pub fn new(id: AccountId, input: NewAccount) -> DomainResult<Self> {
        let code = input.code.trim().to_string();
        require_non_empty("account code", &code)?;
        require_non_empty("account name", &input.name)?;
        if code.len() > 16 || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomainError::validation(
                "account code must be at most 16 letters, digits or dashes",
            ));
        }

        Ok(Self {
            id,
            code,
            name: input.name.trim().to_string(),
            kind: input.kind,
            system: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_accounts_are_never_system_accounts() {
        let account = Account::new(
            AccountId::generate(),
            NewAccount {
                code: " 6100 ".to_string(),
                name: "Rent".to_string(),
                kind: AccountKind::Expense,
            },
        )
        .unwrap();
        assert_eq!(account.code, "6100");
        assert!(!account.system);
    }

    #[test]
    fn rejects_odd_codes() {
        let input = NewAccount {
            code: "61 00".to_string(),
            name: "Rent".to_string(),
            kind: AccountKind::Expense,
        };
        assert!(Account::new(AccountId::generate(), input).is_err());
    }

    #[test]
    fn normal_sides() {
        assert!(AccountKind::Asset.is_debit_normal());
        assert!(AccountKind::Expense.is_debit_normal());
        assert!(!AccountKind::Income.is_debit_normal());
        assert!(!AccountKind::Liability.is_debit_normal());
        assert_eq!("Income".parse::<AccountKind>().unwrap(), AccountKind::Income);
    }
}
