//! Financial reports folded from ledger rows.
//!
//! Callers fetch the per-account sums (or partner rows) for the requested
//! period; everything here is arithmetic over those rows.

use chrono::NaiveDate;
use serde::Serialize;

use ledgerly_core::Money;
use ledgerly_parties::ContactId;

use crate::account::AccountKind;

/// Debit and credit sums for one account over some period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub debit: Money,
    pub credit: Money,
}

impl AccountBalance {
    /// Balance signed by the account's normal side.
    pub fn balance(&self) -> Money {
        if self.kind.is_debit_normal() {
            self.debit - self.credit
        } else {
            self.credit - self.debit
        }
    }

    fn has_activity(&self) -> bool {
        !self.debit.is_zero() || !self.credit.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    /// `None` for computed lines such as current earnings.
    pub code: Option<String>,
    pub name: String,
    pub amount: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub lines: Vec<ReportLine>,
    pub total: Money,
}

impl ReportSection {
    fn of_kind(balances: &[AccountBalance], kind: AccountKind) -> Self {
        let mut section = Self::default();
        for b in balances.iter().filter(|b| b.kind == kind && b.has_activity()) {
            section.push(ReportLine {
                code: Some(b.code.clone()),
                name: b.name.clone(),
                amount: b.balance(),
            });
        }
        section
    }

    fn push(&mut self, line: ReportLine) {
        self.total += line.amount;
        self.lines.push(line);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub assets: ReportSection,
    pub liabilities: ReportSection,
    pub equity: ReportSection,
    pub total_liabilities_and_equity: Money,
    pub balanced: bool,
}

impl BalanceSheet {
    /// `balances` are cumulative up to and including `as_of`.
    pub fn build(as_of: NaiveDate, balances: &[AccountBalance]) -> Self {
        let assets = ReportSection::of_kind(balances, AccountKind::Asset);
        let liabilities = ReportSection::of_kind(balances, AccountKind::Liability);
        let mut equity = ReportSection::of_kind(balances, AccountKind::Equity);

        let earnings = net_of(balances, AccountKind::Income) - net_of(balances, AccountKind::Expense);
        if !earnings.is_zero() {
            equity.push(ReportLine {
                code: None,
                name: "Current earnings".to_string(),
                amount: earnings,
            });
        }

        let total_liabilities_and_equity = liabilities.total + equity.total;
        Self {
            as_of,
            balanced: assets.total == total_liabilities_and_equity,
            assets,
            liabilities,
            equity,
            total_liabilities_and_equity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfitAndLoss {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub income: ReportSection,
    pub expenses: ReportSection,
    pub net_profit: Money,
}

impl ProfitAndLoss {
    /// `balances` cover only entries dated within `from..=to`.
    pub fn build(from: NaiveDate, to: NaiveDate, balances: &[AccountBalance]) -> Self {
        let income = ReportSection::of_kind(balances, AccountKind::Income);
        let expenses = ReportSection::of_kind(balances, AccountKind::Expense);
        Self {
            from,
            to,
            net_profit: income.total - expenses.total,
            income,
            expenses,
        }
    }
}

/// Journal line touching a partner's receivable or payable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerLedgerRow {
    pub entry_date: NaiveDate,
    pub entry_number: String,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub account_code: String,
    pub debit: Money,
    pub credit: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartnerLedgerLine {
    pub entry_date: NaiveDate,
    pub entry_number: String,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub account_code: String,
    pub debit: Money,
    pub credit: Money,
    /// Running `debit - credit` including the opening balance.
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartnerLedger {
    pub partner_id: ContactId,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub opening_balance: Money,
    pub lines: Vec<PartnerLedgerLine>,
    pub closing_balance: Money,
}

impl PartnerLedger {
    /// `opening_balance` is `debit - credit` of everything before `from`.
    pub fn build(
        partner_id: ContactId,
        from: NaiveDate,
        to: NaiveDate,
        opening_balance: Money,
        mut rows: Vec<PartnerLedgerRow>,
    ) -> Self {
        // Stable: lines of one entry keep their stored order.
        rows.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| number_key(&a.entry_number).cmp(&number_key(&b.entry_number)))
        });

        let mut running = opening_balance;
        let lines = rows
            .into_iter()
            .map(|row| {
                running += row.debit - row.credit;
                PartnerLedgerLine {
                    entry_date: row.entry_date,
                    entry_number: row.entry_number,
                    reference: row.reference,
                    description: row.description,
                    account_code: row.account_code,
                    debit: row.debit,
                    credit: row.credit,
                    balance: running,
                }
            })
            .collect();

        Self {
            partner_id,
            from,
            to,
            opening_balance,
            lines,
            closing_balance: running,
        }
    }
}

/// `JE-100000` sorts after `JE-99999`: compare the numeric suffix, not the text.
fn number_key(number: &str) -> (&str, u64, &str) {
    match number.rsplit_once('-') {
        Some((prefix, digits)) => match digits.parse() {
            Ok(n) => (prefix, n, number),
            Err(_) => (number, 0, number),
        },
        None => (number, 0, number),
    }
}

fn net_of(balances: &[AccountBalance], kind: AccountKind) -> Money {
    balances.iter().filter(|b| b.kind == kind).map(AccountBalance::balance).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bal(code: &str, kind: AccountKind, debit: i64, credit: i64) -> AccountBalance {
        AccountBalance {
            code: code.to_string(),
            name: format!("Account {code}"),
            kind,
            debit: Money::from_minor(debit),
            credit: Money::from_minor(credit),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    // Capital 50_000; invoice 11_800 (10_000 + 1_800 tax); bill 5_000; half the invoice collected.
    fn trial() -> Vec<AccountBalance> {
        vec![
            bal("1000", AccountKind::Asset, 50_000 + 5_900, 0),
            bal("1100", AccountKind::Asset, 11_800, 5_900),
            bal("1300", AccountKind::Asset, 0, 0),
            bal("2000", AccountKind::Liability, 0, 5_000),
            bal("2100", AccountKind::Liability, 0, 1_800),
            bal("3000", AccountKind::Equity, 0, 50_000),
            bal("4000", AccountKind::Income, 0, 10_000),
            bal("5000", AccountKind::Expense, 5_000, 0),
        ]
    }

    #[test]
    fn balance_is_signed_by_normal_side() {
        assert_eq!(bal("1000", AccountKind::Asset, 100, 30).balance(), Money::from_minor(70));
        assert_eq!(bal("2000", AccountKind::Liability, 30, 100).balance(), Money::from_minor(70));
    }

    #[test]
    fn balance_sheet_balances_with_current_earnings() {
        let sheet = BalanceSheet::build(day(30), &trial());

        assert_eq!(sheet.assets.total, Money::from_minor(61_800));
        assert_eq!(sheet.assets.lines.len(), 2, "idle accounts are omitted");
        assert_eq!(sheet.liabilities.total, Money::from_minor(6_800));

        let earnings = sheet.equity.lines.last().unwrap();
        assert_eq!(earnings.code, None);
        assert_eq!(earnings.amount, Money::from_minor(5_000));
        assert_eq!(sheet.equity.total, Money::from_minor(55_000));
        assert!(sheet.balanced);
    }

    #[test]
    fn profit_and_loss_nets_income_against_expenses() {
        let pl = ProfitAndLoss::build(day(1), day(30), &trial());
        assert_eq!(pl.income.total, Money::from_minor(10_000));
        assert_eq!(pl.expenses.total, Money::from_minor(5_000));
        assert_eq!(pl.net_profit, Money::from_minor(5_000));
    }

    #[test]
    fn partner_ledger_runs_from_opening_balance() {
        let row = |d: u32, number: &str, debit: i64, credit: i64| PartnerLedgerRow {
            entry_date: day(d),
            entry_number: number.to_string(),
            reference: None,
            description: None,
            account_code: "1100".to_string(),
            debit: Money::from_minor(debit),
            credit: Money::from_minor(credit),
        };
        let rows = vec![row(12, "JE-00003", 0, 400), row(3, "JE-00002", 1_000, 0)];

        let ledger = PartnerLedger::build(ContactId::generate(), day(1), day(30), Money::from_minor(250), rows);
        let balances: Vec<i64> = ledger.lines.iter().map(|l| l.balance.minor()).collect();
        assert_eq!(balances, vec![1_250, 850]);
        assert_eq!(ledger.closing_balance, Money::from_minor(850));
    }

    #[test]
    fn same_day_entries_order_by_sequence_not_text() {
        let row = |number: &str, debit: i64| PartnerLedgerRow {
            entry_date: day(5),
            entry_number: number.to_string(),
            reference: None,
            description: None,
            account_code: "1100".to_string(),
            debit: Money::from_minor(debit),
            credit: Money::ZERO,
        };
        let rows = vec![row("JE-100000", 3), row("JE-99999", 2), row("JE-00007", 1)];

        let ledger = PartnerLedger::build(ContactId::generate(), day(1), day(30), Money::ZERO, rows);
        let numbers: Vec<&str> = ledger.lines.iter().map(|l| l.entry_number.as_str()).collect();
        assert_eq!(numbers, vec!["JE-00007", "JE-99999", "JE-100000"]);
        assert_eq!(ledger.lines[2].balance, Money::from_minor(6));
    }
}
