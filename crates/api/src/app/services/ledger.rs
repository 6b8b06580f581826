//! Journal, balances and financial reports.

use chrono::NaiveDate;
use tracing::info;

use ledgerly_accounting::{
    AccountBalance, BalanceSheet, EntryHeader, EntrySource, JournalEntry, JournalEntryId, PartnerLedger,
    ProfitAndLoss,
};
use ledgerly_core::{DomainError, Page, PageRequest};
use ledgerly_infra::repo::{accounts, contacts, ledger, products, reports, sequences};
use ledgerly_parties::ContactId;
use ledgerly_products::StockStatement;

use super::{start_of_year, today, AppServices};
use crate::app::dto::ManualEntryRequest;
use crate::app::errors::ApiResult;

impl AppServices {
    /// Debit and credit totals per account up to `as_of` (default today).
    pub async fn account_balances(&self, as_of: Option<NaiveDate>) -> ApiResult<Vec<AccountBalance>> {
        let mut conn = self.db.acquire().await?;
        Ok(reports::account_balances(&mut conn, None, as_of.unwrap_or_else(today)).await?)
    }

    pub async fn list_journal(&self, page: PageRequest) -> ApiResult<Page<JournalEntry>> {
        let mut conn = self.db.acquire().await?;
        Ok(ledger::list(&mut conn, page).await?)
    }

    pub async fn get_journal_entry(&self, id: JournalEntryId) -> ApiResult<JournalEntry> {
        let mut conn = self.db.acquire().await?;
        Ok(ledger::get(&mut conn, id).await?)
    }

    /// Balanced entry against existing accounts.
    pub async fn post_manual_entry(&self, req: ManualEntryRequest) -> ApiResult<JournalEntry> {
        let mut tx = self.db.begin().await?;

        let missing = accounts::missing_codes(&mut tx, req.lines.iter().map(|l| l.account_code.as_str())).await?;
        if !missing.is_empty() {
            return Err(DomainError::validation(format!("unknown account codes: {}", missing.join(", "))).into());
        }

        let header = EntryHeader {
            id: JournalEntryId::generate(),
            number: sequences::next_number(&mut tx, sequences::JOURNAL_ENTRY).await?,
            entry_date: req.entry_date.unwrap_or_else(today),
            reference: req.reference,
            description: req.description,
        };
        let entry = JournalEntry::new(header, EntrySource::Manual, None, req.lines)?;
        ledger::insert_entry(&mut tx, &entry).await?;
        tx.commit().await?;

        info!(entry = %entry.number, amount = %entry.total_debit(), "manual entry posted");
        Ok(entry)
    }

    // -------------------------
    // Reports
    // -------------------------

    pub async fn balance_sheet(&self, as_of: Option<NaiveDate>) -> ApiResult<BalanceSheet> {
        let as_of = as_of.unwrap_or_else(today);
        let mut conn = self.db.acquire().await?;
        let balances = reports::account_balances(&mut conn, None, as_of).await?;
        Ok(BalanceSheet::build(as_of, &balances))
    }

    /// `from` defaults to the start of `to`'s year, `to` to today.
    pub async fn profit_and_loss(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> ApiResult<ProfitAndLoss> {
        let (from, to) = period(from, to)?;
        let mut conn = self.db.acquire().await?;
        let balances = reports::account_balances(&mut conn, Some(from), to).await?;
        Ok(ProfitAndLoss::build(from, to, &balances))
    }

    pub async fn stock_statement(&self) -> ApiResult<StockStatement> {
        let mut conn = self.db.acquire().await?;
        let goods = products::list_goods(&mut conn).await?;
        let movements = reports::stock_movements(&mut conn).await?;
        Ok(StockStatement::build(&goods, movements)?)
    }

    pub async fn partner_ledger(
        &self,
        partner_id: ContactId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ApiResult<PartnerLedger> {
        let (from, to) = period(from, to)?;
        let mut conn = self.db.acquire().await?;
        let partner = contacts::get(&mut conn, partner_id).await?;

        let opening = reports::partner_opening_balance(&mut conn, partner.id, from).await?;
        let rows = reports::partner_rows(&mut conn, partner.id, from, to).await?;
        Ok(PartnerLedger::build(partner.id, from, to, opening, rows))
    }
}

fn period(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ApiResult<(NaiveDate, NaiveDate)> {
    let to = to.unwrap_or_else(today);
    let from = from.unwrap_or_else(|| start_of_year(to));
    if from > to {
        return Err(DomainError::validation(format!("from ({from}) is after to ({to})")).into());
    }
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn period_defaults_to_year_to_date() {
        let (from, to) = period(None, Some(d(2024, 6, 30))).unwrap();
        assert_eq!(from, d(2024, 1, 1));
        assert_eq!(to, d(2024, 6, 30));
    }

    #[test]
    fn period_rejects_inverted_range() {
        assert!(period(Some(d(2024, 7, 1)), Some(d(2024, 6, 30))).is_err());
    }
}
