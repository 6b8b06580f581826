//! Contacts, taxes, products and the chart of accounts.

use sqlx::SqliteConnection;
use tracing::info;

use ledgerly_accounting::{Account, AccountId, NewAccount};
use ledgerly_core::{Page, PageRequest};
use ledgerly_infra::repo::contacts::ContactFilter;
use ledgerly_infra::repo::products::ProductFilter;
use ledgerly_infra::repo::taxes::TaxFilter;
use ledgerly_infra::repo::{accounts, contacts, products, taxes};
use ledgerly_parties::{Contact, ContactId, ContactPatch, NewContact};
use ledgerly_products::{NewProduct, Product, ProductId, ProductPatch};
use ledgerly_tax::{NewTax, Tax, TaxId, TaxPatch, TaxScope};

use super::{referenced, AppServices};
use crate::app::errors::ApiResult;

impl AppServices {
    // -------------------------
    // Contacts
    // -------------------------

    pub async fn create_contact(&self, input: NewContact) -> ApiResult<Contact> {
        let contact = Contact::new(ContactId::generate(), input)?;

        let mut conn = self.db.acquire().await?;
        contacts::insert(&mut conn, &contact).await?;

        info!(contact_id = %contact.id, kind = contact.kind.as_str(), "contact created");
        Ok(contact)
    }

    pub async fn get_contact(&self, id: ContactId) -> ApiResult<Contact> {
        let mut conn = self.db.acquire().await?;
        Ok(contacts::get(&mut conn, id).await?)
    }

    pub async fn list_contacts(&self, filter: &ContactFilter, page: PageRequest) -> ApiResult<Page<Contact>> {
        let mut conn = self.db.acquire().await?;
        Ok(contacts::list(&mut conn, filter, page).await?)
    }

    pub async fn update_contact(&self, id: ContactId, patch: ContactPatch) -> ApiResult<Contact> {
        let mut conn = self.db.acquire().await?;
        let mut contact = contacts::get(&mut conn, id).await?;
        contact.update(patch)?;
        contacts::update(&mut conn, &contact).await?;
        Ok(contact)
    }

    /// Contacts are archived rather than deleted; documents keep pointing at them.
    pub async fn archive_contact(&self, id: ContactId) -> ApiResult<Contact> {
        let mut conn = self.db.acquire().await?;
        let mut contact = contacts::get(&mut conn, id).await?;
        contact.archive()?;
        contacts::update(&mut conn, &contact).await?;

        info!(contact_id = %contact.id, "contact archived");
        Ok(contact)
    }

    // -------------------------
    // Taxes
    // -------------------------

    pub async fn create_tax(&self, input: NewTax) -> ApiResult<Tax> {
        let tax = Tax::new(TaxId::generate(), input)?;

        let mut conn = self.db.acquire().await?;
        taxes::insert(&mut conn, &tax).await?;

        info!(tax_id = %tax.id, name = %tax.name, "tax created");
        Ok(tax)
    }

    pub async fn get_tax(&self, id: TaxId) -> ApiResult<Tax> {
        let mut conn = self.db.acquire().await?;
        Ok(taxes::get(&mut conn, id).await?)
    }

    pub async fn list_taxes(&self, filter: TaxFilter) -> ApiResult<Vec<Tax>> {
        let mut conn = self.db.acquire().await?;
        Ok(taxes::list(&mut conn, filter).await?)
    }

    /// Documents already priced keep their tax snapshot.
    pub async fn update_tax(&self, id: TaxId, patch: TaxPatch) -> ApiResult<Tax> {
        let mut conn = self.db.acquire().await?;
        let mut tax = taxes::get(&mut conn, id).await?;
        tax.update(patch)?;
        taxes::update(&mut conn, &tax).await?;
        Ok(tax)
    }

    pub async fn archive_tax(&self, id: TaxId) -> ApiResult<Tax> {
        let mut conn = self.db.acquire().await?;
        let mut tax = taxes::get(&mut conn, id).await?;
        tax.archive()?;
        taxes::update(&mut conn, &tax).await?;
        Ok(tax)
    }

    // -------------------------
    // Products
    // -------------------------

    pub async fn create_product(&self, input: NewProduct) -> ApiResult<Product> {
        let product = Product::new(ProductId::generate(), input)?;

        let mut conn = self.db.acquire().await?;
        check_default_taxes(&mut conn, &product).await?;
        products::insert(&mut conn, &product).await?;

        info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> ApiResult<Product> {
        let mut conn = self.db.acquire().await?;
        Ok(products::get(&mut conn, id).await?)
    }

    pub async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> ApiResult<Page<Product>> {
        let mut conn = self.db.acquire().await?;
        Ok(products::list(&mut conn, filter, page).await?)
    }

    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> ApiResult<Product> {
        let mut conn = self.db.acquire().await?;
        let mut product = products::get(&mut conn, id).await?;
        product.update(patch)?;
        check_default_taxes(&mut conn, &product).await?;
        products::update(&mut conn, &product).await?;
        Ok(product)
    }

    pub async fn archive_product(&self, id: ProductId) -> ApiResult<Product> {
        let mut conn = self.db.acquire().await?;
        let mut product = products::get(&mut conn, id).await?;
        product.archive()?;
        products::update(&mut conn, &product).await?;
        Ok(product)
    }

    // -------------------------
    // Chart of accounts
    // -------------------------

    pub async fn list_accounts(&self) -> ApiResult<Vec<Account>> {
        let mut conn = self.db.acquire().await?;
        Ok(accounts::list(&mut conn).await?)
    }

    pub async fn get_account(&self, id: AccountId) -> ApiResult<Account> {
        let mut conn = self.db.acquire().await?;
        Ok(accounts::get(&mut conn, id).await?)
    }

    /// Unique codes are enforced by the store (409 on duplicates).
    pub async fn create_account(&self, input: NewAccount) -> ApiResult<Account> {
        let account = Account::new(AccountId::generate(), input)?;

        let mut conn = self.db.acquire().await?;
        accounts::insert(&mut conn, &account).await?;

        info!(code = %account.code, kind = account.kind.as_str(), "account created");
        Ok(account)
    }
}

/// Default taxes must exist, be active and belong to the matching side.
async fn check_default_taxes(conn: &mut SqliteConnection, product: &Product) -> ApiResult<()> {
    let defaults = [
        (product.sales_tax_id, TaxScope::Sales),
        (product.purchase_tax_id, TaxScope::Purchase),
    ];
    for (tax_id, scope) in defaults {
        if let Some(tax_id) = tax_id {
            let tax = referenced(taxes::get(conn, tax_id).await)?;
            tax.ensure_usable_for(scope)?;
        }
    }
    Ok(())
}
