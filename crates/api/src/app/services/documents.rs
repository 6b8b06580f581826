//! Purchase orders, sales orders, invoices, bills and payments.

use sqlx::SqliteConnection;
use tracing::info;

use ledgerly_accounting::{invoice_entry, payment_entry, EntryHeader, EntrySource, JournalEntryId};
use ledgerly_core::{OrderStatus, Page, PageRequest};
use ledgerly_infra::repo::invoices::InvoiceFilter;
use ledgerly_infra::repo::{contacts, invoices, ledger, payments, purchase_orders, sales_orders, sequences};
use ledgerly_infra::StoreError;
use ledgerly_invoicing::{
    Invoice, InvoiceHeader, InvoiceHeaderPatch, InvoiceId, InvoiceKind, InvoiceStatus, NewPayment, Payment,
    PaymentId,
};
use ledgerly_parties::{Contact, ContactId};
use ledgerly_products::TradeSide;
use ledgerly_purchasing::{PurchaseOrder, PurchaseOrderId, PurchaseOrderPatch};
use ledgerly_sales::{SalesOrder, SalesOrderId, SalesOrderPatch};

use super::{price_lines, referenced, today, AppServices};
use crate::app::dto::{
    ConvertRequest, CreateInvoiceRequest, CreateOrderRequest, RegisterPaymentRequest, UpdateInvoiceRequest,
    UpdateOrderRequest,
};
use crate::app::errors::ApiResult;

impl AppServices {
    // -------------------------
    // Purchase orders
    // -------------------------

    pub async fn create_purchase_order(&self, req: CreateOrderRequest) -> ApiResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;
        let vendor = referenced(contacts::get(&mut tx, req.partner_id).await)?;
        let lines = price_lines(&mut tx, &req.lines, TradeSide::Purchase).await?;
        let number = sequences::next_number(&mut tx, sequences::PURCHASE_ORDER).await?;

        let order = PurchaseOrder::new(
            PurchaseOrderId::generate(),
            number,
            &vendor,
            req.order_date.unwrap_or_else(today),
            req.reference,
            lines,
        )?;
        purchase_orders::insert(&mut tx, &order).await?;
        tx.commit().await?;

        info!(order = %order.number, vendor_id = %order.vendor_id, "purchase order created");
        Ok(order)
    }

    pub async fn get_purchase_order(&self, id: PurchaseOrderId) -> ApiResult<PurchaseOrder> {
        let mut conn = self.db.acquire().await?;
        Ok(purchase_orders::get(&mut conn, id).await?)
    }

    pub async fn list_purchase_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> ApiResult<Page<PurchaseOrder>> {
        let mut conn = self.db.acquire().await?;
        Ok(purchase_orders::list(&mut conn, status, page).await?)
    }

    pub async fn update_purchase_order(&self, id: PurchaseOrderId, req: UpdateOrderRequest) -> ApiResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;
        let mut order = purchase_orders::get(&mut tx, id).await?;
        let prior = order.status;
        let vendor = load_partner(&mut tx, req.partner_id).await?;
        let lines = match &req.lines {
            Some(drafts) => Some(price_lines(&mut tx, drafts, TradeSide::Purchase).await?),
            None => None,
        };

        order.update(
            vendor.as_ref(),
            PurchaseOrderPatch {
                order_date: req.order_date,
                reference: req.reference,
                lines,
            },
        )?;
        purchase_orders::update(&mut tx, &order, prior).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn confirm_purchase_order(&self, id: PurchaseOrderId) -> ApiResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;
        let mut order = purchase_orders::get(&mut tx, id).await?;
        let prior = order.status;
        order.confirm()?;
        purchase_orders::update(&mut tx, &order, prior).await?;
        tx.commit().await?;

        info!(order = %order.number, "purchase order confirmed");
        Ok(order)
    }

    pub async fn cancel_purchase_order(&self, id: PurchaseOrderId) -> ApiResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;
        let mut order = purchase_orders::get(&mut tx, id).await?;
        let prior = order.status;
        order.cancel()?;
        purchase_orders::update(&mut tx, &order, prior).await?;
        tx.commit().await?;

        info!(order = %order.number, "purchase order cancelled");
        Ok(order)
    }

    /// Turn a confirmed order into a draft vendor bill carrying the same lines.
    pub async fn convert_purchase_order(
        &self,
        id: PurchaseOrderId,
        req: ConvertRequest,
    ) -> ApiResult<(PurchaseOrder, Invoice)> {
        let mut tx = self.db.begin().await?;
        let mut order = purchase_orders::get(&mut tx, id).await?;
        let prior = order.status;
        let number = sequences::next_number(&mut tx, InvoiceKind::VendorBill.number_prefix()).await?;

        let bill_id = InvoiceId::generate();
        let bill = order.to_vendor_bill(bill_id, number, req.invoice_date.unwrap_or_else(today), req.due_date)?;
        order.convert(bill_id)?;

        invoices::insert(&mut tx, &bill).await?;
        purchase_orders::update(&mut tx, &order, prior).await?;
        tx.commit().await?;

        info!(order = %order.number, bill = %bill.number, "purchase order converted");
        Ok((order, bill))
    }

    // -------------------------
    // Sales orders
    // -------------------------

    pub async fn create_sales_order(&self, req: CreateOrderRequest) -> ApiResult<SalesOrder> {
        let mut tx = self.db.begin().await?;
        let customer = referenced(contacts::get(&mut tx, req.partner_id).await)?;
        let lines = price_lines(&mut tx, &req.lines, TradeSide::Sales).await?;
        let number = sequences::next_number(&mut tx, sequences::SALES_ORDER).await?;

        let order = SalesOrder::new(
            SalesOrderId::generate(),
            number,
            &customer,
            req.order_date.unwrap_or_else(today),
            req.reference,
            lines,
        )?;
        sales_orders::insert(&mut tx, &order).await?;
        tx.commit().await?;

        info!(order = %order.number, customer_id = %order.customer_id, "sales order created");
        Ok(order)
    }

    pub async fn get_sales_order(&self, id: SalesOrderId) -> ApiResult<SalesOrder> {
        let mut conn = self.db.acquire().await?;
        Ok(sales_orders::get(&mut conn, id).await?)
    }

    pub async fn list_sales_orders(&self, status: Option<OrderStatus>, page: PageRequest) -> ApiResult<Page<SalesOrder>> {
        let mut conn = self.db.acquire().await?;
        Ok(sales_orders::list(&mut conn, status, page).await?)
    }

    pub async fn update_sales_order(&self, id: SalesOrderId, req: UpdateOrderRequest) -> ApiResult<SalesOrder> {
        let mut tx = self.db.begin().await?;
        let mut order = sales_orders::get(&mut tx, id).await?;
        let prior = order.status;
        let customer = load_partner(&mut tx, req.partner_id).await?;
        let lines = match &req.lines {
            Some(drafts) => Some(price_lines(&mut tx, drafts, TradeSide::Sales).await?),
            None => None,
        };

        order.update(
            customer.as_ref(),
            SalesOrderPatch {
                order_date: req.order_date,
                reference: req.reference,
                lines,
            },
        )?;
        sales_orders::update(&mut tx, &order, prior).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn confirm_sales_order(&self, id: SalesOrderId) -> ApiResult<SalesOrder> {
        let mut tx = self.db.begin().await?;
        let mut order = sales_orders::get(&mut tx, id).await?;
        let prior = order.status;
        order.confirm()?;
        sales_orders::update(&mut tx, &order, prior).await?;
        tx.commit().await?;

        info!(order = %order.number, "sales order confirmed");
        Ok(order)
    }

    pub async fn cancel_sales_order(&self, id: SalesOrderId) -> ApiResult<SalesOrder> {
        let mut tx = self.db.begin().await?;
        let mut order = sales_orders::get(&mut tx, id).await?;
        let prior = order.status;
        order.cancel()?;
        sales_orders::update(&mut tx, &order, prior).await?;
        tx.commit().await?;

        info!(order = %order.number, "sales order cancelled");
        Ok(order)
    }

    pub async fn convert_sales_order(&self, id: SalesOrderId, req: ConvertRequest) -> ApiResult<(SalesOrder, Invoice)> {
        let mut tx = self.db.begin().await?;
        let mut order = sales_orders::get(&mut tx, id).await?;
        let prior = order.status;
        let number = sequences::next_number(&mut tx, InvoiceKind::CustomerInvoice.number_prefix()).await?;

        let invoice_id = InvoiceId::generate();
        let invoice =
            order.to_customer_invoice(invoice_id, number, req.invoice_date.unwrap_or_else(today), req.due_date)?;
        order.convert(invoice_id)?;

        invoices::insert(&mut tx, &invoice).await?;
        sales_orders::update(&mut tx, &order, prior).await?;
        tx.commit().await?;

        info!(order = %order.number, invoice = %invoice.number, "sales order converted");
        Ok((order, invoice))
    }

    // -------------------------
    // Customer invoices and vendor bills
    // -------------------------

    pub async fn create_invoice(&self, kind: InvoiceKind, req: CreateInvoiceRequest) -> ApiResult<Invoice> {
        let mut tx = self.db.begin().await?;
        let partner = referenced(contacts::get(&mut tx, req.partner_id).await)?;
        ensure_partner_side(kind, &partner)?;
        let lines = price_lines(&mut tx, &req.lines, kind.side()).await?;
        let number = sequences::next_number(&mut tx, kind.number_prefix()).await?;

        let invoice = Invoice::draft(
            InvoiceId::generate(),
            kind,
            number,
            InvoiceHeader {
                partner_id: partner.id,
                invoice_date: req.invoice_date.unwrap_or_else(today),
                due_date: req.due_date,
                reference: req.reference,
            },
            lines,
            None,
        )?;
        invoices::insert(&mut tx, &invoice).await?;
        tx.commit().await?;

        info!(invoice = %invoice.number, kind = kind.as_str(), "invoice drafted");
        Ok(invoice)
    }

    pub async fn get_invoice(&self, kind: InvoiceKind, id: InvoiceId) -> ApiResult<Invoice> {
        let mut conn = self.db.acquire().await?;
        load_invoice(&mut conn, kind, id).await
    }

    pub async fn list_invoices(&self, filter: InvoiceFilter, page: PageRequest) -> ApiResult<Page<Invoice>> {
        let mut conn = self.db.acquire().await?;
        Ok(invoices::list(&mut conn, filter, page).await?)
    }

    /// Drafts only; confirmed documents are immutable apart from payments.
    pub async fn update_invoice(&self, kind: InvoiceKind, id: InvoiceId, req: UpdateInvoiceRequest) -> ApiResult<Invoice> {
        let mut tx = self.db.begin().await?;
        let mut invoice = load_invoice(&mut tx, kind, id).await?;
        if let Some(partner) = load_partner(&mut tx, req.partner_id).await? {
            ensure_partner_side(kind, &partner)?;
        }
        let lines = match &req.lines {
            Some(drafts) => Some(price_lines(&mut tx, drafts, kind.side()).await?),
            None => None,
        };

        invoice.update_header(InvoiceHeaderPatch {
            partner_id: req.partner_id,
            invoice_date: req.invoice_date,
            due_date: req.due_date,
            reference: req.reference,
        })?;
        if let Some(lines) = lines {
            invoice.replace_lines(lines)?;
        }
        invoices::update(&mut tx, &invoice).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    /// Confirm and post to the journal in one transaction.
    pub async fn confirm_invoice(&self, kind: InvoiceKind, id: InvoiceId) -> ApiResult<Invoice> {
        let mut tx = self.db.begin().await?;
        let mut invoice = load_invoice(&mut tx, kind, id).await?;
        invoice.confirm()?;

        let header = EntryHeader {
            id: JournalEntryId::generate(),
            number: sequences::next_number(&mut tx, sequences::JOURNAL_ENTRY).await?,
            entry_date: invoice.invoice_date,
            reference: None,
            description: None,
        };
        let entry = invoice_entry(header, &invoice)?;

        invoices::update(&mut tx, &invoice).await?;
        ledger::insert_entry(&mut tx, &entry).await?;
        tx.commit().await?;

        info!(invoice = %invoice.number, entry = %entry.number, total = %invoice.totals.total, "invoice posted");
        Ok(invoice)
    }

    /// Cancelling a posted document adds a reversing entry dated today.
    pub async fn cancel_invoice(&self, kind: InvoiceKind, id: InvoiceId) -> ApiResult<Invoice> {
        let mut tx = self.db.begin().await?;
        let mut invoice = load_invoice(&mut tx, kind, id).await?;
        let was_posted = invoice.cancel()?;

        if was_posted {
            let original = ledger::posting_for(&mut tx, posting_source(kind), invoice.id.0)
                .await?
                .ok_or_else(|| StoreError::Corrupt(format!("{} has no journal entry", invoice.number)))?;
            let header = EntryHeader {
                id: JournalEntryId::generate(),
                number: sequences::next_number(&mut tx, sequences::JOURNAL_ENTRY).await?,
                entry_date: today(),
                reference: Some(invoice.number.clone()),
                description: None,
            };
            let reversal = original.reversal(header)?;
            ledger::insert_entry(&mut tx, &reversal).await?;
            info!(invoice = %invoice.number, entry = %reversal.number, "posting reversed");
        }

        invoices::update(&mut tx, &invoice).await?;
        tx.commit().await?;

        info!(invoice = %invoice.number, "invoice cancelled");
        Ok(invoice)
    }

    // -------------------------
    // Payments
    // -------------------------

    /// Record a payment, settle the document and post the cash movement.
    pub async fn register_payment(
        &self,
        kind: InvoiceKind,
        id: InvoiceId,
        req: RegisterPaymentRequest,
    ) -> ApiResult<(Payment, Invoice)> {
        let mut tx = self.db.begin().await?;
        let mut invoice = load_invoice(&mut tx, kind, id).await?;

        let number = sequences::next_number(&mut tx, sequences::PAYMENT).await?;
        let payment = Payment::register(
            PaymentId::generate(),
            number,
            &mut invoice,
            NewPayment {
                amount: req.amount,
                method: req.method,
                payment_date: req.payment_date.unwrap_or_else(today),
                memo: req.memo,
            },
        )?;

        let header = EntryHeader {
            id: JournalEntryId::generate(),
            number: sequences::next_number(&mut tx, sequences::JOURNAL_ENTRY).await?,
            entry_date: payment.payment_date,
            reference: Some(payment.number.clone()),
            description: Some(format!("Payment for {}", invoice.number)),
        };
        let entry = payment_entry(header, &payment)?;

        payments::insert(&mut tx, &payment).await?;
        invoices::update(&mut tx, &invoice).await?;
        ledger::insert_entry(&mut tx, &entry).await?;
        tx.commit().await?;

        info!(
            payment = %payment.number,
            invoice = %invoice.number,
            amount = %payment.amount,
            status = invoice.payment_status.as_str(),
            "payment registered"
        );
        Ok((payment, invoice))
    }

    pub async fn list_invoice_payments(&self, kind: InvoiceKind, id: InvoiceId) -> ApiResult<Vec<Payment>> {
        let mut conn = self.db.acquire().await?;
        let invoice = load_invoice(&mut conn, kind, id).await?;
        Ok(payments::list_for_invoice(&mut conn, invoice.id).await?)
    }

    pub async fn list_payments(&self, partner_id: Option<ContactId>, page: PageRequest) -> ApiResult<Page<Payment>> {
        let mut conn = self.db.acquire().await?;
        Ok(payments::list(&mut conn, partner_id, page).await?)
    }

    // -------------------------
    // Portal
    // -------------------------

    /// Confirmed documents addressed to a portal user's contact.
    pub async fn portal_invoices(&self, contact_id: ContactId, page: PageRequest) -> ApiResult<Page<Invoice>> {
        let filter = InvoiceFilter {
            kind: None,
            status: Some(InvoiceStatus::Confirmed),
            partner_id: Some(contact_id),
        };
        self.list_invoices(filter, page).await
    }
}

/// A document of the other kind is reported as missing.
async fn load_invoice(conn: &mut SqliteConnection, kind: InvoiceKind, id: InvoiceId) -> ApiResult<Invoice> {
    let invoice = invoices::get(conn, id).await?;
    if invoice.kind != kind {
        return Err(StoreError::not_found(kind.as_str(), id).into());
    }
    Ok(invoice)
}

async fn load_partner(conn: &mut SqliteConnection, id: Option<ContactId>) -> ApiResult<Option<Contact>> {
    match id {
        Some(id) => Ok(Some(referenced(contacts::get(conn, id).await)?)),
        None => Ok(None),
    }
}

fn ensure_partner_side(kind: InvoiceKind, partner: &Contact) -> ApiResult<()> {
    match kind {
        InvoiceKind::CustomerInvoice => partner.ensure_customer()?,
        InvoiceKind::VendorBill => partner.ensure_vendor()?,
    }
    Ok(())
}

fn posting_source(kind: InvoiceKind) -> EntrySource {
    match kind {
        InvoiceKind::CustomerInvoice => EntrySource::CustomerInvoice,
        InvoiceKind::VendorBill => EntrySource::VendorBill,
    }
}
