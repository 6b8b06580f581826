use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use ledgerly_accounting::JournalLine;
use ledgerly_auth::{Role, User};
use ledgerly_core::{Money, PageRequest};
use ledgerly_invoicing::{DocumentLine, Invoice, LineDraft, Payment, PaymentMethod};
use ledgerly_parties::{Contact, ContactId, ContactInfo, ContactKind, NewContact};
use ledgerly_products::{NewProduct, Product, ProductKind, ProductPatch};
use ledgerly_purchasing::PurchaseOrder;
use ledgerly_sales::SalesOrder;
use ledgerly_tax::{Tax, TaxId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub contact_id: Option<ContactId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Shared by `/contacts` and `/products`.
#[derive(Debug, Default, Deserialize)]
pub struct MasterListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub kind: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

impl MasterListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TaxListQuery {
    pub scope: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub partner_id: Option<String>,
}

impl DocumentListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub kind: ContactKind,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gstin: Option<String>,
}

impl From<CreateContactRequest> for NewContact {
    fn from(req: CreateContactRequest) -> Self {
        NewContact {
            name: req.name,
            kind: req.kind,
            info: ContactInfo {
                email: req.email,
                phone: req.phone,
                address: req.address,
            },
            gstin: req.gstin,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub kind: ProductKind,
    pub category: Option<String>,
    pub hsn_code: Option<String>,
    #[serde(default)]
    pub sales_price: Money,
    #[serde(default)]
    pub purchase_price: Money,
    pub sales_tax_id: Option<TaxId>,
    pub purchase_tax_id: Option<TaxId>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        NewProduct {
            name: req.name,
            kind: req.kind,
            category: req.category,
            hsn_code: req.hsn_code,
            sales_price: req.sales_price,
            purchase_price: req.purchase_price,
            sales_tax_id: req.sales_tax_id,
            purchase_tax_id: req.purchase_tax_id,
        }
    }
}

/// `"sales_tax_id": null` clears the default tax; omitting the field keeps it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub kind: Option<ProductKind>,
    pub category: Option<String>,
    pub hsn_code: Option<String>,
    pub sales_price: Option<Money>,
    pub purchase_price: Option<Money>,
    #[serde(default, deserialize_with = "double_option")]
    pub sales_tax_id: Option<Option<TaxId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_tax_id: Option<Option<TaxId>>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        ProductPatch {
            name: req.name,
            kind: req.kind,
            category: req.category,
            hsn_code: req.hsn_code,
            sales_price: req.sales_price,
            purchase_price: req.purchase_price,
            sales_tax_id: req.sales_tax_id,
            purchase_tax_id: req.purchase_tax_id,
        }
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub partner_id: ContactId,
    /// Defaults to today.
    pub order_date: Option<NaiveDate>,
    pub reference: Option<String>,
    #[serde(default)]
    pub lines: Vec<LineDraft>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateOrderRequest {
    pub partner_id: Option<ContactId>,
    pub order_date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub lines: Option<Vec<LineDraft>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertRequest {
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub partner_id: ContactId,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub reference: Option<String>,
    #[serde(default)]
    pub lines: Vec<LineDraft>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateInvoiceRequest {
    pub partner_id: Option<ContactId>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub lines: Option<Vec<LineDraft>>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPaymentRequest {
    pub amount: Money,
    pub method: PaymentMethod,
    pub payment_date: Option<NaiveDate>,
    pub memo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ManualEntryRequest {
    pub entry_date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub lines: Vec<JournalLine>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PartnerLedgerQuery {
    pub partner_id: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn token_to_json(token: String, expires_in: i64, user: User) -> Value {
    json!({
        "token": token,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "user": user_to_json(user),
    })
}

/// Never includes the password hash.
pub fn user_to_json(user: User) -> Value {
    json!({
        "id": user.id.to_string(),
        "name": user.name,
        "email": user.email,
        "role": user.role.as_str(),
        "contact_id": user.contact_id.map(|c| c.to_string()),
        "created_at": user.created_at.to_rfc3339(),
    })
}

pub fn contact_to_json(contact: Contact) -> Value {
    json!({
        "id": contact.id.to_string(),
        "name": contact.name,
        "kind": contact.kind.as_str(),
        "email": contact.info.email,
        "phone": contact.info.phone,
        "address": contact.info.address,
        "gstin": contact.gstin,
        "status": contact.status.as_str(),
    })
}

pub fn product_to_json(product: Product) -> Value {
    json!({
        "id": product.id.to_string(),
        "name": product.name,
        "kind": product.kind.as_str(),
        "category": product.category,
        "hsn_code": product.hsn_code,
        "sales_price": product.sales_price,
        "purchase_price": product.purchase_price,
        "sales_tax_id": product.sales_tax_id.map(|t| t.to_string()),
        "purchase_tax_id": product.purchase_tax_id.map(|t| t.to_string()),
        "status": product.status.as_str(),
    })
}

pub fn tax_to_json(tax: Tax) -> Value {
    json!({
        "id": tax.id.to_string(),
        "name": tax.name,
        "computation": tax.rule.computation.as_str(),
        "value": tax.rule.value,
        "scope": tax.scope.as_str(),
        "active": tax.active,
    })
}

pub fn line_to_json(line: DocumentLine) -> Value {
    json!({
        "line_no": line.line_no,
        "product_id": line.product_id.to_string(),
        "description": line.description,
        "quantity": line.quantity,
        "unit_price": line.unit_price,
        "tax": line.tax.map(|t| json!({
            "tax_id": t.tax_id.to_string(),
            "name": t.name,
            "computation": t.rule.computation.as_str(),
            "value": t.rule.value,
        })),
        "subtotal": line.amounts.subtotal,
        "tax_amount": line.amounts.tax,
        "total": line.amounts.total,
    })
}

fn lines_to_json(lines: Vec<DocumentLine>) -> Vec<Value> {
    lines.into_iter().map(line_to_json).collect()
}

pub fn purchase_order_to_json(order: PurchaseOrder) -> Value {
    json!({
        "id": order.id.to_string(),
        "number": order.number,
        "vendor_id": order.vendor_id.to_string(),
        "order_date": order.order_date,
        "reference": order.reference,
        "status": order.status.as_str(),
        "lines": lines_to_json(order.lines),
        "subtotal": order.totals.subtotal,
        "tax_total": order.totals.tax_total,
        "total": order.totals.total,
        "bill_id": order.bill_id.map(|b| b.to_string()),
    })
}

pub fn sales_order_to_json(order: SalesOrder) -> Value {
    json!({
        "id": order.id.to_string(),
        "number": order.number,
        "customer_id": order.customer_id.to_string(),
        "order_date": order.order_date,
        "reference": order.reference,
        "status": order.status.as_str(),
        "lines": lines_to_json(order.lines),
        "subtotal": order.totals.subtotal,
        "tax_total": order.totals.tax_total,
        "total": order.totals.total,
        "invoice_id": order.invoice_id.map(|i| i.to_string()),
    })
}

pub fn invoice_to_json(invoice: Invoice) -> Value {
    let outstanding = invoice.outstanding();
    json!({
        "id": invoice.id.to_string(),
        "kind": invoice.kind.as_str(),
        "number": invoice.number,
        "partner_id": invoice.partner_id.to_string(),
        "source_order_id": invoice.source_order_id.map(|o| o.to_string()),
        "invoice_date": invoice.invoice_date,
        "due_date": invoice.due_date,
        "reference": invoice.reference,
        "status": invoice.status.as_str(),
        "payment_status": invoice.payment_status.as_str(),
        "lines": lines_to_json(invoice.lines),
        "subtotal": invoice.totals.subtotal,
        "tax_total": invoice.totals.tax_total,
        "total": invoice.totals.total,
        "amount_paid": invoice.amount_paid,
        "outstanding": outstanding,
    })
}

pub fn payment_to_json(payment: Payment) -> Value {
    json!({
        "id": payment.id.to_string(),
        "number": payment.number,
        "invoice_id": payment.invoice_id.to_string(),
        "partner_id": payment.partner_id.to_string(),
        "direction": payment.direction.as_str(),
        "method": payment.method.as_str(),
        "amount": payment.amount,
        "payment_date": payment.payment_date,
        "memo": payment.memo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_patch_distinguishes_null_from_missing() {
        let cleared: UpdateProductRequest = serde_json::from_value(json!({ "sales_tax_id": null })).unwrap();
        assert_eq!(cleared.sales_tax_id, Some(None));
        assert_eq!(cleared.purchase_tax_id, None);

        let untouched: UpdateProductRequest = serde_json::from_value(json!({ "name": "Bolt" })).unwrap();
        assert_eq!(untouched.sales_tax_id, None);
    }

    #[test]
    fn contact_request_nests_reachability() {
        let req: CreateContactRequest = serde_json::from_value(json!({
            "name": "Acme",
            "kind": "customer",
            "email": "billing@acme.test",
        }))
        .unwrap();
        let new: NewContact = req.into();
        assert_eq!(new.info.email.as_deref(), Some("billing@acme.test"));
        assert_eq!(new.kind, ContactKind::Customer);
    }
}
