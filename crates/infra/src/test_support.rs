//! Fixtures for repository tests.

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use ledgerly_core::Money;
use ledgerly_invoicing::{DocumentLine, Invoice, InvoiceHeader, InvoiceId, InvoiceKind, LineDraft};
use ledgerly_parties::{Contact, ContactId, ContactInfo, ContactKind, NewContact};
use ledgerly_products::{NewProduct, Product, ProductId, ProductKind, TradeSide};
use ledgerly_tax::{NewTax, Tax, TaxComputation, TaxId, TaxScope};

use crate::db::Database;
use crate::repo::{contacts, products, taxes};

pub(crate) async fn memory_db() -> Database {
    Database::in_memory().await.expect("in-memory database")
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn contact(name: &str, kind: ContactKind) -> Contact {
    Contact::new(
        ContactId::generate(),
        NewContact {
            name: name.to_string(),
            kind,
            info: ContactInfo::default(),
            gstin: None,
        },
    )
    .unwrap()
}

pub(crate) fn percent_tax(name: &str, bps: i64, scope: TaxScope) -> Tax {
    Tax::new(
        TaxId::generate(),
        NewTax {
            name: name.to_string(),
            computation: TaxComputation::Percentage,
            value: bps,
            scope,
        },
    )
    .unwrap()
}

pub(crate) fn goods(name: &str, sales_price: i64) -> Product {
    Product::new(
        ProductId::generate(),
        NewProduct {
            name: name.to_string(),
            kind: ProductKind::Goods,
            category: None,
            hsn_code: None,
            sales_price: Money::from_minor(sales_price),
            purchase_price: Money::from_minor(sales_price * 3 / 5),
            sales_tax_id: None,
            purchase_tax_id: None,
        },
    )
    .unwrap()
}

pub(crate) struct Masters {
    pub customer: Contact,
    pub vendor: Contact,
    /// Sells at 1000, buys at 600, 18% GST on both sides.
    pub widget: Product,
    pub sales_gst: Tax,
    pub purchase_gst: Tax,
}

pub(crate) async fn seed_masters(conn: &mut SqliteConnection) -> Masters {
    let customer = contact("Acme Traders", ContactKind::Customer);
    let vendor = contact("Bolt Supplies", ContactKind::Vendor);
    let sales_gst = percent_tax("GST 18%", 1800, TaxScope::Sales);
    let purchase_gst = percent_tax("GST 18% (input)", 1800, TaxScope::Purchase);
    let mut widget = goods("Widget", 1_000);
    widget.sales_tax_id = Some(sales_gst.id);
    widget.purchase_tax_id = Some(purchase_gst.id);

    contacts::insert(conn, &customer).await.unwrap();
    contacts::insert(conn, &vendor).await.unwrap();
    taxes::insert(conn, &sales_gst).await.unwrap();
    taxes::insert(conn, &purchase_gst).await.unwrap();
    products::insert(conn, &widget).await.unwrap();

    Masters {
        customer,
        vendor,
        widget,
        sales_gst,
        purchase_gst,
    }
}

pub(crate) fn priced(product: &Product, quantity: i64, side: TradeSide, tax: Option<&Tax>) -> DocumentLine {
    let draft = LineDraft {
        product_id: product.id,
        description: None,
        quantity,
        unit_price: None,
        tax_id: None,
    };
    DocumentLine::price(1, &draft, product, side, tax).unwrap()
}

/// Draft dated 2024-04-01 with one widget line.
pub(crate) fn draft_invoice(masters: &Masters, kind: InvoiceKind, number: &str, quantity: i64) -> Invoice {
    let (partner, tax) = match kind {
        InvoiceKind::CustomerInvoice => (&masters.customer, &masters.sales_gst),
        InvoiceKind::VendorBill => (&masters.vendor, &masters.purchase_gst),
    };
    Invoice::draft(
        InvoiceId::generate(),
        kind,
        number.to_string(),
        InvoiceHeader {
            partner_id: partner.id,
            invoice_date: date(2024, 4, 1),
            due_date: None,
            reference: None,
        },
        vec![priced(&masters.widget, quantity, kind.side(), Some(tax))],
        None,
    )
    .unwrap()
}
