use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

use ledgerly_core::{Page, PageRequest};
use ledgerly_parties::{Contact, ContactId, ContactInfo, ContactKind};

use super::{parse, push_search};
use crate::error::{StoreError, StoreResult};

const COLUMNS: &str = "id, name, kind, email, phone, address, gstin, status";

#[derive(Debug, Clone, Default)]
pub struct ContactFilter {
    /// Matches name, email or GSTIN.
    pub search: Option<String>,
    /// `customer` and `vendor` also match contacts of kind `both`.
    pub kind: Option<ContactKind>,
    pub include_archived: bool,
}

#[derive(Debug, FromRow)]
struct ContactRow {
    id: String,
    name: String,
    kind: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    gstin: Option<String>,
    status: String,
}

impl TryFrom<ContactRow> for Contact {
    type Error = StoreError;

    fn try_from(row: ContactRow) -> StoreResult<Self> {
        Ok(Contact {
            id: parse(&row.id)?,
            name: row.name,
            kind: parse(&row.kind)?,
            info: ContactInfo {
                email: row.email,
                phone: row.phone,
                address: row.address,
            },
            gstin: row.gstin,
            status: parse(&row.status)?,
        })
    }
}

#[instrument(skip(conn, contact), fields(contact_id = %contact.id), err)]
pub async fn insert(conn: &mut SqliteConnection, contact: &Contact) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO contacts (id, name, kind, email, phone, address, gstin, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(contact.id.to_string())
    .bind(&contact.name)
    .bind(contact.kind.as_str())
    .bind(&contact.info.email)
    .bind(&contact.info.phone)
    .bind(&contact.info.address)
    .bind(&contact.gstin)
    .bind(contact.status.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[instrument(skip(conn, contact), fields(contact_id = %contact.id), err)]
pub async fn update(conn: &mut SqliteConnection, contact: &Contact) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET name = ?, kind = ?, email = ?, phone = ?, address = ?, gstin = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(&contact.name)
    .bind(contact.kind.as_str())
    .bind(&contact.info.email)
    .bind(&contact.info.phone)
    .bind(&contact.info.address)
    .bind(&contact.gstin)
    .bind(contact.status.as_str())
    .bind(contact.id.to_string())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("contact", contact.id));
    }
    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: ContactId) -> StoreResult<Contact> {
    let row: Option<ContactRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM contacts WHERE id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| StoreError::not_found("contact", id))?.try_into()
}

pub async fn list(conn: &mut SqliteConnection, filter: &ContactFilter, page: PageRequest) -> StoreResult<Page<Contact>> {
    let total: i64 = filtered("SELECT COUNT(*) FROM contacts", filter)
        .build_query_scalar()
        .fetch_one(&mut *conn)
        .await?;

    let mut qb = filtered(&format!("SELECT {COLUMNS} FROM contacts"), filter);
    qb.push(" ORDER BY name COLLATE NOCASE, id LIMIT ")
        .push_bind(page.limit as i64)
        .push(" OFFSET ")
        .push_bind(page.offset());
    let rows: Vec<ContactRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    let items = rows.into_iter().map(Contact::try_from).collect::<StoreResult<Vec<_>>>()?;
    Ok(Page::new(items, page, total as u64))
}

fn filtered<'a>(select: &str, filter: &'a ContactFilter) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(select);
    qb.push(" WHERE 1 = 1");
    if !filter.include_archived {
        qb.push(" AND status = 'active'");
    }
    if let Some(kind) = filter.kind {
        qb.push(" AND kind IN (")
            .push_bind(kind.as_str())
            .push(", 'both')");
    }
    if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
        push_search(&mut qb, &["name", "email", "gstin"], term);
    }
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{contact, memory_db};

    #[tokio::test]
    async fn insert_get_and_update() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let mut acme = contact("Acme Traders", ContactKind::Customer);
        insert(&mut conn, &acme).await.unwrap();
        assert_eq!(get(&mut conn, acme.id).await.unwrap(), acme);

        acme.archive().unwrap();
        update(&mut conn, &acme).await.unwrap();
        assert!(!get(&mut conn, acme.id).await.unwrap().is_active());
    }

    #[tokio::test]
    async fn missing_contact_is_not_found() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        let err = get(&mut conn, ContactId::generate()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_filters_by_kind_search_and_status() {
        let db = memory_db().await;
        let mut conn = db.acquire().await.unwrap();

        insert(&mut conn, &contact("Acme Traders", ContactKind::Customer)).await.unwrap();
        insert(&mut conn, &contact("Bolt Supplies", ContactKind::Vendor)).await.unwrap();
        insert(&mut conn, &contact("Crest Retail", ContactKind::Both)).await.unwrap();
        let mut gone = contact("Acme Old", ContactKind::Customer);
        gone.archive().unwrap();
        insert(&mut conn, &gone).await.unwrap();

        let customers = ContactFilter {
            kind: Some(ContactKind::Customer),
            ..ContactFilter::default()
        };
        let page = list(&mut conn, &customers, PageRequest::default()).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Traders", "Crest Retail"]);

        let search = ContactFilter {
            search: Some("ACME".to_string()),
            include_archived: true,
            ..ContactFilter::default()
        };
        let page = list(&mut conn, &search, PageRequest::new(Some(1), Some(1))).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
    }
}
