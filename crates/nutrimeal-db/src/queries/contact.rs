use nutrimeal_types::models::ContactQuery;
use tracing::info;
use uuid::Uuid;

use crate::Database;
use crate::error::StoreError;
use crate::models::{QueryRow, now_timestamp};
use crate::queries::required;

impl Database {
    // -- Contact queries --

    pub fn submit_query(&self, name: Option<&str>, email: Option<&str>, message: Option<&str>) -> Result<Uuid, StoreError> {
        let name = required(name, "name")?;
        let email = required(email, "email")?;
        let message = required(message, "message")?;

        self.with_conn_mut(|conn| {
            let id = Uuid::new_v4();
            conn.execute(
                "INSERT INTO queries (id, name, email, message, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'new', ?5)",
                (id.to_string(), &name, &email, &message, now_timestamp()),
            )?;
            Ok(id)
        })
    }

    pub fn list_queries(&self) -> Result<Vec<ContactQuery>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, message, status, created_at
                 FROM queries ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(QueryRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        message: row.get(3)?,
                        status: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter().map(ContactQuery::try_from).collect()
        })
    }

    /// Marks a query resolved. The row is kept for history; resolving it a
    /// second time reports it as not found, like a deleted row would.
    pub fn resolve_query(&self, id: Uuid) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE queries SET status = 'resolved' WHERE id = ?1 AND status = 'new'",
                [id.to_string()],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound("query"));
            }
            info!("Query {} resolved", id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::db;
    use nutrimeal_types::models::QueryStatus;

    #[test]
    fn resolve_keeps_history_and_is_single_shot() {
        let db = db();
        let id = db
            .submit_query(Some("Ann"), Some("ann@x.com"), Some("Where are the vegan recipes?"))
            .unwrap();

        db.resolve_query(id).unwrap();
        assert!(matches!(db.resolve_query(id), Err(StoreError::NotFound(_))));

        let queries = db.list_queries().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].status, QueryStatus::Resolved);
    }

    #[test]
    fn blank_message_is_rejected() {
        let db = db();
        let result = db.submit_query(Some("Ann"), Some("ann@x.com"), Some(" "));
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }
}
