use crate::config::DatabaseConfig;
use crate::error::{Result, StoreError};
use crate::graph::Snapshot;
use crate::models::{Customer, Item, NewReview, Review};
use crate::schema;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};


fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
    })
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        comment: row.get(1)?,
        customer_id: row.get(2)?,
        item_id: row.get(3)?,
    })
}

const SELECT_CUSTOMERS: &str = "SELECT id, name FROM customers";
const SELECT_ITEMS: &str = "SELECT id, name, price FROM items";
const SELECT_REVIEWS: &str = "SELECT id, comment, customer_id, item_id FROM reviews";

fn query_all<T, P>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>>
where
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

// Define a struct to represent a database connection
#[derive(Debug)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    // Open a database with foreign-key enforcement on
    pub fn new(db_path: &str) -> Result<Self> {
        Self::open(&DatabaseConfig {
            path: db_path.to_string(),
            foreign_keys: true,
        })
    }

    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let conn = Connection::open(&config.path)?;
        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        info!(path = %config.path, foreign_keys = config.foreign_keys, "Database connection established");
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Create the database schema
    pub async fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        for table in schema::TABLES.iter() {
            conn.execute_batch(&schema::create_table_sql(table))
                .map_err(|e| {
                    tracing::error!(table = table.name, "Failed creating table: {}", e);
                    e
                })?;
        }
        info!("Schema created");
        Ok(())
    }

    pub async fn insert_customer(&self, name: Option<&str>) -> Result<Customer> {
        let conn = self.conn.lock().await;
        conn.execute("INSERT INTO customers (name) VALUES (?)", params![name])?;
        let customer = Customer {
            id: conn.last_insert_rowid(),
            name: name.map(str::to_string),
        };
        debug!(customer_id = customer.id, "Customer inserted");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: i64) -> Result<Option<Customer>> {
        let conn = self.conn.lock().await;
        let sql = format!("{} WHERE id = ?", SELECT_CUSTOMERS);
        Ok(conn.query_row(&sql, [id], customer_from_row).optional()?)
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        let conn = self.conn.lock().await;
        let sql = format!("{} ORDER BY id", SELECT_CUSTOMERS);
        query_all(&conn, &sql, [], customer_from_row)
    }

    pub async fn update_customer(&self, customer: &Customer) -> Result<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE customers SET name = ? WHERE id = ?",
            params![customer.name, customer.id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("customer", customer.id));
        }
        debug!(customer_id = customer.id, "Customer updated");
        Ok(())
    }

    /// Deletes the customer and every review it owns in one transaction.
    /// Returns the number of reviews removed.
    pub async fn delete_customer(&self, id: i64) -> Result<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM reviews WHERE customer_id = ?", [id])?;
        if tx.execute("DELETE FROM customers WHERE id = ?", [id])? == 0 {
            return Err(StoreError::not_found("customer", id));
        }

        tx.commit()?;
        info!(customer_id = id, reviews = removed, "Customer deleted");
        Ok(removed)
    }

    pub async fn insert_item(&self, name: Option<&str>, price: Option<f64>) -> Result<Item> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO items (name, price) VALUES (?, ?)",
            params![name, price],
        )?;
        let item = Item {
            id: conn.last_insert_rowid(),
            name: name.map(str::to_string),
            price,
        };
        debug!(item_id = item.id, "Item inserted");
        Ok(item)
    }

    pub async fn get_item(&self, id: i64) -> Result<Option<Item>> {
        let conn = self.conn.lock().await;
        let sql = format!("{} WHERE id = ?", SELECT_ITEMS);
        Ok(conn.query_row(&sql, [id], item_from_row).optional()?)
    }

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        let conn = self.conn.lock().await;
        let sql = format!("{} ORDER BY id", SELECT_ITEMS);
        query_all(&conn, &sql, [], item_from_row)
    }

    pub async fn update_item(&self, item: &Item) -> Result<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE items SET name = ?, price = ? WHERE id = ?",
            params![item.name, item.price, item.id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("item", item.id));
        }
        debug!(item_id = item.id, "Item updated");
        Ok(())
    }

    /// Deletes the item and every review of it in one transaction.
    /// Returns the number of reviews removed.
    pub async fn delete_item(&self, id: i64) -> Result<usize> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM reviews WHERE item_id = ?", [id])?;
        if tx.execute("DELETE FROM items WHERE id = ?", [id])? == 0 {
            return Err(StoreError::not_found("item", id));
        }

        tx.commit()?;
        info!(item_id = id, reviews = removed, "Item deleted");
        Ok(removed)
    }

    pub async fn insert_review(&self, review: &NewReview) -> Result<Review> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO reviews (comment, customer_id, item_id) VALUES (?, ?, ?)",
            params![review.comment, review.customer_id, review.item_id],
        )
        .map_err(|e| {
            debug!("Review insert rejected: {}", e);
            e
        })?;
        let stored = review.clone().stored_as(conn.last_insert_rowid());
        debug!(review_id = stored.id, "Review inserted");
        Ok(stored)
    }

    pub async fn get_review(&self, id: i64) -> Result<Option<Review>> {
        let conn = self.conn.lock().await;
        let sql = format!("{} WHERE id = ?", SELECT_REVIEWS);
        Ok(conn.query_row(&sql, [id], review_from_row).optional()?)
    }

    pub async fn list_reviews(&self) -> Result<Vec<Review>> {
        let conn = self.conn.lock().await;
        let sql = format!("{} ORDER BY id", SELECT_REVIEWS);
        query_all(&conn, &sql, [], review_from_row)
    }

    pub async fn update_review(&self, review: &Review) -> Result<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE reviews SET comment = ?, customer_id = ?, item_id = ? WHERE id = ?",
            params![review.comment, review.customer_id, review.item_id, review.id],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("review", review.id));
        }
        debug!(review_id = review.id, "Review updated");
        Ok(())
    }

    pub async fn delete_review(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        if conn.execute("DELETE FROM reviews WHERE id = ?", [id])? == 0 {
            return Err(StoreError::not_found("review", id));
        }
        debug!(review_id = id, "Review deleted");
        Ok(())
    }

    /// Reviews owned by the customer, in insertion order.
    pub async fn reviews_for_customer(&self, customer_id: i64) -> Result<Vec<Review>> {
        let conn = self.conn.lock().await;
        let sql = format!("{} WHERE customer_id = ? ORDER BY id", SELECT_REVIEWS);
        query_all(&conn, &sql, [customer_id], review_from_row)
    }

    /// Reviews owned by the item, in insertion order.
    pub async fn reviews_for_item(&self, item_id: i64) -> Result<Vec<Review>> {
        let conn = self.conn.lock().await;
        let sql = format!("{} WHERE item_id = ? ORDER BY id", SELECT_REVIEWS);
        query_all(&conn, &sql, [item_id], review_from_row)
    }

    /// The item of each of the customer's reviews, `None` where a review has no item.
    pub async fn customer_items(&self, customer_id: i64) -> Result<Vec<Option<Item>>> {
        let conn = self.conn.lock().await;
        query_all(
            &conn,
            "SELECT i.id, i.name, i.price
             FROM reviews r
             LEFT JOIN items i ON r.item_id = i.id
             WHERE r.customer_id = ?
             ORDER BY r.id",
            [customer_id],
            |row| match row.get::<_, Option<i64>>(0)? {
                Some(_) => item_from_row(row).map(Some),
                None => Ok(None),
            },
        )
    }

    /// Takes a review out of the customer's collection, which deletes it.
    pub async fn remove_customer_review(&self, customer_id: i64, review_id: i64) -> Result<()> {
        self.remove_owned_review("customer_id", customer_id, review_id)
            .await
    }

    /// Takes a review out of the item's collection, which deletes it.
    pub async fn remove_item_review(&self, item_id: i64, review_id: i64) -> Result<()> {
        self.remove_owned_review("item_id", item_id, review_id).await
    }

    async fn remove_owned_review(
        &self,
        owner_column: &'static str,
        owner_id: i64,
        review_id: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        let sql = format!("DELETE FROM reviews WHERE id = ? AND {} = ?", owner_column);
        if conn.execute(&sql, [review_id, owner_id])? == 0 {
            return Err(StoreError::not_found("review", review_id));
        }
        debug!(review_id, owner_column, owner_id, "Orphaned review deleted");
        Ok(())
    }

    /// Reads every table inside one transaction.
    pub async fn load_snapshot(&self) -> Result<Snapshot> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let customers = query_all(&tx, SELECT_CUSTOMERS, [], customer_from_row)?;
        let items = query_all(&tx, SELECT_ITEMS, [], item_from_row)?;
        let reviews = query_all(&tx, SELECT_REVIEWS, [], review_from_row)?;

        tx.commit()?;
        debug!(
            customers = customers.len(),
            items = items.len(),
            reviews = reviews.len(),
            "Snapshot loaded"
        );
        Ok(Snapshot::new(customers, items, reviews))
    }

    // function to log database state
    pub async fn debug_dump(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        debug!("[DATABASE DEBUG] Customers:");
        for customer in query_all(&conn, SELECT_CUSTOMERS, [], customer_from_row)? {
            debug!("[DATABASE DEBUG] {:?}", customer);
        }
        debug!("[DATABASE DEBUG] Items:");
        for item in query_all(&conn, SELECT_ITEMS, [], item_from_row)? {
            debug!("[DATABASE DEBUG] {:?}", item);
        }
        debug!("[DATABASE DEBUG] Reviews:");
        for review in query_all(&conn, SELECT_REVIEWS, [], review_from_row)? {
            debug!("[DATABASE DEBUG] {:?}", review);
        }
        Ok(())
    }
}
