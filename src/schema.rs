//! Table layout for customers, items and reviews.
//!
//! The DDL is generated from the descriptors below so that foreign-key
//! constraint names come out the same on every run. Constraints carry no
//! `ON DELETE` action; cascades are performed by [`crate::db::Database`].

/// A column in one of the store's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
}

/// A nullable reference from a column to another table's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub referred_table: &'static str,
    pub referred_column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub foreign_keys: &'static [ForeignKey],
}

const fn key(name: &'static str) -> Column {
    Column { name, sql_type: "INTEGER", nullable: false, primary_key: true }
}

const fn column(name: &'static str, sql_type: &'static str, nullable: bool) -> Column {
    Column { name, sql_type, nullable, primary_key: false }
}

pub const CUSTOMERS: Table = Table {
    name: "customers",
    columns: &[key("id"), column("name", "TEXT", true)],
    foreign_keys: &[],
};

pub const ITEMS: Table = Table {
    name: "items",
    columns: &[
        key("id"),
        column("name", "TEXT", true),
        column("price", "REAL", true),
    ],
    foreign_keys: &[],
};

pub const REVIEWS: Table = Table {
    name: "reviews",
    columns: &[
        key("id"),
        column("comment", "TEXT", false),
        column("customer_id", "INTEGER", true),
        column("item_id", "INTEGER", true),
    ],
    foreign_keys: &[
        ForeignKey { column: "customer_id", referred_table: "customers", referred_column: "id" },
        ForeignKey { column: "item_id", referred_table: "items", referred_column: "id" },
    ],
};

/// All tables, parents before the tables that reference them.
pub const TABLES: [Table; 3] = [CUSTOMERS, ITEMS, REVIEWS];

/// Name of the constraint for `table.column -> referred_table`.
pub fn fk_constraint_name(table: &str, column: &str, referred_table: &str) -> String {
    format!("fk_{}_{}_{}", table, column, referred_table)
}

pub fn create_table_sql(table: &Table) -> String {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            let mut line = format!("{} {}", c.name, c.sql_type);
            if c.primary_key {
                line.push_str(" PRIMARY KEY");
            } else if !c.nullable {
                line.push_str(" NOT NULL");
            }
            line
        })
        .collect();

    for fk in table.foreign_keys {
        lines.push(format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
            fk_constraint_name(table.name, fk.column, fk.referred_table),
            fk.column,
            fk.referred_table,
            fk.referred_column
        ));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        table.name,
        lines.join(",\n    ")
    )
}

/// DDL for the whole store, in creation order.
pub fn schema_sql() -> String {
    TABLES
        .iter()
        .map(create_table_sql)
        .collect::<Vec<_>>()
        .join("\n")
}
