// src/models/item.rs
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Item {
    pub id: i64,              // Store-generated identifier
    pub name: Option<String>, // Item name
    pub price: Option<f64>,   // Unit price, may be unset
}
