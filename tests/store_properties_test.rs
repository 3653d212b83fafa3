use reviewstore::{Database, NewReview, Serializer, Snapshot};
use serde_json::{json, Value};

async fn create_test_db() -> Database {
    let db = Database::new(":memory:").unwrap();
    db.create_schema().await.unwrap();
    db
}

// Several customers and items cross-reviewing each other.
async fn populate(db: &Database) {
    let ann = db.insert_customer(Some("Ann")).await.unwrap();
    let bob = db.insert_customer(Some("Bob")).await.unwrap();
    let mug = db.insert_item(Some("Mug"), Some(9.99)).await.unwrap();
    let pen = db.insert_item(Some("Pen"), None).await.unwrap();

    for (comment, customer, item) in [
        ("Great", Some(ann.id), Some(mug.id)),
        ("Meh", Some(bob.id), Some(mug.id)),
        ("Leaky", Some(ann.id), Some(pen.id)),
        ("Lost", None, Some(pen.id)),
        ("Unsure", Some(bob.id), None),
    ] {
        let mut review = NewReview::new(comment);
        review.customer_id = customer;
        review.item_id = item;
        db.insert_review(&review).await.unwrap();
    }
}

#[tokio::test]
async fn test_referential_consistency() {
    let db = create_test_db().await;
    populate(&db).await;

    let reviews = db.list_reviews().await.unwrap();
    for customer in db.list_customers().await.unwrap() {
        let owned = db.reviews_for_customer(customer.id).await.unwrap();
        let expected: Vec<_> = reviews
            .iter()
            .filter(|r| r.customer_id == Some(customer.id))
            .cloned()
            .collect();
        assert_eq!(owned, expected);
    }
    for item in db.list_items().await.unwrap() {
        for review in db.reviews_for_item(item.id).await.unwrap() {
            assert_eq!(review.item_id, Some(item.id));
        }
    }
}

#[tokio::test]
async fn test_cascade_removes_every_dependent_review() {
    let db = create_test_db().await;
    populate(&db).await;

    let customers = db.list_customers().await.unwrap();
    let items = db.list_items().await.unwrap();

    db.delete_customer(customers[0].id).await.unwrap();
    assert!(db
        .list_reviews()
        .await
        .unwrap()
        .iter()
        .all(|r| r.customer_id != Some(customers[0].id)));

    db.delete_item(items[1].id).await.unwrap();
    let remaining = db.list_reviews().await.unwrap();
    assert!(remaining.iter().all(|r| r.item_id != Some(items[1].id)));
    assert_eq!(remaining.len(), 2);
    assert!(db.load_snapshot().await.unwrap().is_consistent());
}

fn assert_no_nested_key(entries: &Value, key: &str) {
    for entry in entries.as_array().unwrap() {
        assert!(entry.get(key).is_none(), "{} re-embedded in {}", key, entry);
    }
}

#[tokio::test]
async fn test_serialized_owners_do_not_cycle() {
    let db = create_test_db().await;
    populate(&db).await;
    let snapshot = db.load_snapshot().await.unwrap();
    let serializer = Serializer::new(&snapshot);

    for customer in snapshot.customers() {
        let value = serializer.serialize_customer(customer).unwrap();
        assert_no_nested_key(&value["reviews"], "customer");
        for review in value["reviews"].as_array().unwrap() {
            if review["item"].is_object() {
                assert!(review["item"].get("reviews").is_none());
            }
        }
    }
    for item in snapshot.items() {
        let value = serializer.serialize_item(item).unwrap();
        assert_no_nested_key(&value["reviews"], "item");
        for review in value["reviews"].as_array().unwrap() {
            if review["customer"].is_object() {
                assert!(review["customer"].get("reviews").is_none());
            }
        }
    }
}

#[test]
fn test_customer_example() {
    let snapshot = Snapshot::new(
        vec![reviewstore::Customer { id: 1, name: Some("Ann".into()) }],
        vec![reviewstore::Item { id: 5, name: Some("Mug".into()), price: Some(9.99) }],
        vec![reviewstore::Review {
            id: 1,
            comment: "Great".into(),
            customer_id: Some(1),
            item_id: Some(5),
        }],
    );
    let customer = snapshot.customer(1).unwrap();

    assert_eq!(
        Serializer::new(&snapshot).serialize_customer(customer).unwrap(),
        json!({
            "id": 1,
            "name": "Ann",
            "reviews": [{
                "id": 1,
                "comment": "Great",
                "customer_id": 1,
                "item_id": 5,
                "item": {"id": 5, "name": "Mug", "price": 9.99}
            }]
        })
    );

    let items: Vec<_> = snapshot.customer_items(1).into_iter().flatten().collect();
    assert_eq!(
        serde_json::to_value(&items).unwrap(),
        json!([{"id": 5, "name": "Mug", "price": 9.99}])
    );
}

#[tokio::test]
async fn test_item_serialization_from_store() {
    let db = create_test_db().await;
    populate(&db).await;
    let snapshot = db.load_snapshot().await.unwrap();

    let pen = snapshot.items().find(|i| i.name.as_deref() == Some("Pen")).unwrap();
    let value = Serializer::new(&snapshot).serialize_item(pen).unwrap();

    assert_eq!(value["price"], Value::Null);
    let reviews = value["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["comment"], "Leaky");
    assert_eq!(reviews[0]["customer"], json!({"id": 1, "name": "Ann"}));
    assert_eq!(reviews[1]["comment"], "Lost");
    assert_eq!(reviews[1]["customer"], Value::Null);
}

#[tokio::test]
async fn test_customer_items_follows_review_order() {
    let db = create_test_db().await;
    populate(&db).await;
    let customers = db.list_customers().await.unwrap();

    let names: Vec<Option<String>> = db
        .customer_items(customers[0].id)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.and_then(|i| i.name))
        .collect();
    assert_eq!(names, vec![Some("Mug".into()), Some("Pen".into())]);

    // Bob's second review has no item
    let bob_items = db.customer_items(customers[1].id).await.unwrap();
    assert_eq!(bob_items.len(), 2);
    assert!(bob_items[1].is_none());

    // recomputed from current reviews
    let mug_review = db.reviews_for_customer(customers[0].id).await.unwrap()[0].clone();
    db.delete_review(mug_review.id).await.unwrap();
    assert_eq!(db.customer_items(customers[0].id).await.unwrap().len(), 1);
}
