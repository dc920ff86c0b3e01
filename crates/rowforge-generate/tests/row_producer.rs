use std::sync::Arc;

use rowforge_core::{
    Column, ColumnType, ForeignKeyRef, GeneratorSpec, IdentityGeneration, RandomSpec, Table, Value,
};
use rowforge_generate::{GenerationError, RowProducer, ValueStore};

fn column(position: i16, name: &str, data_type: &str) -> Column {
    Column {
        ordinal_position: position,
        name: name.to_string(),
        column_type: ColumnType::new(data_type),
        is_nullable: false,
        is_primary_key: false,
        identity: None,
        foreign_key: None,
        generator: None,
        comment: None,
    }
}

fn with_generator(mut column: Column, generator: GeneratorSpec) -> Column {
    column.generator = Some(generator);
    column
}

fn customer_table() -> Table {
    let mut customer_id = with_generator(
        column(1, "CustomerId", "integer"),
        GeneratorSpec::Counter { start: 1, step: 1 },
    );
    customer_id.is_primary_key = true;

    Table {
        schema: "sales".to_string(),
        name: "Customer".to_string(),
        comment: None,
        columns: vec![
            customer_id,
            with_generator(
                column(2, "CustomerType", "text"),
                GeneratorSpec::Random {
                    distribution: RandomSpec::Choice {
                        values: vec![
                            Value::Text("retail".to_string()),
                            Value::Text("wholesale".to_string()),
                        ],
                    },
                },
            ),
            with_generator(
                column(3, "Name", "text"),
                GeneratorSpec::Random {
                    distribution: RandomSpec::Text {
                        min_len: 5,
                        max_len: 12,
                        charset: None,
                    },
                },
            ),
            with_generator(
                column(4, "IsActive", "boolean"),
                GeneratorSpec::Constant {
                    value: Value::Bool(true),
                },
            ),
        ],
    }
}

fn order_table() -> Table {
    let mut order_id = column(1, "OrderId", "integer");
    order_id.is_primary_key = true;
    order_id.identity = Some(IdentityGeneration::Always);

    let mut customer_id = with_generator(
        column(2, "CustomerId", "integer"),
        GeneratorSpec::CopyFromColumn {
            schema: None,
            table: Some("Customer".to_string()),
            column: "CustomerId".to_string(),
        },
    );
    customer_id.foreign_key = Some(ForeignKeyRef {
        referenced_schema: "sales".to_string(),
        referenced_table: "Customer".to_string(),
        referenced_column: "CustomerId".to_string(),
    });

    Table {
        schema: "sales".to_string(),
        name: "Order".to_string(),
        comment: None,
        columns: vec![
            order_id,
            customer_id,
            with_generator(
                column(3, "Amount", "numeric(10,2)"),
                GeneratorSpec::Random {
                    distribution: RandomSpec::FloatRange {
                        min: 1.0,
                        max: 500.0,
                        scale: Some(2),
                    },
                },
            ),
            with_generator(
                column(4, "SessionId", "uuid"),
                GeneratorSpec::Random {
                    distribution: RandomSpec::Uuid,
                },
            ),
        ],
    }
}

fn producer() -> RowProducer {
    RowProducer::new(Arc::new(ValueStore::new()), 42)
}

#[test]
fn row_has_one_field_per_column_in_schema_order() {
    let producer = producer();
    let table = customer_table();

    let row = producer.produce_row(&table, 7).expect("produce row");

    assert_eq!(row.n, 7);
    assert_eq!(row.fields.len(), table.columns.len());
    let names: Vec<&str> = row.fields.iter().map(|field| field.name.as_str()).collect();
    assert_eq!(names, ["CustomerId", "CustomerType", "Name", "IsActive"]);
    assert_eq!(
        row.value("CustomerId", producer.store()),
        Some(Value::Int(7))
    );
}

#[test]
fn deferred_identity_has_no_store_entry() {
    let producer = producer();
    let tables = vec![customer_table(), order_table()];

    let rows: Vec<_> = producer
        .produce_rows(&tables, || 1)
        .expect("produce rows")
        .collect::<Result<_, _>>()
        .expect("rows");

    let order_id = rows[1].field("OrderId").expect("order id field");
    assert!(!order_id.produces_value_now);
    assert_eq!(producer.store().get(order_id.handle), None);
    assert!(!producer.store().contains(order_id.handle));
}

#[test]
fn foreign_key_copy_resolves_to_parent_value() {
    let producer = producer();
    let tables = vec![customer_table(), order_table()];

    let rows: Vec<_> = producer
        .produce_rows(&tables, || 1)
        .expect("produce rows")
        .collect::<Result<_, _>>()
        .expect("rows");

    let store = producer.store();
    let customer_id = rows[0].field("CustomerId").expect("customer id");
    let order_customer_id = rows[1].field("CustomerId").expect("order customer id");

    assert_eq!(customer_id.handle, order_customer_id.handle);
    assert_eq!(store.get(order_customer_id.handle), store.get(customer_id.handle));
    assert_eq!(store.get(customer_id.handle), Some(Value::Int(1)));
}

#[test]
fn produced_fields_have_exactly_one_entry_each() {
    let producer = producer();
    let tables = vec![customer_table(), order_table()];

    let rows: Vec<_> = producer
        .produce_rows(&tables, || 3)
        .expect("produce rows")
        .collect::<Result<_, _>>()
        .expect("rows");

    let mut handles: Vec<_> = rows
        .iter()
        .flat_map(|row| row.fields.iter())
        .filter(|field| field.produces_value_now)
        .map(|field| field.handle)
        .collect();
    handles.sort();
    handles.dedup();

    assert_eq!(producer.store().len(), handles.len());
    assert!(handles.iter().all(|handle| producer.store().contains(*handle)));
}

#[test]
fn supplier_is_called_once_per_table() {
    let producer = producer();
    let tables = vec![customer_table(), order_table()];
    let mut next = 0;

    let rows: Vec<_> = producer
        .produce_rows(&tables, || {
            next += 1;
            next
        })
        .expect("produce rows")
        .collect::<Result<_, _>>()
        .expect("rows");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].n, 1);
    assert_eq!(rows[1].n, 2);
    assert_eq!(rows[0].table, "Customer");
    assert_eq!(rows[1].table, "Order");
}

#[test]
fn rows_are_produced_lazily() {
    let producer = producer();
    let tables = vec![customer_table(), order_table()];

    let mut rows = producer.produce_rows(&tables, || 1).expect("produce rows");
    assert!(producer.store().is_empty());

    rows.next().expect("first row").expect("customer row");
    assert_eq!(producer.store().len(), 4);
}

#[test]
fn copy_without_produced_source_fails() {
    let producer = producer();
    let tables = vec![order_table()];

    let result = producer
        .produce_rows(&tables, || 1)
        .expect("produce rows")
        .next()
        .expect("one row");

    assert!(matches!(result, Err(GenerationError::MissingReference(_))));
}

#[test]
fn later_produce_row_sees_latest_parent() {
    let producer = producer();

    let customer = producer
        .produce_row(&customer_table(), 5)
        .expect("customer row");
    let order = producer.produce_row(&order_table(), 5).expect("order row");

    assert_eq!(
        order.value("CustomerId", producer.store()),
        customer.value("CustomerId", producer.store())
    );
}

#[test]
fn invalid_arguments_are_rejected() {
    let producer = producer();

    let empty = Table {
        schema: "sales".to_string(),
        name: "Empty".to_string(),
        comment: None,
        columns: Vec::new(),
    };
    assert!(matches!(
        producer.produce_row(&empty, 1),
        Err(GenerationError::InvalidArgument(_))
    ));
    assert!(matches!(
        producer.produce_rows(&[], || 1).map(|_| ()),
        Err(GenerationError::InvalidArgument(_))
    ));
}

#[test]
fn generator_failure_propagates() {
    let producer = producer();
    let mut table = customer_table();
    table.columns[2].generator = Some(GeneratorSpec::Random {
        distribution: RandomSpec::IntRange { min: 9, max: 1 },
    });

    assert!(matches!(
        producer.produce_row(&table, 1),
        Err(GenerationError::InvalidGenerator(_))
    ));
}

#[test]
fn release_drops_task_entries() {
    let producer = producer();
    let tables = vec![customer_table(), order_table()];

    let rows: Vec<_> = producer
        .produce_rows(&tables, || 1)
        .expect("produce rows")
        .collect::<Result<_, _>>()
        .expect("rows");
    assert!(!producer.store().is_empty());

    producer.store().release(&rows);
    assert!(producer.store().is_empty());
}

#[test]
fn rows_serialize_with_shared_handles() {
    let producer = producer();
    let tables = vec![customer_table(), order_table()];

    let rows: Vec<_> = producer
        .produce_rows(&tables, || 3)
        .expect("produce rows")
        .collect::<Result<_, _>>()
        .expect("rows");
    let json = serde_json::to_value(&rows).expect("serialize rows");

    assert_eq!(json[0]["table"], "Customer");
    assert_eq!(json[1]["n"], 3);
    let customer_handle = &json[0]["fields"][0]["handle"];
    assert!(customer_handle.is_string());
    assert_eq!(&json[1]["fields"][1]["handle"], customer_handle);
}

#[test]
fn failed_row_leaves_no_store_entries() {
    let producer = producer();
    let mut table = customer_table();
    table.columns[2].generator = Some(GeneratorSpec::Random {
        distribution: RandomSpec::IntRange { min: 9, max: 1 },
    });

    assert!(producer.produce_row(&table, 1).is_err());
    assert!(producer.store().is_empty());
}

#[test]
fn batch_copy_ignores_newer_rows_from_other_callers() {
    let producer = producer();
    let tables = vec![customer_table(), order_table()];

    let mut batch = producer.produce_rows(&tables, || 1).expect("produce rows");
    let customer = batch.next().expect("customer").expect("customer row");
    let other = producer
        .produce_row(&customer_table(), 9)
        .expect("other customer");
    let order = batch.next().expect("order").expect("order row");

    let copied = order.field("CustomerId").expect("order customer id").handle;
    assert_eq!(copied, customer.field("CustomerId").expect("customer id").handle);
    assert_ne!(copied, other.field("CustomerId").expect("other id").handle);
}
