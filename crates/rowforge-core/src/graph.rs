use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::schema::Table;

/// Order table indices so that every table comes after the tables it depends
/// on through foreign keys or copy-from-column generators.
///
/// Ties keep the caller's order. Self references do not constrain ordering.
/// Cycles are reported as [`Error::InvalidSchema`] naming the tables involved.
pub fn dependency_order(tables: &[Table]) -> Result<Vec<usize>> {
    let graph = build_adjacency(tables);
    toposort(&graph).map_err(|cycle| {
        let names: Vec<String> = cycle.into_iter().map(|idx| tables[idx].key()).collect();
        Error::InvalidSchema(format!("dependency cycle between tables: {}", names.join(", ")))
    })
}

/// Clone `tables` into dependency order.
pub fn order_tables(tables: &[Table]) -> Result<Vec<Table>> {
    Ok(dependency_order(tables)?
        .into_iter()
        .map(|idx| tables[idx].clone())
        .collect())
}

fn build_adjacency(tables: &[Table]) -> BTreeMap<usize, BTreeSet<usize>> {
    let index: HashMap<String, usize> = tables
        .iter()
        .enumerate()
        .map(|(idx, table)| (table.key(), idx))
        .collect();

    let mut graph: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for (child, table) in tables.iter().enumerate() {
        graph.entry(child).or_default();

        for column in &table.columns {
            let mut parents = Vec::new();
            if let Some(fk) = &column.foreign_key {
                parents.push(fk.table_key());
            }
            if let Some((schema, name, _)) = column.copy_source(table) {
                parents.push(format!("{schema}.{name}"));
            }

            for parent_key in parents {
                if let Some(&parent) = index.get(&parent_key) {
                    if parent != child {
                        graph.entry(parent).or_default().insert(child);
                    }
                }
            }
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<usize, BTreeSet<usize>>) -> std::result::Result<Vec<usize>, Vec<usize>> {
    let mut indegree: BTreeMap<usize, usize> = graph.keys().map(|node| (*node, 0)).collect();
    for targets in graph.values() {
        for target in targets {
            *indegree.entry(*target).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .filter_map(|(node, count)| (*count == 0).then_some(*node))
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node);
        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(*target);
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter_map(|(node, count)| (count > 0).then_some(node))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ForeignKeyRef;
    use crate::generator::GeneratorSpec;
    use crate::schema::Column;
    use crate::types::ColumnType;

    fn column(name: &str) -> Column {
        Column {
            ordinal_position: 1,
            name: name.to_string(),
            column_type: ColumnType::new("integer"),
            is_nullable: false,
            is_primary_key: false,
            identity: None,
            foreign_key: None,
            generator: None,
            comment: None,
        }
    }

    fn table(name: &str, columns: Vec<Column>) -> Table {
        Table {
            schema: "public".to_string(),
            name: name.to_string(),
            comment: None,
            columns,
        }
    }

    fn fk_to(target: &str) -> Option<ForeignKeyRef> {
        Some(ForeignKeyRef {
            referenced_schema: "public".to_string(),
            referenced_table: target.to_string(),
            referenced_column: "id".to_string(),
        })
    }

    #[test]
    fn orders_parents_before_children() {
        let mut user_id = column("user_id");
        user_id.foreign_key = fk_to("users");
        let tables = vec![
            table("orders", vec![column("id"), user_id]),
            table("users", vec![column("id")]),
        ];

        let order = dependency_order(&tables).expect("expected ordering");
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn copy_generator_creates_dependency() {
        let mut user_id = column("user_id");
        user_id.generator = Some(GeneratorSpec::CopyFromColumn {
            schema: None,
            table: Some("users".to_string()),
            column: "id".to_string(),
        });
        let tables = vec![
            table("audit", vec![user_id]),
            table("users", vec![column("id")]),
        ];

        let ordered = order_tables(&tables).expect("expected ordering");
        assert_eq!(ordered[0].name, "users");
        assert_eq!(ordered[1].name, "audit");
    }

    #[test]
    fn self_reference_is_not_a_cycle() {
        let mut parent_id = column("parent_id");
        parent_id.foreign_key = fk_to("nodes");
        let tables = vec![table("nodes", vec![column("id"), parent_id])];

        assert_eq!(dependency_order(&tables).expect("ordering"), vec![0]);
    }

    #[test]
    fn reports_cycle() {
        let mut a_ref = column("b_id");
        a_ref.foreign_key = fk_to("b");
        let mut b_ref = column("a_id");
        b_ref.foreign_key = fk_to("a");
        let tables = vec![table("a", vec![a_ref]), table("b", vec![b_ref])];

        let err = dependency_order(&tables).expect_err("expected cycle");
        let message = err.to_string();
        assert!(message.contains("public.a"));
        assert!(message.contains("public.b"));
    }
}
