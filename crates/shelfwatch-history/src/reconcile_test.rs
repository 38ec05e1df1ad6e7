use super::*;
use crate::table::parse_csv;

fn table(csv: &str) -> Table {
    parse_csv(csv).unwrap()
}

const HISTORY: &str = "\
fecha_extraccion,id,nombre,precio_actual
2026-10-17 08:00:00,aaa,Kobo Sage,289.99
2026-10-17 08:00:00,bbb,Kobo Nia,99.99
2026-10-18 08:00:00,aaa,Kobo Sage,279.99
";

#[test]
fn no_history_yields_new_rows_only() {
    let new = table("fecha_extraccion,id\nt,a\nt,a\nt,b\n");
    let merged = reconcile(None, &new, SchemaDrift::Intersection);
    assert_eq!(merged.table.rows, vec![vec!["t", "a"], vec!["t", "b"]]);
    assert_eq!(merged.stats.existing_rows, 0);
    assert_eq!(merged.stats.duplicates_removed, 1);
}

#[test]
fn empty_history_is_treated_as_absent() {
    let existing = Table::new(vec!["id".to_owned()]);
    let new = table("id,nombre\na,Kobo\n");
    let merged = reconcile(Some(&existing), &new, SchemaDrift::Intersection);
    assert_eq!(merged.table.columns, vec!["id", "nombre"]);
    assert_eq!(merged.table.len(), 1);
}

#[test]
fn appends_new_rows_after_history_in_order() {
    let existing = table(HISTORY);
    let new = table(
        "fecha_extraccion,id,nombre,precio_actual\n2026-10-19 08:00:00,aaa,Kobo Sage,279.99\n",
    );
    let merged = reconcile(Some(&existing), &new, SchemaDrift::Intersection);

    assert_eq!(merged.table.len(), 4);
    assert_eq!(merged.table.rows[0], existing.rows[0]);
    assert_eq!(merged.table.rows[3][0], "2026-10-19 08:00:00");
    assert_eq!(merged.stats.duplicates_removed, 0);
}

#[test]
fn reconciling_a_subset_is_idempotent() {
    let existing = table(HISTORY);
    let mut subset = existing.clone();
    subset.rows.truncate(2);

    let merged = reconcile(Some(&existing), &subset, SchemaDrift::Intersection);
    assert_eq!(merged.table, existing);

    let again = reconcile(Some(&merged.table), &subset, SchemaDrift::Intersection);
    assert_eq!(again.table, existing);
}

#[test]
fn growth_is_bounded_by_the_sum_of_both_sides() {
    let existing = table(HISTORY);
    let new = table(
        "fecha_extraccion,id,nombre,precio_actual\n\
         2026-10-17 08:00:00,bbb,Kobo Nia,99.99\n\
         2026-10-19 08:00:00,ccc,Kobo Clara,139.99\n",
    );
    let merged = reconcile(Some(&existing), &new, SchemaDrift::Intersection);
    assert!(merged.table.len() <= existing.len() + new.len());
    assert_eq!(merged.table.len(), 4);
    assert_eq!(merged.stats.duplicates_removed, 1);

    let disjoint = table("fecha_extraccion,id,nombre,precio_actual\nz,zzz,Otro,1.0\n");
    let merged = reconcile(Some(&existing), &disjoint, SchemaDrift::Intersection);
    assert_eq!(merged.table.len(), existing.len() + disjoint.len());
}

#[test]
fn intersection_drops_columns_missing_on_either_side() {
    let existing = table("fecha_extraccion,id,precio\nd1,aaa,10\n");
    let new = table("fecha_extraccion,id,precio_actual\nd2,aaa,12\n");
    let merged = reconcile(Some(&existing), &new, SchemaDrift::Intersection);

    assert_eq!(merged.table.columns, vec!["fecha_extraccion", "id"]);
    assert_eq!(merged.table.rows, vec![vec!["d1", "aaa"], vec!["d2", "aaa"]]);
    assert_eq!(merged.stats.dropped_columns, vec!["precio", "precio_actual"]);
}

#[test]
fn union_keeps_every_column_with_empty_cells() {
    let existing = table("fecha_extraccion,id,precio\nd1,aaa,10\n");
    let new = table("fecha_extraccion,id,precio_actual\nd2,aaa,12\n");
    let merged = reconcile(Some(&existing), &new, SchemaDrift::Union);

    assert_eq!(
        merged.table.columns,
        vec!["fecha_extraccion", "id", "precio", "precio_actual"]
    );
    assert_eq!(
        merged.table.rows,
        vec![vec!["d1", "aaa", "10", ""], vec!["d2", "aaa", "", "12"]]
    );
    assert!(merged.stats.dropped_columns.is_empty());
}

#[test]
fn disjoint_schemas_start_a_new_history() {
    let existing = table("x,y\n1,2\n");
    let new = table("id,nombre\na,Kobo\n");
    let merged = reconcile(Some(&existing), &new, SchemaDrift::Intersection);
    assert_eq!(merged.table, new);
}

#[test]
fn column_order_follows_history_file() {
    let existing = table("id,fecha_extraccion\naaa,d1\n");
    let new = table("fecha_extraccion,id\nd2,bbb\n");
    let merged = reconcile(Some(&existing), &new, SchemaDrift::Intersection);
    assert_eq!(merged.table.columns, vec!["id", "fecha_extraccion"]);
    assert_eq!(merged.table.rows[1], vec!["bbb", "d2"]);
}
