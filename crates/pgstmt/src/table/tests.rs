use super::*;
use crate::condition::Condition;
use crate::error::{DbError, DbResult, ErrorKind};
use crate::operation::{NumberOperation, TextOperation};
use crate::options::OrderDirection;
use crate::value::Value;
use tokio_postgres::Row;

#[derive(Debug)]
#[allow(dead_code)]
struct User {
    id: String,
    username: String,
}

impl Object for User {
    fn columns(table: &TableDef) -> Columns {
        Columns::from(vec![table.column("id"), table.column("username")])
    }

    fn scan(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row
                .try_get("id")
                .map_err(|e| DbError::decode("id", e.to_string()))?,
            username: row
                .try_get("username")
                .map_err(|e| DbError::decode("username", e.to_string()))?,
        })
    }
}

#[derive(Debug)]
#[allow(dead_code)]
struct Org {
    id: String,
    name: String,
}

impl Object for Org {
    fn columns(table: &TableDef) -> Columns {
        Columns::from(vec![table.column("id"), table.column("name")])
    }

    fn scan(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row
                .try_get("id")
                .map_err(|e| DbError::decode("id", e.to_string()))?,
            name: row
                .try_get("name")
                .map_err(|e| DbError::decode("name", e.to_string()))?,
        })
    }
}

fn registry() -> JoinRegistry {
    JoinRegistry::standard().unwrap()
}

#[test]
fn table_def_qualifies_columns() {
    assert_eq!(USERS.qualifier(), "users");
    assert_eq!(USERS.from_clause(), "core.users");
    assert_eq!(USERS.column("id"), Column::new("users", "id"));

    let aliased = USERS.with_alias("u");
    assert_eq!(aliased.qualifier(), "u");
    assert_eq!(aliased.from_clause(), "core.users AS u");
    assert!(aliased.owns(&aliased.column("username")));
    assert!(!aliased.owns(&USERS.column("username")));
    assert!(!USERS.owns(&USERS.column("password")));
    assert_eq!(ORGS.all_columns().len(), ORGS.columns.len());
}

#[test]
fn standard_registry_knows_both_directions() {
    let registry = registry();
    assert_eq!(
        registry.possible_joins(&INSTANCES, &ORGS),
        Some(&[("id", "instance_id")][..])
    );
    assert_eq!(
        registry.possible_joins(&ORGS, &INSTANCES),
        Some(&[("instance_id", "id")][..])
    );
    assert_eq!(
        registry.possible_joins(&USERS, &ORGS),
        Some(&[("instance_id", "instance_id"), ("org_id", "id")][..])
    );
    assert_eq!(registry.possible_joins(&INSTANCES, &USERS), None);
}

#[test]
fn registration_validates_columns() {
    let mut registry = JoinRegistry::new();
    let err = registry
        .register(&ORGS, &USERS, &[("id", "organization_id")])
        .unwrap_err();
    assert!(err.is(ErrorKind::InvalidJoin));
    assert!(err.to_string().contains("organization_id"));

    let err = registry.register(&ORGS, &USERS, &[]).unwrap_err();
    assert!(err.is(ErrorKind::InvalidJoin));
    assert_eq!(registry.possible_joins(&ORGS, &USERS), None);
}

#[test]
fn builds_select_with_join_filter_and_order() {
    let registry = registry();
    let stmt = Query::<User>::new(USERS, &registry)
        .join(&ORGS)
        .filter(Condition::text(
            ORGS.column("name"),
            TextOperation::Equal,
            "acme",
        ))
        .filter(Condition::is_null(USERS.column("state")))
        .order_by(USERS.column("username"), OrderDirection::Descending)
        .limit(20)
        .offset(40)
        .build();

    assert_eq!(
        stmt.sql,
        "SELECT users.id, users.username FROM core.users \
         INNER JOIN core.orgs ON (users.instance_id = orgs.instance_id AND users.org_id = orgs.id) \
         WHERE (orgs.name = $1 AND users.state IS NULL) \
         ORDER BY users.username DESC LIMIT $2 OFFSET $3"
    );
    assert_eq!(
        stmt.args,
        vec![Value::from("acme"), Value::from(20_i64), Value::from(40_i64)]
    );
}

#[test]
fn single_pair_join_renders_without_parentheses() {
    let registry = registry();
    let stmt = Query::<Org>::new(ORGS, &registry)
        .left_join(&INSTANCES)
        .build();
    assert_eq!(
        stmt.sql,
        "SELECT orgs.id, orgs.name FROM core.orgs LEFT JOIN core.instances ON orgs.instance_id = instances.id"
    );
}

#[test]
fn order_by_drops_foreign_columns() {
    let registry = registry();
    let stmt = Query::<User>::new(USERS, &registry)
        .order_by(ORGS.column("name"), OrderDirection::Ascending)
        .order_by(USERS.column("nickname"), OrderDirection::Ascending)
        .order_by(USERS.column("created_at"), OrderDirection::Ascending)
        .build();
    assert_eq!(
        stmt.sql,
        "SELECT users.id, users.username FROM core.users ORDER BY users.created_at"
    );
}

#[test]
fn group_by_lock_and_aliases() {
    let registry = registry();
    let users = USERS.with_alias("u");
    let stmt = Query::<User>::new(users, &registry)
        .filter(Condition::number(
            users.column("created_at"),
            NumberOperation::GreaterThan,
            chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
        ))
        .group_by(users.column("org_id"))
        .lock()
        .build();
    assert_eq!(
        stmt.sql,
        "SELECT u.id, u.username FROM core.users AS u WHERE u.created_at > $1 GROUP BY u.org_id FOR UPDATE"
    );
}

#[test]
fn exists_filter_correlates_with_outer_table() {
    let registry = registry();
    let orgs = ORGS.with_alias("o");
    let stmt = Query::<User>::new(USERS, &registry)
        .filter(orgs.exists(Condition::and([
            Condition::columns_equal(USERS.column("org_id"), orgs.column("id")),
            Condition::text(orgs.column("name"), TextOperation::Equal, "acme"),
        ])))
        .build();
    assert_eq!(
        stmt.sql,
        "SELECT users.id, users.username FROM core.users \
         WHERE EXISTS (SELECT 1 FROM core.orgs AS o WHERE (users.org_id = o.id AND o.name = $1))"
    );
    assert_eq!(stmt.args, vec![Value::from("acme")]);
}

#[test]
fn empty_filters_leave_out_where() {
    let registry = registry();
    let stmt = Query::<User>::new(USERS, &registry)
        .filter(Condition::and([]))
        .filter(Condition::or([]))
        .limit(5)
        .build();
    assert_eq!(
        stmt.sql,
        "SELECT users.id, users.username FROM core.users LIMIT $1"
    );
}

#[test]
#[should_panic(expected = "no join registered")]
fn unregistered_join_panics() {
    let registry = registry();
    let _ = Query::<User>::new(INSTANCES, &registry).join(&USERS);
}

#[tokio::test]
async fn results_on_empty_rows() {
    let results: Results<User> = Results::new(crate::client::Rows::empty());
    assert!(results.collect().await.unwrap().is_empty());
}

#[tokio::test]
async fn driver_error_ends_results_stream() {
    use futures_util::StreamExt;

    let rows = crate::client::Rows::new(futures_util::stream::iter(vec![
        Err(DbError::unknown(std::io::Error::other("gone"))),
        Err(DbError::unknown(std::io::Error::other("never seen"))),
    ]));
    let mut results: Results<User> = Results::new(rows);

    let first = results.next().await.unwrap().unwrap_err();
    assert!(first.to_string().contains("gone"));
    assert!(results.next().await.is_none());
    assert!(results.next().await.is_none());
}
