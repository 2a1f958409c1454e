use super::*;
use crate::column::SqlFunction;
use crate::value::Instruction;

#[test]
fn builds_placeholders_in_order() {
    let mut b = StatementBuilder::new("SELECT * FROM users WHERE a = ");
    b.write_arg(1_i32).write_str(" AND b = ").write_arg("x");

    assert_eq!(b.sql(), "SELECT * FROM users WHERE a = $1 AND b = $2");
    assert_eq!(b.args(), &[Value::from(1_i32), Value::from("x")]);
}

#[test]
fn repeated_value_reuses_placeholder() {
    let mut b = StatementBuilder::default();
    b.write_arg("abc")
        .write_str(", ")
        .write_arg(7_i64)
        .write_str(", ")
        .write_arg("abc")
        .write_str(", ")
        .write_arg(String::from("abc"));

    assert_eq!(b.sql(), "$1, $2, $1, $1");
    assert_eq!(b.args().len(), 2);
}

#[test]
fn equal_bytes_of_different_types_do_not_collide() {
    let mut b = StatementBuilder::default();
    b.write_arg("abc")
        .write_str(" ")
        .write_arg(b"abc".as_slice())
        .write_str(" ")
        .write_arg(5_i32)
        .write_str(" ")
        .write_arg(5_i64);

    assert_eq!(b.sql(), "$1 $2 $3 $4");
    assert_eq!(b.args().len(), 4);
}

#[test]
fn instructions_are_inlined() {
    let mut b = StatementBuilder::new("UPDATE t SET a = ");
    b.write_arg(Instruction::Now)
        .write_str(", b = ")
        .write_arg(Instruction::Null)
        .write_str(", c = ")
        .write_arg(Instruction::Default)
        .write_str(", d = ")
        .write_arg(1_i16);

    assert_eq!(
        b.sql(),
        "UPDATE t SET a = NOW(), b = NULL, c = DEFAULT, d = $1"
    );
    assert_eq!(b.args().len(), 1);
}

#[test]
fn wrapped_args_render_function() {
    let mut b = StatementBuilder::default();
    b.write_arg(Arg::lower("Name"))
        .write_str(" ")
        .write_arg(Arg::Function(SqlFunction::Sha256, Box::new(Arg::lower("Name"))));

    assert_eq!(b.sql(), "LOWER($1) SHA256(LOWER($1))");
    assert_eq!(b.args(), &[Value::from("Name")]);
}

#[test]
fn coalesce_renders_both_args() {
    let mut b = StatementBuilder::default();
    b.write_arg(Arg::coalesce(Instruction::Null, 0_i32))
        .write_str(" ")
        .write_arg(Arg::coalesce(5_i32, 0_i32));

    assert_eq!(b.sql(), "COALESCE(NULL, $1) COALESCE($2, $1)");
    assert_eq!(b.args(), &[Value::from(0_i32), Value::from(5_i32)]);
    assert_eq!(
        Arg::coalesce(Instruction::Null, "x").family(),
        Some(crate::value::Family::Text)
    );
}

#[test]
fn write_args_is_comma_separated() {
    let mut b = StatementBuilder::new("INSERT INTO t VALUES (");
    b.write_args([Arg::from(1_i32), Arg::from("x"), Arg::from(Instruction::Default)])
        .write_char(')');

    assert_eq!(b.sql(), "INSERT INTO t VALUES ($1, $2, DEFAULT)");
    assert_eq!(b.args().len(), 2);
}

#[test]
fn build_consumes_into_statement() {
    let mut b = StatementBuilder::new("SELECT ");
    b.write_arg(true);
    let stmt = b.build();

    assert_eq!(stmt.sql, "SELECT $1");
    assert_eq!(stmt.args, vec![Value::Boolean(true)]);
    assert_eq!(stmt.params().len(), 1);
    assert_eq!(stmt.to_string(), "SELECT $1");
}

#[test]
fn fmt_write_appends_text() {
    use std::fmt::Write as _;

    let mut b = StatementBuilder::default();
    write!(b, "LIMIT {}", 3).unwrap();
    assert_eq!(b.sql(), "LIMIT 3");
}
