//! Statement-text checks against derived shapes: exact SQL renderings
//! and placeholder naming.

use quill::prelude::*;

#[derive(Model)]
struct UserModel {
    #[quill(cast = "blob")]
    uuid: Vec<u8>,
    #[quill(cast = "text")]
    name: String,
    age: i64,
    #[quill(cast = "blob")]
    bio: Option<Vec<u8>>,
}

#[derive(View)]
struct NameAge {
    name: Vec<u8>,
    age: i64,
}

#[derive(Filter)]
struct UserFilter {
    name: String,
    age: i64,
}

#[test]
fn test_create_table_text() {
    assert_eq!(
        create_table::<UserModel>("users"),
        "CREATE TABLE IF NOT EXISTS users (\n\
         \tuuid BLOB PRIMARY KEY,\n\
         \tname TEXT NOT NULL,\n\
         \tage INTEGER NOT NULL,\n\
         \tbio BLOB\n\
         ) STRICT, WITHOUT ROWID;"
    );
}

#[test]
fn test_find_full_chain_text() {
    let sql = builder::find::<NameAge, UserFilter>("users")
        .dist()
        .unwrap()
        .when([group([
            filter("name", Operator::Eq, 0),
            chain(Connective::And),
            filter("age", Operator::In, 3),
        ])])
        .unwrap()
        .sort([asc("name"), desc("age")])
        .unwrap()
        .limit(10)
        .unwrap()
        .skip(12)
        .unwrap()
        .statement()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT DISTINCT name, age FROM users\n\
         WHERE (name = :_name AND age IN (:_age1, :_age2, :_age3))\n\
         ORDER BY name ASC, age DESC\n\
         LIMIT 10\n\
         OFFSET 12;"
    );
}

#[test]
fn test_update_without_when_is_refused() {
    let err = builder::update::<UserModel, UserFilter>("users", Gate::Exact)
        .statement()
        .unwrap_err();
    assert!(matches!(err, QuillError::MismatchedConstraint(_)));
}

#[test]
fn test_delete_gate_pairings() {
    builder::delete::<UserFilter>("users", Gate::All)
        .statement()
        .unwrap();
    let err = builder::delete::<UserFilter>("users", Gate::All)
        .when([filter("age", Operator::Gt, 0)])
        .unwrap()
        .statement()
        .unwrap_err();
    assert!(matches!(err, QuillError::MismatchedConstraint(_)));
}

/// Every colon-prefixed identifier in a built statement is either a
/// `:field` of the model shape or a `:_field` of the filter shape.
#[test]
fn test_placeholder_naming_convention() {
    let statements = [
        builder::create::<UserModel>("users", OnConflict::Abort)
            .statement()
            .unwrap(),
        builder::update::<UserModel, UserFilter>("users", Gate::Exact)
            .when([filter("age", Operator::Between, 0)])
            .unwrap()
            .statement()
            .unwrap(),
        builder::find::<NameAge, UserFilter>("users")
            .when([filter("name", Operator::Contains, 0)])
            .unwrap()
            .statement()
            .unwrap(),
        builder::count::<UserFilter>("users")
            .when([filter("age", Operator::NotIn, 2)])
            .unwrap()
            .statement()
            .unwrap(),
    ];

    let model_labels: Vec<&str> = <UserModel as Model>::FIELDS.iter().map(|f| f.label).collect();
    let filter_labels: Vec<&str> = <UserFilter as Filter>::FIELDS.iter().map(|f| f.label).collect();

    for sql in &statements {
        for (i, _) in sql.match_indices(':') {
            let tail = &sql[i + 1..];
            let ident: String = tail
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            if let Some(rest) = ident.strip_prefix('_') {
                let base = rest.trim_end_matches(|c: char| c.is_ascii_digit());
                assert!(
                    filter_labels.contains(&base),
                    "'{ident}' is not a filter placeholder in {sql}"
                );
            } else {
                assert!(
                    model_labels.contains(&ident.as_str()),
                    "'{ident}' is not a bind placeholder in {sql}"
                );
            }
        }
    }
}
