//! End-to-end round trips through a real database: schema, bind/extract
//! symmetry, optionals, enumerations, nested records, and transactions.

use serde::{Deserialize, Serialize};

use quill::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Enumeration)]
enum Role {
    Admin,
    Member,
    Guest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Social {
    fb: String,
    yt: String,
}

#[derive(Model)]
struct UserModel {
    #[quill(cast = "blob")]
    uuid: Vec<u8>,
    #[quill(cast = "text")]
    name: String,
    age: i64,
    active: bool,
    score: Option<f64>,
    #[quill(cast = "int_enum")]
    role: Role,
    #[quill(cast = "text_enum")]
    fallback: Option<Role>,
    #[quill(cast = "json")]
    socials: Vec<Social>,
    #[quill(cast = "blob")]
    bio: Option<Vec<u8>>,
}

#[derive(Debug, View)]
struct UserView {
    uuid: Vec<u8>,
    name: Vec<u8>,
    age: i64,
    active: bool,
    score: Option<f64>,
    #[quill(any = "enum")]
    role: Role,
    #[quill(any = "enum")]
    fallback: Option<Role>,
    #[quill(any = "json")]
    socials: Vec<Social>,
    bio: Option<Vec<u8>>,
}

#[derive(Filter)]
struct UserFilter {
    name: String,
    age: i64,
}

fn sample_user(uuid: &Uuid7) -> UserModel {
    UserModel {
        uuid: uuid.to_vec(),
        name: "Alice".into(),
        age: 30,
        active: true,
        score: Some(9.25),
        role: Role::Member,
        fallback: Some(Role::Guest),
        socials: vec![
            Social {
                fb: "a".into(),
                yt: "b".into(),
            },
            Social {
                fb: "c".into(),
                yt: "d".into(),
            },
        ],
        bio: None,
    }
}

fn open_users_db() -> Connection {
    let conn = Connection::open(Location::Memory).unwrap();
    conn.exec(&create_table::<UserModel>("users")).unwrap();
    conn
}

fn insert(conn: &Connection, user: &UserModel) {
    let sql = builder::create::<UserModel>("users", OnConflict::Abort)
        .statement()
        .unwrap();
    let mut crud = Crud::prepare(conn, &sql).unwrap();
    assert_eq!(crud.exec(user).unwrap(), Step::Done);
}

#[test]
fn test_schema_round_trip_table_info() {
    let conn = open_users_db();
    let info = conn.exec("PRAGMA table_info(users);").unwrap();
    // (name, type, notnull, pk) predicted from the shape.
    let expected = [
        ("uuid", "BLOB", None, "1"),
        ("name", "TEXT", Some("1"), "0"),
        ("age", "INTEGER", Some("1"), "0"),
        ("active", "INTEGER", Some("1"), "0"),
        ("score", "REAL", Some("0"), "0"),
        ("role", "INTEGER", Some("1"), "0"),
        ("fallback", "TEXT", Some("0"), "0"),
        ("socials", "TEXT", Some("1"), "0"),
        ("bio", "BLOB", Some("0"), "0"),
    ];
    assert_eq!(info.len(), expected.len());
    for (row, (name, ty, notnull, pk)) in info.rows().iter().zip(expected) {
        assert_eq!(row.get("name"), Some(name));
        assert_eq!(row.get("type"), Some(ty));
        // The primary key's NOT NULL is implicit; the engine may report
        // it either way, so it is not asserted.
        if let Some(notnull) = notnull {
            assert_eq!(row.get("notnull"), Some(notnull), "column {name}");
        }
        assert_eq!(row.get("pk"), Some(pk), "column {name}");
    }
}

#[test]
fn test_bind_extract_symmetry() {
    let conn = open_users_db();
    let id = Uuid7::new();
    let user = sample_user(&id);
    insert(&conn, &user);

    let sql = builder::find::<UserView, UserFilter>("users")
        .statement()
        .unwrap();
    let mut crud = Crud::prepare(&conn, &sql).unwrap();
    let view = crud.read_one::<UserView>().unwrap().expect("row inserted");

    assert_eq!(view.uuid, user.uuid);
    assert_eq!(view.name, user.name.as_bytes());
    assert_eq!(view.age, user.age);
    assert_eq!(view.active, user.active);
    assert_eq!(view.score, user.score);
    assert_eq!(view.role, user.role);
    assert_eq!(view.fallback, user.fallback);
    assert_eq!(view.socials, user.socials);
    assert_eq!(view.bio, None);
}

#[test]
fn test_absent_optionals_store_null() {
    let conn = open_users_db();
    let mut user = sample_user(&Uuid7::new());
    user.score = None;
    user.fallback = None;
    insert(&conn, &user);

    let rows = conn
        .exec("SELECT score IS NULL AS s, fallback IS NULL AS f, bio IS NULL AS b FROM users;")
        .unwrap();
    let row = rows.first().unwrap();
    assert_eq!(row.get("s"), Some("1"));
    assert_eq!(row.get("f"), Some("1"));
    assert_eq!(row.get("b"), Some("1"));
}

#[test]
fn test_enumeration_storage_forms() {
    let conn = open_users_db();
    insert(&conn, &sample_user(&Uuid7::new()));

    let rows = conn.exec("SELECT role, fallback FROM users;").unwrap();
    let row = rows.first().unwrap();
    // Ordinal for the int cast, variant name for the text cast.
    assert_eq!(row.get("role"), Some("1"));
    assert_eq!(row.get("fallback"), Some("Guest"));
}

#[test]
fn test_filtered_find_and_count() {
    let conn = open_users_db();
    for (name, age) in [("Alice", 30i64), ("Bob", 41), ("Cara", 30)] {
        let mut user = sample_user(&Uuid7::new());
        user.name = name.into();
        user.age = age;
        insert(&conn, &user);
    }

    let sql = builder::find::<UserView, UserFilter>("users")
        .when([group([
            filter("age", Operator::Eq, 0),
            chain(Connective::And),
            filter("name", Operator::Contains, 0),
        ])])
        .unwrap()
        .sort([asc("name")])
        .unwrap()
        .statement()
        .unwrap();
    let mut crud = Crud::prepare(&conn, &sql).unwrap();
    crud.bind_filter("age", Argument::Int(30)).unwrap();
    crud.bind_filter("name", Argument::Text("%r%")).unwrap();
    let views: Vec<UserView> = crud.read_many().unwrap();
    let names: Vec<&[u8]> = views.iter().map(|v| v.name.as_slice()).collect();
    assert_eq!(names, [b"Cara".as_slice()]);

    let sql = builder::count::<UserFilter>("users")
        .when([filter("age", Operator::In, 2)])
        .unwrap()
        .statement()
        .unwrap();
    let mut count = conn.prepare(&sql).unwrap();
    quill::bind::bind_filter_at(&mut count, "age", 1, Argument::Int(30)).unwrap();
    quill::bind::bind_filter_at(&mut count, "age", 2, Argument::Int(41)).unwrap();
    assert_eq!(count.step().unwrap(), Step::Row);
    assert_eq!(count.column_int64(0), 3);
}

#[test]
fn test_update_with_filter() {
    let conn = open_users_db();
    let id = Uuid7::new();
    let mut user = sample_user(&id);
    insert(&conn, &user);

    user.name = "Alicia".into();
    user.score = None;
    let sql = builder::update::<UserModel, UserFilter>("users", Gate::Exact)
        .when([filter("age", Operator::Eq, 0)])
        .unwrap()
        .statement()
        .unwrap();
    let mut crud = Crud::prepare(&conn, &sql).unwrap();
    crud.bind(&user).unwrap();
    crud.bind_filter("age", Argument::Int(30)).unwrap();
    assert_eq!(crud.step().unwrap(), Step::Done);

    let rows = conn.exec("SELECT name, score IS NULL AS s FROM users;").unwrap();
    assert_eq!(rows.first().unwrap().get("name"), Some("Alicia"));
    assert_eq!(rows.first().unwrap().get("s"), Some("1"));
}

#[test]
fn test_delete_all() {
    let conn = open_users_db();
    insert(&conn, &sample_user(&Uuid7::new()));
    insert(&conn, &sample_user(&Uuid7::new()));

    let sql = builder::delete::<UserFilter>("users", Gate::All)
        .statement()
        .unwrap();
    let mut crud = Crud::prepare(&conn, &sql).unwrap();
    assert_eq!(crud.step().unwrap(), Step::Done);
    assert_eq!(admin::count_records(&conn, "users").unwrap(), 0);
}

#[test]
fn test_transaction_atomicity() {
    let conn = open_users_db();
    let sql = builder::create::<UserModel>("users", OnConflict::Abort)
        .statement()
        .unwrap();
    let mut crud = Crud::prepare(&conn, &sql).unwrap();

    crud.begin().unwrap();
    assert_eq!(crud.exec(&sample_user(&Uuid7::new())).unwrap(), Step::Done);
    crud.reset().unwrap();
    crud.rollback().unwrap();
    assert_eq!(admin::count_records(&conn, "users").unwrap(), 0);

    crud.begin().unwrap();
    assert_eq!(crud.exec(&sample_user(&Uuid7::new())).unwrap(), Step::Done);
    crud.reset().unwrap();
    crud.commit().unwrap();
    assert_eq!(admin::count_records(&conn, "users").unwrap(), 1);
}

#[test]
fn test_file_backed_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quill.db").to_string_lossy().into_owned();

    {
        let conn = Connection::open(Location::Path(path.clone())).unwrap();
        conn.exec(&create_table::<UserModel>("users")).unwrap();
        insert(&conn, &sample_user(&Uuid7::new()));
        admin::set_schema_version(&conn, 3).unwrap();
    }

    let conn = Connection::open(Location::Path(path)).unwrap();
    assert_eq!(admin::count_records(&conn, "users").unwrap(), 1);
    assert_eq!(admin::schema_version(&conn).unwrap(), 3);
    admin::integrity_check(&conn).unwrap();
}

#[test]
fn test_uuid_primary_key_rejects_duplicates() {
    let conn = open_users_db();
    let id = Uuid7::new();
    insert(&conn, &sample_user(&id));

    let sql = builder::create::<UserModel>("users", OnConflict::Abort)
        .statement()
        .unwrap();
    let mut crud = Crud::prepare(&conn, &sql).unwrap();
    let err = crud.exec(&sample_user(&id)).unwrap_err();
    assert!(matches!(err, QuillError::UnmetConstraint(_)));

    // OR IGNORE swallows the conflict instead.
    let sql = builder::create::<UserModel>("users", OnConflict::Ignore)
        .statement()
        .unwrap();
    let mut crud = Crud::prepare(&conn, &sql).unwrap();
    assert_eq!(crud.exec(&sample_user(&id)).unwrap(), Step::Done);
    assert_eq!(admin::count_records(&conn, "users").unwrap(), 1);
}
