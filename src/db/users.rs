use chrono::NaiveDateTime;
use log::debug;
use rusqlite::{Connection, named_params};
use serde::{Deserialize, Serialize};
use serde_rusqlite::from_rows;
use utoipa::ToSchema;

use crate::db::error::{DbError, DbResult, is_constraint_violation};
use crate::models::Id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRow {
    pub id: Id,
    pub username: String,
    pub email: String,
    #[schema(value_type = String, format = DateTime)]
    pub registered_at: NaiveDateTime,
}

const SELECT_USER: &str = r#"
    SELECT
        id,
        username,
        email,
        REPLACE(registered_at, ' ', 'T') as registered_at
    FROM users
"#;

/// Inserts a user and returns the stored row.
///
/// Fails with [`DbError::DuplicateEntry`] when the username is taken.
pub fn create_user(conn: &Connection, username: &str, email: &str) -> DbResult<UserRow> {
    debug!(username = username; "DB: Creating user");

    conn.execute(
        "INSERT INTO users (username, email) VALUES (:username, :email)",
        named_params! {
            ":username": username,
            ":email": email,
        },
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            DbError::DuplicateEntry(format!("username '{username}'"))
        } else {
            DbError::from(e)
        }
    })?;

    let id = conn.last_insert_rowid();
    get_user_by_id(conn, id)?.ok_or_else(|| DbError::Unexpected(format!("user {id} missing after insert")))
}

pub fn get_user_by_id(conn: &Connection, id: Id) -> DbResult<Option<UserRow>> {
    let mut stmt = conn.prepare_cached(&format!("{SELECT_USER} WHERE id = :id"))?;
    let rows = stmt.query(named_params! { ":id": id })?;
    let user = from_rows::<UserRow>(rows).next().transpose()?;
    Ok(user)
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> DbResult<Option<UserRow>> {
    let mut stmt = conn.prepare_cached(&format!("{SELECT_USER} WHERE username = :username"))?;
    let rows = stmt.query(named_params! { ":username": username })?;
    let user = from_rows::<UserRow>(rows).next().transpose()?;
    Ok(user)
}

/// Lists users in id order.
pub fn list_users(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<UserRow>> {
    let mut stmt = conn.prepare_cached(&format!("{SELECT_USER} ORDER BY id ASC LIMIT :limit OFFSET :offset"))?;
    let rows = stmt.query(named_params! { ":limit": limit, ":offset": offset })?;
    let users = from_rows::<UserRow>(rows).collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Updates whichever fields are given. Returns `None` if the user does not exist.
pub fn update_user(
    conn: &Connection,
    id: Id,
    username: Option<&str>,
    email: Option<&str>,
) -> DbResult<Option<UserRow>> {
    debug!(id = id; "DB: Updating user");

    let changed = conn
        .execute(
            r#"
            UPDATE users
            SET username = COALESCE(:username, username),
                email = COALESCE(:email, email)
            WHERE id = :id
            "#,
            named_params! {
                ":id": id,
                ":username": username,
                ":email": email,
            },
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                DbError::DuplicateEntry(format!("username '{}'", username.unwrap_or_default()))
            } else {
                DbError::from(e)
            }
        })?;

    if changed == 0 {
        return Ok(None);
    }
    get_user_by_id(conn, id)
}

/// Deletes a user. Returns `false` if there was nothing to delete.
pub fn delete_user(conn: &Connection, id: Id) -> DbResult<bool> {
    debug!(id = id; "DB: Deleting user");

    let changed = conn.execute("DELETE FROM users WHERE id = :id", named_params! { ":id": id })?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::db::init_db;

    #[test]
    fn test_user_lifecycle() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let pool = init_db(temp_dir.path().join("users.db")).expect("Failed to init DB");
        let conn = pool.get().expect("Failed to get connection");

        let alice = create_user(&conn, "alice", "alice@example.com").unwrap();
        assert_eq!(alice.username, "alice");
        assert_eq!(alice.email, "alice@example.com");

        let bob = create_user(&conn, "bob", "bob@example.com").unwrap();
        assert!(bob.id > alice.id);

        let found = get_user_by_username(&conn, "alice").unwrap().unwrap();
        assert_eq!(found, alice);

        let page = list_users(&conn, 1, 1).unwrap();
        assert_eq!(page, vec![bob.clone()]);

        let updated = update_user(&conn, alice.id, None, Some("alice@petple.kr"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.email, "alice@petple.kr");
        assert_eq!(updated.registered_at, alice.registered_at);

        assert!(update_user(&conn, 9999, Some("ghost"), None).unwrap().is_none());

        assert!(delete_user(&conn, bob.id).unwrap());
        assert!(!delete_user(&conn, bob.id).unwrap());
        assert!(get_user_by_id(&conn, bob.id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_is_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let pool = init_db(temp_dir.path().join("dupes.db")).expect("Failed to init DB");
        let conn = pool.get().expect("Failed to get connection");

        let alice = create_user(&conn, "alice", "alice@example.com").unwrap();
        let bob = create_user(&conn, "bob", "bob@example.com").unwrap();

        let err = create_user(&conn, "alice", "other@example.com").unwrap_err();
        assert!(matches!(err, DbError::DuplicateEntry(_)), "got {err:?}");

        let err = update_user(&conn, bob.id, Some("alice"), None).unwrap_err();
        assert!(matches!(err, DbError::DuplicateEntry(_)), "got {err:?}");

        assert_eq!(list_users(&conn, 10, 0).unwrap(), vec![alice, bob]);
    }
}
