use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Role, Tenant, User};

pub struct TenantRepo;

impl TenantRepo {
    pub fn create(conn: &Connection, name: &str) -> Result<Tenant, AppError> {
        let id = Uuid::new_v4().to_string();
        let slug = format!("{}-{}", slugify(name), &id[..8]);
        conn.execute(
            "INSERT INTO tenants (id, name, slug) VALUES (?1, ?2, ?3)",
            params![id, name, slug],
        )?;
        Self::get(conn, &id)
    }

    pub fn find_by_slug(conn: &Connection, slug: &str) -> Result<Option<String>, AppError> {
        conn.query_row(
            "SELECT id FROM tenants WHERE slug = ?1",
            params![slug],
            |row| row.get(0),
        )
        .optional()
        .map_err(AppError::Store)
    }

    pub fn get(conn: &Connection, id: &str) -> Result<Tenant, AppError> {
        conn.query_row(
            "SELECT id, name, created_at FROM tenants WHERE id = ?1",
            params![id],
            |row| {
                Ok(Tenant {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Store(other),
        })
    }

    pub fn add_membership(
        conn: &Connection,
        user_id: &str,
        tenant_id: &str,
        role: Role,
    ) -> Result<(), AppError> {
        conn.execute(
            "INSERT INTO tenant_users (user_id, tenant_id, role) VALUES (?1, ?2, ?3)",
            params![user_id, tenant_id, role.as_str()],
        )?;
        Ok(())
    }

    /// Returns the first tenant a user belongs to. This system's registration flow always
    /// creates exactly one tenant per new user, so "first" is also "only" in practice.
    pub fn get_tenant_for_user(conn: &Connection, user_id: &str) -> Result<String, AppError> {
        conn.query_row(
            "SELECT tenant_id FROM tenant_users WHERE user_id = ?1 LIMIT 1",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Store(other),
        })
    }
}

pub struct UserRepo;

impl UserRepo {
    pub fn create(conn: &Connection, email: &str, password_hash: &str) -> Result<User, AppError> {
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO users (id, email, password_hash) VALUES (?1, ?2, ?3)",
            params![id, email, password_hash],
        )?;
        Self::get(conn, &id)
    }

    pub fn get(conn: &Connection, id: &str) -> Result<User, AppError> {
        conn.query_row(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?1",
            params![id],
            Self::row_to_user,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
            other => AppError::Store(other),
        })
    }

    pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>, AppError> {
        conn.query_row(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?1",
            params![email],
            Self::row_to_user,
        )
        .optional()
        .map_err(AppError::Store)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug: String = lowered
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "tenant".to_string()
    } else {
        trimmed.to_string()
    }
}
