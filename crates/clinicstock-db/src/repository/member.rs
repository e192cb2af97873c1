//! # Member Repository
//!
//! Team membership. Authentication is handled by the identity provider; a
//! member row only links an e-mail to an organization with a role.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use clinicstock_core::validation::{validate_email, validate_name};
use clinicstock_core::{check_capacity, Member, MemberRole, Resource};

use super::{begin_write, count_for_organization};
use super::organization::load_plan;
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    /// Adds a member, enforcing the plan's seat cap.
    ///
    /// E-mails are stored lowercase so the same person cannot join twice
    /// with different casing.
    pub async fn add(
        &self,
        organization_id: &str,
        email: &str,
        display_name: Option<&str>,
        role: MemberRole,
    ) -> DbResult<Member> {
        validate_email(email)?;
        if let Some(name) = display_name {
            validate_name("display_name", name)?;
        }

        let member = Member {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            email: email.trim().to_lowercase(),
            display_name: display_name.map(|n| n.trim().to_string()),
            role,
            created_at: Utc::now(),
        };

        let mut tx = begin_write(&self.pool).await?;

        let plan = load_plan(&mut *tx, organization_id).await?;
        let current = count_for_organization(&mut *tx, "members", organization_id).await?;
        check_capacity(plan, Resource::Members, current)?;

        sqlx::query(
            r#"
            INSERT INTO members (id, organization_id, email, display_name, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&member.id)
        .bind(&member.organization_id)
        .bind(&member.email)
        .bind(&member.display_name)
        .bind(member.role)
        .bind(member.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &member.email),
            other => other,
        })?;

        tx.commit().await?;

        info!(organization_id = %organization_id, role = ?role, "Member added");
        Ok(member)
    }

    /// Lists members, oldest first.
    pub async fn list(&self, organization_id: &str) -> DbResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, organization_id, email, display_name, role, created_at
            FROM members
            WHERE organization_id = ?1
            ORDER BY created_at, email
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    pub async fn update_role(
        &self,
        organization_id: &str,
        id: &str,
        role: MemberRole,
    ) -> DbResult<()> {
        debug!(organization_id = %organization_id, member_id = %id, role = ?role, "Changing role");

        let result =
            sqlx::query("UPDATE members SET role = ?3 WHERE id = ?1 AND organization_id = ?2")
                .bind(id)
                .bind(organization_id)
                .bind(role)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", id));
        }

        Ok(())
    }

    pub async fn remove(&self, organization_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?1 AND organization_id = ?2")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Member", id));
        }

        info!(organization_id = %organization_id, member_id = %id, "Member removed");
        Ok(())
    }
}
