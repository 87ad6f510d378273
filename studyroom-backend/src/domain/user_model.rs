// studyroom-backend/src/domain/user_model.rs

use super::role::{RoleName, RoleSet};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,

    #[serde(skip_serializing)] // パスワードハッシュは絶対にシリアライズしない
    pub password_hash: String,

    pub role: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub additional_roles: Json,

    pub is_active: bool,

    pub email_verified: bool,

    pub free_document_count: i32,

    pub paid_document_count: i32,

    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::domain::document_model::Entity")]
    Documents,

    #[sea_orm(has_many = "crate::domain::auth_token_model::Entity")]
    AuthTokens,
}

impl Related<crate::domain::document_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<crate::domain::auth_token_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthTokens.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            role: Set(RoleName::PlatformUser.as_str().to_string()),
            additional_roles: Set(serde_json::json!([])),
            is_active: Set(true),
            email_verified: Set(false),
            free_document_count: Set(0),
            paid_document_count: Set(0),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            // 更新の場合のみ updated_at を更新
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}

impl Model {
    /// 追加ロールを文字列のリストとして取得
    pub fn additional_role_names(&self) -> Vec<String> {
        self.additional_roles
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 保持ロールの集合を取得
    pub fn role_set(&self) -> RoleSet {
        RoleSet::from_strings(&self.role, &self.additional_role_names())
    }

    pub fn is_admin(&self) -> bool {
        self.role_set().is_admin()
    }

    /// JWTに載せるクレームへ変換
    pub fn to_claims(&self) -> UserClaims {
        UserClaims {
            user_id: self.id,
            email: self.email.clone(),
            role: self.role.clone(),
            additional_roles: self.additional_role_names(),
        }
    }
}

/// JWTに埋め込むユーザー情報
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserClaims {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub additional_roles: Vec<String>,
}

impl UserClaims {
    pub fn role_set(&self) -> RoleSet {
        RoleSet::from_strings(&self.role, &self.additional_roles)
    }

    pub fn is_admin(&self) -> bool {
        self.role_set().is_admin()
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.role_set().has(role)
    }
}

/// セキュリティ上安全なユーザー情報（パスワードハッシュを除く）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SafeUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub additional_roles: Vec<String>,
    pub is_active: bool,
    pub email_verified: bool,
    pub free_document_count: i32,
    pub paid_document_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Model> for SafeUser {
    fn from(user: Model) -> Self {
        let additional_roles = user.additional_role_names();
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            additional_roles,
            is_active: user.is_active,
            email_verified: user.email_verified,
            free_document_count: user.free_document_count,
            paid_document_count: user.paid_document_count,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(role: &str, additional: serde_json::Value) -> Model {
        Model {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
            additional_roles: additional,
            is_active: true,
            email_verified: true,
            free_document_count: 0,
            paid_document_count: 0,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_set_from_columns() {
        let user = test_user("member", serde_json::json!(["admin"]));
        assert!(user.is_admin());
        assert!(user.role_set().has(RoleName::Member));
    }

    #[test]
    fn test_claims_carry_additional_roles() {
        let user = test_user("platform_user", serde_json::json!(["member"]));
        let claims = user.to_claims();
        assert!(claims.has_role(RoleName::Member));
        assert!(claims.has_role(RoleName::PlatformUser));
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_malformed_additional_roles_are_ignored() {
        let user = test_user("platform_user", serde_json::json!({"not": "an array"}));
        assert!(user.additional_role_names().is_empty());
    }
}
