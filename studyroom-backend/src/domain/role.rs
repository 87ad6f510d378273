// studyroom-backend/src/domain/role.rs

use serde::{Deserialize, Serialize};

/// ロール名を表すenum
///
/// ユーザーは主ロールに加えて additional_roles で複数のロールを同時に
/// 保持できる。権限判定は RoleSet 経由で行い、ADMIN が常に最優先。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleName {
    Admin,
    PlatformUser,
    Member,
}

impl RoleName {
    /// ロール名を文字列として取得
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "admin",
            RoleName::PlatformUser => "platform_user",
            RoleName::Member => "member",
        }
    }

    /// 文字列からロール名を解析
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(RoleName::Admin),
            "platform_user" => Some(RoleName::PlatformUser),
            "member" => Some(RoleName::Member),
            _ => None,
        }
    }

    /// 管理者権限があるかチェック
    pub fn is_admin(&self) -> bool {
        matches!(self, RoleName::Admin)
    }
}

/// ユーザーが保持するロールの集合（主ロール＋追加ロール）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet {
    primary: RoleName,
    additional: Vec<RoleName>,
}

impl RoleSet {
    pub fn new(primary: RoleName, additional: Vec<RoleName>) -> Self {
        Self { primary, additional }
    }

    /// 文字列表現から構築（不明なロール名は無視）
    pub fn from_strings(primary: &str, additional: &[String]) -> Self {
        let primary = RoleName::from_str(primary).unwrap_or(RoleName::PlatformUser);
        let additional = additional
            .iter()
            .filter_map(|s| RoleName::from_str(s))
            .collect();
        Self { primary, additional }
    }

    pub fn primary(&self) -> RoleName {
        self.primary
    }

    /// 指定ロールを保持しているか（主・追加のどちらでも可）
    pub fn has(&self, role: RoleName) -> bool {
        self.primary == role || self.additional.contains(&role)
    }

    /// 管理者権限があるか（ADMINは他の全ロールに優越する）
    pub fn is_admin(&self) -> bool {
        self.has(RoleName::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_roundtrip() {
        for role in [RoleName::Admin, RoleName::PlatformUser, RoleName::Member] {
            assert_eq!(RoleName::from_str(role.as_str()), Some(role));
        }
        assert_eq!(RoleName::from_str("ADMIN"), Some(RoleName::Admin));
        assert_eq!(RoleName::from_str("unknown"), None);
    }

    #[test]
    fn test_role_set_union() {
        let set = RoleSet::from_strings("member", &["admin".to_string()]);
        assert!(set.has(RoleName::Member));
        assert!(set.has(RoleName::Admin));
        assert!(set.is_admin());
        assert!(!set.has(RoleName::PlatformUser));
    }

    #[test]
    fn test_unknown_additional_roles_are_ignored() {
        let set = RoleSet::from_strings("platform_user", &["superuser".to_string()]);
        assert_eq!(set.primary(), RoleName::PlatformUser);
        assert!(!set.is_admin());
    }
}
