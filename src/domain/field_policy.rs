/// リソース種別ごとのフィールドポリシー
///
/// 作成時の必須フィールド、部分更新で変更可能なフィールド、
/// 配列型フィールド、一意制約フィールドの固定許可リストを保持する。
/// `id` / `created_at` / `created_by` はどのリソースでも作成後に変更できない。

/// 作成時に必須のフィールド
///
/// `label`はエラーメッセージ用の表示名、`column`はレコード上のフィールド名。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredField {
    pub label: &'static str,
    pub column: &'static str,
}

/// 1リソース種別分のフィールド許可リスト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    /// リソース名（エラーメッセージ・ログ用）
    pub resource: &'static str,
    /// 作成時の必須フィールド
    pub required: &'static [RequiredField],
    /// 部分更新で変更可能なフィールド
    pub mutable: &'static [&'static str],
    /// 配列型（参照ID列）フィールド
    pub array_fields: &'static [&'static str],
    /// 全レコード間で一意でなければならないフィールド
    pub unique_fields: &'static [&'static str],
}

impl FieldPolicy {
    /// フィールドが部分更新で変更可能か
    pub fn is_mutable(&self, field: &str) -> bool {
        self.mutable.contains(&field)
    }

    /// フィールドが配列型か
    pub fn is_array_field(&self, field: &str) -> bool {
        self.array_fields.contains(&field)
    }
}

// ===========================================
// リソース種別
// ===========================================

/// このバックエンドが扱うリソース種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Organization,
    User,
    Device,
    Content,
    Playlist,
    Schedule,
    Application,
}

impl ResourceKind {
    /// リソース種別に対応するフィールドポリシー
    pub fn policy(self) -> &'static FieldPolicy {
        match self {
            ResourceKind::Organization => &ORGANIZATION_POLICY,
            ResourceKind::User => &USER_POLICY,
            ResourceKind::Device => &DEVICE_POLICY,
            ResourceKind::Content => &CONTENT_POLICY,
            ResourceKind::Playlist => &PLAYLIST_POLICY,
            ResourceKind::Schedule => &SCHEDULE_POLICY,
            ResourceKind::Application => &APPLICATION_POLICY,
        }
    }

    /// リソース名（"organization"など）
    pub fn name(self) -> &'static str {
        self.policy().resource
    }

    /// レスポンス・エラーメッセージ用の表示名（"Organization"など）
    pub fn display_name(self) -> &'static str {
        match self {
            ResourceKind::Organization => "Organization",
            ResourceKind::User => "User",
            ResourceKind::Device => "Device",
            ResourceKind::Content => "Content",
            ResourceKind::Playlist => "Playlist",
            ResourceKind::Schedule => "Schedule",
            ResourceKind::Application => "Application",
        }
    }
}

// ===========================================
// リソース別ポリシー定義
// ===========================================

/// 組織: licenseは全組織間で一意
static ORGANIZATION_POLICY: FieldPolicy = FieldPolicy {
    resource: "organization",
    required: &[
        RequiredField {
            label: "Organization Name",
            column: "name",
        },
        RequiredField {
            label: "License",
            column: "license",
        },
    ],
    mutable: &["name", "license", "updated_by"],
    array_fields: &[],
    unique_fields: &["license"],
};

/// ユーザー: emailは全ユーザー間で一意。passwordはハッシュ化して保存する
static USER_POLICY: FieldPolicy = FieldPolicy {
    resource: "user",
    required: &[
        RequiredField {
            label: "First Name",
            column: "first_name",
        },
        RequiredField {
            label: "Last Name",
            column: "last_name",
        },
        RequiredField {
            label: "Email",
            column: "email",
        },
        RequiredField {
            label: "Role",
            column: "role",
        },
        RequiredField {
            label: "Password",
            column: "password",
        },
        RequiredField {
            label: "Organization ID",
            column: "organization_id",
        },
    ],
    mutable: &[
        "first_name",
        "last_name",
        "email",
        "role",
        "password",
        "updated_by",
    ],
    array_fields: &[],
    unique_fields: &["email"],
};

static DEVICE_POLICY: FieldPolicy = FieldPolicy {
    resource: "device",
    required: &[
        RequiredField {
            label: "Device Name",
            column: "name",
        },
        RequiredField {
            label: "Organization ID",
            column: "organization_id",
        },
    ],
    mutable: &[
        "name",
        "description",
        "model",
        "version",
        "ip_address",
        "status",
        "playlists",
        "applications",
        "contents",
        "storage_left",
        "storage_consumed",
    ],
    array_fields: &["playlists", "applications", "contents"],
    unique_fields: &[],
};

static CONTENT_POLICY: FieldPolicy = FieldPolicy {
    resource: "content",
    required: &[
        RequiredField {
            label: "URL",
            column: "url",
        },
        RequiredField {
            label: "Title",
            column: "title",
        },
        RequiredField {
            label: "Organization ID",
            column: "organization_id",
        },
    ],
    mutable: &[
        "url",
        "thumbnail",
        "title",
        "description",
        "is_active",
        "is_deleted",
        "assigned_to",
        "playlists",
        "updated_by",
    ],
    array_fields: &["assigned_to", "playlists"],
    unique_fields: &[],
};

static PLAYLIST_POLICY: FieldPolicy = FieldPolicy {
    resource: "playlist",
    required: &[
        RequiredField {
            label: "Playlist Name",
            column: "name",
        },
        RequiredField {
            label: "Organization ID",
            column: "organization_id",
        },
    ],
    mutable: &["name", "description", "contents", "updated_by"],
    array_fields: &["contents"],
    unique_fields: &[],
};

static SCHEDULE_POLICY: FieldPolicy = FieldPolicy {
    resource: "schedule",
    required: &[
        RequiredField {
            label: "Start At",
            column: "start_at",
        },
        RequiredField {
            label: "End At",
            column: "end_at",
        },
        RequiredField {
            label: "Organization ID",
            column: "organization_id",
        },
    ],
    mutable: &[
        "start_at",
        "end_at",
        "loop",
        "is_active",
        "assigned_to",
        "contents",
        "playlists",
        "updated_by",
    ],
    array_fields: &["assigned_to", "contents", "playlists"],
    unique_fields: &[],
};

/// アプリケーション: 更新操作を持たないためmutableは空
static APPLICATION_POLICY: FieldPolicy = FieldPolicy {
    resource: "application",
    required: &[
        RequiredField {
            label: "Application Name",
            column: "name",
        },
        RequiredField {
            label: "Organization ID",
            column: "organization_id",
        },
        RequiredField {
            label: "Client ID",
            column: "client_id",
        },
        RequiredField {
            label: "Platform",
            column: "platform",
        },
    ],
    mutable: &[],
    array_fields: &[],
    unique_fields: &[],
};

/// 有効なユーザーロール
pub const VALID_USER_ROLES: &[&str] = &["superadmin", "admin", "user", "viewer"];

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ポリシーテーブルテスト ====================

    #[test]
    fn test_immutable_fields_never_mutable() {
        // id / created_at / created_by はどのリソースでも変更不可
        for kind in [
            ResourceKind::Organization,
            ResourceKind::User,
            ResourceKind::Device,
            ResourceKind::Content,
            ResourceKind::Playlist,
            ResourceKind::Schedule,
            ResourceKind::Application,
        ] {
            let policy = kind.policy();
            assert!(!policy.is_mutable("id"), "{}", policy.resource);
            assert!(!policy.is_mutable("created_at"), "{}", policy.resource);
            assert!(!policy.is_mutable("created_by"), "{}", policy.resource);
            assert!(!policy.is_mutable("updated_at"), "{}", policy.resource);
        }
    }

    #[test]
    fn test_organization_policy() {
        let policy = ResourceKind::Organization.policy();
        assert_eq!(policy.resource, "organization");
        assert!(policy.is_mutable("license"));
        assert!(!policy.is_mutable("status"));
        assert_eq!(policy.unique_fields, &["license"]);
        assert!(policy.array_fields.is_empty());
    }

    #[test]
    fn test_user_policy() {
        let policy = ResourceKind::User.policy();
        assert_eq!(policy.required.len(), 6);
        assert!(policy.is_mutable("password"));
        // organization_idは作成時必須だが変更不可
        assert!(!policy.is_mutable("organization_id"));
        assert_eq!(policy.unique_fields, &["email"]);
    }

    #[test]
    fn test_device_policy_array_fields() {
        let policy = ResourceKind::Device.policy();
        assert!(policy.is_array_field("playlists"));
        assert!(policy.is_array_field("applications"));
        assert!(policy.is_array_field("contents"));
        assert!(!policy.is_array_field("name"));
        assert!(policy.is_mutable("storage_left"));
    }

    #[test]
    fn test_schedule_policy_array_fields() {
        let policy = ResourceKind::Schedule.policy();
        assert_eq!(
            policy.array_fields,
            &["assigned_to", "contents", "playlists"]
        );
        assert!(policy.is_mutable("loop"));
    }

    #[test]
    fn test_application_policy_has_no_mutable_fields() {
        let policy = ResourceKind::Application.policy();
        assert!(policy.mutable.is_empty());
        assert_eq!(policy.required.len(), 4);
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(ResourceKind::Organization.name(), "organization");
        assert_eq!(ResourceKind::Device.display_name(), "Device");
    }
}
