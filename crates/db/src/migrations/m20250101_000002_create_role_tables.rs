//! Create roles, permissions and their junction tables.
//!
//! Seeds the staff permissions and the `Staff` system role.

use sea_orm_migration::prelude::*;

/// Permissions guarding the staff screens.
const STAFF_PERMISSIONS: [(&str, &str); 4] = [
    ("01jfa0000000000000000perm1", "staff-list"),
    ("01jfa0000000000000000perm2", "staff-create"),
    ("01jfa0000000000000000perm3", "staff-edit"),
    ("01jfa0000000000000000perm4", "staff-delete"),
];

const STAFF_ROLE: (&str, &str) = ("01jfa0000000000000000role1", "Staff");

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Roles::Name).string_len(128).not_null().unique_key())
                    .col(ColumnDef::new(Roles::CustomRole).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Roles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Permissions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Permissions::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Permissions::Name).string_len(128).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RolePermissions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RolePermissions::RoleId).string_len(32).not_null())
                    .col(ColumnDef::new(RolePermissions::PermissionId).string_len(32).not_null())
                    .primary_key(
                        Index::create()
                            .col(RolePermissions::RoleId)
                            .col(RolePermissions::PermissionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_permissions_role")
                            .from(RolePermissions::Table, RolePermissions::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_permissions_permission")
                            .from(RolePermissions::Table, RolePermissions::PermissionId)
                            .to(Permissions::Table, Permissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserRoles::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(UserRoles::RoleId).string_len(32).not_null())
                    .primary_key(Index::create().col(UserRoles::UserId).col(UserRoles::RoleId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_user")
                            .from(UserRoles::Table, UserRoles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_role")
                            .from(UserRoles::Table, UserRoles::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: role_id (who holds a role)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_roles_role_id")
                    .table(UserRoles::Table)
                    .col(UserRoles::RoleId)
                    .to_owned(),
            )
            .await?;

        let mut permissions = Query::insert()
            .into_table(Permissions::Table)
            .columns([Permissions::Id, Permissions::Name])
            .to_owned();
        for (id, name) in STAFF_PERMISSIONS {
            permissions.values_panic([id.into(), name.into()]);
        }
        manager.exec_stmt(permissions).await?;

        let staff_role = Query::insert()
            .into_table(Roles::Table)
            .columns([Roles::Id, Roles::Name, Roles::CustomRole])
            .values_panic([STAFF_ROLE.0.into(), STAFF_ROLE.1.into(), false.into()])
            .to_owned();
        manager.exec_stmt(staff_role).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserRoles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RolePermissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Name,
    CustomRole,
    CreatedAt,
}

#[derive(Iden)]
enum Permissions {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum RolePermissions {
    Table,
    RoleId,
    PermissionId,
}

#[derive(Iden)]
enum UserRoles {
    Table,
    UserId,
    RoleId,
}
