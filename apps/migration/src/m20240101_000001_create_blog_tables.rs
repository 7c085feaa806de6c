//! Users, locations, categories, posts and comments.
//!
//! Deleting a user removes their posts and comments; deleting a post removes
//! its comments. Categories and locations detach from posts instead.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(users_table()).await?;
        manager.create_table(locations_table()).await?;
        manager.create_table(categories_table()).await?;
        manager.create_table(posts_table()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_pub_date")
                    .table(Posts::Table)
                    .col(Posts::PubDate)
                    .to_owned(),
            )
            .await?;

        manager.create_table(comments_table()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_created")
                    .table(Comments::Table)
                    .col(Comments::PostId)
                    .col(Comments::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Locations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

fn users_table() -> TableCreateStatement {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
        .col(
            ColumnDef::new(Users::Username)
                .string_len(150)
                .not_null()
                .unique_key(),
        )
        .col(ColumnDef::new(Users::FirstName).string_len(150).not_null().default(""))
        .col(ColumnDef::new(Users::LastName).string_len(150).not_null().default(""))
        .col(ColumnDef::new(Users::Email).string_len(254).not_null().default(""))
        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
        .col(timestamp_column(Users::CreatedAt))
        .col(timestamp_column(Users::UpdatedAt))
        .to_owned()
}

fn locations_table() -> TableCreateStatement {
    Table::create()
        .table(Locations::Table)
        .if_not_exists()
        .col(ColumnDef::new(Locations::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Locations::Name).string_len(256).not_null())
        .col(
            ColumnDef::new(Locations::IsPublished)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(timestamp_column(Locations::CreatedAt))
        .to_owned()
}

fn categories_table() -> TableCreateStatement {
    Table::create()
        .table(Categories::Table)
        .if_not_exists()
        .col(ColumnDef::new(Categories::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Categories::Title).string_len(256).not_null())
        .col(ColumnDef::new(Categories::Description).text().not_null())
        .col(
            ColumnDef::new(Categories::Slug)
                .string_len(64)
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(Categories::IsPublished)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(timestamp_column(Categories::CreatedAt))
        .to_owned()
}

fn posts_table() -> TableCreateStatement {
    Table::create()
        .table(Posts::Table)
        .if_not_exists()
        .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Posts::AuthorId).uuid().not_null())
        .col(ColumnDef::new(Posts::Title).string_len(256).not_null())
        .col(ColumnDef::new(Posts::Text).text().not_null())
        .col(
            ColumnDef::new(Posts::PubDate)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(ColumnDef::new(Posts::Image).string().null())
        .col(ColumnDef::new(Posts::LocationId).uuid().null())
        .col(ColumnDef::new(Posts::CategoryId).uuid().null())
        .col(
            ColumnDef::new(Posts::IsPublished)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(timestamp_column(Posts::CreatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_posts_author")
                .from(Posts::Table, Posts::AuthorId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_posts_location")
                .from(Posts::Table, Posts::LocationId)
                .to(Locations::Table, Locations::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .on_update(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_posts_category")
                .from(Posts::Table, Posts::CategoryId)
                .to(Categories::Table, Categories::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .on_update(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn comments_table() -> TableCreateStatement {
    Table::create()
        .table(Comments::Table)
        .if_not_exists()
        .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Comments::PostId).uuid().not_null())
        .col(ColumnDef::new(Comments::AuthorId).uuid().not_null())
        .col(ColumnDef::new(Comments::Text).text().not_null())
        .col(timestamp_column(Comments::CreatedAt))
        .foreign_key(
            ForeignKey::create()
                .name("fk_comments_post")
                .from(Comments::Table, Comments::PostId)
                .to(Posts::Table, Posts::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_comments_author")
                .from(Comments::Table, Comments::AuthorId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn timestamp_column<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    FirstName,
    LastName,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    Name,
    IsPublished,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Title,
    Description,
    Slug,
    IsPublished,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    AuthorId,
    Title,
    Text,
    PubDate,
    Image,
    LocationId,
    CategoryId,
    IsPublished,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostId,
    AuthorId,
    Text,
    CreatedAt,
}
