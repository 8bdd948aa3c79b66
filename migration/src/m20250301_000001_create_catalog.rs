use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(string_len(Categories::Name, 256))
                    .col(string_len_uniq(Categories::Slug, 50))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string_len(Genres::Name, 256))
                    .col(string_len_uniq(Genres::Slug, 50))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Titles::Table)
                    .if_not_exists()
                    .col(pk_auto(Titles::Id))
                    .col(string_len(Titles::Name, 256))
                    .col(integer(Titles::Year))
                    .col(text(Titles::Description).default(""))
                    .col(integer_null(Titles::CategoryId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_titles_category")
                            .from(Titles::Table, Titles::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_titles_name")
                    .table(Titles::Table)
                    .col(Titles::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TitleGenres::Table)
                    .if_not_exists()
                    .col(pk_auto(TitleGenres::Id))
                    .col(integer(TitleGenres::TitleId))
                    .col(integer(TitleGenres::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_genres_title")
                            .from(TitleGenres::Table, TitleGenres::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_genres_genre")
                            .from(TitleGenres::Table, TitleGenres::GenreId)
                            .to(Genres::Table, Genres::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_title_genres_unique")
                    .table(TitleGenres::Table)
                    .col(TitleGenres::TitleId)
                    .col(TitleGenres::GenreId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TitleGenres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Titles::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Categories::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Categories {
    Table,
    Id,
    Name,
    Slug,
}

#[derive(DeriveIden)]
pub(crate) enum Genres {
    Table,
    Id,
    Name,
    Slug,
}

#[derive(DeriveIden)]
pub(crate) enum Titles {
    Table,
    Id,
    Name,
    Year,
    Description,
    CategoryId,
}

#[derive(DeriveIden)]
enum TitleGenres {
    Table,
    Id,
    TitleId,
    GenreId,
}
