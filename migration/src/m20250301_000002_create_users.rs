use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len_uniq(Users::Username, 150))
                    .col(string_len_uniq(Users::Email, 254))
                    .col(string_len(Users::FirstName, 150).default(""))
                    .col(string_len(Users::LastName, 150).default(""))
                    .col(text(Users::Bio).default(""))
                    .col(string_len(Users::Role, 15).default("user"))
                    .col(boolean(Users::IsSuperuser).default(false))
                    .col(string_null(Users::ConfirmationCodeHash))
                    .col(big_integer_null(Users::ConfirmationExpiresAt))
                    .col(big_integer_null(Users::ConfirmedAt))
                    .col(big_integer(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    Email,
    FirstName,
    LastName,
    Bio,
    Role,
    IsSuperuser,
    ConfirmationCodeHash,
    ConfirmationExpiresAt,
    ConfirmedAt,
    CreatedAt,
}
