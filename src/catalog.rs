//! Categories, genres and titles.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::{
    db::is_unique_violation,
    entities::{category, genre, title, title_genre},
    error::{AppError, AppResult},
    models::{CreateTitleRequest, SlugEntry, TitleOut, TitleQuery, UpdateTitleRequest},
    pagination::{self, Page, PageRequest},
    rating,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Taxonomy {
    Category,
    Genre,
}

impl Taxonomy {
    fn noun(self) -> &'static str {
        match self {
            Taxonomy::Category => "category",
            Taxonomy::Genre => "genre",
        }
    }
}

pub fn validate_slug(slug: &str) -> AppResult<()> {
    let ok = !slug.is_empty()
        && slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(AppError::field("slug", "enter a valid slug of letters, numbers, underscores or hyphens"))
    }
}

pub fn validate_year(year: i32, current_year: i32) -> AppResult<()> {
    if year < 0 {
        return Err(AppError::field("year", "year must not be negative"));
    }
    if year > current_year {
        return Err(AppError::field("year", format!("year must not be later than {current_year}")));
    }
    Ok(())
}

fn current_year() -> i32 {
    i32::from(jiff::Zoned::now().year())
}

#[derive(Clone)]
pub struct CatalogStore {
    db: DatabaseConnection,
}

impl CatalogStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_entries(
        &self,
        kind: Taxonomy,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<Page<SlugEntry>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        match kind {
            Taxonomy::Category => {
                let mut select = category::Entity::find()
                    .order_by_asc(category::Column::Name)
                    .order_by_asc(category::Column::Id);
                if let Some(term) = search {
                    select = select.filter(category::Column::Name.starts_with(term));
                }
                pagination::fetch(&self.db, select, page).await?.map(|m| Ok(m.into()))
            },
            Taxonomy::Genre => {
                let mut select = genre::Entity::find()
                    .order_by_asc(genre::Column::Name)
                    .order_by_asc(genre::Column::Id);
                if let Some(term) = search {
                    select = select.filter(genre::Column::Name.starts_with(term));
                }
                pagination::fetch(&self.db, select, page).await?.map(|m| Ok(m.into()))
            },
        }
    }

    pub async fn create_entry(&self, kind: Taxonomy, entry: SlugEntry) -> AppResult<SlugEntry> {
        validate_slug(&entry.slug)?;

        let inserted = match kind {
            Taxonomy::Category => category::ActiveModel {
                name: Set(entry.name.clone()),
                slug: Set(entry.slug.clone()),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map(SlugEntry::from),
            Taxonomy::Genre => genre::ActiveModel {
                name: Set(entry.name.clone()),
                slug: Set(entry.slug.clone()),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map(SlugEntry::from),
        };

        match inserted {
            Ok(created) => {
                info!(kind = kind.noun(), slug = %created.slug, "created");
                Ok(created)
            },
            Err(err) if is_unique_violation(&err) => Err(AppError::conflict(
                "slug",
                format!("a {} with this slug already exists", kind.noun()),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn ensure_entry(&self, kind: Taxonomy, slug: &str) -> AppResult<()> {
        let found = match kind {
            Taxonomy::Category => {
                category::Entity::find()
                    .filter(category::Column::Slug.eq(slug))
                    .count(&self.db)
                    .await?
            },
            Taxonomy::Genre => {
                genre::Entity::find().filter(genre::Column::Slug.eq(slug)).count(&self.db).await?
            },
        };
        if found == 0 { Err(AppError::NotFound(kind.noun())) } else { Ok(()) }
    }

    pub async fn delete_entry(&self, kind: Taxonomy, slug: &str) -> AppResult<()> {
        let res = match kind {
            Taxonomy::Category => {
                category::Entity::delete_many()
                    .filter(category::Column::Slug.eq(slug))
                    .exec(&self.db)
                    .await?
            },
            Taxonomy::Genre => {
                genre::Entity::delete_many()
                    .filter(genre::Column::Slug.eq(slug))
                    .exec(&self.db)
                    .await?
            },
        };
        if res.rows_affected == 0 {
            return Err(AppError::NotFound(kind.noun()));
        }
        info!(kind = kind.noun(), slug, "deleted");
        Ok(())
    }

    pub async fn list_titles(&self, q: &TitleQuery, page: PageRequest) -> AppResult<Page<TitleOut>> {
        let mut select =
            title::Entity::find().order_by_asc(title::Column::Name).order_by_asc(title::Column::Id);

        if let Some(slug) = q.category.as_deref() {
            let Some(cat) = category::Entity::find()
                .filter(category::Column::Slug.eq(slug))
                .one(&self.db)
                .await?
            else {
                return Ok(Page { count: 0, results: Vec::new() });
            };
            select = select.filter(title::Column::CategoryId.eq(cat.id));
        }
        if let Some(slug) = q.genre.as_deref() {
            let Some(g) =
                genre::Entity::find().filter(genre::Column::Slug.eq(slug)).one(&self.db).await?
            else {
                return Ok(Page { count: 0, results: Vec::new() });
            };
            let title_ids: Vec<i32> = title_genre::Entity::find()
                .filter(title_genre::Column::GenreId.eq(g.id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|link| link.title_id)
                .collect();
            select = select.filter(title::Column::Id.is_in(title_ids));
        }
        if let Some(name) = q.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(title::Column::Name.contains(name));
        }
        if let Some(year) = q.year {
            select = select.filter(title::Column::Year.eq(year));
        }

        let page = pagination::fetch(&self.db, select, page).await?;
        let results = self.hydrate(page.results).await?;
        Ok(Page { count: page.count, results })
    }

    pub async fn title(&self, id: i32) -> AppResult<TitleOut> {
        let model = self.title_model(id).await?;
        self.hydrate(vec![model]).await?.pop().ok_or(AppError::NotFound("title"))
    }

    pub async fn title_model(&self, id: i32) -> AppResult<title::Model> {
        title::Entity::find_by_id(id).one(&self.db).await?.ok_or(AppError::NotFound("title"))
    }

    pub async fn create_title(&self, req: CreateTitleRequest) -> AppResult<TitleOut> {
        validate_year(req.year, current_year())?;
        let category_id = match req.category.as_deref() {
            Some(slug) => Some(self.category_id(slug).await?),
            None => None,
        };
        let genre_ids = self.genre_ids(&req.genre).await?;

        let txn = self.db.begin().await?;
        let created = title::ActiveModel {
            name: Set(req.name),
            year: Set(req.year),
            description: Set(req.description),
            category_id: Set(category_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        link_genres(&txn, created.id, &genre_ids).await?;
        txn.commit().await?;

        info!(title_id = created.id, name = %created.name, "title created");
        self.title(created.id).await
    }

    pub async fn update_title(&self, id: i32, req: UpdateTitleRequest) -> AppResult<TitleOut> {
        let existing = self.title_model(id).await?;
        if let Some(year) = req.year {
            validate_year(year, current_year())?;
        }
        let category_id = match req.category.as_deref() {
            Some(slug) => Some(self.category_id(slug).await?),
            None => None,
        };
        let genre_ids = match &req.genre {
            Some(slugs) => Some(self.genre_ids(slugs).await?),
            None => None,
        };

        let txn = self.db.begin().await?;
        let mut active: title::ActiveModel = existing.into();
        if let Some(name) = req.name {
            active.name = Set(name);
        }
        if let Some(year) = req.year {
            active.year = Set(year);
        }
        if let Some(description) = req.description {
            active.description = Set(description);
        }
        if let Some(category_id) = category_id {
            active.category_id = Set(Some(category_id));
        }
        active.update(&txn).await?;

        if let Some(genre_ids) = genre_ids {
            title_genre::Entity::delete_many()
                .filter(title_genre::Column::TitleId.eq(id))
                .exec(&txn)
                .await?;
            link_genres(&txn, id, &genre_ids).await?;
        }
        txn.commit().await?;

        self.title(id).await
    }

    pub async fn delete_title(&self, id: i32) -> AppResult<()> {
        let res = title::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("title"));
        }
        info!(title_id = id, "title deleted");
        Ok(())
    }

    async fn category_id(&self, slug: &str) -> AppResult<i32> {
        category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .map(|c| c.id)
            .ok_or_else(|| AppError::field("category", format!("no category with slug {slug:?}")))
    }

    async fn genre_ids(&self, slugs: &[String]) -> AppResult<Vec<i32>> {
        let found: HashMap<String, i32> = genre::Entity::find()
            .filter(genre::Column::Slug.is_in(slugs.iter().cloned()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|g| (g.slug, g.id))
            .collect();

        let mut ids = Vec::with_capacity(slugs.len());
        for slug in slugs {
            match found.get(slug) {
                Some(id) if !ids.contains(id) => ids.push(*id),
                Some(_) => {},
                None => {
                    return Err(AppError::field("genre", format!("no genre with slug {slug:?}")));
                },
            }
        }
        Ok(ids)
    }

    /// Attaches category, genres and the live rating to each title.
    async fn hydrate(&self, titles: Vec<title::Model>) -> AppResult<Vec<TitleOut>> {
        let ids: Vec<i32> = titles.iter().map(|t| t.id).collect();
        let category_ids: Vec<i32> = titles.iter().filter_map(|t| t.category_id).collect();

        let categories: HashMap<i32, SlugEntry> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            category::Entity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| (c.id, c.into()))
                .collect()
        };

        let mut genres: HashMap<i32, Vec<SlugEntry>> = HashMap::new();
        if !ids.is_empty() {
            let links = title_genre::Entity::find()
                .filter(title_genre::Column::TitleId.is_in(ids.iter().copied()))
                .order_by_asc(title_genre::Column::Id)
                .find_also_related(genre::Entity)
                .all(&self.db)
                .await?;
            for (link, g) in links {
                if let Some(g) = g {
                    genres.entry(link.title_id).or_default().push(g.into());
                }
            }
        }

        let ratings = rating::for_titles(&self.db, &ids).await?;

        Ok(titles
            .into_iter()
            .map(|t| TitleOut {
                category: t.category_id.and_then(|id| categories.get(&id).cloned()),
                genre: genres.remove(&t.id).unwrap_or_default(),
                rating: ratings.get(&t.id).copied(),
                id: t.id,
                name: t.name,
                year: t.year,
                description: t.description,
            })
            .collect())
    }
}

async fn link_genres(txn: &DatabaseTransaction, title_id: i32, genre_ids: &[i32]) -> AppResult<()> {
    if genre_ids.is_empty() {
        return Ok(());
    }
    let links = genre_ids.iter().map(|genre_id| title_genre::ActiveModel {
        title_id: Set(title_id),
        genre_id: Set(*genre_id),
        ..Default::default()
    });
    title_genre::Entity::insert_many(links).exec(txn).await?;
    Ok(())
}
