use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, sea_query::Expr,
};

use crate::{entities::review, error::AppResult};

/// Mean of `count` scores summing to `sum`, rounded to the nearest integer
/// with halves away from zero. `None` when there are no scores.
pub fn from_totals(sum: i64, count: i64) -> Option<i32> {
    if count <= 0 {
        return None;
    }
    Some((sum as f64 / count as f64).round() as i32)
}

/// Ratings for the given titles, computed from their reviews at query time.
/// Titles without reviews are absent from the map.
pub async fn for_titles<C>(db: &C, title_ids: &[i32]) -> AppResult<HashMap<i32, i32>>
where
    C: ConnectionTrait,
{
    if title_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64, i64)> = review::Entity::find()
        .select_only()
        .column(review::Column::TitleId)
        .column_as(Expr::col(review::Column::Score).sum(), "score_sum")
        .column_as(Expr::col(review::Column::Id).count(), "review_count")
        .filter(review::Column::TitleId.is_in(title_ids.iter().copied()))
        .group_by(review::Column::TitleId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(title_id, sum, count)| from_totals(sum, count).map(|r| (title_id, r)))
        .collect())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn from_scores(scores: &[i32]) -> Option<i32> {
        let sum = scores.iter().copied().map(i64::from).sum();
        from_totals(sum, scores.len() as i64)
    }

    #[rstest]
    #[case(&[], None)]
    #[case(&[8, 10], Some(9))]
    #[case(&[7], Some(7))]
    #[case(&[7, 8], Some(8))]
    #[case(&[1, 1, 2], Some(1))]
    #[case(&[10, 10, 9], Some(10))]
    fn mean_rounds_to_nearest(#[case] scores: &[i32], #[case] expected: Option<i32>) {
        assert_eq!(from_scores(scores), expected);
    }

    #[test]
    fn totals_without_reviews_are_null_not_zero() {
        assert_eq!(from_totals(0, 0), None);
    }
}
