//! Paging engine
//!
//! A page is two round trips made one after the other: the count statement,
//! then the windowed statement. Nothing ties the two to the same snapshot, so
//! rows written in between can make `total` and `values` disagree.

use crate::context::error::ContextResult;
use crate::context::serie_context::SerieContext;
use crate::query::QueryBuilder;
use crate::series::{convert, PageResult, Paging, Serie};

/// Column read first when extracting a count
const COUNT_COLUMN: &str = "count";

/// Position of the count when no column is named `count`, after `time`
const COUNT_FALLBACK_INDEX: usize = 1;

impl SerieContext {
    /// Number of rows the builder matches.
    ///
    /// Reads the first row of the first result set; an empty result counts as
    /// zero.
    pub async fn count(&self, builder: &QueryBuilder) -> ContextResult<usize> {
        let statement = builder.to_count()?;
        let series = self.query(&statement).await?;
        Ok(first_count(&series))
    }

    /// Fetch one page of results.
    ///
    /// `page < 1` is read as the first page and `page_size < 1` as the
    /// default size of 10.
    pub async fn page(
        &self,
        builder: &QueryBuilder,
        page: i64,
        page_size: i64,
    ) -> ContextResult<PageResult<Serie>> {
        let mut paging = Paging::new(page, page_size);
        self.page_with(builder, &mut paging).await
    }

    /// Fetch the page described by `paging`, writing the count into its `total`.
    ///
    /// A zero page or page size is normalized in place first.
    pub async fn page_with(
        &self,
        builder: &QueryBuilder,
        paging: &mut Paging,
    ) -> ContextResult<PageResult<Serie>> {
        paging.normalize();
        paging.total = self.count(builder).await?;

        let statement = builder.to_limit_and_offset(paging.page_size, paging.offset())?;
        let values = self.query(&statement).await?;
        Ok(PageResult::new(*paging, values))
    }
}

fn first_count(series: &[Serie]) -> usize {
    let Some(serie) = series.first() else {
        return 0;
    };
    let Some(row) = serie.values.first() else {
        return 0;
    };

    let index = serie
        .column_index(COUNT_COLUMN)
        .unwrap_or(COUNT_FALLBACK_INDEX);
    row.get(index)
        .and_then(|value| convert::<i64>(value).ok().flatten())
        .map(|count| count.max(0) as usize)
        .unwrap_or(0)
}
