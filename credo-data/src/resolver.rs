use std::marker::PhantomData;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::{DataError, ResultExt};
use crate::executor::Executor;
use crate::page::{Page, PageRequest};
use crate::query::Statements;
use crate::repository::Paginate;

/// Answers page requests for one table.
///
/// Fetches the requested slice first and only counts the table when the
/// slice is non-empty. A request that matches nothing returns
/// [`Page::empty`] whatever page number was asked for.
pub struct PageResolver<T, E> {
    statements: Arc<Statements>,
    executor: Arc<E>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, E> PageResolver<T, E> {
    pub fn new(statements: Arc<Statements>, executor: Arc<E>) -> Self {
        Self {
            statements,
            executor,
            _marker: PhantomData,
        }
    }
}

impl<T, E> Clone for PageResolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            statements: self.statements.clone(),
            executor: self.executor.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity, E: Executor> Paginate<T> for PageResolver<T, E> {
    async fn get_page(&self, request: PageRequest) -> Result<Page<T>, DataError> {
        let params = request
            .resolve(self.statements.table().id_column())
            .context("unable to create page request")?;
        let (sql, args) = self
            .statements
            .page(&params)
            .context("unable to create page query")?;

        let content: Vec<T> = self
            .executor
            .select_many(&sql, &args)
            .await
            .context("unable to get page items")?;
        if content.is_empty() {
            tracing::trace!(
                table = self.statements.table().name(),
                page = params.page_number(),
                "page is empty"
            );
            return Ok(Page::empty());
        }

        let total = self.count().await?;
        let page = Page::new(content, &params, total);
        tracing::trace!(
            table = self.statements.table().name(),
            page = page.number,
            size = page.size,
            total = page.total,
            total_pages = page.total_pages,
            "page resolved"
        );
        Ok(page)
    }

    async fn count(&self) -> Result<u64, DataError> {
        let (sql, args) = self.statements.count();
        self.executor
            .select_one(&sql, &args)
            .await
            .context("unable to count records")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::dialect::Dialect;
    use crate::table::TableDescriptor;
    use crate::testing::MockExecutor;
    use crate::value::{FromRecord, Record, Value};

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i64,
    }

    impl FromRecord for Item {
        fn from_record(record: &Record) -> Result<Self, DataError> {
            Ok(Self {
                id: record.get("id")?,
            })
        }
    }

    impl Entity for Item {
        fn columns() -> &'static [&'static str] {
            &["id"]
        }

        fn values(&self) -> Vec<Value> {
            vec![self.id.into()]
        }
    }

    fn resolver(
        driver: &str,
        executor: MockExecutor,
    ) -> (Arc<MockExecutor>, PageResolver<Item, MockExecutor>) {
        let executor = Arc::new(executor);
        let table = TableDescriptor::new("items", "id").unwrap();
        let statements = Arc::new(Statements::new(Dialect::resolve(driver), table));
        (executor.clone(), PageResolver::new(statements, executor))
    }

    fn rows(ids: &[i64]) -> Vec<Record> {
        ids.iter().map(|id| Record::new().with("id", *id)).collect()
    }

    #[tokio::test]
    async fn test_page_with_total() {
        let (executor, pages) = resolver("sqlite3", MockExecutor::new());
        executor.push_rows(rows(&[4]));
        executor.push_rows(vec![Record::new().with("COUNT(\"id\")", 5i64)]);

        let page = pages
            .get_page(PageRequest::new().page_number(2).page_size(2))
            .await
            .unwrap();
        assert_eq!(page.number, 2);
        assert_eq!(page.size, 1);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.content, vec![Item { id: 4 }]);

        let calls = executor.calls();
        assert_eq!(
            calls[0].0,
            r#"SELECT * FROM "items" ORDER BY "id" ASC LIMIT ?, ?"#
        );
        assert_eq!(calls[0].1, vec![Value::Int(4), Value::Int(2)]);
        assert_eq!(calls[1].0, r#"SELECT COUNT("id") FROM "items";"#);
    }

    #[tokio::test]
    async fn test_page_sorted_desc_postgres() {
        let (executor, pages) = resolver("pgx", MockExecutor::new());
        executor.push_rows(rows(&[9, 8]));
        executor.push_rows(vec![Record::new().with("count", 9i64)]);

        pages
            .get_page(PageRequest::new().page_size(2).sort_by("id").sort_desc())
            .await
            .unwrap();
        assert_eq!(
            executor.queries()[0],
            r#"SELECT * FROM "items" ORDER BY "id" DESC OFFSET $1 LIMIT $2"#
        );
    }

    #[tokio::test]
    async fn test_empty_page_skips_count() {
        let (executor, pages) = resolver("sqlite3", MockExecutor::new());

        let page = pages
            .get_page(PageRequest::new().page_number(7).page_size(3))
            .await
            .unwrap();
        assert_eq!(page, Page::empty());
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_page_size_issues_no_query() {
        let (executor, pages) = resolver("sqlite3", MockExecutor::new());

        let err = pages
            .get_page(PageRequest::new().page_size(0))
            .await
            .unwrap_err();
        assert!(err.is_invalid_page_size());
        assert!(err.to_string().starts_with("unable to create page request"));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_sort_column_issues_no_query() {
        let (executor, pages) = resolver("sqlite3", MockExecutor::new());

        let err = pages
            .get_page(PageRequest::new().sort_by("id; DROP TABLE items"))
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), DataError::Query(_)));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_count_failure_is_wrapped() {
        let (executor, pages) = resolver("sqlite3", MockExecutor::new());
        executor.push_rows(rows(&[1]));
        executor.push_error(DataError::Unsupported("boom".into()));

        let err = pages.get_page(PageRequest::new()).await.unwrap_err();
        assert!(err.to_string().starts_with("unable to count records"));
    }

    #[tokio::test]
    async fn test_dropped_call_is_cancelled() {
        let (executor, pages) = resolver(
            "sqlite3",
            MockExecutor::new().with_delay(Duration::from_secs(60)),
        );

        let res = tokio::time::timeout(Duration::from_millis(20), pages.count()).await;
        assert!(res.is_err());
        assert_eq!(executor.calls().len(), 1);
    }
}
