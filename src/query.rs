//! Query vocabulary shared by the typed accessors
//!
//! Filters are small combinator trees over per-entity condition enums; the
//! SQL itself is rendered through `sqlx::QueryBuilder` so every value travels
//! as a bind parameter.

use sqlx::{Postgres, QueryBuilder};

/// A per-entity condition that knows how to render itself into a WHERE
/// clause fragment. Implementations push column names from fixed enums and
/// values through `push_bind`.
pub trait SqlCond {
    fn push_cond(&self, qb: &mut QueryBuilder<'_, Postgres>);
}

/// A sortable column of an entity. Implementations return fixed identifiers,
/// never caller-supplied strings.
pub trait SqlColumn {
    fn as_sql(&self) -> &'static str;
}

/// Boolean combinator tree over entity conditions.
#[derive(Debug, Clone)]
pub enum Filter<C> {
    /// Conjunction; empty means "match everything".
    All(Vec<Filter<C>>),
    /// Disjunction; empty means "match nothing".
    Any(Vec<Filter<C>>),
    Not(Box<Filter<C>>),
    Is(C),
}

impl<C> Filter<C> {
    pub fn all(parts: impl IntoIterator<Item = Filter<C>>) -> Self {
        Self::All(parts.into_iter().collect())
    }

    pub fn any(parts: impl IntoIterator<Item = Filter<C>>) -> Self {
        Self::Any(parts.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Filter<C>) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Matches every row.
    pub fn everything() -> Self {
        Self::All(Vec::new())
    }
}

impl<C> From<C> for Filter<C> {
    fn from(cond: C) -> Self {
        Filter::Is(cond)
    }
}

impl<C: SqlCond> Filter<C> {
    pub(crate) fn push(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Filter::Is(cond) => cond.push_cond(qb),
            Filter::All(parts) if parts.is_empty() => {
                qb.push("TRUE");
            }
            Filter::Any(parts) if parts.is_empty() => {
                qb.push("FALSE");
            }
            Filter::All(parts) | Filter::Any(parts) => {
                let sep = if matches!(self, Filter::All(_)) { " AND " } else { " OR " };
                qb.push("(");
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        qb.push(sep);
                    }
                    part.push(qb);
                }
                qb.push(")");
            }
            Filter::Not(inner) => {
                qb.push("NOT (");
                inner.push(qb);
                qb.push(")");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Placement of NULL values within an ordered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

impl Nulls {
    fn as_sql(self) -> &'static str {
        match self {
            Nulls::First => "NULLS FIRST",
            Nulls::Last => "NULLS LAST",
        }
    }
}

/// One ordering key; lists of these order by the first key, then the next.
#[derive(Debug, Clone, Copy)]
pub struct OrderBy<C> {
    pub column: C,
    pub order: SortOrder,
    pub nulls: Option<Nulls>,
}

impl<C> OrderBy<C> {
    pub fn asc(column: C) -> Self {
        Self { column, order: SortOrder::Asc, nulls: None }
    }

    pub fn desc(column: C) -> Self {
        Self { column, order: SortOrder::Desc, nulls: None }
    }

    pub fn nulls(mut self, nulls: Nulls) -> Self {
        self.nulls = Some(nulls);
        self
    }
}

/// Offset/limit paging with a clamped page size.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    limit: i64,
    offset: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset: offset.max(0),
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: Self::DEFAULT_LIMIT, offset: 0 }
    }
}

/// Keyset paging anchored on a row id. A positive take walks forward in
/// creation order from the anchor, a negative take walks backward; the
/// anchor row itself is not part of the page.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub anchor: uuid::Uuid,
    pub take: i64,
}

impl Cursor {
    pub fn after(anchor: uuid::Uuid, take: i64) -> Self {
        Self { anchor, take: take.abs() }
    }

    pub fn before(anchor: uuid::Uuid, take: i64) -> Self {
        Self { anchor, take: -take.abs() }
    }

    pub(crate) fn forward(&self) -> bool {
        self.take >= 0
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::try_from(self.take.unsigned_abs())
            .unwrap_or(Page::MAX_LIMIT)
            .clamp(1, Page::MAX_LIMIT)
    }
}

pub(crate) fn push_order_by<C: SqlColumn>(
    qb: &mut QueryBuilder<'_, Postgres>,
    keys: &[OrderBy<C>],
    tiebreak: &'static str,
) {
    qb.push(" ORDER BY ");
    for key in keys {
        qb.push(key.column.as_sql());
        qb.push(" ");
        qb.push(key.order.as_sql());
        if let Some(nulls) = key.nulls {
            qb.push(" ");
            qb.push(nulls.as_sql());
        }
        qb.push(", ");
    }
    // Stable tiebreak so equal keys page deterministically.
    qb.push(tiebreak);
    qb.push(" ASC");
}

pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Page) {
    qb.push(" LIMIT ");
    qb.push_bind(page.limit);
    qb.push(" OFFSET ");
    qb.push_bind(page.offset);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    #[derive(Debug, Clone)]
    enum TestCond {
        Active(bool),
        NameLike(String),
    }

    impl SqlCond for TestCond {
        fn push_cond(&self, qb: &mut QueryBuilder<'_, Postgres>) {
            match self {
                TestCond::Active(v) => {
                    qb.push("is_active = ");
                    qb.push_bind(*v);
                }
                TestCond::NameLike(s) => {
                    qb.push("name ILIKE ");
                    qb.push_bind(format!("%{s}%"));
                }
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum TestColumn {
        Name,
    }

    impl SqlColumn for TestColumn {
        fn as_sql(&self) -> &'static str {
            "name"
        }
    }

    fn render(filter: &Filter<TestCond>) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("");
        filter.push(&mut qb);
        qb.build().sql().to_string()
    }

    #[test]
    fn test_filter_combinators() {
        let filter = Filter::all([
            Filter::from(TestCond::Active(true)),
            Filter::any([
                Filter::from(TestCond::NameLike("tee".into())),
                Filter::not(Filter::from(TestCond::NameLike("shirt".into()))),
            ]),
        ]);
        let sql = render(&filter);
        assert_eq!(sql, "(is_active = $1 AND (name ILIKE $2 OR NOT (name ILIKE $3)))");
    }

    #[test]
    fn test_empty_conjunction_matches_everything() {
        assert_eq!(render(&Filter::everything()), "TRUE");
        assert_eq!(render(&Filter::any([])), "FALSE");
    }

    #[test]
    fn test_order_by_rendering() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t WHERE TRUE");
        push_order_by(
            &mut qb,
            &[OrderBy::desc(TestColumn::Name).nulls(Nulls::Last)],
            "id",
        );
        assert_eq!(
            qb.build().sql(),
            "SELECT * FROM t WHERE TRUE ORDER BY name DESC NULLS LAST, id ASC"
        );
    }

    #[test]
    fn test_page_clamps() {
        let page = Page::new(10_000, -5);
        assert_eq!(page.limit(), Page::MAX_LIMIT);
        assert_eq!(page.offset(), 0);
        assert_eq!(Page::default().limit(), Page::DEFAULT_LIMIT);
    }

    #[test]
    fn test_cursor_direction() {
        let id = uuid::Uuid::now_v7();
        let fwd = Cursor::after(id, 20);
        let back = Cursor::before(id, 20);
        assert!(fwd.forward());
        assert!(!back.forward());
        assert_eq!(fwd.limit(), 20);
        assert_eq!(back.limit(), 20);
    }
}
