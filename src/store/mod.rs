//! Typed accessors, one module per entity
//!
//! Accessor functions take `impl PgExecutor<'_>`, so the same function runs
//! against the pool (`catalog.pool()`) or inside a transaction
//! (`tx.conn()`). The handful of composite operations that issue several
//! statements take `&mut PgConnection`; get one from `catalog.acquire()` or
//! a transaction.

pub mod categories;
pub mod images;
pub mod option_values;
pub mod options;
pub mod products;
pub mod variant_links;
pub mod variants;
