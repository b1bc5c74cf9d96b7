//! utilities related to database queries
//!
use std::{ops::Deref, sync::Arc};

pub mod filter {
    use super::DynFilterPart;

    /// Builder for a filter whose parts must all match
    #[derive(Clone)]
    pub struct CompoundFilterBuilder {
        pub(crate) top: CompoundFilter,
    }

    /// Start a filter whose parts must all match
    pub fn and() -> CompoundFilterBuilder {
        CompoundFilterBuilder::new()
    }

    impl CompoundFilterBuilder {
        pub fn new() -> Self {
            Self {
                top: CompoundFilter::new(),
            }
        }

        /// Append a filter expression. It is joined to the existing ones with
        /// `AND`.
        pub fn push<F: Into<DynFilterPart>>(mut self, filter: F) -> Self {
            self.top.add_filter(filter.into());
            self
        }

        pub fn build(self) -> DynFilterPart {
            self.top.into()
        }
    }

    impl Default for CompoundFilterBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Anything that can render itself as (part of) an SQL `WHERE` clause. It
    /// could be a single column condition or a nested compound condition.
    pub trait FilterPart: Send {
        /// append the SQL for this filter to the given [sqlx::QueryBuilder],
        /// binding any values instead of interpolating them
        fn add_to_query(&self, builder: &mut sqlx::QueryBuilder<sqlx::Sqlite>);
    }

    /// One or more filter conditions that must all hold. Compound filters
    /// nest, so they can form arbitrary trees.
    #[derive(Clone, Default)]
    pub struct CompoundFilter {
        pub(crate) conditions: Vec<DynFilterPart>,
    }

    impl CompoundFilter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_filter(&mut self, filter: DynFilterPart) {
            self.conditions.push(filter);
        }
    }

    impl FilterPart for CompoundFilter {
        fn add_to_query(&self, builder: &mut sqlx::QueryBuilder<sqlx::Sqlite>) {
            if self.conditions.is_empty() {
                builder.push("TRUE");
                return;
            }

            builder.push(" (");
            for (i, cond) in self.conditions.iter().enumerate() {
                if i > 0 {
                    builder.push(" AND ");
                }
                cond.add_to_query(builder);
            }
            builder.push(")");
        }
    }
}

/// A shareable, type-erased filter part
#[derive(Clone)]
pub struct DynFilterPart(Arc<dyn filter::FilterPart + Sync>);

impl Deref for DynFilterPart {
    type Target = Arc<dyn filter::FilterPart + Sync>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<F> From<F> for DynFilterPart
where
    F: filter::FilterPart + Send + Sync + 'static,
{
    fn from(value: F) -> Self {
        DynFilterPart(Arc::new(value))
    }
}
