//! Two-phase transactional database initialization.
//!
//! Phase 1 creates the schema, phase 2 seeds data. Each phase runs in its
//! own transaction: a seeding failure never rolls back schema creation,
//! because schema and data are independently recoverable.

use crate::connection;
use crate::context::DbContext;
use crate::conventions::{ConventionKind, ConventionSet, SqliteIndexNaming, UniqueConstraint};
use crate::error::InitError;
use crate::model::ModelBuilder;
use crate::schema::{SchemaCreator, SqliteSchemaCreator};
use async_trait::async_trait;
use tracing::info;

/// Seeding strategy invoked after schema creation.
///
/// The seeder receives the schema-initialized context; rows it stages via
/// [`DbContext::queue_insert`] are persisted inside phase 2's transaction.
#[async_trait]
pub trait Seeder: Send + Sync {
    async fn seed(&self, ctx: &mut DbContext) -> Result<(), sqlx::Error>;
}

struct NoopSeeder;

#[async_trait]
impl Seeder for NoopSeeder {
    async fn seed(&self, _ctx: &mut DbContext) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

/// Creates and seeds SQLite databases from a declarative model.
pub struct SqliteInitializer {
    model_builder: ModelBuilder,
    schema_creator: Box<dyn SchemaCreator>,
    seeder: Box<dyn Seeder>,
}

impl SqliteInitializer {
    /// Build an initializer around the required model builder.
    ///
    /// Patches the builder's convention set exactly once:
    /// 1. removes the timestamp-concurrency convention (the SQLite driver
    ///    cannot populate rowversion values);
    /// 2. inserts the SQLite index-naming convention immediately after the
    ///    default foreign-key-index convention when that default is present
    ///    (absent means there is nothing to rename);
    /// 3. adds the uniqueness convention so unique markers become
    ///    constraints at schema-generation time.
    pub fn new(mut model_builder: ModelBuilder) -> Self {
        patch_conventions(model_builder.conventions_mut());
        SqliteInitializer {
            model_builder,
            schema_creator: Box::new(SqliteSchemaCreator::new()),
            seeder: Box::new(NoopSeeder),
        }
    }

    /// Replace the default no-op seeder.
    pub fn with_seeder(mut self, seeder: impl Seeder + 'static) -> Self {
        self.seeder = Box::new(seeder);
        self
    }

    /// Replace the default schema creator collaborator.
    pub fn with_schema_creator(mut self, creator: impl SchemaCreator + 'static) -> Self {
        self.schema_creator = Box::new(creator);
        self
    }

    pub fn model_builder(&self) -> &ModelBuilder {
        &self.model_builder
    }

    /// Initialize the database behind `ctx`: compile the model, ensure the
    /// target directory exists, create the schema, then seed.
    ///
    /// Each phase commits its own transaction; on failure the active
    /// transaction is rolled back and the original error propagates
    /// unwrapped.
    pub async fn initialize_database(&self, ctx: &mut DbContext) -> Result<(), InitError> {
        let model = self.model_builder.build(ctx.connection_string())?;

        let path = ctx.database_path()?;
        connection::ensure_parent_dir(&path)?;
        info!(path = %path.display(), "initializing database");

        // Phase 1: schema creation.
        let pool = ctx.pool().clone();
        let mut tx = pool.begin().await?;
        if let Err(err) = self.schema_creator.create(&model, &mut tx).await {
            tx.rollback().await.ok();
            return Err(InitError::Database(err));
        }
        tx.commit().await?;
        info!(tables = model.tables().len(), "schema created");

        // Phase 2: seeding, in an independent transaction. Never merged
        // with phase 1.
        let mut tx = pool.begin().await?;
        if let Err(err) = self.seeder.seed(ctx).await {
            tx.rollback().await.ok();
            return Err(InitError::Database(err));
        }
        match ctx.save_changes_in(&mut tx).await {
            Ok(persisted) => {
                tx.commit().await?;
                info!(rows = persisted, "database seeded");
            }
            Err(err) => {
                tx.rollback().await.ok();
                return Err(InitError::Database(err));
            }
        }

        Ok(())
    }
}

fn patch_conventions(conventions: &mut ConventionSet) {
    conventions.remove(ConventionKind::TimestampConcurrency);

    if conventions.contains(ConventionKind::ForeignKeyIndex) {
        // Anchor presence checked above, so the insertion cannot miss.
        let _ = conventions.insert_after(
            ConventionKind::ForeignKeyIndex,
            Box::new(SqliteIndexNaming),
        );
    }

    conventions.add(Box::new(UniqueConstraint));
}
