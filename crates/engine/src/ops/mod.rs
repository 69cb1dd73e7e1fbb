use sea_orm::DatabaseConnection;

use crate::{ResultEngine, ValidationErrors};

mod expenses;
mod reports;
mod users;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Maximum length, in characters, of names and descriptions.
const TEXT_MAX_CHARS: usize = 255;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// Trims `value` and records an error under `field` if it is empty or longer
/// than [`TEXT_MAX_CHARS`].
fn normalize_required_text(
    value: &str,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field may not be blank.");
        return None;
    }
    if trimmed.chars().count() > TEXT_MAX_CHARS {
        errors.add(
            field,
            format!("Ensure this field has no more than {TEXT_MAX_CHARS} characters."),
        );
        return None;
    }
    Some(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
