use super::error::DbError;

pub type DbResult<T> = std::result::Result<T, DbError>;
