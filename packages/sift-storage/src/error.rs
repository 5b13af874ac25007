#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Collection {name:?} was not found.")]
	CollectionNotFound { name: String },
	#[error("Collection {name:?} already exists.")]
	CollectionExists { name: String },
	#[error("Column {column:?} does not exist in collection {name:?}.")]
	MissingColumn { name: String, column: String },
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Engine error: {0}")]
	Engine(String),
}
