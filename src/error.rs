use thiserror::Error;

use crate::element::WayId;

#[derive(Error, Debug)]
pub enum MultipolygonError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid tile bounds: {0}")]
    InvalidTileBounds(String),

    #[error("Way {way} refers to unknown coordinate handle at index {index}")]
    UnknownCoordinate { way: WayId, index: usize },
}

pub type Result<T> = std::result::Result<T, MultipolygonError>;
