// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rebuild destinations from options or persisted records

use super::file::{FileDestination, FILE_DESTINATION_TYPE};
use super::Destination;
use crate::traced::TracedDestination;
use herald_core::{DestinationOptions, DestinationRecord};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("destination options have no __type")]
    MissingType,
    #[error("unknown destination type: {0}")]
    UnknownType(String),
    #[error("invalid options for {type_tag}: {reason}")]
    InvalidOptions { type_tag: String, reason: String },
}

/// Construct a traced destination of the variant named by `__type`
pub fn destination_from_options(
    options: DestinationOptions,
) -> Result<Arc<dyn Destination>, FactoryError> {
    let type_tag = options.type_tag.clone().ok_or(FactoryError::MissingType)?;
    match type_tag.as_str() {
        FILE_DESTINATION_TYPE => {
            let dest = FileDestination::from_options(&options).ok_or_else(|| {
                FactoryError::InvalidOptions {
                    type_tag: type_tag.clone(),
                    reason: "missing string option \"path\"".to_string(),
                }
            })?;
            Ok(Arc::new(TracedDestination::new(dest)))
        }
        _ => Err(FactoryError::UnknownType(type_tag)),
    }
}

pub fn destination_from_record(
    record: DestinationRecord,
) -> Result<Arc<dyn Destination>, FactoryError> {
    destination_from_options(DestinationOptions::from(record))
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
