// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors and warnings produced while reading cluster documents.
///
/// Only `MalformedDocument`, `Io` and `Config` are ever returned as `Err`. The others describe
/// recoverable problems: the builder substitutes a placeholder, records the condition in the
/// snapshot's warnings and carries on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not parse document: {0}")]
    MalformedDocument(#[from] elementtree::Error),

    #[error("unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot { expected: String, found: String },

    #[error("resource agent {0} is not installed")]
    UnknownAgent(String),

    #[error("{resource} refers to unknown {kind} \"{target}\"")]
    UnresolvedReference {
        resource: String,
        kind: &'static str,
        target: String,
    },

    #[error("<{element}> is missing attribute \"{attribute}\"")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn missing(element: impl Into<String>, attribute: &'static str) -> Self {
        Error::MissingAttribute {
            element: element.into(),
            attribute,
        }
    }
}
