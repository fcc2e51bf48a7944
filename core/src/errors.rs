// Copyright 2023-2024 The Milton Hirsch Institute, B.V.
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Every failure the allocator, deallocator and query API can report.
///
/// All variants surface as HTTP 400 at the HTTP boundary; the variant
/// itself is the only thing that distinguishes them for a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpamError {
    /// `allocate`: pool exists but no block of the requested size is free.
    NoCapacity,
    /// `allocate_by_cidr`: target CIDR is not contained in any root of the pool.
    NoRoot,
    /// `allocate_by_cidr`: the specific CIDR is already materialized.
    NotAvailable,
    /// A conditional write lost a race with a concurrent mutation, or the
    /// requested side of a materialized ancestor was not free. Retryable.
    /// Carries the CIDR of the node the condition failed against, for
    /// diagnostics (preserved per the `allocate_by_cidr` open question).
    Conflict(String),
    /// `delete_root`/`deallocate`: no node at that key.
    NotFound,
    /// `deallocate`: node exists but is not a reservation.
    NotAReservation,
    /// `delete_root`: node exists but is not the root of its tree.
    NotARoot,
    /// `delete_root`: root still hosts at least one reservation.
    NotEmpty,
    /// `create_root`: CIDR overlaps an existing root.
    OverlappingRoot,
    /// Invariant violation; should not happen.
    Internal(String),
}

impl Display for IpamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IpamError::NoCapacity => write!(f, "No capacity available in pool"),
            IpamError::NoRoot => write!(f, "No root found for CIDR in pool"),
            IpamError::NotAvailable => write!(f, "CIDR is not available"),
            IpamError::Conflict(cidr) => write!(f, "Conflict allocating near {}", cidr),
            IpamError::NotFound => write!(f, "Not found"),
            IpamError::NotAReservation => write!(f, "CIDR is not a reservation"),
            IpamError::NotARoot => write!(f, "CIDR is not a root"),
            IpamError::NotEmpty => write!(f, "Root is not empty"),
            IpamError::OverlappingRoot => write!(f, "CIDR conflicts with an existing root"),
            IpamError::Internal(message) => write!(f, "Internal error: {}", message),
        }
    }
}

impl Error for IpamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
