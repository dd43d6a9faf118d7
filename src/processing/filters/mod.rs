// src/processing/filters/mod.rs
//! Digital filters for optical-mapping signals and frames

pub mod drift;
pub mod fir;
pub mod spatial;
pub mod temporal;

pub use drift::*;
pub use fir::*;
pub use spatial::*;
pub use temporal::*;

use crate::config::constants::{drift as drift_consts, spatial as spatial_consts, temporal as temporal_consts};
use crate::error::{AnalysisError, AnalysisErrorBuilder};
use crate::utils::validate_range;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spatial smoothing kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialKernel {
    Gaussian,
    Mean,
    Median,
}

impl SpatialKernel {
    pub fn name(&self) -> &'static str {
        match self {
            SpatialKernel::Gaussian => "gaussian",
            SpatialKernel::Mean => "mean",
            SpatialKernel::Median => "median",
        }
    }
}

impl FromStr for SpatialKernel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gaussian" => Ok(SpatialKernel::Gaussian),
            "mean" => Ok(SpatialKernel::Mean),
            "median" => Ok(SpatialKernel::Median),
            other => Err(AnalysisErrorBuilder::new("spatial", "parse_kernel")
                .invalid_value("filter_type", "unsupported spatial filter")
                .with_values(spatial_consts::SPATIAL_FILTERS.join(" | "), other)),
        }
    }
}

impl fmt::Display for SpatialKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wire form shared by the order enums: an integer or a sentinel string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum OrderRepr {
    Int(i64),
    Text(String),
}

/// FIR filter order: an explicit positive order or automatic selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderRepr", into = "OrderRepr")]
pub enum FilterOrder {
    Explicit(usize),
    Auto,
}

impl FromStr for FilterOrder {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == temporal_consts::AUTO_SENTINEL {
            return Ok(FilterOrder::Auto);
        }
        match s.parse::<i64>() {
            Ok(order) => FilterOrder::try_from(OrderRepr::Int(order)),
            Err(_) => Err(AnalysisErrorBuilder::new("temporal", "parse_order")
                .invalid_value("filter_order", "must be a positive integer or 'auto'")
                .with_values("integer | auto", s)),
        }
    }
}

impl TryFrom<OrderRepr> for FilterOrder {
    type Error = AnalysisError;

    fn try_from(repr: OrderRepr) -> Result<Self, Self::Error> {
        match repr {
            OrderRepr::Int(order) if order > 0 => Ok(FilterOrder::Explicit(order as usize)),
            OrderRepr::Int(order) => Err(AnalysisErrorBuilder::new("temporal", "parse_order")
                .invalid_value("filter_order", "must be a positive integer")
                .with_values("> 0", order)),
            OrderRepr::Text(text) => text.parse(),
        }
    }
}

impl From<FilterOrder> for OrderRepr {
    fn from(order: FilterOrder) -> Self {
        match order {
            FilterOrder::Explicit(n) => OrderRepr::Int(n as i64),
            FilterOrder::Auto => OrderRepr::Text(temporal_consts::AUTO_SENTINEL.to_string()),
        }
    }
}

/// Drift model: polynomial degree in [1, 5] or a single exponential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OrderRepr", into = "OrderRepr")]
pub enum DriftOrder {
    Polynomial(u8),
    Exponential,
}

impl DriftOrder {
    /// Validated polynomial drift order
    pub fn polynomial(degree: i64) -> Result<Self, AnalysisError> {
        let range = drift_consts::MIN_POLY_ORDER as i64..=drift_consts::MAX_POLY_ORDER as i64;
        let degree = validate_range("drift", "drift_order", degree, range)?;
        Ok(DriftOrder::Polynomial(degree as u8))
    }
}

impl FromStr for DriftOrder {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == drift_consts::EXPONENTIAL_SENTINEL {
            return Ok(DriftOrder::Exponential);
        }
        match s.parse::<i64>() {
            Ok(degree) => DriftOrder::polynomial(degree),
            Err(_) => Err(AnalysisErrorBuilder::new("drift", "parse_order")
                .invalid_value("drift_order", "must be an integer in [1, 5] or 'exp'")
                .with_values("1..=5 | exp", s)),
        }
    }
}

impl TryFrom<OrderRepr> for DriftOrder {
    type Error = AnalysisError;

    fn try_from(repr: OrderRepr) -> Result<Self, Self::Error> {
        match repr {
            OrderRepr::Int(degree) => DriftOrder::polynomial(degree),
            OrderRepr::Text(text) => text.parse(),
        }
    }
}

impl From<DriftOrder> for OrderRepr {
    fn from(order: DriftOrder) -> Self {
        match order {
            DriftOrder::Polynomial(n) => OrderRepr::Int(n as i64),
            DriftOrder::Exponential => OrderRepr::Text(drift_consts::EXPONENTIAL_SENTINEL.to_string()),
        }
    }
}
