//! Column-wise normalization of the feature matrix.
//!
//! - **Scaling**: continuous columns to zero mean, unit variance
//!   (population statistics, Welford accumulation)
//! - **Binarization**: categorical columns to indicator columns, one per
//!   class seen at fit time
//! - **Fitted transform**: the learned parameters as an explicit,
//!   serializable value threaded from fit to apply
//!
//! # Example
//!
//! ```ignore
//! use bidder_feature_extractor::preprocessing::{FittedTransform, UnseenCategoryPolicy};
//!
//! let transform = FittedTransform::fit(&train_matrix)?;
//! let (train, _) = transform.apply(&train_matrix, UnseenCategoryPolicy::ZeroFill)?;
//! let (test, report) = transform.apply(&test_matrix, UnseenCategoryPolicy::ZeroFill)?;
//! ```

pub mod binarizer;
pub mod normalization;
pub mod transform;

pub use binarizer::LabelBinarizer;
pub use normalization::{Normalizer, StandardScaler, DEFAULT_MIN_STD};
pub use transform::{
    ColumnTransform, FittedTransform, TransformReport, UnseenCategory, UnseenCategoryPolicy,
};
