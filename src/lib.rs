//! imod-recipe - build recipe for the IMOD tomography package
//!
//! Downloads the pinned IMOD self-extracting installer, runs it against an
//! install prefix, writes the Etomo CPU queue configuration and computes the
//! environment needed to use the result.

pub mod audit;
pub mod build;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod install;
pub mod process;
pub mod recipe;
pub mod stage;
pub mod ui;

pub use error::{RecipeError, RecipeResult};
