//! Terminal UI helpers
//!
//! Uses `cliclack` for spinners and prompts and `indicatif` for progress bars,
//! falling back to plain lines on stderr when not attached to a terminal.
//!
//! # Example
//!
//! ```rust,ignore
//! use imod_recipe::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//!
//! ui::intro(&ctx, "Installing imod@4.11.24");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Checking dependencies...");
//! spinner.stop("Dependencies available");
//!
//! ui::outro_success(&ctx, "Installed");
//! ```

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_error, outro_success, remark, step_error_detail, step_ok,
    step_ok_detail, step_warn_hint,
};
pub use progress::{DownloadProgress, InstallProgress, TaskSpinner};
pub use prompts::confirm;
