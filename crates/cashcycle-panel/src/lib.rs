#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cashcycle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod assemble;
pub mod columns;
pub mod error;
pub mod event_time;
pub mod instrument;
pub mod quarter;
pub mod ratios;
pub mod treatment;
pub mod winsorize;

pub use assemble::{Panel, PanelConfig, PanelInputs, assemble_panel};
pub use error::{PanelError, Result};
pub use event_time::{NeverTreatedPolicy, add_event_time};
pub use instrument::{InstrumentInputs, InstrumentSpec, build_instrument};
pub use quarter::{Quarter, QuarterIndex, add_quarter_index};
pub use ratios::compute_ratios;
pub use treatment::{TreatmentInputs, TreatmentRule, assign_treatment};
pub use winsorize::{WinsorBounds, winsorize};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
