// Derived-metric views over the normalized master table. Each view
// recomputes the derived metrics through `metrics` rather than sharing
// mutated state, so formulas cannot drift between scaling bases.

pub mod comparison;
pub mod correlation;
pub mod metrics;
pub mod minutes;
pub mod pace;
