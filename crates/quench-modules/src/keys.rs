//! Resource keys used by the stand-in modules.

/// Entropy density from [`TrentoInitial`](crate::TrentoInitial).
pub const INITIAL_STATE: &str = "initial_state";
/// Energy density at the start of hydro, from
/// [`NullPreDynamics`](crate::NullPreDynamics).
pub const PREEQUILIBRIUM: &str = "preequilibrium";
/// Medium of the first hydro stage.
pub const MEDIUM: &str = "medium";
/// Medium of the second hydro stage.
pub const MEDIUM_2: &str = "medium_2";
/// Partons from the hard scattering.
pub const HARD_PARTONS: &str = "hard_partons";
/// High-virtuality shower produced by [`Matter`](crate::Matter).
pub const SHOWER: &str = "shower";
/// Partons after all energy loss.
pub const FINAL_PARTONS: &str = "final_partons";
/// Energy deposited by jets, consumed by the second hydro stage.
pub const LIQUEFIER: &str = "liquefier";
/// Hadrons from jet hadronization.
pub const HADRONS: &str = "hadrons";
/// Hadrons sampled from the freeze-out surface.
pub const SOFT_HADRONS: &str = "soft_hadrons";
