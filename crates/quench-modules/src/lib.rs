//! Stand-in physics modules for Quench.
//!
//! Toy versions of the stages of a heavy-ion event: an initial-state
//! generator, pre-equilibrium dynamics, a hard-scattering gun, a
//! hydrodynamic medium with an optional liquefier, two energy-loss
//! modules, a particlization sampler, hadronization, and an ASCII
//! writer. The physics is deliberately simple; what matters is that each
//! module declares its scheduling class, capabilities and resources, and
//! draws random numbers only from the seed its context hands it.
//!
//! [`two_stage_hydro`] assembles them into the two-stage hydro pipeline.
//!
//! | Module | Kind | Owns | Reads | Accumulates |
//! |--------|------|------|-------|-------------|
//! | [`TrentoInitial`] | upstream | `initial_state` | | |
//! | [`NullPreDynamics`] | upstream | `preequilibrium` | `initial_state` | |
//! | [`PythiaGun`] | downstream | `hard_partons` | | |
//! | [`MusicHydro`] | upstream, or downstream with a liquefier | its medium, the liquefier | `preequilibrium` | |
//! | [`Matter`] | downstream | `shower` | `hard_partons`, medium | liquefier |
//! | [`Lbt`] | downstream | `final_partons` | `shower`, medium | liquefier |
//! | [`SurfaceSampler`] | downstream | `soft_hadrons` | medium | |
//! | [`PartonPrinter`] | downstream | | `final_partons` | |
//! | [`ColorlessHadronization`] | downstream | `hadrons` | `final_partons` | |
//! | [`AsciiWriter`] | sink | | hadron streams | |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod data;
pub mod eloss;
pub mod hadronization;
pub mod hard;
pub mod hydro;
pub mod initial;
pub mod keys;
pub mod pipeline;
mod rng;
pub mod soft;
pub mod writer;

pub use data::{Droplet, Grid, Hadron, InitialState, Liquefier, Medium, Parton, PreEquilibrium};
pub use eloss::{Lbt, Matter, VIRTUALITY};
pub use hadronization::{ColorlessHadronization, PartonPrinter};
pub use hard::PythiaGun;
pub use hydro::MusicHydro;
pub use initial::{NullPreDynamics, TrentoInitial};
pub use pipeline::two_stage_hydro;
pub use soft::SurfaceSampler;
pub use writer::AsciiWriter;

#[cfg(test)]
mod testing;
