//! Data carried by the shared resources of the stand-in pipeline.

/// A square transverse grid centred on the beam axis.
///
/// Cell `(ix, iy)` is stored at `iy * size + ix`; its centre sits at
/// `((ix + 0.5) * spacing - half_width, ...)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    /// Cells per side.
    pub size: usize,
    /// Cell width in fm.
    pub spacing: f64,
    /// Row-major cell values.
    pub values: Vec<f64>,
}

impl Grid {
    /// A zero-filled grid.
    pub fn new(size: usize, spacing: f64) -> Self {
        Self {
            size,
            spacing,
            values: vec![0.0; size * size],
        }
    }

    /// Transverse coordinate of the centre of cell index `i` along one axis.
    pub fn coord(&self, i: usize) -> f64 {
        (i as f64 + 0.5) * self.spacing - 0.5 * self.size as f64 * self.spacing
    }

    /// Index of the cell containing `(x, y)`, if inside the grid.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<usize> {
        let half = 0.5 * self.size as f64 * self.spacing;
        let ix = ((x + half) / self.spacing).floor();
        let iy = ((y + half) / self.spacing).floor();
        let n = self.size as f64;
        if ix < 0.0 || iy < 0.0 || ix >= n || iy >= n {
            return None;
        }
        Some(iy as usize * self.size + ix as usize)
    }

    /// Value of the cell containing `(x, y)`, or 0 outside the grid.
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        self.cell_at(x, y).map_or(0.0, |i| self.values[i])
    }

    /// Integral over the transverse plane.
    pub fn integral(&self) -> f64 {
        self.values.iter().sum::<f64>() * self.spacing * self.spacing
    }

    /// Largest cell value, or 0 for an empty grid.
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// A grid of the same shape with `f` applied to every cell.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            size: self.size,
            spacing: self.spacing,
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// Entropy density after the collision.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitialState {
    /// Sampled impact parameter in fm.
    pub impact_parameter: f64,
    /// Entropy density per cell.
    pub entropy: Grid,
}

/// Energy density handed to hydrodynamics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreEquilibrium {
    /// Proper time at which hydro starts, in fm/c.
    pub tau0: f64,
    /// Energy density per cell in GeV/fm³.
    pub energy_density: Grid,
}

/// A hydrodynamic medium.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Medium {
    /// Temperature per cell at `tau0`, in GeV.
    pub temperature: Grid,
    /// Peak temperature at `tau0`, in GeV.
    pub initial_temperature: f64,
    /// Hydro start time, in fm/c.
    pub tau0: f64,
    /// Time at which the hottest cell reaches freeze-out, in fm/c.
    pub freeze_out_time: f64,
    /// Freeze-out temperature, in GeV.
    pub freeze_out_temperature: f64,
    /// Total energy at `tau0`, in GeV, including jet deposits.
    pub total_energy: f64,
    /// Energy received from the liquefier, in GeV.
    pub deposited_energy: f64,
}

impl Medium {
    /// Path length available to a jet: the lifetime of the fluid.
    pub fn lifetime(&self) -> f64 {
        (self.freeze_out_time - self.tau0).max(0.0)
    }
}

/// A parton of the hard process or the shower.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Parton {
    /// PDG particle id.
    pub pid: i32,
    /// Transverse momentum in GeV.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth in `[0, 2π)`.
    pub phi: f64,
    /// Virtuality in GeV. Set by the virtuality-ordered shower.
    pub virtuality: f64,
    /// Transverse production point, x in fm.
    pub x: f64,
    /// Transverse production point, y in fm.
    pub y: f64,
}

/// A final-state hadron.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hadron {
    /// PDG particle id.
    pub pid: i32,
    /// Transverse momentum in GeV.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuth in `[0, 2π)`.
    pub phi: f64,
}

/// An energy deposit from a jet into the medium.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Droplet {
    /// Transverse position, x in fm.
    pub x: f64,
    /// Transverse position, y in fm.
    pub y: f64,
    /// Deposited energy in GeV.
    pub energy: f64,
}

/// Collects jet energy deposits for a downstream hydro stage.
///
/// Energy-loss modules hold an accumulator handle and call
/// [`deposit`](Self::deposit); the owning hydro stage calls
/// [`drain`](Self::drain) once per event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Liquefier {
    droplets: Vec<Droplet>,
}

impl Liquefier {
    /// Add one deposit. Non-positive or non-finite energies are dropped.
    pub fn deposit(&mut self, droplet: Droplet) {
        if droplet.energy.is_finite() && droplet.energy > 0.0 {
            self.droplets.push(droplet);
        }
    }

    /// Remove and return every pending deposit.
    pub fn drain(&mut self) -> Vec<Droplet> {
        std::mem::take(&mut self.droplets)
    }

    /// Number of pending deposits.
    pub fn len(&self) -> usize {
        self.droplets.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.droplets.is_empty()
    }

    /// Total pending energy in GeV.
    pub fn pending_energy(&self) -> f64 {
        self.droplets.iter().map(|d| d.energy).sum()
    }
}

/// Wrap an azimuth into `[0, 2π)`.
pub(crate) fn wrap_phi(phi: f64) -> f64 {
    phi.rem_euclid(std::f64::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_coordinates_are_centred() {
        let g = Grid::new(4, 1.0);
        assert_eq!(g.coord(0), -1.5);
        assert_eq!(g.coord(3), 1.5);
        assert_eq!(g.cell_at(-1.9, -1.9), Some(0));
        assert_eq!(g.cell_at(1.9, 1.9), Some(15));
        assert_eq!(g.cell_at(2.1, 0.0), None);
    }

    #[test]
    fn grid_integral_and_max() {
        let mut g = Grid::new(2, 0.5);
        g.values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(g.integral(), 10.0 * 0.25);
        assert_eq!(g.max(), 4.0);
        assert_eq!(g.map(|v| v * 2.0).values, vec![2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn liquefier_drops_bad_deposits_and_drains() {
        let mut l = Liquefier::default();
        l.deposit(Droplet { x: 0.0, y: 0.0, energy: 1.5 });
        l.deposit(Droplet { x: 0.0, y: 0.0, energy: -1.0 });
        l.deposit(Droplet { x: 0.0, y: 0.0, energy: f64::NAN });
        assert_eq!(l.len(), 1);
        assert_eq!(l.pending_energy(), 1.5);
        assert_eq!(l.drain().len(), 1);
        assert!(l.is_empty());
    }

    #[test]
    fn phi_wraps() {
        assert!((wrap_phi(-0.5) - (std::f64::consts::TAU - 0.5)).abs() < 1e-12);
        assert!(wrap_phi(7.0) < std::f64::consts::TAU);
    }
}
