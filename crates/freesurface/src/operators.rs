//! Discrete operators on the staggered grid.
//!
//! All operators are pure: they take the current field and return a new one
//! of the same shape. Face masks come from the [`Domain`].

use glam::DVec2;

use crate::config::FluidParams;
use crate::field::{CellField, StaggeredField};
use crate::grid::Domain;

/// `u + g Δt` on every face that touches water.
pub fn apply_body_forces(u: &StaggeredField, domain: &Domain, gravity: DVec2, dt: f64) -> StaggeredField {
    let wb = &domain.faces().water_boundary;
    let mut out = u.clone();
    let (x, y) = out.components_mut();

    for (v, &on) in x.iter_mut().zip(wb.x()) {
        if on {
            *v += gravity.x * dt;
        }
    }
    for (v, &on) in y.iter_mut().zip(wb.y()) {
        if on {
            *v += gravity.y * dt;
        }
    }
    out
}

/// Face velocities as seen by a water cell: free faces keep `u`, faces
/// against solid carry `u_solid`, all other faces are zero.
pub fn boundary_adjusted(u: &StaggeredField, domain: &Domain, solid_velocity: f64) -> StaggeredField {
    let faces = domain.faces();
    let free = u.masked(&faces.water_water_or_air);
    free.zip_with(&faces.water_solid, |&v, &ws| if ws { v + solid_velocity } else { v })
}

/// Net outflow per cell, `(Δu_x + Δu_y) / Δx`, after boundary adjustment.
pub fn divergence(u: &StaggeredField, domain: &Domain, solid_velocity: f64) -> CellField {
    let (rows, cols) = (domain.rows(), domain.cols());
    let inv_dx = 1.0 / domain.cell_size();
    let adj = boundary_adjusted(u, domain, solid_velocity);

    let mut div = CellField::zeros(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            let dx = adj.x_at(i, j + 1) - adj.x_at(i, j);
            let dy = adj.y_at(i + 1, j) - adj.y_at(i, j);
            div.set(i, j, (dx + dy) * inv_dx);
        }
    }
    div
}

/// Subtract the pressure gradient on free faces, then pin water-solid faces
/// to the solid velocity. Pressure outside the grid reads as zero.
pub fn pressure_gradient_update(
    u: &StaggeredField,
    p: &CellField,
    domain: &Domain,
    params: &FluidParams,
) -> StaggeredField {
    let (rows, cols) = (domain.rows(), domain.cols());
    let faces = domain.faces();
    let scale = params.dt / (params.density * domain.cell_size());
    let p_at = |i: Option<usize>, j: Option<usize>| match (i, j) {
        (Some(i), Some(j)) if i < rows && j < cols => p.get(i, j),
        _ => 0.0,
    };

    let mut out = u.clone();

    for i in 0..rows {
        for j in 0..=cols {
            let idx = out.x_index(i, j);
            if faces.water_water_or_air.x()[idx] {
                let left = p_at(Some(i), j.checked_sub(1));
                let right = p_at(Some(i), Some(j));
                out.x_mut()[idx] += scale * (left - right);
            }
            if faces.water_solid.x()[idx] {
                out.x_mut()[idx] = params.solid_velocity;
            }
        }
    }

    for i in 0..=rows {
        for j in 0..cols {
            let idx = out.y_index(i, j);
            if faces.water_water_or_air.y()[idx] {
                let up = p_at(i.checked_sub(1), Some(j));
                let down = p_at(Some(i), Some(j));
                out.y_mut()[idx] += scale * (up - down);
            }
            if faces.water_solid.y()[idx] {
                out.y_mut()[idx] = params.solid_velocity;
            }
        }
    }

    out
}
