//! Marker particles tracking the fluid body.
//!
//! One particle is seeded at the center of every water cell. Particles are
//! carried by the grid velocity but never feed back into the material mask.

use glam::DVec2;

use crate::grid::Domain;

/// Ordered particle positions in world space. The count is fixed at creation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Particles {
    list: Vec<DVec2>,
}

impl Particles {
    /// One particle per water cell center, in row-major order.
    pub fn from_water_cells(domain: &Domain) -> Self {
        Self {
            list: domain
                .water_cells()
                .iter()
                .map(|&(i, j)| domain.cell_center(i, j))
                .collect(),
        }
    }

    pub fn from_positions(list: Vec<DVec2>) -> Self {
        Self { list }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[DVec2] {
        &self.list
    }

    pub fn iter(&self) -> impl Iterator<Item = &DVec2> {
        self.list.iter()
    }

    /// Mutable access for in-place advection; the slice cannot grow or shrink.
    #[inline]
    pub(crate) fn positions_mut(&mut self) -> &mut [DVec2] {
        &mut self.list
    }

    /// Mean position, `None` when there are no particles.
    pub fn centroid(&self) -> Option<DVec2> {
        (!self.list.is_empty()).then(|| self.list.iter().copied().sum::<DVec2>() / self.list.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DomainLayout;

    #[test]
    fn test_seeded_at_water_centers() {
        let d = Domain::new(5, 5, 2.0, &DomainLayout::Wedge).unwrap();
        let p = Particles::from_water_cells(&d);
        assert_eq!(p.len(), 5);
        assert_eq!(p.positions()[0], DVec2::new(2.0, 2.0));
        assert_eq!(p.positions()[4], DVec2::new(4.0, 6.0));
    }

    #[test]
    fn test_default_wedge_particle_count() {
        let d = Domain::new(30, 30, 1.0, &DomainLayout::Wedge).unwrap();
        let p = Particles::from_water_cells(&d);
        assert_eq!(p.len(), d.water_count());
        assert!(p.iter().all(|pos| d.is_water(pos.y as usize, pos.x as usize)));
    }

    #[test]
    fn test_centroid() {
        let p = Particles::from_positions(vec![DVec2::new(0.0, 0.0), DVec2::new(2.0, 4.0)]);
        assert_eq!(p.centroid(), Some(DVec2::new(1.0, 2.0)));
        assert_eq!(Particles::default().centroid(), None);
    }
}
