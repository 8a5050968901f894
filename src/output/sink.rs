use crate::domain::SitedTurbine;
use crate::geometry::SpatialReference;

/// Append-only collection of sited turbines in the DEM's spatial reference
#[derive(Debug, Clone, PartialEq)]
pub struct TurbineSink {
    reference: SpatialReference,
    turbines: Vec<SitedTurbine>,
}

impl TurbineSink {
    pub fn new(reference: SpatialReference) -> Self {
        Self {
            reference,
            turbines: Vec::new(),
        }
    }

    pub fn append(&mut self, turbine: SitedTurbine) {
        self.turbines.push(turbine);
    }

    pub fn len(&self) -> usize {
        self.turbines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turbines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SitedTurbine> {
        self.turbines.iter()
    }

    pub fn reference(&self) -> &SpatialReference {
        &self.reference
    }

    pub fn into_turbines(self) -> Vec<SitedTurbine> {
        self.turbines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CandidatePoint;
    use crate::geometry::LinearUnit;
    use geo::Point;

    #[test]
    fn test_append_keeps_order() {
        let mut sink = TurbineSink::new(SpatialReference::projected(LinearUnit::Feet));
        assert!(sink.is_empty());

        for id in [7, 3, 5] {
            let site = CandidatePoint::new(id, Point::new(id as f64, 0.0), 500.0, 1.0);
            sink.append(SitedTurbine::new(site));
        }

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.reference().frame, crate::geometry::Frame::Projected(LinearUnit::Feet));
        let ids: Vec<u64> = sink.into_turbines().iter().map(|t| t.site.id.0).collect();
        assert_eq!(ids, vec![7, 3, 5]);
    }
}
