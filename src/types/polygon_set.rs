use geo::{MultiPolygon, Polygon};

/// A collection of keyed polygons in one coordinate reference system.
///
/// `K` is the zone identifier for the zone layer and the region name for the
/// region layer. The EPSG code is informational; it is only used to reject a
/// run whose two layers declare different systems.
#[derive(Debug, Clone)]
pub struct PolygonSet<K> {
    epsg: Option<u32>,
    features: Vec<(K, MultiPolygon<f64>)>,
}

impl<K> PolygonSet<K> {
    /// Create an empty set with an unknown coordinate system.
    pub fn new() -> Self { Self { epsg: None, features: Vec::new() } }

    /// Set the EPSG code of the set's coordinate reference system.
    pub fn with_epsg(mut self, epsg: u32) -> Self {
        self.epsg = Some(epsg);
        self
    }

    /// Append a feature.
    pub fn push(&mut self, key: impl Into<K>, geometry: impl Into<MultiPolygon<f64>>) {
        self.features.push((key.into(), geometry.into()));
    }

    /// Builder form of `push`.
    pub fn with(mut self, key: impl Into<K>, geometry: impl Into<MultiPolygon<f64>>) -> Self {
        self.push(key, geometry);
        self
    }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    #[inline] pub fn set_epsg(&mut self, epsg: Option<u32>) { self.epsg = epsg }

    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    #[inline] pub fn features(&self) -> &[(K, MultiPolygon<f64>)] { &self.features }

    pub(crate) fn into_features(self) -> Vec<(K, MultiPolygon<f64>)> { self.features }
}

impl<K> Default for PolygonSet<K> {
    fn default() -> Self { Self::new() }
}

impl<K, G: Into<MultiPolygon<f64>>> FromIterator<(K, G)> for PolygonSet<K> {
    fn from_iter<I: IntoIterator<Item = (K, G)>>(iter: I) -> Self {
        Self {
            epsg: None,
            features: iter.into_iter().map(|(k, g)| (k, g.into())).collect(),
        }
    }
}

impl<K> From<Vec<(K, Polygon<f64>)>> for PolygonSet<K> {
    fn from(features: Vec<(K, Polygon<f64>)>) -> Self { features.into_iter().collect() }
}
