/// Mean radius of the earth in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.;

/// Haversine distance in meters between two points given in degrees.
///
/// NaN coordinates are not guarded against and produce NaN.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points. f64::min would swallow NaN.
    let a = if a > 1. { 1. } else { a };
    let c = 2. * f64::asin(f64::sqrt(a));

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero_apart() {
        assert_eq!(haversine_distance(56.175188, 10.196123, 56.175188, 10.196123), 0.);
        assert_eq!(haversine_distance(-90., 180., -90., 180.), 0.);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            ((0., 0.), (0., 1.)),
            ((56.1, 10.2), (55.6, 12.5)),
            ((-33.9, 151.2), (51.5, -0.1)),
            ((89.9, -179.9), (-89.9, 179.9)),
        ];

        for ((lat1, lon1), (lat2, lon2)) in pairs {
            assert_eq!(haversine_distance(lat1, lon1, lat2, lon2), haversine_distance(lat2, lon2, lat1, lon1));
        }
    }

    #[test]
    fn one_degree_of_longitude_at_the_equator() {
        let distance = haversine_distance(0., 0., 0., 1.);
        assert!((distance - 111_190.).abs() / 111_190. < 0.005, "got {distance}");
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let distance = haversine_distance(0., 0., 0., 180.);
        assert!(distance.is_finite());
        assert!((distance - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.);
    }

    #[test]
    fn nan_propagates() {
        assert!(haversine_distance(f64::NAN, 0., 0., 0.).is_nan());
    }
}
