//! Route geometry derived from an ordered scene list.
//!
//! Pure and synchronous. Distances use the haversine great-circle formula;
//! walking times model an average pace of 4.5 km/h. Per-segment minutes are
//! summed rather than recomputed from the total distance so the totals match
//! the per-leg estimates players actually see.

use crate::entities::Scene;
use crate::value_objects::GeoPoint;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average walking speed in km/h.
const WALKING_SPEED_KMH: f64 = 4.5;

/// Climax markers are display annotation only; cap them so a long route
/// does not drown in flags.
const MAX_CLIMAX_MARKERS: usize = 3;

/// Derived metrics for the full route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMetrics {
    /// Sum of consecutive-pair great-circle distances, in km
    pub total_km: f64,
    /// Sum of per-segment walking estimates, in minutes
    pub total_minutes: u32,
    /// Walking estimate per leg, in scene order
    pub segment_minutes: Vec<u32>,
}

/// Great-circle distance in kilometers between two coordinates.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Walking-time estimate for a distance, floored at one minute.
pub fn walking_minutes(km: f64) -> u32 {
    ((km / WALKING_SPEED_KMH * 60.0).round() as u32).max(1)
}

/// Total distance, total walking minutes, and per-leg minutes for an
/// ordered scene list. Lists shorter than two scenes have zero totals.
pub fn route_metrics(scenes: &[Scene]) -> RouteMetrics {
    if scenes.len() < 2 {
        return RouteMetrics::default();
    }

    let mut total_km = 0.0;
    let mut segment_minutes = Vec::with_capacity(scenes.len() - 1);

    for pair in scenes.windows(2) {
        let km = distance(pair[0].position, pair[1].position);
        total_km += km;
        segment_minutes.push(walking_minutes(km));
    }

    RouteMetrics {
        total_km,
        total_minutes: segment_minutes.iter().sum(),
        segment_minutes,
    }
}

/// 1-based positions of turning-point scenes, capped at the first three.
pub fn climax_indices(scenes: &[Scene]) -> Vec<usize> {
    scenes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.role.is_turning_point())
        .map(|(i, _)| i + 1)
        .take(MAX_CLIMAX_MARKERS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::NarrativeRole;

    fn scene_at(lat: f64, lng: f64) -> Scene {
        Scene::new("stop", GeoPoint::new(lat, lng))
    }

    #[test]
    fn test_distance_identical_points_is_zero() {
        let p = GeoPoint::new(35.6812, 139.7671);
        assert_eq!(distance(p, p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(35.6812, 139.7671);
        let b = GeoPoint::new(35.6586, 139.7454);
        assert!((distance(a, b) - distance(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_distance_known_pair() {
        // Tokyo Station to Tokyo Tower, roughly 3.2 km
        let a = GeoPoint::new(35.6812, 139.7671);
        let b = GeoPoint::new(35.6586, 139.7454);
        let km = distance(a, b);
        assert!(km > 2.8 && km < 3.6, "got {}", km);
    }

    #[test]
    fn test_walking_minutes_floors_at_one() {
        assert_eq!(walking_minutes(0.0), 1);
        assert_eq!(walking_minutes(0.01), 1);
    }

    #[test]
    fn test_walking_minutes_rounds() {
        // 4.5 km at 4.5 km/h is exactly 60 minutes
        assert_eq!(walking_minutes(4.5), 60);
        // 1.0 km -> 13.33 min -> 13
        assert_eq!(walking_minutes(1.0), 13);
    }

    #[test]
    fn test_route_metrics_short_lists_are_zero() {
        assert_eq!(route_metrics(&[]), RouteMetrics::default());
        assert_eq!(route_metrics(&[scene_at(35.0, 139.0)]), RouteMetrics::default());
    }

    #[test]
    fn test_route_metrics_totals_are_segment_sums() {
        let scenes = vec![
            scene_at(35.6812, 139.7671),
            scene_at(35.6586, 139.7454),
            scene_at(35.6295, 139.7387),
        ];
        let metrics = route_metrics(&scenes);

        let d1 = distance(scenes[0].position, scenes[1].position);
        let d2 = distance(scenes[1].position, scenes[2].position);
        assert!((metrics.total_km - (d1 + d2)).abs() < 1e-12);

        // Minutes are summed per segment, not recomputed from the total.
        assert_eq!(metrics.segment_minutes.len(), 2);
        assert_eq!(
            metrics.total_minutes,
            walking_minutes(d1) + walking_minutes(d2)
        );
    }

    #[test]
    fn test_segment_sum_differs_from_total_recompute() {
        // Many short legs accumulate the one-minute floor; a recompute from
        // the total distance would lose that.
        let scenes: Vec<Scene> = (0..5).map(|i| scene_at(35.0, 139.0 + 0.0001 * i as f64)).collect();
        let metrics = route_metrics(&scenes);
        assert_eq!(metrics.total_minutes, 4);
        assert!(metrics.total_minutes > walking_minutes(metrics.total_km));
    }

    #[test]
    fn test_climax_indices_filters_and_caps() {
        let mut scenes: Vec<Scene> = (0..6).map(|i| scene_at(35.0, 139.0 + 0.01 * i as f64)).collect();
        scenes[1].role = NarrativeRole::TurningPoint;
        scenes[2].role = NarrativeRole::TurningPoint;
        scenes[3].role = NarrativeRole::TurningPoint;
        scenes[5].role = NarrativeRole::TurningPoint;

        let indices = climax_indices(&scenes);
        assert_eq!(indices, vec![2, 3, 4]);
    }

    #[test]
    fn test_climax_indices_empty_when_no_turning_points() {
        let scenes: Vec<Scene> = (0..3).map(|i| scene_at(35.0, 139.0 + 0.01 * i as f64)).collect();
        assert!(climax_indices(&scenes).is_empty());
    }
}
